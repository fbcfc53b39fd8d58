pub mod check_config;
pub mod generate;
pub mod list;
pub mod prompt;

//! The documentation pipeline: discover files, generate (or reuse cached)
//! documentation, and rewrite each file with a fresh leading comment block.

pub mod cache;
pub mod discover;
pub mod document;
pub mod generator;
pub mod outcome;
pub mod pool;
pub mod runner;

pub use cache::DocCache;
pub use discover::{discover, FileFilter};
pub use generator::DocGenerator;
pub use outcome::{FileOutcome, RunResult, SkipReason};
pub use pool::WorkerPool;
pub use runner::Pipeline;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use code2doc::cli;
use code2doc::cli::generate::GenerateArgs;

#[derive(Parser)]
#[command(name = "code2doc", version)]
#[command(about = "Prepend LLM-generated documentation to source files", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Document every matching file under a source folder
    Generate(GenerateArgs),

    /// List the files `generate` would process
    List {
        /// Source folder to scan
        #[arg(default_value = "src")]
        path: String,

        /// Path to config file
        #[arg(long)]
        config: Option<String>,
    },

    /// Send a single prompt to the configured model and print the reply
    Prompt {
        /// Prompt text
        text: String,

        /// Path to config file
        #[arg(long)]
        config: Option<String>,

        /// Use mock LLM client
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration, credentials and cache file
    CheckConfig {
        /// Path to config file
        #[arg(long)]
        config: Option<String>,
    },

    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so `list` and `prompt` output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate(args) => {
            cli::generate::run(args).await?;
        }
        Commands::List { path, config } => {
            cli::list::run(path, config)?;
        }
        Commands::Prompt {
            text,
            config,
            dry_run,
        } => {
            cli::prompt::run(text, config, dry_run).await?;
        }
        Commands::CheckConfig { config } => {
            cli::check_config::run(config)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "code2doc", &mut std::io::stdout());
        }
    }

    Ok(())
}

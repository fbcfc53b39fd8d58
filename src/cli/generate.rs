use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{Config, PromptStyle, Provider};
use crate::llm::factory;
use crate::pipeline::{DocCache, DocGenerator, FileFilter, Pipeline, RunResult};

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Source folder to document
    #[arg(default_value = "src")]
    pub path: String,

    /// Path to config file (defaults to ./code2doc.toml or ~/.config/code2doc/config.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Override LLM provider (azure, openai, openai-compatible, ollama)
    #[arg(long)]
    pub provider: Option<String>,

    /// Override model or Azure deployment name
    #[arg(long)]
    pub model: Option<String>,

    /// Override endpoint / base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Number of files processed concurrently
    #[arg(long)]
    pub workers: Option<usize>,

    /// Cache file location
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// File receiving the list of updated paths
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Prompt style: brief or detailed
    #[arg(long)]
    pub prompt_style: Option<String>,

    /// Use a mock LLM client and only log what would change; no file is written
    #[arg(long)]
    pub dry_run: bool,
}

/// Apply CLI overrides on top of the loaded config.
pub fn apply_overrides(config: &mut Config, args: &GenerateArgs) -> Result<()> {
    if let Some(ref provider) = args.provider {
        info!("CLI override: provider = {}", provider);
        config.llm.provider = provider.parse::<Provider>()?;
    }
    if let Some(ref model) = args.model {
        info!("CLI override: model = {}", model);
        config.llm.model = model.clone();
    }
    if let Some(ref base_url) = args.base_url {
        info!("CLI override: base_url = {}", base_url);
        config.llm.base_url = Some(base_url.clone());
    }
    if let Some(workers) = args.workers {
        info!("CLI override: workers = {}", workers);
        config.pipeline.workers = workers;
    }
    if let Some(ref cache) = args.cache {
        info!("CLI override: cache_file = {}", cache.display());
        config.pipeline.cache_file = cache.clone();
    }
    if let Some(ref report) = args.report {
        info!("CLI override: report_file = {}", report.display());
        config.pipeline.report_file = report.clone();
    }
    if let Some(ref style) = args.prompt_style {
        info!("CLI override: prompt_style = {}", style);
        config.pipeline.prompt_style = style.parse::<PromptStyle>()?;
    }
    Ok(())
}

pub async fn run(args: GenerateArgs) -> Result<RunResult> {
    let mut config = Config::load_with_path(args.config.clone())?;
    apply_overrides(&mut config, &args)?;
    config.validate()?;

    info!("Source folder: {}", args.path);
    info!("Dry run: {}", args.dry_run);

    // Credentials are checked here, before any file is read
    let client = factory::create_client(&config, args.dry_run)?;

    let cache = if args.dry_run {
        warn!("Dry run: source files, cache and report are left untouched");
        DocCache::in_memory()
    } else {
        DocCache::load(&config.pipeline.cache_file)?
    };

    let generator = DocGenerator::new(client, Arc::new(cache))
        .with_limits(config.pipeline.limits())
        .with_prompt_style(config.pipeline.prompt_style);
    let filter = FileFilter::from_config(&config.pipeline)?;
    let pipeline =
        Pipeline::new(generator, filter, config.pipeline.workers).with_dry_run(args.dry_run);

    let result = pipeline.run(Path::new(&args.path)).await?;

    if args.dry_run {
        info!(
            "Dry run: {} of {} files would be updated, report not written",
            result.previewed.len(),
            result.discovered
        );
        return Ok(result);
    }

    result.write_report(&config.pipeline.report_file)?;

    if result.updated.is_empty() {
        info!("No files were updated");
    } else {
        info!(
            "Updated {} of {} files",
            result.updated.len(),
            result.discovered
        );
    }

    Ok(result)
}

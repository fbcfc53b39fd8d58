use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

use super::discover::{discover, FileFilter};
use super::document::{strip_docs, wrap_docs};
use super::generator::DocGenerator;
use super::outcome::{FileOutcome, RunResult, SkipReason};
use super::pool::WorkerPool;
use crate::llm::prompts::fence_language;

/// Discover → document → rewrite, over a bounded worker pool.
pub struct Pipeline {
    generator: Arc<DocGenerator>,
    filter: FileFilter,
    pool: WorkerPool,
    dry_run: bool,
}

impl Pipeline {
    pub fn new(generator: DocGenerator, filter: FileFilter, workers: usize) -> Self {
        Self {
            generator: Arc::new(generator),
            filter,
            pool: WorkerPool::new(workers),
            dry_run: false,
        }
    }

    /// In a dry run documentation is generated and logged, but no source
    /// file and no cache file is written.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Document a single file in place (or preview it in a dry run).
    pub async fn apply(&self, path: &Path) -> FileOutcome {
        process_file(&self.generator, path, !self.dry_run).await
    }

    /// Process every eligible file under `root`, then persist the cache.
    ///
    /// Individual file failures never abort the run. The cache is written
    /// only after all workers have been joined.
    pub async fn run(&self, root: &Path) -> Result<RunResult> {
        let files = discover(root, &self.filter)?;
        let discovered = files.len();

        info!(
            "Processing {} files with {} workers",
            discovered,
            self.pool.size()
        );

        let generator = Arc::clone(&self.generator);
        let write = !self.dry_run;
        let outcomes = self
            .pool
            .run(files.clone(), move |path: PathBuf| {
                let generator = Arc::clone(&generator);
                async move { process_file(&generator, &path, write).await }
            })
            .await;

        let mut result = RunResult {
            discovered,
            ..RunResult::default()
        };
        for (path, joined) in files.into_iter().zip(outcomes) {
            let outcome = joined.unwrap_or_else(|err| {
                warn!("Skipping {} (worker failed): {}", path.display(), err);
                FileOutcome::Skipped(SkipReason::Worker(err))
            });
            result.record(path, outcome);
        }

        if self.dry_run {
            debug!("Dry run: cache not persisted");
        } else {
            self.generator
                .cache()
                .save()
                .context("Failed to persist documentation cache")?;
        }

        info!(
            "Run complete: {} updated, {} previewed, {} skipped",
            result.updated.len(),
            result.previewed.len(),
            result.skipped.len()
        );
        Ok(result)
    }
}

/// Read, strip old documentation, generate, and write back. The file is only
/// written once documentation is in hand, so a failed generation leaves it
/// exactly as it was.
pub async fn apply_file(generator: &DocGenerator, path: &Path) -> FileOutcome {
    process_file(generator, path, true).await
}

/// Same steps as `apply_file`, but the would-be header is logged instead of
/// written.
pub async fn preview_file(generator: &DocGenerator, path: &Path) -> FileOutcome {
    process_file(generator, path, false).await
}

async fn process_file(generator: &DocGenerator, path: &Path, write: bool) -> FileOutcome {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) => {
            warn!("Skipping {} (unreadable): {}", path.display(), err);
            return FileOutcome::Skipped(SkipReason::Read(err));
        }
    };

    let body = strip_docs(&raw);
    if body.trim().is_empty() {
        debug!("Skipping {} (empty)", path.display());
        return FileOutcome::Skipped(SkipReason::Empty);
    }

    let doc = match generator.generate_docs(body, fence_language(path)).await {
        Ok(doc) => doc,
        Err(err) => {
            warn!(
                "Skipping {} (failed to generate documentation): {:#}",
                path.display(),
                err
            );
            return FileOutcome::Skipped(SkipReason::Generation(err));
        }
    };

    let updated = wrap_docs(&doc, body);

    if !write {
        let header = &updated[..updated.len() - body.len()];
        info!("Dry run, would update {}:\n{}", path.display(), header.trim_end());
        return FileOutcome::Previewed;
    }

    if let Err(err) = fs::write(path, updated).await {
        warn!("Skipping {} (write failed): {}", path.display(), err);
        return FileOutcome::Skipped(SkipReason::Write(err));
    }

    info!("Updated: {}", path.display());
    FileOutcome::Updated
}

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::info;

/// Why a file was left untouched. None of these abort a run.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("no content left after removing existing documentation")]
    Empty,

    #[error("failed to read file: {0}")]
    Read(#[source] io::Error),

    #[error("failed to generate documentation: {0:#}")]
    Generation(anyhow::Error),

    #[error("failed to write file: {0}")]
    Write(#[source] io::Error),

    #[error("worker task failed: {0}")]
    Worker(#[source] JoinError),
}

#[derive(Debug)]
pub enum FileOutcome {
    Updated,
    /// Documentation was generated but, in a dry run, not written.
    Previewed,
    Skipped(SkipReason),
}

impl FileOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, FileOutcome::Updated)
    }
}

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of one full pass over the discovered files.
#[derive(Debug, Default)]
pub struct RunResult {
    pub discovered: usize,
    pub updated: Vec<PathBuf>,
    pub previewed: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

impl RunResult {
    pub fn record(&mut self, path: PathBuf, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Updated => self.updated.push(path),
            FileOutcome::Previewed => self.previewed.push(path),
            FileOutcome::Skipped(reason) => self.skipped.push(SkippedFile { path, reason }),
        }
    }

    /// Write updated paths, one per line, for a calling process (e.g. a CI
    /// job that commits the changes). When no file was updated, a report
    /// left over from an earlier run is removed so it cannot be mistaken for
    /// this one. Returns whether the report was written.
    pub fn write_report(&self, path: &Path) -> Result<bool> {
        if self.updated.is_empty() {
            info!("No files updated");
            match fs::remove_file(path) {
                Ok(()) => info!("Removed stale report {}", path.display()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("Failed to remove stale report {}", path.display())
                    })
                }
            }
            return Ok(false);
        }

        let lines = self
            .updated
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");

        fs::write(path, lines)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!(
            "Saved list of {} updated files to {}",
            self.updated.len(),
            path.display()
        );
        Ok(true)
    }
}

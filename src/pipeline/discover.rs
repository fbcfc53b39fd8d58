use anyhow::{bail, Context, Result};
use glob::Pattern;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;

/// Decides which files are eligible for documentation.
#[derive(Debug, Clone)]
pub struct FileFilter {
    extensions: Vec<String>,
    exclude: Vec<Pattern>,
}

impl FileFilter {
    /// `extensions` may be given as `kt` or `.kt`; `exclude` entries are glob
    /// patterns matched against the file name only.
    pub fn new<E, X>(extensions: &[E], exclude: &[X]) -> Result<Self>
    where
        E: AsRef<str>,
        X: AsRef<str>,
    {
        let extensions = extensions
            .iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect::<Vec<_>>();

        let exclude = exclude
            .iter()
            .map(|pattern| {
                Pattern::new(pattern.as_ref())
                    .with_context(|| format!("Invalid exclude pattern: {}", pattern.as_ref()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            extensions,
            exclude,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(&config.extensions, &config.exclude)
    }

    pub fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        let allowed_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)));

        allowed_ext && !self.exclude.iter().any(|pattern| pattern.matches(name))
    }
}

/// Recursively list every file under `root` that passes `filter`, sorted.
///
/// Hidden files and ignore files are not consulted: a checked-in source tree
/// is documented in full. Unreadable directory entries are logged and skipped.
pub fn discover(root: &Path, filter: &FileFilter) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Source folder does not exist: {}", root.display());
    }

    info!("Walking source folder: {}", root.display());

    let mut files = Vec::new();
    for entry in WalkBuilder::new(root).standard_filters(false).build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry: {}", err);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        if filter.accepts(entry.path()) {
            files.push(entry.into_path());
        } else {
            debug!("Filtered out: {}", entry.path().display());
        }
    }

    files.sort();
    info!("Found {} files", files.len());
    Ok(files)
}

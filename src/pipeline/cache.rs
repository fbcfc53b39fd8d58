//! Fingerprint → documentation cache, persisted as a JSON object between runs.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Shared between workers behind an `Arc`. Entries are never evicted.
#[derive(Debug, Default)]
pub struct DocCache {
    /// `None` for caches that live only in memory
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl DocCache {
    /// A cache that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Seed an unpersisted cache, mostly useful in tests.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            path: None,
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Read the cache file at `path`. A missing file yields an empty cache
    /// that will be created on `save`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read cache file {}", path.display()))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).with_context(|| {
                    format!(
                        "Cache file {} is not a JSON object of strings",
                        path.display()
                    )
                })?
            }
        } else {
            debug!("No cache file at {}, starting empty", path.display());
            BTreeMap::new()
        };

        info!(
            "Loaded {} cached documentation entries from {}",
            entries.len(),
            path.display()
        );

        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A panic elsewhere cannot leave a half-written map entry behind.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, doc: impl Into<String>) {
        self.lock().insert(key.into(), doc.into());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Overwrite the cache file with the current entries. The JSON is written
    /// to a sibling temp file and renamed into place, so a crash mid-write
    /// leaves the previous cache intact. No-op for in-memory caches.
    pub fn save(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let json = {
            let entries = self.lock();
            serde_json::to_string_pretty(&*entries).context("Failed to serialize cache")?
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(json.as_bytes())
            .context("Failed to write cache contents")?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace cache file {}", path.display()))?;

        info!("Saved {} cache entries to {}", self.len(), path.display());
        Ok(())
    }
}

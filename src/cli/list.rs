use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::pipeline::{discover, FileFilter};

/// Files `generate` would process under `path`, per the loaded config.
pub fn collect(path: &str, config_path: Option<String>) -> Result<Vec<PathBuf>> {
    let config = Config::load_with_path(config_path)?;
    let filter = FileFilter::from_config(&config.pipeline)?;
    discover(Path::new(path), &filter)
}

pub fn run(path: String, config_path: Option<String>) -> Result<()> {
    let files = collect(&path, config_path)?;
    for file in &files {
        println!("{}", file.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_honours_config_filters() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.kt"), "x").unwrap();
        fs::write(src.join("b.js"), "x").unwrap();

        let config = dir.path().join("code2doc.toml");
        fs::write(&config, "[pipeline]\nextensions = [\"kt\"]\n").unwrap();

        let files = collect(
            &src.to_string_lossy(),
            Some(config.to_string_lossy().to_string()),
        )
        .unwrap();
        assert_eq!(files, vec![src.join("a.kt")]);
    }
}

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::{Config, Provider};
use crate::pipeline::{DocCache, FileFilter};
use crate::util::env_non_empty;

#[derive(Debug, Default)]
pub struct CheckResult {
    pub passed: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl CheckResult {
    fn pass(&mut self, msg: impl Into<String>) {
        self.passed.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }
}

pub fn run(config_path: Option<String>) -> Result<()> {
    let results = check(config_path);
    print_results(&results);

    if !results.errors.is_empty() {
        bail!("{} configuration error(s)", results.errors.len());
    }
    Ok(())
}

/// Everything `generate` would trip over, collected without touching the
/// network or any source file.
pub fn check(config_path: Option<String>) -> CheckResult {
    let mut results = CheckResult::default();

    let source = Config::locate(config_path.clone());
    let config = match Config::load_with_path(config_path) {
        Ok(config) => {
            match source {
                Some(path) => results.pass(format!("Config loaded from {}", path.display())),
                None => results.pass("No config file found, using defaults"),
            }
            config
        }
        Err(e) => {
            results.error(format!("Failed to load config: {:#}", e));
            return results;
        }
    };

    if let Err(e) = config.validate() {
        results.error(e.to_string());
    }

    results.pass(format!(
        "LLM provider: {} (model: {})",
        config.llm.provider, config.llm.model
    ));

    check_api_key(&config, &mut results);

    match config.llm.resolve_base_url() {
        Ok(url) => results.pass(format!("Endpoint: {}", url)),
        Err(e) => results.error(e.to_string()),
    }

    if config.llm.provider == Provider::Azure {
        results.pass(format!("Azure api-version: {}", config.llm.api_version));
    }

    let pipeline = &config.pipeline;
    match FileFilter::from_config(pipeline) {
        Ok(_) => results.pass(format!(
            "Extensions: {} (excluding {})",
            pipeline.extensions.join(", "),
            if pipeline.exclude.is_empty() {
                "nothing".to_string()
            } else {
                pipeline.exclude.join(", ")
            }
        )),
        Err(e) => results.error(format!("{:#}", e)),
    }

    results.pass(format!(
        "Workers: {}, truncation: {} lines / {} chars, prompt style: {:?}",
        pipeline.workers, pipeline.max_lines, pipeline.max_chars, pipeline.prompt_style
    ));

    check_cache(&pipeline.cache_file, &mut results);

    results
}

fn check_api_key(config: &Config, results: &mut CheckResult) {
    let provider = config.llm.provider;
    match &config.llm.api_key_env {
        Some(env_var) if env_var.eq_ignore_ascii_case("none") => {
            results.pass("API key: not required (api_key_env = \"none\")");
        }
        Some(env_var) => match env_non_empty(env_var) {
            Some(_) => results.pass(format!("API key: {} is set", env_var)),
            None if provider.requires_api_key() => {
                results.error(format!("API key: {} is not set", env_var))
            }
            None => results.warn(format!(
                "API key: {} is not set (OK for local models, needed for gateways)",
                env_var
            )),
        },
        None if provider.requires_api_key() => results.error(format!(
            "API key: provider {} needs llm.api_key_env",
            provider
        )),
        None => results.pass("API key: not configured (local provider)"),
    }
}

fn check_cache(path: &Path, results: &mut CheckResult) {
    if !path.exists() {
        results.pass(format!(
            "Cache: {} does not exist yet (created on first run)",
            path.display()
        ));
        return;
    }

    match DocCache::load(path) {
        Ok(cache) => results.pass(format!(
            "Cache: {} ({} entries)",
            path.display(),
            cache.len()
        )),
        Err(e) => results.error(format!("{:#}", e)),
    }
}

fn print_results(results: &CheckResult) {
    println!();
    for msg in &results.passed {
        println!("  \u{2713} {}", msg);
    }
    for msg in &results.warnings {
        println!("  ! {}", msg);
    }
    for msg in &results.errors {
        println!("  \u{2717} {}", msg);
    }
    println!();
    println!(
        "{} passed, {} warnings, {} errors",
        results.passed.len(),
        results.warnings.len(),
        results.errors.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> String {
        let path = dir.path().join("code2doc.toml");
        fs::write(&path, body).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let results = check(Some("/nonexistent/code2doc.toml".to_string()));
        assert_eq!(results.errors.len(), 1);
        assert!(results.errors[0].contains("Failed to load config"));
    }

    #[test]
    #[serial]
    fn test_ollama_config_passes() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("cache.json");
        let path = write_config(
            &dir,
            &format!(
                r#"
                [llm]
                provider = "ollama"
                model = "codegemma"

                [pipeline]
                cache_file = "{}"
                "#,
                cache.to_string_lossy().replace('\\', "/")
            ),
        );

        let results = check(Some(path));
        assert!(results.errors.is_empty(), "{:?}", results.errors);
        assert!(results
            .passed
            .iter()
            .any(|m| m.contains("http://localhost:11434")));
    }

    #[test]
    #[serial]
    fn test_azure_without_key_or_endpoint_reports_errors() {
        env::remove_var(crate::config::AZURE_ENDPOINT_ENV);
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [llm]
            provider = "azure"
            model = "gpt-4o"
            api_key_env = "CODE2DOC_CHECK_MISSING_KEY"
            "#,
        );

        let results = check(Some(path));
        assert!(results
            .errors
            .iter()
            .any(|m| m.contains("CODE2DOC_CHECK_MISSING_KEY is not set")));
        assert!(results
            .errors
            .iter()
            .any(|m| m.contains(crate::config::AZURE_ENDPOINT_ENV)));
    }

    #[test]
    fn test_invalid_exclude_pattern_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [llm]
            provider = "ollama"
            model = "codegemma"

            [pipeline]
            exclude = ["[broken"]
            "#,
        );

        let results = check(Some(path));
        assert!(results
            .errors
            .iter()
            .any(|m| m.contains("Invalid exclude pattern")));
    }

    #[test]
    fn test_malformed_cache_reported() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("cache.json");
        fs::write(&cache, "not json").unwrap();

        let mut results = CheckResult::default();
        check_cache(&cache, &mut results);
        assert_eq!(results.errors.len(), 1);
    }
}

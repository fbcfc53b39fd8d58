use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::pipeline::document::TruncationLimits;
use crate::util::env_non_empty;

/// Per-repo config file name, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "code2doc.toml";

/// Fallback for the Azure endpoint when `llm.base_url` is not set.
pub const AZURE_ENDPOINT_ENV: &str = "AZURE_OPENAI_ENDPOINT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "azure")]
    Azure,
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "openai-compatible")]
    OpenAICompatible,
    #[serde(rename = "ollama")]
    Ollama,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Azure => "azure",
            Provider::OpenAI => "openai",
            Provider::OpenAICompatible => "openai-compatible",
            Provider::Ollama => "ollama",
        }
    }

    /// Hosted providers refuse anonymous requests; local servers and
    /// gateways may or may not want a key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Provider::Azure | Provider::OpenAI)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "azure" | "azure-openai" => Ok(Provider::Azure),
            "openai" => Ok(Provider::OpenAI),
            "openai-compatible" => Ok(Provider::OpenAICompatible),
            "ollama" => Ok(Provider::Ollama),
            other => bail!("Unknown LLM provider: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// One-line request, cheapest on tokens
    #[default]
    Brief,
    /// Sectioned template: overview, signature, parameters, usage
    Detailed,
}

impl FromStr for PromptStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "brief" => Ok(PromptStyle::Brief),
            "detailed" => Ok(PromptStyle::Detailed),
            other => bail!("Unknown prompt style: {} (expected brief or detailed)", other),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: Provider,

    /// Model name, or the deployment name for Azure
    pub model: String,

    /// Environment variable holding the API key. `"none"` disables the key.
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,

    /// Azure REST api-version query parameter
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_version() -> String {
    "2024-05-01-preview".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_top_p() -> f32 {
    1.0
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Azure,
            model: "gpt-4o".to_string(),
            api_key_env: Some("AZURE_OPENAI_API_KEY".to_string()),
            base_url: None,
            api_version: default_api_version(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            top_p: default_top_p(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Resolve the service root URL for the configured provider, without a
    /// trailing slash.
    pub fn resolve_base_url(&self) -> Result<String> {
        let configured = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        let url = match self.provider {
            Provider::Azure => match configured.or_else(|| env_non_empty(AZURE_ENDPOINT_ENV)) {
                Some(url) => url,
                None => bail!(
                    "Azure provider requires llm.base_url or the {} environment variable",
                    AZURE_ENDPOINT_ENV
                ),
            },
            Provider::OpenAI => {
                configured.unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            }
            Provider::OpenAICompatible => {
                configured.unwrap_or_else(|| "http://localhost:11434/v1".to_string())
            }
            Provider::Ollama => configured.unwrap_or_else(|| "http://localhost:11434".to_string()),
        };

        Ok(url.trim_end_matches('/').to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// File extensions to document, with or without the leading dot
    pub extensions: Vec<String>,

    /// File-name globs to skip (e.g. `*.test.js`)
    pub exclude: Vec<String>,

    pub workers: usize,

    /// Truncation applied before prompting and hashing
    pub max_lines: usize,
    pub max_chars: usize,

    pub cache_file: PathBuf,

    /// Updated paths, one per line, for a calling process to pick up
    pub report_file: PathBuf,

    pub prompt_style: PromptStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let limits = TruncationLimits::default();
        Self {
            extensions: vec!["js".to_string(), "ts".to_string(), "kt".to_string()],
            exclude: vec![
                "*.test.js".to_string(),
                "*.test.ts".to_string(),
                "*.json".to_string(),
            ],
            workers: 5,
            max_lines: limits.max_lines,
            max_chars: limits.max_chars,
            cache_file: PathBuf::from("cache.json"),
            report_file: PathBuf::from("updated_files.txt"),
            prompt_style: PromptStyle::Brief,
        }
    }
}

impl PipelineConfig {
    pub fn limits(&self) -> TruncationLimits {
        TruncationLimits {
            max_lines: self.max_lines,
            max_chars: self.max_chars,
        }
    }
}

impl Config {
    /// Load config from the working directory or user config directory
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        match Self::locate(path) {
            Some(config_path) => {
                debug!("Loading config from {}", config_path.display());
                Self::load_from_path(&config_path)
            }
            None => {
                debug!("Using default config");
                Ok(Self::default())
            }
        }
    }

    /// Which file `load_with_path` would read, if any. An explicit path is
    /// returned as-is so a typo surfaces as a read error instead of silently
    /// falling back to defaults.
    pub fn locate(path: Option<String>) -> Option<PathBuf> {
        if let Some(config_path) = path {
            return Some(PathBuf::from(config_path));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("code2doc").join("config.toml"))
            .filter(|p| p.is_file())
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Get API key from the environment variable named in config.
    /// Missing keys are fatal only for providers that cannot work without one.
    pub fn get_api_key(&self) -> Result<String> {
        match &self.llm.api_key_env {
            Some(env_var) if env_var.eq_ignore_ascii_case("none") => Ok(String::new()),
            Some(env_var) => match env_non_empty(env_var) {
                Some(key) => Ok(key),
                None if self.llm.provider.requires_api_key() => bail!(
                    "API key not found in environment variable: {}",
                    env_var
                ),
                None => Ok(String::new()),
            },
            None if self.llm.provider.requires_api_key() => bail!(
                "Provider {} needs an API key but llm.api_key_env is not set",
                self.llm.provider
            ),
            None => Ok(String::new()),
        }
    }

    /// Reject settings that would make a run meaningless before any file is
    /// touched.
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if self.pipeline.extensions.is_empty() {
            bail!("pipeline.extensions must list at least one extension");
        }
        if self.pipeline.max_lines == 0 || self.pipeline.max_chars == 0 {
            bail!("pipeline.max_lines and pipeline.max_chars must be greater than zero");
        }
        if self.pipeline.workers == 0 {
            bail!("pipeline.workers must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, Provider::Azure);
        assert_eq!(
            config.llm.api_key_env,
            Some("AZURE_OPENAI_API_KEY".to_string())
        );
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.pipeline.workers, 5);
        assert_eq!(config.pipeline.max_lines, 1000);
        assert_eq!(config.pipeline.max_chars, 4000);
        assert_eq!(config.pipeline.prompt_style, PromptStyle::Brief);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("provider = \"azure\""));
        assert!(toml_str.contains("AZURE_OPENAI_API_KEY"));
        assert!(toml_str.contains("cache_file = \"cache.json\""));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [llm]
            provider = "ollama"
            model = "codegemma"

            [pipeline]
            extensions = ["kt"]
            workers = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.provider, Provider::Ollama);
        assert_eq!(config.llm.api_key_env, None);
        assert_eq!(config.llm.api_version, "2024-05-01-preview");
        assert_eq!(config.pipeline.extensions, vec!["kt"]);
        assert_eq!(config.pipeline.workers, 2);
        assert_eq!(config.pipeline.max_chars, 4000);
        assert_eq!(config.pipeline.exclude.len(), 3);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("azure".parse::<Provider>().unwrap(), Provider::Azure);
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAI);
        assert_eq!(
            "openai-compatible".parse::<Provider>().unwrap(),
            Provider::OpenAICompatible
        );
        assert_eq!("ollama".parse::<Provider>().unwrap(), Provider::Ollama);
        let err = "bard".parse::<Provider>().unwrap_err();
        assert!(err.to_string().contains("Unknown LLM provider"));
    }

    #[test]
    fn test_prompt_style_from_str() {
        assert_eq!(
            "detailed".parse::<PromptStyle>().unwrap(),
            PromptStyle::Detailed
        );
        assert!("verbose".parse::<PromptStyle>().is_err());
    }

    #[test]
    #[serial]
    fn test_api_key_from_env() {
        env::set_var("CODE2DOC_TEST_API_KEY", "test_key_123");
        let mut config = Config::default();
        config.llm.api_key_env = Some("CODE2DOC_TEST_API_KEY".to_string());

        assert_eq!(config.get_api_key().unwrap(), "test_key_123");

        env::remove_var("CODE2DOC_TEST_API_KEY");
    }

    #[test]
    fn test_api_key_missing_fails_for_azure() {
        let mut config = Config::default();
        config.llm.api_key_env = Some("CODE2DOC_NONEXISTENT_KEY_XYZ".to_string());

        let err = config.get_api_key().unwrap_err();
        assert!(err.to_string().contains("API key not found"));
    }

    #[test]
    fn test_api_key_env_unset_fails_for_hosted_provider() {
        let mut config = Config::default();
        config.llm.api_key_env = None;
        assert!(config.get_api_key().is_err());
    }

    #[test]
    fn test_api_key_optional_for_local_providers() {
        let mut config = Config::default();
        config.llm.provider = Provider::Ollama;
        config.llm.api_key_env = Some("CODE2DOC_NONEXISTENT_KEY_OLLAMA".to_string());
        assert_eq!(config.get_api_key().unwrap(), "");

        config.llm.provider = Provider::OpenAICompatible;
        config.llm.api_key_env = None;
        assert_eq!(config.get_api_key().unwrap(), "");
    }

    #[test]
    fn test_api_key_none_literal() {
        let mut config = Config::default();
        config.llm.api_key_env = Some("none".to_string());
        assert_eq!(config.get_api_key().unwrap(), "");
    }

    #[test]
    fn test_resolve_base_url_defaults() {
        let mut llm = LlmConfig {
            provider: Provider::OpenAI,
            ..LlmConfig::default()
        };
        assert_eq!(llm.resolve_base_url().unwrap(), "https://api.openai.com/v1");

        llm.provider = Provider::OpenAICompatible;
        assert_eq!(
            llm.resolve_base_url().unwrap(),
            "http://localhost:11434/v1"
        );

        llm.provider = Provider::Ollama;
        assert_eq!(llm.resolve_base_url().unwrap(), "http://localhost:11434");

        llm.base_url = Some("http://gpu-box:11434/".to_string());
        assert_eq!(llm.resolve_base_url().unwrap(), "http://gpu-box:11434");
    }

    #[test]
    #[serial]
    fn test_resolve_azure_endpoint_from_env() {
        env::set_var(AZURE_ENDPOINT_ENV, "https://example.openai.azure.com/");
        let llm = LlmConfig::default();
        assert_eq!(
            llm.resolve_base_url().unwrap(),
            "https://example.openai.azure.com"
        );

        env::remove_var(AZURE_ENDPOINT_ENV);
        let err = llm.resolve_base_url().unwrap_err();
        assert!(err.to_string().contains(AZURE_ENDPOINT_ENV));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = Config::default();
        config.pipeline.extensions.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pipeline.max_chars = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pipeline.workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_explicit_path_fails() {
        let result = Config::load_with_path(Some("/nonexistent/code2doc.toml".to_string()));
        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}

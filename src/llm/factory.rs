use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use super::client::{LlmClient, MockLlmClient};
use super::client_impl::{AzureOpenAIClient, OllamaClient, OpenAIClient, SamplingParams};
use crate::config::{Config, Provider};

/// Create an LLM client based on configuration.
///
/// Resolves the credential and endpoint up front, so a missing API key fails
/// here instead of once per file.
pub fn create_client(config: &Config, dry_run: bool) -> Result<Arc<dyn LlmClient>> {
    if dry_run {
        info!("Dry run: using mock LLM client");
        return Ok(Arc::new(MockLlmClient::new()));
    }

    let llm = &config.llm;
    let api_key = config.get_api_key()?;
    let base_url = llm.resolve_base_url()?;
    let params = SamplingParams::from(llm);

    info!(
        "Using {} provider (model: {}, endpoint: {})",
        llm.provider, llm.model, base_url
    );

    let client: Arc<dyn LlmClient> = match llm.provider {
        Provider::Azure => Arc::new(AzureOpenAIClient::new(
            api_key,
            base_url,
            llm.model.clone(),
            llm.api_version.clone(),
            params,
            llm.timeout_secs,
        )?),

        Provider::OpenAI | Provider::OpenAICompatible => Arc::new(OpenAIClient::with_base_url(
            api_key,
            llm.model.clone(),
            base_url,
            params,
            llm.timeout_secs,
        )?),

        Provider::Ollama => Arc::new(OllamaClient::new(
            llm.model.clone(),
            base_url,
            params,
            llm.timeout_secs,
        )?),
    };

    Ok(client)
}

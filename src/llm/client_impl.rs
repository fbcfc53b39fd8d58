use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::client::LlmClient;
use crate::config::LlmConfig;
use crate::util::SecretString;

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.0,
            top_p: 1.0,
        }
    }
}

impl From<&LlmConfig> for SamplingParams {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }
}

fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

/// Turn a non-2xx status into an error carrying the response body, otherwise
/// decode the JSON payload.
async fn decode_response<T: DeserializeOwned>(response: Response, service: &str) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        bail!("{} API error {}: {}", service, status, error_text);
    }

    response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} API response", service))
}

fn non_empty(text: String, service: &str) -> Result<String> {
    if text.trim().is_empty() {
        bail!("Empty completion from {}", service);
    }
    Ok(text)
}

// ============================================================================
// Chat-completions wire format (shared by Azure and OpenAI-compatible APIs)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatRequest {
    fn user_prompt(model: Option<String>, prompt: &str, params: SamplingParams) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
        }
    }
}

impl ChatResponse {
    fn into_text(self, service: &str) -> Result<String> {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .with_context(|| format!("No choices in {} response", service))?;
        non_empty(text, service)
    }
}

// ============================================================================
// Azure OpenAI Client
// ============================================================================

pub struct AzureOpenAIClient {
    api_key: SecretString,
    endpoint: String,
    deployment: String,
    api_version: String,
    params: SamplingParams,
    client: Client,
}

impl AzureOpenAIClient {
    pub fn new(
        api_key: String,
        endpoint: String,
        deployment: String,
        api_version: String,
        params: SamplingParams,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            deployment,
            api_version,
            params,
            client: build_http_client(timeout_secs)?,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl LlmClient for AzureOpenAIClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        // The deployment in the URL selects the model; the body carries none.
        let request = ChatRequest::user_prompt(None, prompt, self.params);

        debug!(
            "Calling Azure OpenAI at {} with deployment: {}",
            self.endpoint, self.deployment
        );

        let response = self
            .client
            .post(self.url())
            .header("api-key", self.api_key.expose())
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Azure OpenAI API")?;

        let api_response: ChatResponse = decode_response(response, "Azure OpenAI").await?;
        api_response.into_text("Azure OpenAI")
    }
}

// ============================================================================
// OpenAI Client (also any OpenAI-compatible gateway)
// ============================================================================

pub struct OpenAIClient {
    api_key: SecretString,
    model: String,
    base_url: String,
    params: SamplingParams,
    client: Client,
}

impl OpenAIClient {
    pub fn new(
        api_key: String,
        model: String,
        params: SamplingParams,
        timeout_secs: u64,
    ) -> Result<Self> {
        Self::with_base_url(
            api_key,
            model,
            "https://api.openai.com/v1".to_string(),
            params,
            timeout_secs,
        )
    }

    pub fn with_base_url(
        api_key: String,
        model: String,
        base_url: String,
        params: SamplingParams,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            params,
            client: build_http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest::user_prompt(Some(self.model.clone()), prompt, self.params);

        debug!(
            "Calling OpenAI-compatible API at {} with model: {}",
            self.base_url, self.model
        );

        let url = format!("{}/chat/completions", self.base_url);
        let mut req = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&request);

        // Local gateways often run without auth
        if !self.api_key.is_blank() {
            req = req.header("authorization", format!("Bearer {}", self.api_key.expose()));
        }

        let response = req
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        let api_response: ChatResponse = decode_response(response, "OpenAI").await?;
        api_response.into_text("OpenAI")
    }
}

// ============================================================================
// Ollama Client (native /api/chat)
// ============================================================================

pub struct OllamaClient {
    model: String,
    base_url: String,
    params: SamplingParams,
    client: Client,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: ChatMessage,
}

impl OllamaClient {
    pub fn new(
        model: String,
        base_url: String,
        params: SamplingParams,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            params,
            client: build_http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            options: OllamaOptions {
                temperature: self.params.temperature,
                top_p: self.params.top_p,
                num_predict: self.params.max_tokens,
            },
        };

        debug!(
            "Calling Ollama at {} with model: {}",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        let api_response: OllamaResponse = decode_response(response, "Ollama").await?;
        non_empty(api_response.message.content, "Ollama")
    }
}

// ============================================================================
// Tests
// ============================================================================

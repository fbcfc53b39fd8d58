use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::cache::DocCache;
use super::document::{digest_hex, truncate, TruncationLimits};
use crate::config::PromptStyle;
use crate::llm::client::LlmClient;
use crate::llm::prompts;

/// Produces documentation text for stripped source content, consulting the
/// cache before the model.
pub struct DocGenerator {
    client: Arc<dyn LlmClient>,
    cache: Arc<DocCache>,
    limits: TruncationLimits,
    prompt_style: PromptStyle,
}

impl DocGenerator {
    pub fn new(client: Arc<dyn LlmClient>, cache: Arc<DocCache>) -> Self {
        Self {
            client,
            cache,
            limits: TruncationLimits::default(),
            prompt_style: PromptStyle::default(),
        }
    }

    pub fn with_limits(mut self, limits: TruncationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_prompt_style(mut self, style: PromptStyle) -> Self {
        self.prompt_style = style;
        self
    }

    pub fn cache(&self) -> &Arc<DocCache> {
        &self.cache
    }

    /// Documentation for `content`, which must already have its previous
    /// documentation block stripped. `fence` is the code-fence language used
    /// in the prompt.
    ///
    /// A cache hit makes no network call. A miss sends exactly one request;
    /// failures are returned to the caller without retry.
    pub async fn generate_docs(&self, content: &str, fence: &str) -> Result<String> {
        let snippet = truncate(content, &self.limits);
        let key = digest_hex(&snippet);

        if let Some(doc) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(doc);
        }

        let prompt = prompts::documentation_prompt(self.prompt_style, fence, &snippet);

        let started = Instant::now();
        let reply = self
            .client
            .complete(&prompt)
            .await
            .context("Documentation request failed")?;
        info!(
            "Model response time: {:.2} seconds",
            started.elapsed().as_secs_f64()
        );

        let doc = reply.trim();
        if doc.is_empty() {
            bail!("Model returned empty documentation");
        }

        self.cache.insert(key, doc);
        Ok(doc.to_string())
    }
}

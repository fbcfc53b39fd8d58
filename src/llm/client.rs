use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Offline client for `--dry-run`: answers every prompt with a fixed text.
pub struct MockLlmClient {
    response: String,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::with_response("Documentation placeholder generated by a dry run.")
    }

    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_default_response() {
        let client = MockLlmClient::new();
        let reply = client.complete("anything").await.unwrap();
        assert!(reply.contains("dry run"));
    }

    #[tokio::test]
    async fn test_mock_client_custom_response() {
        let client = MockLlmClient::with_response("Doc A");
        assert_eq!(client.complete("x").await.unwrap(), "Doc A");
    }
}

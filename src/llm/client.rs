use super::error::BackendError;
use super::types::{LLMRequest, LLMResponse};
use async_trait::async_trait;

#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError>;

    fn name(&self) -> &str;

    fn model_info(&self) -> Option<String> {
        None
    }

    /// Prompt in, text out.
    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        Ok(self.chat(LLMRequest::prompt(prompt)).await?.content)
    }
}

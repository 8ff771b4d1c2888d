use anyhow::Result;
use async_trait::async_trait;

/// One-shot chat completion. Implementations own their transport, model
/// selection and timeouts; callers just get text back.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String>;
}

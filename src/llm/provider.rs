//! `LlmProvider` trait — the generative assistant contract.

use async_trait::async_trait;

use crate::error::LlmError;

/// A chat completion backend.
///
/// The assistant bridge only needs single-turn completion: one system
/// instruction, one user message, one textual reply.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// The model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Produce a reply to `user_text` under `system_prompt`.
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, LlmError>;
}

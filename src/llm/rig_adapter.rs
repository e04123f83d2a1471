//! Bridges rig's `CompletionModel` implementations to our `LlmProvider` trait.

use async_trait::async_trait;

use rig::agent::AgentBuilder;
use rig::completion::{CompletionModel, Prompt};

use crate::error::LlmError;

use super::provider::LlmProvider;

/// Adapter wrapping any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, LlmError> {
        let agent = AgentBuilder::new(self.model.clone())
            .preamble(system_prompt)
            .build();

        agent
            .prompt(user_text)
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: self.model_name.clone(),
                reason: e.to_string(),
            })
    }
}

//! Assistant bridge — side-channel chat with the generative assistant.
//!
//! Logically separate from the registration flow: it lazily touches the
//! session store for bookkeeping but never participates in step
//! advancement.

use std::sync::Arc;

use tracing::warn;

use crate::llm::LlmProvider;
use crate::registration::SessionStore;

/// Fixed instruction sent with every assistant request.
pub const ASSISTANT_SYSTEM_PROMPT: &str = "You are a driving school registration assistant.";

/// Relays free-form questions to the LLM provider.
pub struct AssistantBridge {
    llm: Arc<dyn LlmProvider>,
    sessions: Arc<SessionStore>,
}

impl AssistantBridge {
    pub fn new(llm: Arc<dyn LlmProvider>, sessions: Arc<SessionStore>) -> Self {
        Self { llm, sessions }
    }

    /// Forward `text` to the assistant and relay its reply verbatim.
    ///
    /// Ensures a session exists for the user; provider failures degrade to
    /// a user-visible message rather than propagating.
    pub async fn chat_with_bot(&self, user_id: &str, text: &str) -> String {
        self.sessions.ensure(user_id).await;

        match self.llm.complete(ASSISTANT_SYSTEM_PROMPT, text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(user_id, error = %e, "Assistant request failed");
                format!("Sorry, the assistant is unavailable right now: {e}")
            }
        }
    }
}

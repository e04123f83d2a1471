//! Conversation engine — advances sessions through the registration script
//! and finalizes completed records.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::error::StorageError;
use crate::store::StudentStore;

use super::model::Student;
use super::script::RegistrationStep;
use super::session::SessionStore;

/// Coordinates the registration flow: session tracking, prompt sequencing,
/// structured field updates, and exactly-once record finalization.
pub struct Registrar {
    sessions: Arc<SessionStore>,
    students: Arc<dyn StudentStore>,
}

impl Registrar {
    pub fn new(sessions: Arc<SessionStore>, students: Arc<dyn StudentStore>) -> Self {
        Self { sessions, students }
    }

    /// Handle an inbound chat message for `user_id`.
    ///
    /// Emits the prompt for the user's current step and advances the
    /// session. At the terminal step the record is finalized and the
    /// session removed; past it, only the restart fallback is emitted.
    ///
    /// The reply text itself is not recorded — field values arrive solely
    /// through [`Registrar::handle_student_data`].
    pub async fn handle_message(&self, user_id: &str, _text: &str) -> Vec<String> {
        let session = self.sessions.ensure(user_id).await;
        let step = session.step;

        match step {
            RegistrationStep::Closed => vec![step.prompt().to_string()],
            step if step.is_terminal() => {
                if self.sessions.advance(user_id).await.is_none() {
                    warn!(user_id, "Session vanished while advancing");
                }
                let mut out = vec![step.prompt().to_string()];
                out.extend(self.finalize(user_id).await);
                out
            }
            step => {
                if self.sessions.advance(user_id).await.is_none() {
                    warn!(user_id, "Session vanished while advancing");
                }
                vec![step.prompt().to_string()]
            }
        }
    }

    /// Merge structured field data into the session and acknowledge it.
    ///
    /// Without an existing session the data is dropped silently — the
    /// structured channel never creates sessions.
    pub async fn handle_student_data(
        &self,
        user_id: &str,
        data: Map<String, Value>,
    ) -> Vec<String> {
        let echo = Value::Object(data.clone()).to_string();
        if self.sessions.update(user_id, data).await {
            vec![format!("Received your data: {echo}")]
        } else {
            debug!(user_id, "Dropped student_data for unknown session");
            Vec::new()
        }
    }

    /// Build the candidate record from accumulated fields, submit it to
    /// storage, and report the outcome. The session is removed whatever
    /// the outcome.
    async fn finalize(&self, user_id: &str) -> Vec<String> {
        let Some(session) = self.sessions.get(user_id).await else {
            warn!(user_id, "Finalize called without a session");
            return Vec::new();
        };

        let candidate = Student::from_fields(&session.fields);
        let out = match self.students.save_student(&candidate).await {
            Ok(stored) => {
                vec![format!(
                    "Registration successful for {}!",
                    stored.student.first_name
                )]
            }
            Err(StorageError::Validation(message)) => vec![message],
            Err(e) => {
                error!(user_id, error = %e, "Student save failed");
                vec![format!("An error occurred: {e}")]
            }
        };

        self.sessions.remove(user_id).await;
        out
    }
}

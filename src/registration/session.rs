//! Session store — process-wide per-user conversational state.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use super::script::RegistrationStep;

/// One user's in-progress registration: current step plus the partial
/// field values received over the structured-update channel.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub step: RegistrationStep,
    pub fields: Map<String, Value>,
}

/// Shared mapping from user id to session.
///
/// The store is safe for concurrent access across connections; events for a
/// single user are expected to be serialized by the caller (one WebSocket
/// connection handles its events in order).
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Return the session for `user_id`, creating a fresh one on first
    /// contact. Returns a snapshot; the store keeps ownership.
    pub async fn ensure(&self, user_id: &str) -> Session {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!(user_id, "New session created");
                Session::default()
            })
            .clone()
    }

    /// Merge `fields` into the session, overwriting on key collision.
    ///
    /// Returns `false` (and changes nothing) when no session exists —
    /// structured updates never create sessions.
    pub async fn update(&self, user_id: &str, fields: Map<String, Value>) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(user_id) {
            Some(session) => {
                for (key, value) in fields {
                    session.fields.insert(key, value);
                }
                true
            }
            None => false,
        }
    }

    /// Advance the session one step and return the new step.
    ///
    /// Returns `None` if no session exists; callers must `ensure` first, so
    /// a `None` here is a contract violation worth logging. A session
    /// already at the last step stays there.
    pub async fn advance(&self, user_id: &str) -> Option<RegistrationStep> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(user_id)?;
        if let Some(next) = session.step.next() {
            session.step = next;
        }
        Some(session.step)
    }

    /// Delete the session. Removing an absent session is a no-op.
    pub async fn remove(&self, user_id: &str) {
        if self.sessions.write().await.remove(user_id).is_some() {
            debug!(user_id, "Session removed");
        }
    }

    /// Snapshot of the session, if one exists.
    pub async fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions.read().await.get(user_id).cloned()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

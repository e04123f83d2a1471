//! Voice input — transcription bridge into the conversation engine.
//!
//! Audio bytes are written to a scoped temporary file that is released on
//! every exit path, transcribed through the [`Transcriber`] seam, and the
//! resulting text is handled exactly as if the user had typed it.

mod http;

pub use http::HttpTranscriber;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::TranscribeError;
use crate::registration::Registrar;

/// Fixed apology when the audio was received but no speech was recognized.
const UNRECOGNIZED_MESSAGE: &str = "Sorry, I couldn't understand the audio. Please try again.";

/// Speech-to-text seam. The service behind it is a black box that turns an
/// audio file into text or fails.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String, TranscribeError>;
}

/// Feeds transcribed voice messages into the conversation engine.
pub struct VoiceBridge {
    transcriber: Arc<dyn Transcriber>,
    registrar: Arc<Registrar>,
}

impl VoiceBridge {
    pub fn new(transcriber: Arc<dyn Transcriber>, registrar: Arc<Registrar>) -> Self {
        Self {
            transcriber,
            registrar,
        }
    }

    /// Handle an inbound voice message.
    ///
    /// On success the transcript goes through the same path as a typed
    /// message. On any failure the session is untouched and a user-visible
    /// message is returned instead.
    pub async fn handle_voice(&self, user_id: &str, audio: &[u8]) -> Vec<String> {
        let text = match self.transcribe_scoped(audio).await {
            Ok(text) => text,
            Err(TranscribeError::Unrecognized) => {
                return vec![UNRECOGNIZED_MESSAGE.to_string()];
            }
            Err(TranscribeError::Service(reason)) => {
                warn!(user_id, reason, "Transcription service failed");
                return vec![format!("Speech Recognition service error: {reason}")];
            }
            Err(e) => {
                warn!(user_id, error = %e, "Voice message handling failed");
                return vec![format!("An error occurred: {e}")];
            }
        };

        self.registrar.handle_message(user_id, &text).await
    }

    /// Write the audio to a uniquely-named temp file and transcribe it.
    /// The file is deleted when the guard drops, on every exit path.
    async fn transcribe_scoped(&self, audio: &[u8]) -> Result<String, TranscribeError> {
        let mut tmp = tempfile::NamedTempFile::new()?;
        tmp.write_all(audio)?;
        tmp.flush()?;
        self.transcriber.transcribe(tmp.path()).await
    }
}

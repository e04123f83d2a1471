//! HTTP transcription backend.
//!
//! Posts the audio file to an OpenAI-compatible `/audio/transcriptions`
//! endpoint (e.g. a local whisper server) and reads the transcript from the
//! JSON response.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::error::TranscribeError;

use super::Transcriber;

/// Transcription service client.
pub struct HttpTranscriber {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl HttpTranscriber {
    pub fn new(endpoint: String, model: String, api_key: Option<SecretString>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            model,
            api_key,
        }
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, TranscribeError> {
        let bytes = tokio::fs::read(audio).await?;

        let part = Part::bytes(bytes)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| TranscribeError::Service(format!("Invalid audio part: {e}")))?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| TranscribeError::Service(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Service(format!(
                "{status}: {body}"
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| TranscribeError::Service(format!("Invalid response: {e}")))?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(TranscribeError::Unrecognized);
        }

        debug!(chars = text.len(), "Audio transcribed");
        Ok(text)
    }
}

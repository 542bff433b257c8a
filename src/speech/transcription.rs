use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use super::{SpeechError, Transcriber};
use crate::config::SpeechConfig;

/// Whisper-style transcription API client (multipart file upload).
pub struct HttpTranscriber {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl HttpTranscriber {
    pub fn new(cfg: &SpeechConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: cfg.transcription_url.clone(),
            model: cfg.transcription_model.clone(),
            api_key: cfg.transcription_api_key.clone(),
        }
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, waveform: &Path) -> Result<String, SpeechError> {
        let bytes = tokio::fs::read(waveform).await?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", part);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Unavailable {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SpeechError::UnexpectedSchema(e.to_string()))?;

        let text = data
            .get("text")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or_else(|| SpeechError::UnexpectedSchema("missing \"text\" field".to_string()))?;

        debug!("Transcribed {} chars", text.len());
        Ok(text)
    }
}

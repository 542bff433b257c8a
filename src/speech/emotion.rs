use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{EmotionClassifier, SpeechError};
use crate::config::SpeechConfig;

/// Dominant emotion detected in one answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionScore {
    pub label: String,
    /// Classifier confidence in [0, 1]
    pub confidence: f64,
}

/// One entry of the classifier's ranked output.
#[derive(Debug, Deserialize)]
struct RankedClass {
    label: String,
    score: f64,
}

/// HTTP client for a speech emotion classifier that returns its full
/// ranked class list.
pub struct HttpEmotionClassifier {
    client: reqwest::Client,
    url: String,
}

impl HttpEmotionClassifier {
    pub fn new(cfg: &SpeechConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: cfg.emotion_url.clone(),
        }
    }
}

#[async_trait]
impl EmotionClassifier for HttpEmotionClassifier {
    async fn classify(&self, waveform: &Path) -> Result<EmotionScore, SpeechError> {
        let bytes = tokio::fs::read(waveform).await?;

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Unavailable {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let ranked: Vec<RankedClass> = response
            .json()
            .await
            .map_err(|e| SpeechError::UnexpectedSchema(e.to_string()))?;

        // Highest confidence wins; the classifier's own ordering breaks ties
        let mut best: Option<&RankedClass> = None;
        for entry in &ranked {
            if best.map_or(true, |current| entry.score > current.score) {
                best = Some(entry);
            }
        }

        let top = best
            .ok_or_else(|| SpeechError::UnexpectedSchema("empty class list".to_string()))?;

        Ok(EmotionScore {
            label: top.label.clone(),
            confidence: top.score.clamp(0.0, 1.0),
        })
    }
}

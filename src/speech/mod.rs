//! External speech-analysis services
//!
//! Both services consume the canonical mono 16 kHz waveform produced by
//! the audio normalizer. Their failures are typed so the orchestrator can
//! tell an unreachable service from a response it cannot interpret.

mod emotion;
mod transcription;

pub use emotion::{EmotionScore, HttpEmotionClassifier};
pub use transcription::HttpTranscriber;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpeechError {
    /// Service reachable but returned a non-success status
    #[error("service returned {status}: {body}")]
    Unavailable { status: u16, body: String },

    /// Transport-level failure (connect, timeout, TLS)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Success status, but the body is not what this crate expects
    #[error("unexpected response shape: {0}")]
    UnexpectedSchema(String),

    /// Waveform file could not be read
    #[error("could not read waveform: {0}")]
    Io(#[from] std::io::Error),
}

/// Speech-to-text service.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, waveform: &Path) -> Result<String, SpeechError>;
}

/// Speech emotion classifier.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn classify(&self, waveform: &Path) -> Result<EmotionScore, SpeechError>;
}

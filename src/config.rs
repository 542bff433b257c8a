use anyhow::{bail, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub storage: StorageConfig,
    pub speech: SpeechConfig,
    pub llm: LlmConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Transcoder binary; checked at startup, never per request
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root for session documents (one JSON file per session, nested per user)
    pub sessions_path: String,
    /// Root for raw answer uploads
    pub uploads_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub transcription_url: String,
    pub transcription_model: String,
    #[serde(default)]
    pub transcription_api_key: String,
    pub emotion_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Ordered fallback chain; the first model that answers wins
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Concurrent per-answer pipelines during finish
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_workers() -> usize {
    2
}

impl Config {
    /// Load configuration from a TOML file plus COACH_-prefixed environment
    /// overrides. API keys come only from the environment.
    pub fn load(path: &str) -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("COACH").separator("__"));

        if let Ok(key) = env::var("GEMINI_API_KEY") {
            settings = settings.set_override("llm.api_key", key)?;
        }

        if let Ok(key) = env::var("OPENAI_API_KEY") {
            settings = settings.set_override("speech.transcription_api_key", key)?;
        }

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Reject configurations the pipeline cannot run with. Called once at
    /// startup so credential problems never surface per request.
    pub fn validate(&self) -> Result<()> {
        if self.llm.models.is_empty() {
            bail!("llm.models must list at least one model");
        }

        if self.llm.api_key.is_empty() {
            bail!("LLM API key missing (set GEMINI_API_KEY)");
        }

        if self.speech.transcription_api_key.is_empty() {
            bail!("Transcription API key missing (set OPENAI_API_KEY)");
        }

        if self.analysis.workers == 0 {
            bail!("analysis.workers must be at least 1");
        }

        Ok(())
    }
}

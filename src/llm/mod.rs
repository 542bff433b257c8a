//! LLM text-generation adapter
//!
//! The planner and the feedback generator only see the `TextGenerator`
//! trait; the production implementation is a Gemini REST client with a
//! configuration-driven model fallback chain.

mod gemini;
pub mod json;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// 404 from the API: this model name does not exist for this key
    #[error("model {0} not found")]
    ModelNotFound(String),

    /// Any other non-success status
    #[error("model {model} returned {status}: {body}")]
    Upstream {
        model: String,
        status: u16,
        body: String,
    },

    /// Transport-level failure (connect, timeout, TLS)
    #[error("request to {model} failed: {source}")]
    Request {
        model: String,
        #[source]
        source: reqwest::Error,
    },

    /// 200 with no usable text candidate in the body
    #[error("empty completion from {0}")]
    EmptyCompletion(String),

    /// Every model in the fallback chain failed
    #[error("all models in the fallback chain failed; last error: {last}")]
    Exhausted { last: String },
}

/// External text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

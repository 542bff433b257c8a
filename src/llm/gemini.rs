use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use super::{LlmError, TextGenerator};
use crate::config::LlmConfig;

/// Gemini `generateContent` REST client.
///
/// Holds an ordered list of model names; `generate` walks the list and the
/// first model that answers wins. A missing model (404) or any other
/// per-model failure just advances the chain.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    models: Vec<String>,
}

impl GeminiClient {
    pub fn new(cfg: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            models: cfg.models.clone(),
        }
    }

    async fn generate_with(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        // AI Studio keys are passed as a query parameter, not a bearer token
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| LlmError::Request {
                model: model.to_string(),
                source,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotFound(model.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream {
                model: model.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let data: serde_json::Value =
            response.json().await.map_err(|source| LlmError::Request {
                model: model.to_string(),
                source,
            })?;

        data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| LlmError::EmptyCompletion(model.to_string()))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let mut last: Option<LlmError> = None;

        for model in &self.models {
            debug!("Trying model {}", model);
            match self.generate_with(model, prompt).await {
                Ok(text) => {
                    debug!("Model {} answered ({} chars)", model, text.len());
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Model {} failed, trying next: {}", model, e);
                    last = Some(e);
                }
            }
        }

        Err(LlmError::Exhausted {
            last: last
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no models configured".to_string()),
        })
    }
}

//! OpenAI-compatible chat completions provider.
//!
//! Works against any endpoint speaking the `/v1/chat/completions` dialect
//! (hosted OpenAI, a local vLLM/llama.cpp gateway serving a medical model,
//! etc.). Transport failures map onto the `ModelError` taxonomy; the repair
//! loop never sees HTTP details.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::ModelClient;
use crate::errors::ModelError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiClient {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub temperature: f32,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(model: String, api_key: String) -> Self {
        Self::with_base_url(model, api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(model: String, api_key: String, base_url: String) -> Self {
        Self {
            model,
            api_key,
            base_url,
            // Deterministic decoding: the contract, not sampling variety,
            // is what we are after.
            temperature: 0.0,
            client: reqwest::Client::new(),
        }
    }

    fn map_transport_error(e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            // The reqwest-level timeout is a transport detail; the repair
            // loop applies its own deadline via tokio. Keep the tag anyway.
            ModelError::Timeout { timeout_secs: 0 }
        } else {
            ModelError::Unavailable(e.to_string())
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
            "max_tokens": max_tokens,
        });

        debug!(model = %self.model, prompt_len = prompt.len(), "chat completion request");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            // 4xx means the backend rejected this request (content policy,
            // bad model id, auth); 5xx means it could not serve it at all.
            return if status.is_client_error() {
                Err(ModelError::Refused(format!("status {status}: {detail}")))
            } else {
                Err(ModelError::Unavailable(format!("status {status}: {detail}")))
            };
        }

        let payload: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ModelError::Unavailable(format!("invalid response body: {e}")))?;

        let text = payload
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ModelError::Refused("response carried no message content".to_string())
            })?;

        Ok(text.to_string())
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

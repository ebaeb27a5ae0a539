//! OpenAI-compatible chat completions over HTTP.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Provider for OpenAI and OpenAI-compatible endpoints.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a non-default (OpenAI-compatible) endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_failed(&self, reason: impl Into<String>) -> LlmError {
        LlmError::RequestFailed {
            provider: "openai".to_string(),
            reason: reason.into(),
        }
    }

    fn invalid_response(&self, reason: impl Into<String>) -> LlmError {
        LlmError::InvalidResponse {
            provider: "openai".to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| serde_json::json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(t) = request.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        if let Some(n) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(n);
        }

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_failed(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::AuthFailed {
                provider: "openai".to_string(),
            });
        }
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(self.request_failed(format!("status {status}: {detail}")));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| self.invalid_response(e.to_string()))?;

        let content = data
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| self.invalid_response("missing choices[0].message.content"))?
            .to_string();

        let input_tokens = data
            .pointer("/usage/prompt_tokens")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32;
        let output_tokens = data
            .pointer("/usage/completion_tokens")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32;

        Ok(CompletionResponse {
            content,
            input_tokens,
            output_tokens,
        })
    }
}

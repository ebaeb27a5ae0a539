//! Anthropic Messages API over HTTP.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider, Role};

const BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// The Messages API requires max_tokens; used when the request leaves it unset.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Provider for the Anthropic Messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            model: model.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_failed(&self, reason: impl Into<String>) -> LlmError {
        LlmError::RequestFailed {
            provider: "anthropic".to_string(),
            reason: reason.into(),
        }
    }

    fn invalid_response(&self, reason: impl Into<String>) -> LlmError {
        LlmError::InvalidResponse {
            provider: "anthropic".to_string(),
            reason: reason.into(),
        }
    }
}

/// Split a request into the Messages API shape: system text is a top-level
/// field, everything else stays in the messages array.
fn split_system(request: &CompletionRequest) -> (String, Vec<serde_json::Value>) {
    let mut system_parts = Vec::new();
    let mut messages = Vec::new();

    for m in &request.messages {
        match m.role {
            Role::System => system_parts.push(m.content.clone()),
            _ => messages.push(serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })),
        }
    }

    (system_parts.join("\n\n"), messages)
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (system, messages) = split_system(&request);

        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": messages,
        });
        if !system.is_empty() {
            body["system"] = serde_json::json!(system);
        }
        if let Some(t) = request.temperature {
            body["temperature"] = serde_json::json!(t);
        }

        let resp = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_failed(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::AuthFailed {
                provider: "anthropic".to_string(),
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
            .get("content")
            .and_then(|c| c.get(0))
            .and_then(|b| b.get("text"))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| self.invalid_response("missing content[0].text"))?
            .to_string();

        let input_tokens = data
            .pointer("/usage/input_tokens")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32;
        let output_tokens = data
            .pointer("/usage/output_tokens")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32;

        Ok(CompletionResponse {
            content,
            input_tokens,
            output_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ChatMessage;

    #[test]
    fn split_system_extracts_system_text() {
        let req = CompletionRequest::new(vec![
            ChatMessage::system("You write replies."),
            ChatMessage::user("Draft one."),
        ]);
        let (system, messages) = split_system(&req);
        assert_eq!(system, "You write replies.");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[test]
    fn split_system_joins_multiple_system_messages() {
        let req = CompletionRequest::new(vec![
            ChatMessage::system("First."),
            ChatMessage::system("Second."),
            ChatMessage::user("Go."),
        ]);
        let (system, _) = split_system(&req);
        assert_eq!(system, "First.\n\nSecond.");
    }

    #[tokio::test]
    async fn complete_against_dead_endpoint_is_request_failed() {
        let p = AnthropicProvider::new(
            reqwest::Client::new(),
            SecretString::from("sk-ant-test"),
            "claude-sonnet-4-20250514",
        )
        .with_base_url("http://127.0.0.1:9/v1");

        let err = p
            .complete(CompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RequestFailed { .. }));
    }
}

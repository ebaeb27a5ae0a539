//! Provider-agnostic completion types and the `LlmProvider` trait.

use async_trait::async_trait;

use crate::error::LlmError;

/// Message role in a chat completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-compatible APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A completion response.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The model's text output, verbatim.
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Abstraction over LLM backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Name of the configured model, for logging.
    fn model_name(&self) -> &str;

    /// Run a single completion request.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("a").role, Role::System);
        assert_eq!(ChatMessage::user("b").role, Role::User);
        assert_eq!(ChatMessage::assistant("c").role, Role::Assistant);
    }

    #[test]
    fn completion_request_builder() {
        let req = CompletionRequest::new(vec![ChatMessage::user("hi")])
            .with_temperature(0.2)
            .with_max_tokens(128);
        assert_eq!(req.temperature, Some(0.2));
        assert_eq!(req.max_tokens, Some(128));
        assert_eq!(req.messages.len(), 1);
    }

    #[test]
    fn role_wire_names() {
        assert_eq!(Role::System.as_str(), "system");
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }
}

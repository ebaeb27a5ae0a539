//! Reply composer — builds the reply prompt and runs one completion.
//!
//! This is the critical path: a composition failure means no reply exists,
//! so errors propagate to the caller instead of degrading.

use std::sync::Arc;

use tracing::debug;

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::types::InboundEmail;

/// Visible separator between retrieved memory snippets in the prompt.
pub const MEMORY_DELIMITER: &str = "\n---\n";

const SYSTEM_PROMPT: &str = "You write email replies on behalf of the user. \
Be concise and professional: 3 to 6 sentences, plain text, no markdown. \
Sign off simply, without placeholder names or bracketed fields. \
If notes from past correspondence are provided, use them naturally, and \
never mention that any notes, memory, or retrieval were used.";

/// Configuration for reply generation.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            max_tokens: 400,
        }
    }
}

/// Generates reply drafts from an email, retrieved memory, and an optional
/// decision instruction.
pub struct ReplyComposer {
    llm: Arc<dyn LlmProvider>,
    config: ComposerConfig,
}

impl ReplyComposer {
    pub fn new(llm: Arc<dyn LlmProvider>, config: ComposerConfig) -> Self {
        Self { llm, config }
    }

    /// Compose a reply. Exactly one completion call per invocation; the
    /// model's text is returned verbatim.
    pub async fn compose(
        &self,
        email: &InboundEmail,
        memory_snippets: &[String],
        decision: Option<&str>,
    ) -> Result<String, LlmError> {
        let user_prompt = build_user_prompt(email, memory_snippets, decision);

        debug!(
            sender = email.sender(),
            snippets = memory_snippets.len(),
            has_decision = decision.is_some(),
            "Composing reply"
        );

        let request = CompletionRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(user_prompt),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let response = self.llm.complete(request).await?;
        Ok(response.content)
    }
}

/// Build the user instruction block.
fn build_user_prompt(
    email: &InboundEmail,
    memory_snippets: &[String],
    decision: Option<&str>,
) -> String {
    let memory_block = if memory_snippets.is_empty() {
        String::new()
    } else {
        memory_snippets.join(MEMORY_DELIMITER)
    };

    let mut prompt = format!(
        "Write a reply to this email.\n\n\
         From: {from}\n\
         Subject: {subject}\n\n\
         {body}\n\n\
         Notes from past correspondence with this sender:\n{memory}",
        from = email.from_email,
        subject = email.subject,
        body = email.body_text,
        memory = memory_block,
    );

    if let Some(instruction) = decision {
        prompt.push_str("\n\nInstruction: ");
        prompt.push_str(instruction);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> InboundEmail {
        InboundEmail {
            from_email: "bob@x.com".to_string(),
            subject: "Sync".to_string(),
            body_text: "Are you free Tuesday?".to_string(),
            proposed_time: None,
            message_id: None,
        }
    }

    #[test]
    fn prompt_embeds_email_fields() {
        let prompt = build_user_prompt(&email(), &[], None);
        assert!(prompt.contains("From: bob@x.com"));
        assert!(prompt.contains("Subject: Sync"));
        assert!(prompt.contains("Are you free Tuesday?"));
    }

    #[test]
    fn prompt_joins_memory_with_delimiter() {
        let snippets = vec!["first note".to_string(), "second note".to_string()];
        let prompt = build_user_prompt(&email(), &snippets, None);
        assert!(prompt.contains("first note\n---\nsecond note"));
    }

    #[test]
    fn prompt_memory_block_empty_when_no_snippets() {
        let prompt = build_user_prompt(&email(), &[], None);
        assert!(prompt.ends_with("Notes from past correspondence with this sender:\n"));
    }

    #[test]
    fn prompt_appends_decision_instruction() {
        let prompt = build_user_prompt(&email(), &[], Some("Accept the meeting."));
        assert!(prompt.ends_with("Instruction: Accept the meeting."));
    }

    #[test]
    fn prompt_omits_instruction_line_without_decision() {
        let prompt = build_user_prompt(&email(), &[], None);
        assert!(!prompt.contains("Instruction:"));
    }
}

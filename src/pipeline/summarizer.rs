//! Summary writer — background memory write-back.
//!
//! Runs strictly off the critical path: scheduled after the reply is
//! already determined, never awaited by the caller, and every failure is
//! absorbed. Failures are logged and counted so an operator can notice a
//! dead memory store without the reply flow ever feeling it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::error::{Error, PipelineError};
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::memory::MemoryGateway;
use crate::pipeline::types::InboundEmail;

const SUMMARY_SYSTEM_PROMPT: &str = "You maintain short notes about email \
correspondents. Summarize the email in 1-2 plain sentences: who wrote, what \
they want, and any stated times or preferences. No preamble.";

/// Temperature for summarization (factual, low variance).
const SUMMARY_TEMPERATURE: f32 = 0.2;

/// Max tokens for a 1-2 sentence summary.
const SUMMARY_MAX_TOKENS: u32 = 120;

/// Condenses emails into memory records via the gateway.
pub struct SummaryWriter {
    llm: Arc<dyn LlmProvider>,
    gateway: Arc<MemoryGateway>,
    failures: AtomicU64,
}

impl SummaryWriter {
    pub fn new(llm: Arc<dyn LlmProvider>, gateway: Arc<MemoryGateway>) -> Self {
        Self {
            llm,
            gateway,
            failures: AtomicU64::new(0),
        }
    }

    /// Schedule a write-back for this email and return immediately.
    ///
    /// The spawned task owns its failure handling; nothing propagates to
    /// the caller and nothing is retried.
    pub fn spawn_write_back(self: Arc<Self>, email: InboundEmail) {
        let writer = self;
        tokio::spawn(async move {
            if let Err(e) = writer.write_back(&email).await {
                writer.failures.fetch_add(1, Ordering::Relaxed);
                warn!(sender = email.sender(), error = %e, "Memory write-back failed");
            }
        });
    }

    /// Summarize one email and commit the record.
    ///
    /// Public so tests can await the write-back deterministically; the
    /// engine only ever goes through `spawn_write_back`.
    pub async fn write_back(&self, email: &InboundEmail) -> Result<(), Error> {
        let user_prompt = format!(
            "From: {from}\nSubject: {subject}\n\n{body}",
            from = email.from_email,
            subject = email.subject,
            body = email.body_text,
        );

        let request = CompletionRequest::new(vec![
            ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
            ChatMessage::user(user_prompt),
        ])
        .with_temperature(SUMMARY_TEMPERATURE)
        .with_max_tokens(SUMMARY_MAX_TOKENS);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(PipelineError::Compose)?;

        let summary = response.content.trim().to_string();

        self.gateway
            .commit(email.sender(), &email.subject, &summary)
            .await
            .map_err(PipelineError::WriteBack)?;

        debug!(sender = email.sender(), "Memory write-back committed");
        Ok(())
    }

    /// Number of write-backs that have failed since startup.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

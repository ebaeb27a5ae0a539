//! Memory gateway — per-sender retrieval and append-only commits.
//!
//! Partitions the vector store into one namespace per email sender.
//! Retrieval is best-effort: any failure degrades to "no memory context"
//! and never reaches the reply path. Commits are append-only; nothing in
//! the engine ever mutates an existing record.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::MemoryError;
use crate::memory::index::VectorMemory;

/// Namespace used when the sender address is missing or blank.
pub const UNKNOWN_NAMESPACE: &str = "unknown";

/// Derive the memory namespace for a sender address.
///
/// Pure: lower-cased, trimmed; absent or empty senders collapse into the
/// sentinel namespace.
pub fn derive_namespace(sender: Option<&str>) -> String {
    match sender {
        Some(s) if !s.trim().is_empty() => s.trim().to_lowercase(),
        _ => UNKNOWN_NAMESPACE.to_string(),
    }
}

/// Gateway over the external vector memory store.
pub struct MemoryGateway {
    store: Arc<dyn VectorMemory>,
    top_k: usize,
}

impl MemoryGateway {
    pub fn new(store: Arc<dyn VectorMemory>, top_k: usize) -> Self {
        Self { store, top_k }
    }

    /// Retrieve up to `top_k` memory snippets for a sender, nearest first.
    ///
    /// Never fails: embedding errors, store outages, and malformed
    /// responses all degrade to an empty result. The fallible body lives in
    /// `try_retrieve` so the recovery point is a single visible match.
    pub async fn retrieve(&self, email_text: &str, sender: &str) -> Vec<String> {
        match self.try_retrieve(email_text, sender).await {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!(sender = sender, error = %e, "Memory retrieval failed; continuing without context");
                Vec::new()
            }
        }
    }

    async fn try_retrieve(
        &self,
        email_text: &str,
        sender: &str,
    ) -> Result<Vec<String>, MemoryError> {
        let namespace = derive_namespace(Some(sender));
        let vector = self.store.embed(email_text).await?;
        let matches = self.store.query(&namespace, &vector, self.top_k).await?;

        let snippets: Vec<String> = matches
            .iter()
            .filter_map(|m| snippet_from(&m.metadata))
            .collect();

        debug!(
            namespace = %namespace,
            matched = matches.len(),
            usable = snippets.len(),
            "Memory retrieval"
        );

        Ok(snippets)
    }

    /// Append one summary record to the sender's namespace.
    ///
    /// The caller (summary writer) treats failure as fire-and-forget; the
    /// record either lands whole or not at all — upsert is a single call.
    pub async fn commit(
        &self,
        sender: &str,
        subject: &str,
        summary_text: &str,
    ) -> Result<(), MemoryError> {
        let namespace = derive_namespace(Some(sender));
        let vector = self.store.embed(summary_text).await?;

        let id = format!("{namespace}-{}", Uuid::new_v4());
        let metadata = serde_json::json!({
            "summary": summary_text,
            "sender": sender,
            "subject": subject,
            "created_at": Utc::now().to_rfc3339(),
        });

        self.store.upsert(&namespace, &id, &vector, metadata).await?;

        debug!(namespace = %namespace, id = %id, "Memory record committed");
        Ok(())
    }
}

/// Pull the display snippet out of a record's metadata.
///
/// Prefers the `summary` field, falls back to a generic `text` field,
/// and drops records where both are missing or empty.
fn snippet_from(metadata: &serde_json::Value) -> Option<String> {
    let text = metadata
        .get("summary")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            metadata
                .get("text")
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.trim().is_empty())
        })?;
    Some(text.to_string())
}

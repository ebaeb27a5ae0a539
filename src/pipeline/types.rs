//! Shared types for the reply pipeline.

use serde::{Deserialize, Serialize};

/// Sender value used when the webhook omits or blanks the address.
pub const UNKNOWN_SENDER: &str = "unknown";

/// An inbound email as delivered by the intake webhook.
///
/// Every field is optional on the wire; missing sender/subject/body are
/// filled with defaults rather than rejected. Identity, when present, is
/// the originating `message_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEmail {
    #[serde(default)]
    pub from_email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body_text: String,
    #[serde(default)]
    pub proposed_time: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

impl InboundEmail {
    /// Apply the webhook defaulting rules: blank sender collapses to
    /// `"unknown"`, a blank proposed time counts as absent.
    pub fn normalized(mut self) -> Self {
        let sender = self.from_email.trim();
        self.from_email = if sender.is_empty() {
            UNKNOWN_SENDER.to_string()
        } else {
            sender.to_string()
        };

        self.proposed_time = self
            .proposed_time
            .take()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        self
    }

    /// Sender address (post-normalization this is never blank).
    pub fn sender(&self) -> &str {
        &self.from_email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_all_fields_missing() {
        let email: InboundEmail = serde_json::from_str("{}").unwrap();
        let email = email.normalized();
        assert_eq!(email.from_email, "unknown");
        assert_eq!(email.subject, "");
        assert_eq!(email.body_text, "");
        assert!(email.proposed_time.is_none());
        assert!(email.message_id.is_none());
    }

    #[test]
    fn normalized_trims_sender() {
        let email: InboundEmail =
            serde_json::from_str(r#"{"from_email": "  Bob@X.com  "}"#).unwrap();
        assert_eq!(email.normalized().from_email, "Bob@X.com");
    }

    #[test]
    fn blank_proposed_time_counts_as_absent() {
        let email: InboundEmail =
            serde_json::from_str(r#"{"proposed_time": "   "}"#).unwrap();
        assert!(email.normalized().proposed_time.is_none());
    }

    #[test]
    fn full_payload_round_trips() {
        let json = r#"{
            "from_email": "bob@x.com",
            "subject": "Sync",
            "body_text": "Are you free Tuesday?",
            "proposed_time": "Tuesday 3pm",
            "message_id": "<abc@x.com>"
        }"#;
        let email: InboundEmail = serde_json::from_str(json).unwrap();
        let email = email.normalized();
        assert_eq!(email.sender(), "bob@x.com");
        assert_eq!(email.proposed_time.as_deref(), Some("Tuesday 3pm"));
        assert_eq!(email.message_id.as_deref(), Some("<abc@x.com>"));
    }
}

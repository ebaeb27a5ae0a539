//! Outbound send collaborator — hands the approved reply to the webhook
//! that performs the actual email delivery.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// The outbound reply payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_message_id: Option<String>,
}

/// Dispatches the final reply downstream. Best-effort: the reply has
/// already been shown to the operator when this runs.
#[async_trait]
pub trait OutboundSender: Send + Sync {
    async fn dispatch(&self, email: &OutboundEmail) -> Result<(), ChannelError>;
}

/// Sends the reply to a configured webhook as JSON.
pub struct WebhookSender {
    url: String,
    client: reqwest::Client,
}

impl WebhookSender {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl OutboundSender for WebhookSender {
    async fn dispatch(&self, email: &OutboundEmail) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(&self.url)
            .json(email)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "send-webhook".into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "send-webhook".into(),
                reason: format!("status {status}: {detail}"),
            });
        }

        tracing::info!(to = %email.to, subject = %email.subject, "Outbound reply dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_email_serializes_without_null_message_id() {
        let email = OutboundEmail {
            to: "bob@x.com".to_string(),
            subject: "Re: Sync".to_string(),
            body: "Tuesday works.".to_string(),
            original_message_id: None,
        };
        let json = serde_json::to_string(&email).unwrap();
        assert!(!json.contains("original_message_id"));
    }

    #[test]
    fn outbound_email_round_trips_with_message_id() {
        let email = OutboundEmail {
            to: "bob@x.com".to_string(),
            subject: "Re: Sync".to_string(),
            body: "Tuesday works.".to_string(),
            original_message_id: Some("<abc@x.com>".to_string()),
        };
        let json = serde_json::to_string(&email).unwrap();
        let parsed: OutboundEmail = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.original_message_id.as_deref(), Some("<abc@x.com>"));
    }

    #[tokio::test]
    async fn dispatch_against_dead_endpoint_is_send_failed() {
        let sender = WebhookSender::new("http://127.0.0.1:9/send", reqwest::Client::new());
        let email = OutboundEmail {
            to: "bob@x.com".to_string(),
            subject: "Re: Sync".to_string(),
            body: "Tuesday works.".to_string(),
            original_message_id: None,
        };
        assert!(matches!(
            sender.dispatch(&email).await,
            Err(ChannelError::SendFailed { .. })
        ));
    }
}

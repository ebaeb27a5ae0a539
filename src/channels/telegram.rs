//! Telegram notifier — delivers operator prompts via the Bot API.
//!
//! Send-only: inbound operator messages arrive through the webhook route,
//! so there is no polling loop here.

use async_trait::async_trait;

use crate::channels::Notifier;
use crate::error::ChannelError;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Operator notification channel over the Telegram Bot API.
pub struct TelegramNotifier {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, client: reqwest::Client) -> Self {
        Self { bot_token, client }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    /// Send a text message, trying Markdown first with plain text fallback.
    /// Splits long messages that exceed Telegram's 4096 char limit.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);

        for chunk in &chunks {
            self.send_message_chunk(chat_id, chunk).await?;
        }
        Ok(())
    }

    /// Send a single message chunk (≤4096 chars), Markdown-first with fallback.
    async fn send_message_chunk(&self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        let markdown_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown"
        });

        let markdown_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&markdown_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if markdown_resp.status().is_success() {
            return Ok(());
        }

        let markdown_status = markdown_resp.status();
        tracing::warn!(
            status = ?markdown_status,
            "Telegram sendMessage with Markdown failed; retrying without parse_mode"
        );

        // Retry without parse_mode
        let plain_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        let plain_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&plain_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !plain_resp.status().is_success() {
            let plain_err = plain_resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!(
                    "sendMessage failed (markdown: {}, plain: {})",
                    markdown_status, plain_err
                ),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, conversation_id: &str, text: &str) -> Result<(), ChannelError> {
        self.send_message(conversation_id, text).await
    }
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        // Find a good split point
        let chunk = &remaining[..max_len];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(max_len);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { max_len } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

//! Delivery channels: operator notifications and outbound email dispatch.

pub mod outbound;
pub mod telegram;

pub use outbound::{OutboundEmail, OutboundSender, WebhookSender};
pub use telegram::TelegramNotifier;

use async_trait::async_trait;

use crate::error::ChannelError;

/// Sends chat messages to the human operator.
///
/// Best-effort: callers may log a failure and continue — an undelivered
/// prompt never aborts session handling.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, conversation_id: &str, text: &str) -> Result<(), ChannelError>;
}

//! Session store — process-wide map of in-flight decision dialogues.
//!
//! One session per conversation identifier, created when a qualifying
//! email arrives and removed when the dialogue reaches a terminal state.
//! All mutation goes through this store so concurrent webhook deliveries
//! for the same conversation observe read-your-writes ordering.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::pipeline::types::InboundEmail;

/// Where a decision dialogue currently stands.
///
/// There is no terminal variant: finalization removes the session, and
/// absence is the terminal signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the operator's first yes/no on availability.
    AwaitingAvailability,
    /// Operator is available but the email proposed no time; waiting for one.
    AwaitingTime,
    /// Operator is unavailable; waiting for yes/no on proposing a new time.
    AwaitingRescheduleConfirm,
    /// Operator wants to reschedule; waiting for the new time.
    AwaitingRescheduleTime,
}

/// One in-flight decision dialogue.
#[derive(Debug, Clone)]
pub struct Session {
    pub email: InboundEmail,
    pub state: SessionState,
}

impl Session {
    pub fn new(email: InboundEmail) -> Self {
        Self {
            email,
            state: SessionState::AwaitingAvailability,
        }
    }
}

/// Conversation identifier → session. The single owner of session lifetime.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session, replacing any existing one for that conversation
    /// (last-write-wins). Returns the replaced session, if any.
    pub async fn put(&self, conversation_id: &str, session: Session) -> Option<Session> {
        self.inner
            .write()
            .await
            .insert(conversation_id.to_string(), session)
    }

    /// Snapshot of the session for a conversation, if one is active.
    pub async fn get(&self, conversation_id: &str) -> Option<Session> {
        self.inner.read().await.get(conversation_id).cloned()
    }

    /// Advance the state of an active session. Returns false if the
    /// session disappeared in the meantime.
    pub async fn set_state(&self, conversation_id: &str, state: SessionState) -> bool {
        match self.inner.write().await.get_mut(conversation_id) {
            Some(session) => {
                session.state = state;
                true
            }
            None => false,
        }
    }

    /// Remove and return the session for a conversation.
    pub async fn remove(&self, conversation_id: &str) -> Option<Session> {
        self.inner.write().await.remove(conversation_id)
    }

    /// Number of active sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

//! HTTP surface — intake webhooks and the stateless draft endpoint.
//!
//! Transport only: handlers parse the wire payloads, hand everything to
//! the dialogue engine, and shape the responses.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

use crate::pipeline::InboundEmail;
use crate::session::DialogueEngine;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DialogueEngine>,
    /// Conversation the single operator is reached on.
    pub operator_chat_id: String,
}

/// Build the Axum router.
pub fn app_routes(engine: Arc<DialogueEngine>, operator_chat_id: String) -> Router {
    let state = AppState {
        engine,
        operator_chat_id,
    };

    Router::new()
        .route("/health", get(health))
        .route("/webhook/email", post(inbound_email))
        .route("/webhook/telegram", post(telegram_update))
        .route("/api/triage", post(triage_preview))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "triage-assist"
    }))
}

// ── Inbound email ───────────────────────────────────────────────────

/// A qualifying meeting email arrived; open (or overwrite) the session
/// and prompt the operator.
async fn inbound_email(
    State(state): State<AppState>,
    Json(email): Json<InboundEmail>,
) -> impl IntoResponse {
    info!(sender = %email.from_email, subject = %email.subject, "Inbound email event");

    match state
        .engine
        .open_session(&state.operator_chat_id, email)
        .await
    {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({"status": "accepted"})),
        ),
        Err(e) => {
            error!(error = %e, "Failed to open session");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": e.to_string()})),
            )
        }
    }
}

// ── Telegram updates ────────────────────────────────────────────────

/// Operator chat message. Non-text updates are acknowledged and dropped.
async fn telegram_update(
    State(state): State<AppState>,
    Json(update): Json<serde_json::Value>,
) -> impl IntoResponse {
    let Some((chat_id, text)) = extract_chat_event(&update) else {
        debug!("Ignoring Telegram update without chat text");
        return Json(serde_json::json!({"ok": true}));
    };

    if let Err(e) = state.engine.handle_chat_message(&chat_id, &text).await {
        // Surfaced here, not to Telegram: a non-2xx would make the Bot API
        // redeliver the same message.
        error!(chat_id = %chat_id, error = %e, "Chat message handling failed");
    }

    Json(serde_json::json!({"ok": true}))
}

/// Pull `(chat_id, text)` out of a Telegram update payload.
fn extract_chat_event(update: &serde_json::Value) -> Option<(String, String)> {
    let message = update.get("message")?;
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_i64)?
        .to_string();
    let text = message
        .get("text")
        .and_then(serde_json::Value::as_str)?
        .to_string();
    Some((chat_id, text))
}

// ── Stateless draft preview ─────────────────────────────────────────

/// Draft a reply immediately, without a session or a decision. Memory
/// retrieval still applies.
async fn triage_preview(
    State(state): State<AppState>,
    Json(email): Json<InboundEmail>,
) -> impl IntoResponse {
    match state.engine.preview_reply(email).await {
        Ok(reply_text) => (
            StatusCode::OK,
            Json(serde_json::json!({"reply_text": reply_text})),
        ),
        Err(e) => {
            error!(error = %e, "Draft preview failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({"error": e.to_string()})),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_chat_event_happy_path() {
        let update = serde_json::json!({
            "update_id": 42,
            "message": {
                "chat": {"id": 99887766},
                "text": "yes",
                "from": {"username": "operator"}
            }
        });
        let (chat_id, text) = extract_chat_event(&update).unwrap();
        assert_eq!(chat_id, "99887766");
        assert_eq!(text, "yes");
    }

    #[test]
    fn extract_chat_event_ignores_non_text_updates() {
        let update = serde_json::json!({
            "update_id": 43,
            "message": {"chat": {"id": 1}, "photo": []}
        });
        assert!(extract_chat_event(&update).is_none());
    }

    #[test]
    fn extract_chat_event_ignores_missing_message() {
        let update = serde_json::json!({"update_id": 44});
        assert!(extract_chat_event(&update).is_none());
    }
}

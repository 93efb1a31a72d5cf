//! REST endpoints for direct messages between two users.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::middleware::CurrentUser;
use crate::notify::{self, KIND_MESSAGE};
use crate::state::AppState;
use crate::storage::models::DirectMessage;

const MAX_CONTENT_LENGTH: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// POST /api/messages/{user_id} — Send a direct message.
/// The recipient is notified as a final side effect.
pub async fn send_message(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(receiver_id): Path<i64>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<DirectMessage>), StatusCode> {
    let content = body.content.trim().to_string();
    if content.is_empty() || receiver_id == current.id {
        return Err(StatusCode::BAD_REQUEST);
    }
    if content.len() > MAX_CONTENT_LENGTH {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }

    let sender = state
        .store
        .user(current.id)
        .await
        .map_err(|e| e.status())?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let message = state
        .store
        .create_message(current.id, receiver_id, content)
        .await
        .map_err(|e| e.status())?;

    let text = format!("{} vous a envoyé un message", sender.username);
    notify::notify(&state, receiver_id, KIND_MESSAGE, &text, message.id).await;

    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/messages/{user_id} — Conversation with a peer, oldest-first.
/// Fetching marks the peer's messages to the caller as read.
pub async fn get_conversation(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(peer_id): Path<i64>,
) -> Result<Json<Vec<DirectMessage>>, StatusCode> {
    let messages = state
        .store
        .conversation(current.id, peer_id)
        .await
        .map_err(|e| e.status())?;

    state
        .store
        .mark_messages_read(current.id, peer_id)
        .await
        .map_err(|e| e.status())?;

    Ok(Json(messages))
}

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use serde::Deserialize;

use crate::auth::session::resolve_session;
use crate::state::AppState;
use crate::ws::{actor, CLOSE_UNAUTHORIZED};

/// Query parameters for the WebSocket upgrade. The session token travels
/// as a query param because browsers cannot set headers on WS connects.
#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: Option<String>,
}

/// GET /ws?token=<session token>
/// Real-time channel endpoint. On auth failure the upgrade still completes
/// and the server immediately closes with a not-authorized code, so the
/// client can read the close frame instead of a bare handshake error.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id = params
        .token
        .as_deref()
        .and_then(|token| resolve_session(&state.sessions, token));

    match user_id {
        Some(user_id) => {
            tracing::info!(user_id, "websocket connection authenticated");
            ws.on_upgrade(move |socket| actor::run_connection(socket, state, user_id))
        }
        None => {
            tracing::warn!("websocket upgrade without resolvable session");
            ws.on_upgrade(close_unauthorized)
        }
    }
}

async fn close_unauthorized(mut socket: WebSocket) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: CLOSE_UNAUTHORIZED,
            reason: "not authorized".into(),
        })))
        .await;
}

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use crate::state::AppState;
use crate::ws;

/// Server sends a WebSocket ping at this interval to detect dead peers.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// If no pong arrives within this window after a ping, the connection is
/// considered dead and closed.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Actor for one authenticated connection.
///
/// The socket is split: a writer task owns the sink and forwards whatever
/// arrives on the mpsc channel (the dispatcher pushes notifications through
/// that channel); the reader loop here handles control frames and
/// disconnects. The channel is how the registry hands this client to the
/// rest of the system.
pub async fn run_connection(socket: WebSocket, state: AppState, user_id: i64) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    ws::register(&state.connections, user_id, tx.clone());
    tracing::info!(user_id, "websocket actor started");

    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Keepalive: ping on a timer, expect a pong before the timeout.
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();
    let ping_tx = tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_timer = interval(PING_INTERVAL);
        // Skip the immediate first tick.
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            if ping_tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
                // Writer task is gone, so is the connection.
                break;
            }

            match timeout(PONG_TIMEOUT, pong_rx.recv()).await {
                Ok(Some(())) => {}
                _ => {
                    tracing::warn!("pong timeout, closing connection");
                    let _ = ping_tx.send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "pong timeout".into(),
                    })));
                    break;
                }
            }
        }
    });

    loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) => match msg {
                Message::Pong(_) => {
                    let _ = pong_tx.send(());
                }
                Message::Ping(data) => {
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Close(frame) => {
                    tracing::info!(user_id, reason = ?frame, "client initiated close");
                    break;
                }
                Message::Text(_) | Message::Binary(_) => {
                    // The notification channel is push-only; inbound
                    // application messages are ignored.
                    tracing::debug!(user_id, "ignoring inbound message on push channel");
                }
            },
            Some(Err(e)) => {
                tracing::warn!(user_id, error = %e, "websocket receive error");
                break;
            }
            None => {
                tracing::info!(user_id, "websocket stream ended");
                break;
            }
        }
    }

    writer_handle.abort();
    ping_handle.abort();

    ws::unregister(&state.connections, user_id, &tx);
    tracing::info!(user_id, "websocket actor stopped");
}

/// Forwards messages from the mpsc channel to the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // Send failed, connection is broken.
            break;
        }
    }
}

//! Best-effort push delivery of freshly created notifications.
//!
//! Handlers never talk to the registry directly: after the store write
//! commits they emit the record onto an unbounded channel, and the
//! dispatcher task drains it. A send failure anywhere on this path is
//! swallowed; delivery is a side effect the originating request must never
//! observe. Users without a live channel simply pick the record up on
//! their next fetch of the notification list.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::storage::models::Notification;
use crate::ws::{self, ConnectionRegistry};

/// Wire payload for a push event. `content` is the display text; the rest
/// lets the client refresh state without refetching the full record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub related_id: i64,
}

impl From<&Notification> for PushPayload {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind.clone(),
            content: n.content.clone(),
            related_id: n.related_id,
        }
    }
}

/// Handler-side sender for created notifications.
pub type NotificationTx = mpsc::UnboundedSender<Notification>;

/// Pushes notifications to connected recipients. The registry is injected
/// so a broker-backed implementation can stand in when scaling out.
pub struct Dispatcher {
    registry: ConnectionRegistry,
}

impl Dispatcher {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Deliver one notification if its recipient is connected.
    /// Never fails: no channel means the store already holds the record,
    /// and a dead channel is reaped by its own actor.
    pub fn deliver(&self, notification: &Notification) {
        let payload = match serde_json::to_string(&PushPayload::from(notification)) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize push payload");
                return;
            }
        };

        if let Some(tx) = ws::lookup(&self.registry, notification.user_id) {
            let _ = tx.send(Message::Text(payload.into()));
            tracing::debug!(
                user_id = notification.user_id,
                notification_id = notification.id,
                "notification pushed"
            );
        }
    }

    /// Consume the notification channel until all senders are dropped.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Notification>) {
        while let Some(notification) = rx.recv().await {
            self.deliver(&notification);
        }
    }
}

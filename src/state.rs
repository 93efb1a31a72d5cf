use std::sync::Arc;

use crate::auth::session::SessionMap;
use crate::notify::dispatcher::NotificationTx;
use crate::storage::Storage;
use crate::ws::ConnectionRegistry;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend (in-memory reference implementation by default).
    pub store: Arc<dyn Storage>,
    /// In-memory session token map.
    pub sessions: SessionMap,
    /// Active WebSocket channel per user.
    pub connections: ConnectionRegistry,
    /// Handler-side end of the notification dispatch channel.
    pub notification_tx: NotificationTx,
}

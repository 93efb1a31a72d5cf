pub mod actor;
pub mod handler;

use axum::extract::ws::{CloseFrame, Message};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sender half of a connection's outbound channel. Any part of the system
/// can clone this to push messages to that client.
pub type ConnectionSender = mpsc::UnboundedSender<Message>;

/// Connection registry: at most one live channel per user.
/// Injected into the dispatcher rather than reached as a hidden global, so
/// a distributed registry can replace it for multi-process deployments.
pub type ConnectionRegistry = Arc<DashMap<i64, ConnectionSender>>;

/// Close code sent to a channel superseded by a newer connection for the
/// same user.
pub const CLOSE_REPLACED: u16 = 4000;
/// Close code for an upgrade without a resolvable session.
pub const CLOSE_UNAUTHORIZED: u16 = 4001;

pub fn new_connection_registry() -> ConnectionRegistry {
    Arc::new(DashMap::new())
}

/// Insert or replace the channel for a user. Last writer wins; the
/// superseded channel is told to close so its socket does not linger.
pub fn register(registry: &ConnectionRegistry, user_id: i64, tx: ConnectionSender) {
    if let Some(old) = registry.insert(user_id, tx) {
        let _ = old.send(Message::Close(Some(CloseFrame {
            code: CLOSE_REPLACED,
            reason: "replaced by newer connection".into(),
        })));
    }
    tracing::debug!(user_id, "connection registered");
}

/// Remove a user's entry, but only if it still refers to this channel.
/// A reconnect may already have replaced the entry; the old actor's
/// cleanup must not tear down the new connection.
pub fn unregister(registry: &ConnectionRegistry, user_id: i64, tx: &ConnectionSender) {
    registry.remove_if(&user_id, |_, current| current.same_channel(tx));
    tracing::debug!(user_id, "connection unregistered");
}

/// Current channel for a user, if connected.
pub fn lookup(registry: &ConnectionRegistry, user_id: i64) -> Option<ConnectionSender> {
    registry.get(&user_id).map(|entry| entry.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (
        ConnectionSender,
        mpsc::UnboundedReceiver<Message>,
    ) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn register_last_writer_wins() {
        let registry = new_connection_registry();
        let (tx1, mut rx1) = channel();
        let (tx2, _rx2) = channel();

        register(&registry, 7, tx1);
        register(&registry, 7, tx2.clone());

        let current = lookup(&registry, 7).expect("entry present");
        assert!(current.same_channel(&tx2));

        // The superseded channel was told to close.
        match rx1.try_recv() {
            Ok(Message::Close(Some(frame))) => assert_eq!(frame.code, CLOSE_REPLACED),
            other => panic!("expected close frame, got {other:?}"),
        }
    }

    #[test]
    fn unregister_removes_entry() {
        let registry = new_connection_registry();
        let (tx, _rx) = channel();

        register(&registry, 7, tx.clone());
        unregister(&registry, 7, &tx);
        assert!(lookup(&registry, 7).is_none());

        // Unregistering an absent user is a no-op.
        unregister(&registry, 7, &tx);
        assert!(lookup(&registry, 7).is_none());
    }

    #[test]
    fn stale_unregister_keeps_replacement() {
        let registry = new_connection_registry();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();

        register(&registry, 7, tx1.clone());
        register(&registry, 7, tx2.clone());

        // Old actor cleans up after being replaced; the new entry survives.
        unregister(&registry, 7, &tx1);
        let current = lookup(&registry, 7).expect("replacement still registered");
        assert!(current.same_channel(&tx2));
    }
}

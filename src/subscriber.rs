//! Client-side notification subscriber.
//!
//! Maintains a live WebSocket to the server's /ws endpoint and keeps a
//! local view of notifications fresh: every received push invalidates the
//! cached list (the consumer re-fetches) and surfaces a transient alert.
//! Any close, clean or not, schedules a reconnect after a fixed delay,
//! indefinitely. Shutdown cancels the pending retry and closes the socket
//! deterministically so no connection attempt outlives the consumer.

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::notify::dispatcher::PushPayload;

/// What the subscriber drives on message receipt.
pub trait NotificationSink: Send + Sync + 'static {
    /// The cached notification list is stale; the consumer should re-fetch.
    fn invalidate(&self);
    /// Show a transient alert with the notification text.
    fn alert(&self, content: &str);
}

/// Connection lifecycle, observable through [`Subscriber::state_watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Full ws:// URL including the session token query param.
    pub url: String,
    /// Fixed delay between reconnect attempts.
    pub retry_delay: Duration,
}

impl SubscriberConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Handle to a running subscriber task.
pub struct Subscriber {
    shutdown_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<SubscriberState>,
    handle: JoinHandle<()>,
}

impl Subscriber {
    /// Spawn the subscriber loop.
    pub fn spawn(config: SubscriberConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(SubscriberState::Disconnected);
        let handle = tokio::spawn(run(config, sink, shutdown_rx, state_tx));
        Self {
            shutdown_tx,
            state_rx,
            handle,
        }
    }

    pub fn state(&self) -> SubscriberState {
        *self.state_rx.borrow()
    }

    /// Watch channel for state transitions, for consumers that want to
    /// await connectivity changes.
    pub fn state_watch(&self) -> watch::Receiver<SubscriberState> {
        self.state_rx.clone()
    }

    /// Tear down: cancel any pending retry, close the socket, and wait for
    /// the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}

async fn run(
    config: SubscriberConfig,
    sink: Arc<dyn NotificationSink>,
    mut shutdown: watch::Receiver<bool>,
    state: watch::Sender<SubscriberState>,
) {
    'reconnect: loop {
        if *shutdown.borrow() {
            break;
        }
        state.send_replace(SubscriberState::Connecting);

        let connected = tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => break 'reconnect,
            result = tokio_tungstenite::connect_async(&config.url) => result,
        };

        match connected {
            Ok((ws_stream, _)) => {
                state.send_replace(SubscriberState::Connected);
                tracing::debug!(url = %config.url, "subscriber connected");

                let (mut write, mut read) = ws_stream.split();
                loop {
                    tokio::select! {
                        biased;
                        _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => {
                            let _ = write.send(Message::Close(None)).await;
                            break 'reconnect;
                        }
                        msg = read.next() => match msg {
                            Some(Ok(Message::Text(text))) => handle_message(sink.as_ref(), text.as_str()),
                            Some(Ok(Message::Close(frame))) => {
                                tracing::debug!(reason = ?frame, "subscriber channel closed by server");
                                break;
                            }
                            Some(Ok(_)) => {
                                // Ping/pong is handled by the transport.
                            }
                            Some(Err(e)) => {
                                tracing::warn!(error = %e, "subscriber receive error");
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "subscriber connect failed");
            }
        }

        state.send_replace(SubscriberState::Disconnected);

        // Fixed-delay retry, cancellable at teardown.
        tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => break 'reconnect,
            _ = tokio::time::sleep(config.retry_delay) => {}
        }
    }

    state.send_replace(SubscriberState::Disconnected);
}

/// Parse a push payload. A malformed frame is logged and ignored; it never
/// tears down the channel.
fn handle_message(sink: &dyn NotificationSink, text: &str) {
    match serde_json::from_str::<PushPayload>(text) {
        Ok(payload) => {
            sink.invalidate();
            sink.alert(&payload.content);
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed push payload");
        }
    }
}

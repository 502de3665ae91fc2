use super::builder::parse_endpoint;
use super::{
    ClientState, ConnectionState, RealtimeClientBuilder, RealtimeClientOptions, ReconnectMode,
};
use crate::infrastructure::{HistoryClient, history_endpoint};
use crate::messaging::EventDispatcher;
use crate::session::{SessionContext, SessionStore};
use crate::types::{ChatMessage, InboundMessage, MessageLog, RealtimeError, Result};
use crate::websocket::{Transport, TransportHandle};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc, watch};

/// Shared core of a [`RealtimeClient`]; background tasks only hold it weakly.
pub(crate) struct ClientInner {
    pub(crate) options: RealtimeClientOptions,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) state: RwLock<ClientState>,
    pub(crate) status_rx: watch::Receiver<ConnectionState>,
}

impl ClientInner {
    /// Opens a new underlying connection unless one is already connecting or
    /// connected. The caller holds the state lock.
    pub(crate) fn open_locked(self: &Arc<Self>, state: &mut ClientState) {
        let Some(generation) = state.begin_connect() else {
            tracing::debug!("Already {}, ignoring connect", state.status());
            return;
        };

        tracing::info!("Connecting to {}", state.endpoint);
        let TransportHandle { sender, mut events } = self.transport.open(state.endpoint.as_str());
        state.connection.attach(sender);

        let dispatcher = EventDispatcher::new(Arc::downgrade(self), generation);
        state.task_manager.spawn(async move {
            while let Some(event) = events.recv().await {
                if dispatcher.dispatch(event).await.is_break() {
                    break;
                }
            }
            tracing::debug!("Event pump for connection {} finished", generation);
        });
    }

    /// Schedules the follow-up to an unexpected close according to the
    /// reconnect policy.
    pub(crate) fn schedule_reconnect(self: &Arc<Self>, state: &mut ClientState) {
        let policy = &self.options.reconnect;
        let delay = match policy.mode {
            ReconnectMode::Disabled => return,
            ReconnectMode::StatusOnly => policy.initial_delay,
            ReconnectMode::Automatic => match state.reconnect_timer.next_delay() {
                Some(delay) => delay,
                None => {
                    tracing::warn!(
                        "Giving up after {} reconnection attempts",
                        state.reconnect_timer.attempts()
                    );
                    return;
                }
            },
        };

        tracing::info!("Scheduling reconnection in {:?}", delay);
        let mode = policy.mode;
        let generation = state.generation();
        let client = Arc::downgrade(self);

        state.set_reconnect_task(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(client) = client.upgrade() else {
                return;
            };
            let mut state = client.state.write().await;
            if state.generation() != generation || state.status() != ConnectionState::Disconnected {
                tracing::debug!("Connection changed while waiting, skipping reconnection");
                return;
            }

            state.release_reconnect_task();
            state.mark_reconnecting();
            if mode == ReconnectMode::Automatic {
                tracing::info!("Attempting to reconnect...");
                client.open_locked(&mut state);
            }
        }));
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        self.state.get_mut().teardown();
        tracing::debug!("Realtime client dropped, connection released");
    }
}

/// Client for the forum chat WebSocket.
///
/// `RealtimeClient` owns one connection to a fixed endpoint and exposes its
/// status, the log of received messages, and a send operation. Transport
/// failures never surface as errors from `connect` or `disconnect`; they show
/// up in [`status()`](Self::status) instead.
///
/// Clones share the same connection. Dropping the last clone closes the
/// connection and cancels any pending reconnection.
///
/// # Example
///
/// ```no_run
/// use forum_realtime_rs::{RealtimeClient, RealtimeClientOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RealtimeClient::new("ws://localhost:8082/ws", RealtimeClientOptions::default())?;
///
/// let mut messages = client.on_message().await;
/// client.send(&serde_json::json!({"username": "alice", "content": "hi"})).await?;
///
/// while let Some(message) = messages.recv().await {
///     println!("{}", message.payload());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl RealtimeClient {
    /// Creates a client over the default WebSocket transport.
    ///
    /// Unless `options.manual` is set the connection is opened right away,
    /// which requires a running tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UrlParse`] or [`RealtimeError::InvalidEndpoint`]
    /// if `endpoint` is not a `ws://` or `wss://` URL.
    pub fn new(endpoint: impl AsRef<str>, options: RealtimeClientOptions) -> Result<Self> {
        RealtimeClientBuilder::new(endpoint, options).map(|builder| builder.build())
    }

    /// Opens the connection. Does nothing while already connecting or connected.
    ///
    /// An explicit connect restores the full reconnect budget, even after
    /// automatic reconnection gave up.
    pub async fn connect(&self) {
        let mut state = self.inner.state.write().await;
        if !state.status().is_active() {
            state.reconnect_timer.reset();
        }
        self.inner.open_locked(&mut state);
    }

    /// Closes the connection and cancels any pending reconnection.
    /// Calling it while already disconnected has no effect.
    pub async fn disconnect(&self) {
        let mut state = self.inner.state.write().await;
        if state.force_disconnect() {
            tracing::info!("Disconnected from {}", state.endpoint);
        }
    }

    /// Serializes `payload` as JSON and sends it.
    ///
    /// Nothing is queued: while the status is not `Connected` the payload is
    /// dropped and [`RealtimeError::NotConnected`] is returned.
    pub async fn send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<()> {
        let state = self.inner.state.read().await;
        let status = state.status();
        if status != ConnectionState::Connected || !state.connection.is_ready() {
            tracing::warn!("WebSocket is not connected ({}), dropping message", status);
            return Err(RealtimeError::NotConnected);
        }

        let text = serde_json::to_string(payload)?;
        state.connection.send_text(text)?;
        tracing::debug!("Sent message");
        Ok(())
    }

    /// Sends a chat message with the session identity attached
    pub async fn send_chat(&self, session: &SessionContext, content: impl Into<String>) -> Result<()> {
        self.send(&ChatMessage::from_session(session, content)).await
    }

    pub fn status(&self) -> ConnectionState {
        *self.inner.status_rx.borrow()
    }

    /// Receiver that observes every status transition
    pub fn watch_status(&self) -> watch::Receiver<ConnectionState> {
        self.inner.status_rx.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionState::Connected
    }

    /// Snapshot of the received messages in arrival order
    pub async fn messages(&self) -> MessageLog {
        self.inner.state.read().await.messages.clone()
    }

    /// Registers a listener that receives every message appended from now on
    pub async fn on_message(&self) -> mpsc::Receiver<InboundMessage> {
        let (tx, rx) = mpsc::channel(self.inner.options.message_buffer.max(1));
        self.inner.state.write().await.add_listener(tx);
        rx
    }

    pub async fn endpoint(&self) -> String {
        self.inner.state.read().await.endpoint.to_string()
    }

    /// Points the client at a new endpoint.
    ///
    /// The old connection is closed, the message log cleared and the status
    /// reset before the new endpoint is applied. Unless the client is manual
    /// it connects to the new endpoint straight away.
    pub async fn set_endpoint(&self, endpoint: impl AsRef<str>) -> Result<()> {
        let endpoint = parse_endpoint(endpoint.as_ref())?;
        let mut state = self.inner.state.write().await;
        if state.endpoint == endpoint {
            return Ok(());
        }

        tracing::info!("Switching endpoint from {} to {}", state.endpoint, endpoint);
        state.reset(endpoint);
        if !self.inner.options.manual {
            self.inner.open_locked(&mut state);
        }
        Ok(())
    }

    /// Follows the session lifecycle: connects while a session is active and
    /// disconnects when it ends. Replaces any previous binding.
    pub async fn bind_session(&self, sessions: &SessionStore) {
        let mut rx = sessions.subscribe();
        let client = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            loop {
                let session = rx.borrow_and_update().clone();
                let Some(inner) = client.upgrade() else {
                    break;
                };
                let realtime = RealtimeClient { inner };
                match session {
                    Some(session) => {
                        tracing::debug!("Session active for {}, connecting", session.username);
                        realtime.connect().await;
                    }
                    None => {
                        tracing::debug!("No active session, disconnecting");
                        realtime.disconnect().await;
                    }
                }
                drop(realtime);

                if rx.changed().await.is_err() {
                    break;
                }
            }
        });

        self.inner.state.write().await.set_session_task(task);
    }

    /// Loads the persisted chat log over HTTP
    pub async fn fetch_history(&self) -> Result<Vec<ChatMessage>> {
        let endpoint = match &self.inner.options.history_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => history_endpoint(&self.inner.state.read().await.endpoint)?,
        };

        HistoryClient::new(endpoint, self.inner.options.access_token.clone())
            .fetch()
            .await
    }
}

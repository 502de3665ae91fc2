use super::{ClientInner, ClientState, ConnectionState, RealtimeClient};
use crate::infrastructure::ReconnectTimer;
use crate::types::constants::{
    MAX_RECONNECT_ATTEMPTS, MAX_RECONNECT_DELAY, MESSAGE_BUFFER_SIZE, RECONNECT_DELAY,
};
use crate::types::{RealtimeError, Result};
use crate::websocket::{Transport, WebSocketTransport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use url::Url;

/// What happens after the server side closes the connection unexpectedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectMode {
    /// Flip to `Reconnecting` after the delay and open a new connection,
    /// backing off between failed attempts.
    Automatic,
    /// Flip to `Reconnecting` once after the initial delay and do nothing else.
    StatusOnly,
    /// Stay `Disconnected`.
    Disabled,
}

#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub mode: ReconnectMode,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Status label only, no new connection
    pub fn status_only() -> Self {
        Self {
            mode: ReconnectMode::StatusOnly,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            mode: ReconnectMode::Disabled,
            ..Self::default()
        }
    }

    pub(crate) fn timer(&self) -> ReconnectTimer {
        ReconnectTimer::new(self.initial_delay, self.max_delay, self.max_attempts)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            mode: ReconnectMode::Automatic,
            initial_delay: Duration::from_millis(RECONNECT_DELAY),
            max_delay: Duration::from_millis(MAX_RECONNECT_DELAY),
            max_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RealtimeClientOptions {
    /// Do not connect until `connect()` is called
    pub manual: bool,
    pub reconnect: ReconnectPolicy,
    /// Capacity of each `on_message` listener
    pub message_buffer: usize,
    /// Bearer token for the history endpoint
    pub access_token: Option<String>,
    /// Overrides the history URL derived from the socket endpoint
    pub history_endpoint: Option<String>,
}

impl Default for RealtimeClientOptions {
    fn default() -> Self {
        Self {
            manual: false,
            reconnect: ReconnectPolicy::default(),
            message_buffer: MESSAGE_BUFFER_SIZE,
            access_token: None,
            history_endpoint: None,
        }
    }
}

/// Builder for RealtimeClient that handles initialization
pub struct RealtimeClientBuilder {
    endpoint: Url,
    options: RealtimeClientOptions,
    transport: Arc<dyn Transport>,
}

impl RealtimeClientBuilder {
    /// Create a new builder, validating the endpoint
    pub fn new(endpoint: impl AsRef<str>, options: RealtimeClientOptions) -> Result<Self> {
        let endpoint = parse_endpoint(endpoint.as_ref())?;

        Ok(Self {
            endpoint,
            options,
            transport: Arc::new(WebSocketTransport),
        })
    }

    /// Replace the default WebSocket transport
    pub fn with_transport(mut self, transport: impl Transport) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Build the client. Unless `manual` is set the connection is opened
    /// before this returns, so it must run inside a tokio runtime.
    pub fn build(self) -> RealtimeClient {
        let (status_tx, status_rx) = watch::channel(ConnectionState::Disconnected);
        let timer = self.options.reconnect.timer();
        let client_state = ClientState::new(self.endpoint, timer, status_tx);

        let inner = Arc::new(ClientInner {
            options: self.options,
            transport: self.transport,
            state: RwLock::new(client_state),
            status_rx,
        });

        if !inner.options.manual {
            // Nothing else holds the lock yet
            if let Ok(mut state) = inner.state.try_write() {
                inner.open_locked(&mut state);
            }
        }

        RealtimeClient { inner }
    }
}

/// Parses a socket endpoint, accepting only `ws` and `wss`
pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(RealtimeError::InvalidEndpoint(format!(
            "expected ws:// or wss:// endpoint, got '{}://'",
            other
        ))),
    }
}

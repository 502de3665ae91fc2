use super::connection::{ConnectionManager, ConnectionState};
use crate::infrastructure::{ReconnectTimer, TaskManager};
use crate::messaging::CloseInfo;
use crate::types::{InboundMessage, MessageLog};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use url::Url;

/// How a close event was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The connection was already gone; nothing changed
    Ignored,
    /// The caller asked for the close
    Requested,
    /// The peer or the network closed the connection
    Unexpected,
}

/// All mutable state of a RealtimeClient.
///
/// Every status transition goes through the methods below; the status itself
/// lives in the watch channel so readers never need this lock.
pub struct ClientState {
    pub endpoint: Url,
    pub messages: MessageLog,
    pub connection: ConnectionManager,
    pub task_manager: TaskManager,
    pub reconnect_timer: ReconnectTimer,
    pub was_manual_disconnect: bool,
    listeners: Vec<mpsc::Sender<InboundMessage>>,
    reconnect_task: Option<JoinHandle<()>>,
    session_task: Option<JoinHandle<()>>,
    generation: u64,
    status_tx: watch::Sender<ConnectionState>,
}

impl ClientState {
    pub fn new(
        endpoint: Url,
        reconnect_timer: ReconnectTimer,
        status_tx: watch::Sender<ConnectionState>,
    ) -> Self {
        Self {
            endpoint,
            messages: MessageLog::new(),
            connection: ConnectionManager::new(),
            task_manager: TaskManager::new(),
            reconnect_timer,
            was_manual_disconnect: false,
            listeners: Vec::new(),
            reconnect_task: None,
            session_task: None,
            generation: 0,
            status_tx,
        }
    }

    pub fn status(&self) -> ConnectionState {
        *self.status_tx.borrow()
    }

    /// Identifies the current underlying connection
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Publishes `new_state`. Returns false, and notifies nobody, if it is unchanged.
    fn set_status(&self, new_state: ConnectionState) -> bool {
        let changed = self.status_tx.send_if_modified(|state| {
            if *state == new_state {
                false
            } else {
                *state = new_state;
                true
            }
        });
        if changed {
            tracing::debug!("Connection state -> {}", new_state);
        }
        changed
    }

    /// Starts a new connection attempt.
    ///
    /// Returns the generation of the new connection, or `None` when one is
    /// already connecting or connected.
    pub fn begin_connect(&mut self) -> Option<u64> {
        if self.status().is_active() {
            return None;
        }

        self.cancel_reconnect();
        self.task_manager.abort_all();
        self.connection.close();

        self.generation += 1;
        self.was_manual_disconnect = false;
        self.set_status(ConnectionState::Connecting);
        Some(self.generation)
    }

    pub fn handle_open(&mut self) {
        if self.status() != ConnectionState::Connecting {
            tracing::warn!("Ignoring open event while {}", self.status());
            return;
        }
        self.reconnect_timer.reset();
        self.set_status(ConnectionState::Connected);
        tracing::info!("Connected to {}", self.endpoint);
    }

    pub fn handle_error(&mut self, reason: &str) {
        tracing::error!("WebSocket error: {}", reason);
        if self.status().is_active() {
            self.set_status(ConnectionState::Errored);
        }
    }

    pub fn handle_close(&mut self, info: &CloseInfo) -> CloseOutcome {
        let state = self.status();
        if !matches!(
            state,
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Errored
        ) {
            tracing::debug!("Ignoring close event ({}) while {}", info, state);
            return CloseOutcome::Ignored;
        }

        self.connection.detach();
        self.set_status(ConnectionState::Disconnected);

        if self.was_manual_disconnect {
            tracing::info!("Connection closed ({})", info);
            CloseOutcome::Requested
        } else {
            tracing::warn!("Connection closed unexpectedly ({})", info);
            CloseOutcome::Unexpected
        }
    }

    /// Decodes a text frame and appends it. Malformed frames are dropped.
    pub fn handle_frame(&mut self, text: &str) -> Option<InboundMessage> {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!("Failed to parse message: {} - Raw: {}", e, text);
                return None;
            }
        };

        self.messages.push(message.clone());
        self.notify_listeners(&message);
        Some(message)
    }

    pub fn add_listener(&mut self, listener: mpsc::Sender<InboundMessage>) {
        self.listeners.push(listener);
    }

    fn notify_listeners(&mut self, message: &InboundMessage) {
        self.listeners.retain(|listener| match listener.try_send(message.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Message listener is full, skipping message");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    /// Switches the label after the reconnect delay elapsed
    pub fn mark_reconnecting(&mut self) {
        self.set_status(ConnectionState::Reconnecting);
    }

    pub fn set_reconnect_task(&mut self, task: JoinHandle<()>) {
        if let Some(previous) = self.reconnect_task.replace(task) {
            previous.abort();
        }
    }

    /// Forgets the reconnect task without aborting it (called by the task itself)
    pub fn release_reconnect_task(&mut self) {
        self.reconnect_task = None;
    }

    fn cancel_reconnect(&mut self) -> bool {
        match self.reconnect_task.take() {
            Some(task) => {
                let pending = !task.is_finished();
                task.abort();
                pending
            }
            None => false,
        }
    }

    pub fn set_session_task(&mut self, task: JoinHandle<()>) {
        if let Some(previous) = self.session_task.replace(task) {
            previous.abort();
        }
    }

    /// Caller-initiated disconnect.
    ///
    /// Returns true if anything happened: a connection was closed, a pending
    /// reconnect was cancelled or the status changed.
    pub fn force_disconnect(&mut self) -> bool {
        let cancelled = self.cancel_reconnect();
        let closed = self.connection.close();
        self.task_manager.abort_all();
        self.was_manual_disconnect = true;

        if closed {
            self.generation += 1;
        }
        let changed = self.set_status(ConnectionState::Disconnected);

        cancelled || closed || changed
    }

    /// Tears down the connection and starts over with a new endpoint
    pub fn reset(&mut self, endpoint: Url) {
        self.force_disconnect();
        self.generation += 1;
        self.messages.clear();
        self.reconnect_timer.reset();
        self.was_manual_disconnect = false;
        self.endpoint = endpoint;
    }

    /// Releases everything synchronously; used when the client is dropped
    pub fn teardown(&mut self) {
        self.force_disconnect();
        if let Some(task) = self.session_task.take() {
            task.abort();
        }
        self.listeners.clear();
    }
}

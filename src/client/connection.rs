use crate::types::{RealtimeError, Result};
use crate::websocket::Outgoing;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Errored,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Errored => "errored",
        }
    }

    /// States in which `connect()` has nothing to do
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds the writer of the current underlying connection
pub struct ConnectionManager {
    writer: Option<mpsc::UnboundedSender<Outgoing>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self { writer: None }
    }

    /// Sets the writer for a freshly opened connection
    pub fn attach(&mut self, writer: mpsc::UnboundedSender<Outgoing>) {
        if self.writer.replace(writer).is_some() {
            tracing::debug!("Replaced writer of a previous connection");
        }
    }

    /// Forgets the writer without sending a close (the peer already closed)
    pub fn detach(&mut self) {
        self.writer = None;
    }

    /// Whether the transport can take a frame right now
    pub fn is_ready(&self) -> bool {
        self.writer.as_ref().is_some_and(|w| !w.is_closed())
    }

    /// Hands a text frame to the transport
    pub fn send_text(&self, text: String) -> Result<()> {
        let writer = self.writer.as_ref().ok_or(RealtimeError::NotConnected)?;
        writer
            .send(Outgoing::Text(text))
            .map_err(|_| RealtimeError::Connection("transport writer closed".to_string()))
    }

    /// Asks the transport to close and drops the writer.
    /// Returns true if a connection was attached.
    pub fn close(&mut self) -> bool {
        match self.writer.take() {
            Some(writer) => {
                let _ = writer.send(Outgoing::Close);
                true
            }
            None => false,
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_writer_is_not_connected() {
        let connection = ConnectionManager::new();
        assert!(!connection.is_ready());
        assert!(matches!(
            connection.send_text("{}".to_string()),
            Err(RealtimeError::NotConnected)
        ));
    }

    #[test]
    fn test_close_sends_close_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connection = ConnectionManager::new();
        connection.attach(tx);
        assert!(connection.is_ready());

        connection.send_text("hi".to_string()).unwrap();
        assert!(connection.close());
        assert!(!connection.close());

        assert_eq!(rx.try_recv().unwrap(), Outgoing::Text("hi".to_string()));
        assert_eq!(rx.try_recv().unwrap(), Outgoing::Close);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_writer_with_dropped_transport_is_not_ready() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut connection = ConnectionManager::new();
        connection.attach(tx);
        drop(rx);

        assert!(!connection.is_ready());
        assert!(matches!(
            connection.send_text("{}".to_string()),
            Err(RealtimeError::Connection(_))
        ));
    }
}

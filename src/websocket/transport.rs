use crate::messaging::TransportEvent;
use tokio::sync::mpsc;

/// Frames the client hands to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text(String),
    /// Caller-initiated close
    Close,
}

/// The two ends of one underlying connection as seen by the client
pub struct TransportHandle {
    pub sender: mpsc::UnboundedSender<Outgoing>,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl TransportHandle {
    pub fn new(
        sender: mpsc::UnboundedSender<Outgoing>,
        events: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> Self {
        Self { sender, events }
    }
}

/// Duplex message-stream primitive the client drives.
///
/// `open` must return immediately. Whether the connection succeeds is reported
/// later through the handle's events: `Opened` on success, or `Error` followed
/// by `Closed` on failure.
pub trait Transport: Send + Sync + 'static {
    fn open(&self, url: &str) -> TransportHandle;
}

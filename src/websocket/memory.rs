use super::transport::{Outgoing, Transport, TransportHandle};
use crate::messaging::{CloseInfo, TransportEvent};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// In-process [`Transport`].
///
/// Every `open` is recorded as a [`MemoryPeer`] that plays the server side:
/// it can inject events and read back whatever the client sent. Clones share
/// the same record.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    peers: Arc<Mutex<Vec<MemoryPeer>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of underlying connections opened so far
    pub fn open_count(&self) -> usize {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Peer for the `index`-th open, in open order
    pub fn peer(&self, index: usize) -> Option<MemoryPeer> {
        self.peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    /// Peer for the most recent open
    pub fn last_peer(&self) -> Option<MemoryPeer> {
        self.peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Transport for MemoryTransport {
    fn open(&self, url: &str) -> TransportHandle {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        tracing::debug!("Opening in-memory connection to {}", url);
        self.peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MemoryPeer {
                url: url.to_string(),
                events: event_tx,
                outgoing: Arc::new(Mutex::new(out_rx)),
            });

        TransportHandle::new(out_tx, event_rx)
    }
}

/// Server side of one in-memory connection
#[derive(Clone)]
pub struct MemoryPeer {
    url: String,
    events: mpsc::UnboundedSender<TransportEvent>,
    outgoing: Arc<Mutex<mpsc::UnboundedReceiver<Outgoing>>>,
}

impl MemoryPeer {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Delivers an event to the client. Returns false once the client stopped listening.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn open(&self) -> bool {
        self.emit(TransportEvent::Opened)
    }

    pub fn message(&self, text: impl Into<String>) -> bool {
        self.emit(TransportEvent::Message(text.into()))
    }

    pub fn error(&self, reason: impl Into<String>) -> bool {
        self.emit(TransportEvent::Error(reason.into()))
    }

    pub fn close(&self, info: CloseInfo) -> bool {
        self.emit(TransportEvent::Closed(info))
    }

    /// True once the client dropped its event receiver
    pub fn is_detached(&self) -> bool {
        self.events.is_closed()
    }

    /// Drains everything the client has sent so far
    pub fn sent(&self) -> Vec<Outgoing> {
        let mut outgoing = self.outgoing.lock().unwrap_or_else(PoisonError::into_inner);
        let mut frames = Vec::new();
        while let Ok(frame) = outgoing.try_recv() {
            frames.push(frame);
        }
        frames
    }
}

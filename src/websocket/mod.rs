// WebSocket module - transport seam and its implementations
pub mod factory;
pub mod memory;
pub mod transport;

pub use factory::{WebSocketFactory, WebSocketTransport};
pub use memory::{MemoryPeer, MemoryTransport};
pub use transport::{Outgoing, Transport, TransportHandle};

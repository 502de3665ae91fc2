// Messaging module - transport events and their dispatch into client state
pub mod dispatcher;
pub mod event;

pub use dispatcher::EventDispatcher;
pub use event::{CloseInfo, TransportEvent};

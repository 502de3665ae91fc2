// Module declarations
mod builder;
mod connection;
mod core;
mod state;

// Public API exports
pub use self::builder::{
    RealtimeClientBuilder, RealtimeClientOptions, ReconnectMode, ReconnectPolicy,
};
pub use self::connection::{ConnectionManager, ConnectionState};
pub(crate) use self::core::ClientInner;
pub use self::core::RealtimeClient;
pub use self::state::{ClientState, CloseOutcome};

//! # Forum Realtime
//!
//! Realtime chat client for the forum WebSocket service.
//!
//! A [`RealtimeClient`] owns one WebSocket connection, publishes its
//! [`ConnectionState`], keeps an append-only [`MessageLog`] of everything the
//! server relays, and sends JSON payloads while connected.
//!
//! ## Example
//!
//! ```no_run
//! use forum_realtime_rs::{RealtimeClient, RealtimeClientOptions, SessionContext, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RealtimeClient::new(
//!         "ws://localhost:8082/ws",
//!         RealtimeClientOptions {
//!             manual: true,
//!             ..Default::default()
//!         },
//!     )?;
//!
//!     let sessions = SessionStore::global();
//!     client.bind_session(sessions).await;
//!     let session = sessions.begin(SessionContext::new("alice"));
//!
//!     client.send_chat(&session, "hello").await.ok();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod session;
pub mod types;
pub mod websocket;

pub use client::{
    ConnectionState, RealtimeClient, RealtimeClientBuilder, RealtimeClientOptions, ReconnectMode,
    ReconnectPolicy,
};
pub use messaging::{CloseInfo, TransportEvent};
pub use session::{SessionContext, SessionStore};
pub use types::{ChatMessage, InboundMessage, MessageLog, RealtimeError, Result};
pub use websocket::{MemoryTransport, Outgoing, Transport, TransportHandle, WebSocketTransport};

use crate::session::SessionContext;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A decoded inbound frame.
///
/// The payload shape is defined by whoever sits on the other side of the
/// socket; the client only guarantees that it parsed as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct InboundMessage(serde_json::Value);

impl InboundMessage {
    /// Parses a text frame. Fails on anything that is not JSON.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text).map(Self)
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.0
    }

    /// Decodes the payload into a caller-defined type, e.g. [`ChatMessage`].
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.0)
    }
}

impl From<serde_json::Value> for InboundMessage {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Chat payload relayed by the chat service.
///
/// Accepts the snake_case form sent by clients as well as the capitalised
/// form the service uses for persisted rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "ID")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "UserID")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "Username")]
    pub username: String,
    #[serde(alias = "Content", alias = "message")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "CreatedAt")]
    pub created_at: Option<String>,
}

impl ChatMessage {
    pub fn new(username: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id: None,
            username: username.into(),
            content: content.into(),
            created_at: None,
        }
    }

    /// Builds an outgoing message carrying the session identity as plain data.
    pub fn from_session(session: &SessionContext, content: impl Into<String>) -> Self {
        Self {
            user_id: session.user_id,
            ..Self::new(session.username.clone(), content)
        }
    }
}

/// Append-only log of inbound messages in arrival order.
///
/// Cloning is cheap and yields a snapshot: later appends copy on write, so a
/// snapshot handed to a caller never changes underneath it.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Arc<Vec<InboundMessage>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: InboundMessage) {
        Arc::make_mut(&mut self.entries).push(message);
    }

    pub fn clear(&mut self) {
        self.entries = Arc::new(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&InboundMessage> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InboundMessage> {
        self.entries.iter()
    }

    /// Returns true when both logs share the same backing storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a InboundMessage;
    type IntoIter = std::slice::Iter<'a, InboundMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

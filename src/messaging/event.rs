use crate::types::constants::{WS_CLOSE_ABNORMAL, WS_CLOSE_NO_STATUS, WS_CLOSE_NORMAL};

/// Events a transport delivers for one underlying connection.
///
/// A connection produces at most one `Opened` and exactly one `Closed`, which
/// is always the last event. `Error` does not close the connection by itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Error(String),
    Closed(CloseInfo),
}

impl TransportEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "open",
            Self::Message(_) => "message",
            Self::Error(_) => "error",
            Self::Closed(_) => "close",
        }
    }
}

/// Close code and reason reported with a `Closed` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

impl CloseInfo {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    pub fn normal() -> Self {
        Self::new(WS_CLOSE_NORMAL, "")
    }

    /// Connection dropped without a close frame
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(WS_CLOSE_ABNORMAL, reason)
    }

    /// Close frame that carried no status code
    pub fn no_status() -> Self {
        Self::new(WS_CLOSE_NO_STATUS, "")
    }
}

impl std::fmt::Display for CloseInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.reason.is_empty() {
            write!(f, "code={}", self.code)
        } else {
            write!(f, "code={}, reason='{}'", self.code, self.reason)
        }
    }
}

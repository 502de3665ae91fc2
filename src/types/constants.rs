/// Delay before an unexpected close turns into a reconnect (milliseconds)
pub const RECONNECT_DELAY: u64 = 5000;

/// Upper bound for the reconnect backoff (milliseconds)
pub const MAX_RECONNECT_DELAY: u64 = 60_000;

/// Reconnect attempts before giving up until the next explicit connect
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Capacity of each `on_message` listener channel
pub const MESSAGE_BUFFER_SIZE: usize = 100;

/// Path of the chat history resource on the chat service
pub const HISTORY_PATH: &str = "/messages";

/// WebSocket close codes
pub const WS_CLOSE_NORMAL: u16 = 1000;
pub const WS_CLOSE_NO_STATUS: u16 = 1005;
pub const WS_CLOSE_ABNORMAL: u16 = 1006;

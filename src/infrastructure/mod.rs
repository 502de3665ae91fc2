// Infrastructure module - background tasks, timers and HTTP helpers
pub mod http;
pub mod task_manager;
pub mod timer;

pub use http::{HistoryClient, history_endpoint};
pub use task_manager::TaskManager;
pub use timer::ReconnectTimer;

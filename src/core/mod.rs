pub mod client;
pub mod debug_logger;
pub mod proxy;

// Re-export commonly used items
pub use client::{HttpSettings, ProxyClient};
pub use debug_logger::{get_debug_logger, DebugLogger};
pub use proxy::*;

//! HTTP API module.
//!
//! Upload, preview and download endpoints plus the SSE log stream.

pub mod server;
pub mod types;
pub mod logs;

pub use server::{router, start_server, ServerConfig};
pub use types::*;
pub use logs::*;

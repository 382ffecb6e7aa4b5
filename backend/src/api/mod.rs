//! HTTP API module.
//!
//! The pinning proxy server, its response types and the progress log stream.

pub mod server;
pub mod types;
pub mod logs;

pub use server::{router, start_server};
pub use types::*;
pub use logs::*;

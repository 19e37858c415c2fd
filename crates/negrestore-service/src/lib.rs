//! Negative Restore Service: upload, process, and fetch over WebSocket.
//!
//! Wraps the engine from `negrestore-core` with content-addressed storage,
//! age-based retention, and a JSON message protocol.

pub mod config;
pub mod ipc;
pub mod logging;
pub mod retention;
pub mod server;
pub mod store;

pub use config::ServiceConfig;
pub use ipc::{ClientRequest, ErrorKind, ServerResponse};
pub use store::{ImageState, ImageStore, StoreError};

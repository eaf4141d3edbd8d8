//! Storage facade node.
//!
//! Serves the storage request API through a single-threaded mailbox: calls
//! await a reply, casts are fire-and-forget, and requests are processed in
//! FIFO order. Blocking reads bypass the mailbox because they may suspend
//! arbitrarily long.

pub mod config;
pub mod facade;
pub mod shutdown;

pub use config::Config;
pub use facade::{FacadeError, StorageHandle, StorageNode, StorageRequest};

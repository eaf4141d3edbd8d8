//! Transactional table manager for the Vellum storage engine.
//!
//! This crate defines the table abstraction the engine is written against:
//! named tables of `(noun key, encoded value)` rows with ACID transactions,
//! element-wise prefix selects, and a per-table write stream for blocking
//! readers. The [`MemoryTables`] backend implements the contract with a
//! single-writer commit model: readers snapshot committed state without
//! locking, writers serialize through one lock, and write events broadcast
//! after commit while the lock is still held.

#![warn(missing_docs)]

mod error;
mod manager;
mod memory;
mod pattern;

pub use error::{Error, Result};
pub use manager::{Row, TableEvent, TableManager, TableTxn, TxOutcome};
pub use memory::{MemoryTables, MemoryTxn};
pub use pattern::KeyPattern;

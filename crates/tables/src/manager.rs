//! The table manager contract.
//!
//! Backends provide named tables of `(noun key, encoded value)` rows with
//! transactions, element-wise prefix selects, and a per-table write stream.
//! Every storage-layer operation goes through [`TableManager::transaction`];
//! reads and writes compose inside one closure, so multi-row updates commit
//! or abort together. Nested participation is by construction: helpers take
//! `&mut` to the transaction they were handed instead of opening their own.

use tokio::sync::broadcast;
use vellum_types::Noun;

use crate::error::Result;
use crate::pattern::KeyPattern;

/// A single table row: decoded noun key plus encoded value bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Row key. Keys are full nouns so selects can constrain list elements.
    pub key: Noun,
    /// Encoded row value.
    pub value: Vec<u8>,
}

impl Row {
    /// Build a row.
    pub fn new(key: Noun, value: Vec<u8>) -> Self {
        Row { key, value }
    }
}

/// Outcome of a transaction: the closure's result, or the abort reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome<T> {
    /// The transaction committed and produced a result.
    Committed(T),
    /// The transaction aborted; buffered writes were discarded.
    Aborted(String),
}

impl<T> TxOutcome<T> {
    /// True when the transaction committed.
    pub fn is_committed(&self) -> bool {
        matches!(self, TxOutcome::Committed(_))
    }

    /// The committed result, if any.
    pub fn committed(self) -> Option<T> {
        match self {
            TxOutcome::Committed(value) => Some(value),
            TxOutcome::Aborted(_) => None,
        }
    }

    /// Map the committed result, preserving an abort.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TxOutcome<U> {
        match self {
            TxOutcome::Committed(value) => TxOutcome::Committed(f(value)),
            TxOutcome::Aborted(reason) => TxOutcome::Aborted(reason),
        }
    }
}

/// One event per committed row write on a subscribed table.
#[derive(Debug, Clone)]
pub struct TableEvent {
    /// Table the row was written to.
    pub table: String,
    /// Key of the written row.
    pub key: Noun,
    /// Encoded value of the written row.
    pub value: Vec<u8>,
}

/// Operations available inside a transaction.
pub trait TableTxn {
    /// Read the row at `key`, returning zero or one entries.
    ///
    /// Reads observe writes buffered earlier in the same transaction.
    fn read(&self, table: &str, key: &Noun) -> Result<Vec<Row>>;

    /// Buffer a row write. Applied atomically at commit.
    fn write(&mut self, table: &str, row: Row) -> Result<()>;

    /// All rows whose keys match the pattern, in key order.
    fn select(&self, table: &str, pattern: &KeyPattern) -> Result<Vec<Row>>;
}

/// A transactional table backend.
pub trait TableManager: Clone + Send + Sync + 'static {
    /// Transaction handle type. Owns its view of the state, so backends
    /// that snapshot (rather than borrow) hand it out directly.
    type Txn: TableTxn;

    /// Create a table. Fails if it already exists.
    fn create_table(&self, name: &str) -> Result<()>;

    /// Drop a table and its rows. Fails if it does not exist.
    fn delete_table(&self, name: &str) -> Result<()>;

    /// Run `f` inside a transaction.
    ///
    /// An `Ok` return commits the buffered writes atomically and emits one
    /// [`TableEvent`] per write to that table's subscribers; an `Err` return
    /// aborts, discarding the buffer.
    fn transaction<R, F>(&self, f: F) -> TxOutcome<R>
    where
        F: FnOnce(&mut Self::Txn) -> Result<R>;

    /// Subscribe to the table's write stream.
    ///
    /// Events are delivered for writes committed after the receiver exists,
    /// which is what makes subscribe-before-check sound for blocking reads.
    /// Unsubscribing is dropping the receiver.
    fn subscribe(&self, table: &str) -> broadcast::Receiver<TableEvent>;
}

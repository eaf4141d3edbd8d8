//! Error types for storage operations.

use snafu::Snafu;
use vellum_tables::TxOutcome;
use vellum_types::CodecError;

/// Result type for storage operations.
pub type Result<T, E = StorageError> = std::result::Result<T, E>;

/// Unwrap a committed transaction outcome, surfacing an abort unchanged.
///
/// No retry happens here; callers retry by re-invoking the operation.
pub fn require_committed<T>(outcome: TxOutcome<T>) -> Result<T> {
    match outcome {
        TxOutcome::Committed(value) => Ok(value),
        TxOutcome::Aborted(reason) => TxAbortedSnafu { reason }.fail(),
    }
}

/// Error type for storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// The transaction aborted; the caller may retry by re-invoking.
    #[snafu(display("Transaction aborted: {reason}"))]
    TxAborted {
        /// Why the transaction aborted.
        reason: String,
    },

    /// Blocking reads reject version zero: no write ever carries it.
    #[snafu(display("Version zero is never written"))]
    BadVersion,

    /// The qualified key is not `[version, key | tail]` shaped.
    #[snafu(display("Malformed qualified key: {key}"))]
    BadShape {
        /// Display form of the offending key.
        key: String,
    },

    /// The key does not carry this handle's namespace prefix.
    ///
    /// Unreachable when the tables are used only through this layer.
    #[snafu(display("Namespace prefix mismatch on key: {key}"))]
    Namespace {
        /// Display form of the offending key.
        key: String,
    },

    /// The qualified table's write stream closed while waiting.
    #[snafu(display("Write stream closed while awaiting {key}"))]
    StreamClosed {
        /// Display form of the awaited key.
        key: String,
    },

    /// A table operation failed outside a transaction.
    #[snafu(context(false), display("Table error: {source}"))]
    Table {
        /// The underlying table error.
        source: vellum_tables::Error,
    },

    /// Row encoding or decoding failed.
    #[snafu(context(false), display("Codec error: {source}"))]
    Codec {
        /// The underlying codec error.
        source: CodecError,
    },
}

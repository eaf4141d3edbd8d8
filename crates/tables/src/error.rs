//! Error types for table operations.

use snafu::Snafu;
use vellum_types::CodecError;

/// Result type for table operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for table operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The table already exists.
    #[snafu(display("Table already exists: {name}"))]
    TableExists {
        /// Name of the offending table.
        name: String,
    },

    /// The table does not exist.
    #[snafu(display("No such table: {name}"))]
    NoSuchTable {
        /// Name of the missing table.
        name: String,
    },

    /// Row encoding or decoding failed.
    #[snafu(context(false), display("Codec error: {source}"))]
    Codec {
        /// The underlying codec error.
        source: CodecError,
    },
}

//! Core types for the Vellum storage engine.
//!
//! This crate provides the foundational types shared by every layer:
//! - The [`Noun`] term model (atoms and cells, with list helpers)
//! - The [`StoredValue`] tombstone-aware value wrapper
//! - Postcard-based row encoding with consistent error handling
//! - SHA-256 hashing primitives for the commitment tree

#![warn(missing_docs)]

pub mod codec;
pub mod hash;
pub mod noun;
pub mod value;

pub use codec::{CodecError, decode, encode};
pub use hash::{EMPTY_HASH, Hash, sha256, sha256_pair};
pub use noun::{Atom, Noun};
pub use value::StoredValue;

/// Per-key version counter.
///
/// Versions are positive and strictly increasing per key. Zero is reserved:
/// it is never a valid written version and only appears inside the
/// qualified-key tail sentinel and the blocking-read rejection check.
pub type Version = u64;

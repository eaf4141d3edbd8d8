//! Stored-value representation for the qualified table.

use serde::{Deserialize, Serialize};

use crate::noun::Noun;

/// A value as stored at a `(version, key)` coordinate.
///
/// Deletions never remove rows: they write `Tombstone` under a fresh
/// version. The enum tag keeps the tombstone disjoint from every legal user
/// value on the wire, so no reserved noun can collide with user data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredValue {
    /// A user-written noun.
    Value(Noun),
    /// Logical deletion marker.
    Tombstone,
}

impl StoredValue {
    /// True for the deletion marker.
    pub fn is_tombstone(&self) -> bool {
        matches!(self, StoredValue::Tombstone)
    }

    /// The user value, if this is not a tombstone.
    pub fn as_value(&self) -> Option<&Noun> {
        match self {
            StoredValue::Value(noun) => Some(noun),
            StoredValue::Tombstone => None,
        }
    }

    /// Consume into the user value, if this is not a tombstone.
    pub fn into_value(self) -> Option<Noun> {
        match self {
            StoredValue::Value(noun) => Some(noun),
            StoredValue::Tombstone => None,
        }
    }
}

impl From<Noun> for StoredValue {
    fn from(noun: Noun) -> Self {
        StoredValue::Value(noun)
    }
}

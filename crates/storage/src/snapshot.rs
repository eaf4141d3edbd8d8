//! Point-in-time snapshots of the order map.
//!
//! A snapshot is a consistent view of `namespaced key → version`, captured
//! under one transaction. Because qualified rows are immutable once written,
//! a snapshot lookup against the live qualified table always observes the
//! value that was visible at capture time, regardless of later writes.

use tracing::warn;
use vellum_tables::{KeyPattern, TableManager, TableTxn, TxOutcome};
use vellum_types::{Noun, StoredValue, Version, decode};

use crate::namespace;
use crate::storage::Storage;

/// An immutable capture of the order map.
#[derive(Clone)]
pub struct Snapshot<M: TableManager> {
    storage: Storage<M>,
    entries: Vec<(Noun, Version)>,
}

impl<M: TableManager> Snapshot<M> {
    /// The captured `(namespaced key, version)` pairs.
    pub fn entries(&self) -> &[(Noun, Version)] {
        &self.entries
    }

    /// The version of `key` in this snapshot, if the key was present.
    pub fn version_of(&self, key: &Noun) -> Option<Version> {
        let nskey = namespace::namespace(self.storage.namespace(), key);
        self.entries
            .iter()
            .find(|(entry, _)| *entry == nskey)
            .map(|(_, version)| *version)
    }

    /// The value of `key` as of this snapshot.
    ///
    /// Reads the live qualified table at the captured version; stable for
    /// the snapshot's lifetime since qualified rows never change.
    pub fn get(&self, key: &Noun) -> Option<Noun> {
        let version = self.version_of(key)?;
        let rows = self.storage.read_at_order(key, version).committed()?;
        rows.into_iter()
            .next()
            .and_then(|row| decode::<StoredValue>(&row.value).ok())
            .and_then(StoredValue::into_value)
    }

    /// Encode the snapshot as a noun: a list of `[nskey version]` cells.
    pub fn to_noun(&self) -> Noun {
        Noun::list(
            self.entries
                .iter()
                .map(|(nskey, version)| Noun::cell(nskey.clone(), Noun::atom(*version)))
                .collect::<Vec<_>>(),
        )
    }
}

impl<M: TableManager> Storage<M> {
    /// Capture the entire order table under one transaction.
    pub fn snapshot_order(&self) -> TxOutcome<Snapshot<M>> {
        let outcome = self.tables().transaction(|txn| {
            let rows = txn.select(self.order_table(), &KeyPattern::prefix(vec![]))?;
            rows.into_iter()
                .map(|row| Ok((row.key, decode::<Version>(&row.value)?)))
                .collect::<vellum_tables::Result<Vec<_>>>()
        });
        if let TxOutcome::Aborted(reason) = &outcome {
            warn!(%reason, "snapshot aborted");
        }
        outcome.map(|entries| Snapshot {
            storage: self.clone(),
            entries,
        })
    }

    /// Capture a snapshot and store it under `key` as an ordinary put.
    pub fn put_snapshot(&self, key: &Noun) -> TxOutcome<Version> {
        match self.snapshot_order() {
            TxOutcome::Committed(snapshot) => self.put(key, snapshot.to_noun()),
            TxOutcome::Aborted(reason) => TxOutcome::Aborted(reason),
        }
    }
}

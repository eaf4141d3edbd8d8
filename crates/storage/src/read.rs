//! Readers: current value, version-specific rows, and keyspace scans.
//!
//! Reads that fail transactionally degrade to absent rather than erroring;
//! the abort is logged. Version-specific reads return raw qualified rows
//! with keys denamespaced, for snapshot lookups.

use tracing::warn;
use vellum_tables::{KeyPattern, Row, TableManager, TableTxn, TxOutcome};
use vellum_types::{Noun, StoredValue, Version, decode};

use crate::namespace;
use crate::storage::Storage;
use crate::write::read_version;

/// Read the value at the key's current version inside a transaction.
///
/// Absent when the qualified row is missing or holds the tombstone.
fn current_value<T: TableTxn>(
    txn: &T,
    qualified_table: &str,
    nskey: &Noun,
    version: Version,
) -> vellum_tables::Result<Option<Noun>> {
    let qkey = namespace::qualified_key(version, nskey);
    match txn.read(qualified_table, &qkey)?.into_iter().next() {
        Some(row) => {
            let stored: StoredValue = decode(&row.value)?;
            Ok(stored.into_value())
        },
        None => Ok(None),
    }
}

impl<M: TableManager> Storage<M> {
    /// The value at the key's current version, or `None` when the key was
    /// never written or its latest write is a tombstone.
    pub fn get(&self, key: &Noun) -> Option<Noun> {
        let nskey = namespace::namespace(self.namespace(), key);
        let outcome = self.tables().transaction(|txn| {
            match read_version(txn, self.order_table(), &nskey)? {
                0 => Ok(None),
                version => current_value(txn, self.qualified_table(), &nskey, version),
            }
        });
        match outcome {
            TxOutcome::Committed(value) => value,
            TxOutcome::Aborted(reason) => {
                warn!(key = %key, %reason, "get aborted; treating as absent");
                None
            },
        }
    }

    /// The order row for a key, with its key denamespaced.
    pub fn read_order(&self, key: &Noun) -> TxOutcome<Vec<Row>> {
        let nskey = namespace::namespace(self.namespace(), key);
        let outcome = self
            .tables()
            .transaction(|txn| txn.read(self.order_table(), &nskey));
        self.denamespace_rows(outcome, |ns, row_key| namespace::denamespace(ns, row_key))
    }

    /// The qualified row at `(order, key)`, with its key denamespaced.
    pub fn read_at_order(&self, key: &Noun, order: Version) -> TxOutcome<Vec<Row>> {
        let nskey = namespace::namespace(self.namespace(), key);
        let qkey = namespace::qualified_key(order, &nskey);
        let outcome = self
            .tables()
            .transaction(|txn| txn.read(self.qualified_table(), &qkey));
        self.denamespace_rows(outcome, |ns, row_key| {
            namespace::denamespace_qualified(ns, row_key)
        })
    }

    /// Every `(key, value)` pair under the given key prefix, or `None` when
    /// any matched key is absent at its current version.
    ///
    /// Callers use this to materialize a coherent working set; a tombstone
    /// among the matches marks an inconsistency the caller is not prepared
    /// to handle, so the whole call is absent.
    pub fn get_keyspace(&self, prefix: &[Noun]) -> Option<Vec<(Noun, Noun)>> {
        let mut elements: Vec<Noun> = self
            .namespace()
            .iter()
            .cloned()
            .map(Noun::Atom)
            .collect();
        elements.extend(prefix.iter().cloned());
        let pattern = KeyPattern::prefix(elements);

        let outcome = self.tables().transaction(|txn| {
            let matched = txn.select(self.order_table(), &pattern)?;
            let mut entries = Vec::with_capacity(matched.len());
            for row in matched {
                let version: Version = decode(&row.value)?;
                match current_value(txn, self.qualified_table(), &row.key, version)? {
                    Some(value) => entries.push((row.key, value)),
                    None => return Ok(None),
                }
            }
            Ok(Some(entries))
        });

        let entries = match outcome {
            TxOutcome::Committed(Some(entries)) => entries,
            TxOutcome::Committed(None) => return None,
            TxOutcome::Aborted(reason) => {
                warn!(%reason, "keyspace read aborted; treating as absent");
                return None;
            },
        };
        entries
            .into_iter()
            .map(|(nskey, value)| {
                namespace::denamespace(self.namespace(), &nskey).map(|key| (key, value))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| warn!(%error, "keyspace row outside this namespace"))
            .ok()
    }

    /// Denamespace row keys of a committed outcome; a prefix mismatch turns
    /// the outcome into an abort (unreachable through this layer).
    fn denamespace_rows(
        &self,
        outcome: TxOutcome<Vec<Row>>,
        strip: impl Fn(&[vellum_types::Atom], &Noun) -> crate::error::Result<Noun>,
    ) -> TxOutcome<Vec<Row>> {
        match outcome {
            TxOutcome::Committed(rows) => {
                let stripped: crate::error::Result<Vec<Row>> = rows
                    .into_iter()
                    .map(|row| strip(self.namespace(), &row.key).map(|key| Row::new(key, row.value)))
                    .collect();
                match stripped {
                    Ok(rows) => TxOutcome::Committed(rows),
                    Err(error) => {
                        warn!(%error, "row key outside this namespace");
                        TxOutcome::Aborted(error.to_string())
                    },
                }
            },
            aborted => aborted,
        }
    }
}

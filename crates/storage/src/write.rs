//! The versioning core: writes that advance the per-key version counter.
//!
//! Every write commits two rows in one transaction: the order row holding
//! the key's latest version and the qualified row holding the value at its
//! `(version, key)` coordinate. Aborts are reported through the published
//! event and never retried here; callers retry by re-invoking.

use tracing::warn;
use vellum_tables::{Row, TableManager, TableTxn, TxOutcome};
use vellum_types::{Noun, StoredValue, Version, decode, encode};

use crate::events::StorageEvent;
use crate::namespace;
use crate::storage::Storage;

/// Read a key's current version inside a transaction; absent means zero.
pub(crate) fn read_version<T: TableTxn>(
    txn: &T,
    order_table: &str,
    nskey: &Noun,
) -> vellum_tables::Result<Version> {
    match txn.read(order_table, nskey)?.into_iter().next() {
        Some(row) => Ok(decode(&row.value)?),
        None => Ok(0),
    }
}

impl<M: TableManager> Storage<M> {
    /// Write `value` under `key` at the next version.
    ///
    /// Publishes a [`StorageEvent::Put`] carrying the outcome when a topic
    /// is configured. The committed result is the assigned version.
    pub fn put(&self, key: &Noun, value: Noun) -> TxOutcome<Version> {
        self.put_stored(key, StoredValue::Value(value))
    }

    /// Logical deletion: a put whose value is the tombstone.
    ///
    /// Advances the version like any other write; history stays intact.
    pub fn delete(&self, key: &Noun) -> TxOutcome<Version> {
        self.put_stored(key, StoredValue::Tombstone)
    }

    fn put_stored(&self, key: &Noun, value: StoredValue) -> TxOutcome<Version> {
        let nskey = namespace::namespace(self.namespace(), key);
        let outcome = self.tables().transaction(|txn| {
            let current = read_version(txn, self.order_table(), &nskey)?;
            let next = current + 1;
            txn.write(self.order_table(), Row::new(nskey.clone(), encode(&next)?))?;
            txn.write(
                self.qualified_table(),
                Row::new(namespace::qualified_key(next, &nskey), encode(&value)?),
            )?;
            Ok(next)
        });
        if let TxOutcome::Aborted(reason) = &outcome {
            warn!(key = %key, %reason, "put aborted");
        }
        self.publish(StorageEvent::Put {
            key: key.clone(),
            value,
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Write `value` under `key` at a caller-chosen version.
    ///
    /// A replay primitive: no read-then-increment happens, so the order
    /// table's monotonicity holds only if callers pass strictly increasing
    /// versions. Publishes a [`StorageEvent::Write`] when a topic is
    /// configured.
    pub fn write_at_order(&self, key: &Noun, value: Noun, order: Version) -> TxOutcome<()> {
        let stored = StoredValue::Value(value);
        let nskey = namespace::namespace(self.namespace(), key);
        let outcome = self.tables().transaction(|txn| {
            txn.write(self.order_table(), Row::new(nskey.clone(), encode(&order)?))?;
            txn.write(
                self.qualified_table(),
                Row::new(namespace::qualified_key(order, &nskey), encode(&stored)?),
            )?;
            Ok(())
        });
        if let TxOutcome::Aborted(reason) = &outcome {
            warn!(key = %key, order, %reason, "write_at_order aborted");
        }
        self.publish(StorageEvent::Write {
            key: key.clone(),
            value: stored,
            version: order,
            outcome: outcome.clone(),
        });
        outcome
    }
}

//! Blocking reads: await a specific `(version, key)` write.
//!
//! The caller names the exact qualified key `[version, key | 0]` it wants.
//! The protocol is subscribe-first, read-second: any write committed after
//! the subscription exists produces an event the waiter observes, and any
//! write committed before it is seen by the transactional read. No wakeup
//! can be lost. The waiter never times out here; cancellation is dropping
//! the future, which drops the subscription with it.

use snafu::ensure;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use vellum_tables::{TableManager, TableTxn, TxOutcome};
use vellum_types::{Noun, StoredValue, decode};

use crate::error::{BadShapeSnafu, BadVersionSnafu, Result, StreamClosedSnafu};
use crate::namespace;
use crate::storage::Storage;

impl<M: TableManager> Storage<M> {
    /// Return the value at `qkey`, blocking until that exact version is
    /// written.
    ///
    /// Rejects version zero and malformed qualified keys immediately. The
    /// returned value is whatever was stored at the coordinate, tombstone
    /// included.
    pub async fn blocking_read(&self, qkey: &Noun) -> Result<StoredValue> {
        // Reject early. The version check reads only the head element and
        // runs first, so a zero version outranks any deeper malformation.
        match qkey.as_cell().and_then(|(head, _)| head.as_atom()) {
            Some(version) => ensure!(!version.is_zero(), BadVersionSnafu),
            None => {
                return BadShapeSnafu {
                    key: qkey.to_string(),
                }
                .fail();
            },
        }
        namespace::split_qualified(qkey)?;

        // Subscription must exist before the presence check.
        let mut stream = self.tables().subscribe(self.qualified_table());
        let nsqkey = namespace::namespace_qualified(self.namespace(), qkey)?;

        if let Some(stored) = self.read_qualified_row(&nsqkey) {
            return Ok(stored);
        }

        debug!(key = %nsqkey, "awaiting qualified write");
        loop {
            match stream.recv().await {
                Ok(event) if event.key == nsqkey => return Ok(decode(&event.value)?),
                Ok(_) => {},
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, key = %nsqkey, "write stream lagged; re-checking table");
                    if let Some(stored) = self.read_qualified_row(&nsqkey) {
                        return Ok(stored);
                    }
                },
                Err(RecvError::Closed) => {
                    return StreamClosedSnafu {
                        key: nsqkey.to_string(),
                    }
                    .fail();
                },
            }
        }
    }

    /// One transactional read of the qualified row. Aborts degrade to
    /// absent, so the waiter keeps waiting.
    fn read_qualified_row(&self, nsqkey: &Noun) -> Option<StoredValue> {
        let outcome = self
            .tables()
            .transaction(|txn| txn.read(self.qualified_table(), nsqkey));
        match outcome {
            TxOutcome::Committed(rows) => rows
                .into_iter()
                .next()
                .and_then(|row| decode(&row.value).ok()),
            TxOutcome::Aborted(reason) => {
                warn!(key = %nsqkey, %reason, "qualified read aborted; still waiting");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vellum_tables::MemoryTables;

    use super::*;
    use crate::error::StorageError;
    use crate::storage::StorageConfig;

    fn storage() -> Storage<MemoryTables> {
        Storage::new(MemoryTables::new(), StorageConfig::default())
    }

    fn qualified(version: u64, key: &str) -> Noun {
        namespace::qualified_key(version, &Noun::from(key))
    }

    #[tokio::test]
    async fn version_zero_rejects_immediately() {
        let result = storage().blocking_read(&qualified(0, "z")).await;
        assert!(matches!(result, Err(StorageError::BadVersion)));
    }

    #[tokio::test]
    async fn version_zero_outranks_a_malformed_tail() {
        // Head is the zero atom but the tail is not [key | tail] shaped;
        // the version rejection wins.
        let bad = Noun::cell(Noun::from(0u64), Noun::from(5u64));
        let result = storage().blocking_read(&bad).await;
        assert!(matches!(result, Err(StorageError::BadVersion)));
    }

    #[tokio::test]
    async fn malformed_keys_reject_immediately() {
        let storage = storage();
        for bad in [
            Noun::from(1u64),
            Noun::cell(Noun::from(1u64), Noun::from(0u64)),
            Noun::cell(
                Noun::cell(Noun::from(1u64), Noun::from(2u64)),
                Noun::cell(Noun::from("k"), Noun::zero()),
            ),
        ] {
            let result = storage.blocking_read(&bad).await;
            assert!(matches!(result, Err(StorageError::BadShape { .. })));
        }
    }

    #[tokio::test]
    async fn present_rows_return_without_waiting() {
        let storage = storage();
        storage.put(&Noun::from("x"), Noun::from(42u64));
        let stored = storage
            .blocking_read(&qualified(1, "x"))
            .await
            .expect("present");
        assert_eq!(stored.as_value(), Some(&Noun::from(42u64)));
    }

    #[tokio::test]
    async fn waits_for_the_exact_version() {
        let storage = storage();
        let writer = storage.clone();
        let reader = tokio::spawn(async move {
            storage.blocking_read(&qualified(1, "y")).await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        writer.put(&Noun::from("y"), Noun::from("hello"));

        let stored = reader.await.expect("join").expect("present");
        assert_eq!(stored.as_value(), Some(&Noun::from("hello")));
    }

    #[tokio::test]
    async fn earlier_versions_do_not_wake_the_waiter() {
        let storage = storage();
        let writer = storage.clone();
        let reader = tokio::spawn(async move {
            storage.blocking_read(&qualified(2, "y")).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        writer.put(&Noun::from("y"), Noun::from("first"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!reader.is_finished(), "version 1 must not satisfy a version-2 wait");

        writer.put(&Noun::from("y"), Noun::from("second"));
        let stored = reader.await.expect("join").expect("present");
        assert_eq!(stored.as_value(), Some(&Noun::from("second")));
    }

    #[tokio::test]
    async fn tombstone_writes_wake_the_waiter() {
        let storage = storage();
        let writer = storage.clone();
        let reader = tokio::spawn(async move {
            storage.blocking_read(&qualified(2, "y")).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        writer.put(&Noun::from("y"), Noun::from(1u64));
        writer.delete(&Noun::from("y"));

        let stored = reader.await.expect("join").expect("present");
        assert!(stored.is_tombstone());
    }
}

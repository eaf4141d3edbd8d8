//! Table lifecycle: create, drop, and reset the three tables.
//!
//! Each per-table step is independent: one failure never stops the others.
//! Create/drop errors are swallowed and logged; the combined outcome is
//! acceptable as long as no table is missing afterwards.

use tracing::{debug, info, warn};
use vellum_tables::{Error, TableManager, TxOutcome};

use crate::commitment::CommitmentTree;
use crate::events::StorageEvent;
use crate::storage::Storage;

fn delete_outcome(result: vellum_tables::Result<()>) -> TxOutcome<()> {
    match result {
        Ok(()) => TxOutcome::Committed(()),
        Err(error) => TxOutcome::Aborted(error.to_string()),
    }
}

impl<M: TableManager> Storage<M> {
    /// Ensure the three tables exist. Idempotent.
    pub fn setup(&self) {
        for table in [
            self.order_table(),
            self.qualified_table(),
            self.commitments_table(),
        ] {
            match self.tables().create_table(table) {
                Ok(()) => info!(table, "created table"),
                Err(Error::TableExists { .. }) => debug!(table, "table already exists"),
                Err(error) => warn!(table, %error, "table creation failed"),
            }
        }
    }

    /// Drop the three tables, publishing a deletion event per table.
    pub fn remove(&self) {
        let qualified = delete_outcome(self.tables().delete_table(self.qualified_table()));
        self.publish(StorageEvent::DeleteQualified(qualified.clone()));

        let ordering = delete_outcome(self.tables().delete_table(self.order_table()));
        self.publish(StorageEvent::DeleteOrdering(ordering.clone()));

        let commitments = delete_outcome(self.tables().delete_table(self.commitments_table()));
        self.publish(StorageEvent::DeleteCommitments(commitments.clone()));

        for (table, outcome) in [
            (self.qualified_table(), qualified),
            (self.order_table(), ordering),
            (self.commitments_table(), commitments),
        ] {
            match outcome {
                TxOutcome::Committed(()) => info!(table, "dropped table"),
                TxOutcome::Aborted(reason) => debug!(table, %reason, "table drop skipped"),
            }
        }
    }

    /// Drop and recreate the tables. Idempotent.
    pub fn ensure_new(&self) {
        self.remove();
        self.setup();
    }

    /// The commitment-tree accumulator bound to this handle's table.
    pub fn commitment_tree(&self) -> CommitmentTree<M> {
        CommitmentTree::new(self.tables().clone(), self.commitments_table())
    }
}

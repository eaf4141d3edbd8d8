//! In-memory table backend.
//!
//! Single-writer commit model:
//! - committed state lives behind an `ArcSwap`; transactions capture it once
//! - transactions and DDL serialize through one `parking_lot::Mutex`
//! - writes buffer in the transaction and apply copy-on-write at table
//!   granularity on commit
//! - write events broadcast after the state swap, before the writer lock
//!   releases, so a receiver that existed before a commit always observes
//!   that commit's events

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use snafu::{OptionExt, ensure};
use tokio::sync::broadcast;
use tracing::debug;
use vellum_types::Noun;

use crate::error::{NoSuchTableSnafu, Result, TableExistsSnafu};
use crate::manager::{Row, TableEvent, TableManager, TableTxn, TxOutcome};
use crate::pattern::KeyPattern;

/// Rows of one table, ordered by key.
type TableData = BTreeMap<Noun, Vec<u8>>;

/// The committed tables. Cloning is cheap: per-table data is shared until a
/// commit writes to it.
#[derive(Debug, Default, Clone)]
struct CommittedTables {
    tables: HashMap<String, Arc<TableData>>,
}

struct Shared {
    state: ArcSwap<CommittedTables>,
    /// Serializes transactions and DDL (single-writer model).
    txn_lock: Mutex<()>,
    /// Per-table write streams, created on first subscribe.
    streams: RwLock<HashMap<String, broadcast::Sender<TableEvent>>>,
}

/// Default capacity of a table's write stream.
const DEFAULT_STREAM_CAPACITY: usize = 1024;

/// In-memory implementation of [`TableManager`].
///
/// Cheaply cloneable; clones share state, so handles with distinct
/// namespaces can point at the same physical tables.
#[derive(Clone)]
pub struct MemoryTables {
    shared: Arc<Shared>,
    stream_capacity: usize,
}

impl MemoryTables {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::with_stream_capacity(DEFAULT_STREAM_CAPACITY)
    }

    /// Create an empty backend with a custom write-stream capacity.
    pub fn with_stream_capacity(stream_capacity: usize) -> Self {
        MemoryTables {
            shared: Arc::new(Shared {
                state: ArcSwap::from_pointee(CommittedTables::default()),
                txn_lock: Mutex::new(()),
                streams: RwLock::new(HashMap::new()),
            }),
            stream_capacity,
        }
    }
}

impl Default for MemoryTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Transaction over a captured state snapshot plus a write buffer.
pub struct MemoryTxn {
    base: Arc<CommittedTables>,
    writes: Vec<(String, Row)>,
}

impl MemoryTxn {
    fn table(&self, name: &str) -> Result<&TableData> {
        self.base
            .tables
            .get(name)
            .map(Arc::as_ref)
            .context(NoSuchTableSnafu { name })
    }
}

impl TableTxn for MemoryTxn {
    fn read(&self, table: &str, key: &Noun) -> Result<Vec<Row>> {
        let data = self.table(table)?;
        // Later writes in the same transaction shadow earlier state.
        for (name, row) in self.writes.iter().rev() {
            if name == table && row.key == *key {
                return Ok(vec![row.clone()]);
            }
        }
        Ok(data
            .get(key)
            .map(|value| Row::new(key.clone(), value.clone()))
            .into_iter()
            .collect())
    }

    fn write(&mut self, table: &str, row: Row) -> Result<()> {
        self.table(table)?;
        self.writes.push((table.to_string(), row));
        Ok(())
    }

    fn select(&self, table: &str, pattern: &KeyPattern) -> Result<Vec<Row>> {
        let data = self.table(table)?;
        let mut merged: TableData = data
            .iter()
            .filter(|(key, _)| pattern.matches(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for (name, row) in &self.writes {
            if name == table && pattern.matches(&row.key) {
                merged.insert(row.key.clone(), row.value.clone());
            }
        }
        Ok(merged
            .into_iter()
            .map(|(key, value)| Row::new(key, value))
            .collect())
    }
}

impl TableManager for MemoryTables {
    type Txn = MemoryTxn;

    fn create_table(&self, name: &str) -> Result<()> {
        let _guard = self.shared.txn_lock.lock();
        let current = self.shared.state.load_full();
        ensure!(
            !current.tables.contains_key(name),
            TableExistsSnafu { name }
        );
        let mut next = (*current).clone();
        next.tables.insert(name.to_string(), Arc::new(TableData::new()));
        self.shared.state.store(Arc::new(next));
        debug!(table = name, "created table");
        Ok(())
    }

    fn delete_table(&self, name: &str) -> Result<()> {
        let _guard = self.shared.txn_lock.lock();
        let current = self.shared.state.load_full();
        ensure!(
            current.tables.contains_key(name),
            NoSuchTableSnafu { name }
        );
        let mut next = (*current).clone();
        next.tables.remove(name);
        self.shared.state.store(Arc::new(next));
        debug!(table = name, "deleted table");
        Ok(())
    }

    fn transaction<R, F>(&self, f: F) -> TxOutcome<R>
    where
        F: FnOnce(&mut Self::Txn) -> Result<R>,
    {
        let _guard = self.shared.txn_lock.lock();
        let base = self.shared.state.load_full();
        let mut txn = MemoryTxn {
            base: Arc::clone(&base),
            writes: Vec::new(),
        };
        match f(&mut txn) {
            Ok(result) => {
                let writes = txn.writes;
                if !writes.is_empty() {
                    let mut next = (*base).clone();
                    for (table, row) in &writes {
                        if let Some(data) = next.tables.get_mut(table) {
                            Arc::make_mut(data).insert(row.key.clone(), row.value.clone());
                        }
                    }
                    self.shared.state.store(Arc::new(next));
                    // Emitted under the transaction lock: a receiver obtained
                    // before this commit cannot miss these events.
                    let streams = self.shared.streams.read();
                    for (table, row) in writes {
                        if let Some(sender) = streams.get(&table) {
                            let _ = sender.send(TableEvent {
                                table,
                                key: row.key,
                                value: row.value,
                            });
                        }
                    }
                }
                TxOutcome::Committed(result)
            },
            Err(error) => TxOutcome::Aborted(error.to_string()),
        }
    }

    fn subscribe(&self, table: &str) -> broadcast::Receiver<TableEvent> {
        if let Some(sender) = self.shared.streams.read().get(table) {
            return sender.subscribe();
        }
        let mut streams = self.shared.streams.write();
        streams
            .entry(table.to_string())
            .or_insert_with(|| broadcast::channel(self.stream_capacity).0)
            .subscribe()
    }
}

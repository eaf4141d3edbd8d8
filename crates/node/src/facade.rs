//! The storage facade: a mailbox actor over one [`Storage`] handle.
//!
//! Requests are serialized through one mpsc channel and processed in FIFO
//! order, so a call issued after a cast observes the cast's effects. Calls
//! carry a oneshot reply channel; casts do not. [`StorageHandle::blocking_read`]
//! bypasses the mailbox entirely: it acquires the storage via a synchronous
//! `state` call and then drives the table manager directly, since a waiter
//! may suspend for an unbounded time and must not clog the mailbox.

use snafu::Snafu;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use vellum_storage::{Snapshot, Storage, StorageError, TREE_ARITY, TREE_DEPTH};
use vellum_tables::{Row, TableManager, TxOutcome};
use vellum_types::{Noun, StoredValue, Version};

/// Mailbox depth before casts apply backpressure.
const MAILBOX_CAPACITY: usize = 256;

/// Error type for facade interactions.
#[derive(Debug, Snafu)]
pub enum FacadeError {
    /// The facade task is not running.
    #[snafu(display("Storage facade is not running"))]
    Closed,

    /// A storage operation failed.
    #[snafu(context(false), display("{source}"))]
    Storage {
        /// The underlying storage error.
        source: StorageError,
    },
}

/// Result type for facade interactions.
pub type Result<T, E = FacadeError> = std::result::Result<T, E>;

/// A request in the facade mailbox.
pub enum StorageRequest<M: TableManager> {
    /// Call: the storage handle itself.
    State {
        /// Reply channel.
        reply: oneshot::Sender<Storage<M>>,
    },
    /// Call: current value of a key.
    Get {
        /// Logical key.
        key: Noun,
        /// Reply channel.
        reply: oneshot::Sender<Option<Noun>>,
    },
    /// Call: all pairs under a key prefix, all-or-nothing.
    GetKeyspace {
        /// Key prefix elements.
        prefix: Vec<Noun>,
        /// Reply channel.
        reply: oneshot::Sender<Option<Vec<(Noun, Noun)>>>,
    },
    /// Call: the order row for a key.
    ReadOrder {
        /// Logical key.
        key: Noun,
        /// Reply channel.
        reply: oneshot::Sender<TxOutcome<Vec<Row>>>,
    },
    /// Call: the qualified row at a specific version.
    ReadAtOrder {
        /// Logical key.
        key: Noun,
        /// Version to read at.
        order: Version,
        /// Reply channel.
        reply: oneshot::Sender<TxOutcome<Vec<Row>>>,
    },
    /// Call: a consistent capture of the order map.
    SnapshotOrder {
        /// Reply channel.
        reply: oneshot::Sender<TxOutcome<Snapshot<M>>>,
    },
    /// Cast: ensure the tables exist.
    Setup,
    /// Cast: drop the tables, publishing deletion events.
    Remove,
    /// Cast: drop and recreate the tables.
    EnsureNew,
    /// Cast: write a value at the next version.
    Put {
        /// Logical key.
        key: Noun,
        /// Value to store.
        value: Noun,
    },
    /// Cast: write a tombstone at the next version.
    DeleteKey {
        /// Logical key.
        key: Noun,
    },
    /// Cast: write a value at a caller-chosen version.
    WriteAtOrder {
        /// Logical key.
        key: Noun,
        /// Value to store.
        value: Noun,
        /// Forced version.
        order: Version,
    },
    /// Cast: capture a snapshot and store it under a key.
    PutSnapshot {
        /// Key to store the snapshot under.
        key: Noun,
    },
}

/// The facade task: owns the storage and drains the mailbox.
pub struct StorageNode<M: TableManager> {
    storage: Storage<M>,
    mailbox: mpsc::Receiver<StorageRequest<M>>,
}

impl<M: TableManager> StorageNode<M> {
    /// Spawn the facade task over `storage`, returning its handle.
    ///
    /// The storage's constructor has already ensured the tables exist; the
    /// commitment tree is bound over the commitments table here.
    pub fn spawn(storage: Storage<M>) -> StorageHandle<M> {
        let commitments = storage.commitment_tree();
        debug!(
            depth = TREE_DEPTH,
            arity = TREE_ARITY,
            bound = commitments.root().is_committed(),
            "commitment tree bound"
        );

        let (requests, mailbox) = mpsc::channel(MAILBOX_CAPACITY);
        let node = StorageNode { storage, mailbox };
        tokio::spawn(node.run());
        StorageHandle { requests }
    }

    async fn run(mut self) {
        while let Some(request) = self.mailbox.recv().await {
            self.handle(request);
        }
        debug!("storage facade stopped");
    }

    fn handle(&mut self, request: StorageRequest<M>) {
        match request {
            StorageRequest::State { reply } => {
                let _ = reply.send(self.storage.clone());
            },
            StorageRequest::Get { key, reply } => {
                let _ = reply.send(self.storage.get(&key));
            },
            StorageRequest::GetKeyspace { prefix, reply } => {
                let _ = reply.send(self.storage.get_keyspace(&prefix));
            },
            StorageRequest::ReadOrder { key, reply } => {
                let _ = reply.send(self.storage.read_order(&key));
            },
            StorageRequest::ReadAtOrder { key, order, reply } => {
                let _ = reply.send(self.storage.read_at_order(&key, order));
            },
            StorageRequest::SnapshotOrder { reply } => {
                let _ = reply.send(self.storage.snapshot_order());
            },
            StorageRequest::Setup => self.storage.setup(),
            StorageRequest::Remove => self.storage.remove(),
            StorageRequest::EnsureNew => self.storage.ensure_new(),
            StorageRequest::Put { key, value } => {
                self.storage.put(&key, value);
            },
            StorageRequest::DeleteKey { key } => {
                self.storage.delete(&key);
            },
            StorageRequest::WriteAtOrder { key, value, order } => {
                self.storage.write_at_order(&key, value, order);
            },
            StorageRequest::PutSnapshot { key } => {
                self.storage.put_snapshot(&key);
            },
        }
    }
}

/// Client side of the facade mailbox.
///
/// Cheaply cloneable; all clones feed the same FIFO mailbox.
pub struct StorageHandle<M: TableManager> {
    requests: mpsc::Sender<StorageRequest<M>>,
}

impl<M: TableManager> Clone for StorageHandle<M> {
    fn clone(&self) -> Self {
        StorageHandle {
            requests: self.requests.clone(),
        }
    }
}

impl<M: TableManager> StorageHandle<M> {
    async fn call<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<R>) -> StorageRequest<M>,
    ) -> Result<R> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(make(reply))
            .await
            .map_err(|_| FacadeError::Closed)?;
        response.await.map_err(|_| FacadeError::Closed)
    }

    async fn cast(&self, request: StorageRequest<M>) -> Result<()> {
        self.requests
            .send(request)
            .await
            .map_err(|_| FacadeError::Closed)
    }

    /// Call: the storage handle behind the facade.
    pub async fn state(&self) -> Result<Storage<M>> {
        self.call(|reply| StorageRequest::State { reply }).await
    }

    /// Call: current value of `key`.
    pub async fn get(&self, key: Noun) -> Result<Option<Noun>> {
        self.call(|reply| StorageRequest::Get { key, reply }).await
    }

    /// Call: all `(key, value)` pairs under `prefix`, all-or-nothing.
    pub async fn get_keyspace(&self, prefix: Vec<Noun>) -> Result<Option<Vec<(Noun, Noun)>>> {
        self.call(|reply| StorageRequest::GetKeyspace { prefix, reply })
            .await
    }

    /// Call: the order row for `key`.
    pub async fn read_order(&self, key: Noun) -> Result<TxOutcome<Vec<Row>>> {
        self.call(|reply| StorageRequest::ReadOrder { key, reply })
            .await
    }

    /// Call: the qualified row for `key` at `order`.
    pub async fn read_at_order(&self, key: Noun, order: Version) -> Result<TxOutcome<Vec<Row>>> {
        self.call(|reply| StorageRequest::ReadAtOrder { key, order, reply })
            .await
    }

    /// Call: a consistent capture of the order map.
    pub async fn snapshot_order(&self) -> Result<TxOutcome<Snapshot<M>>> {
        self.call(|reply| StorageRequest::SnapshotOrder { reply })
            .await
    }

    /// Cast: ensure the tables exist.
    pub async fn setup(&self) -> Result<()> {
        self.cast(StorageRequest::Setup).await
    }

    /// Cast: drop the tables, publishing deletion events.
    pub async fn remove(&self) -> Result<()> {
        self.cast(StorageRequest::Remove).await
    }

    /// Cast: drop and recreate the tables.
    pub async fn ensure_new(&self) -> Result<()> {
        self.cast(StorageRequest::EnsureNew).await
    }

    /// Cast: write `value` under `key` at the next version.
    pub async fn put(&self, key: Noun, value: Noun) -> Result<()> {
        self.cast(StorageRequest::Put { key, value }).await
    }

    /// Cast: write a tombstone under `key` at the next version.
    pub async fn delete_key(&self, key: Noun) -> Result<()> {
        self.cast(StorageRequest::DeleteKey { key }).await
    }

    /// Cast: write `value` under `key` at a caller-chosen version.
    pub async fn write_at_order(&self, key: Noun, value: Noun, order: Version) -> Result<()> {
        self.cast(StorageRequest::WriteAtOrder { key, value, order })
            .await
    }

    /// Cast: capture a snapshot and store it under `key`.
    pub async fn put_snapshot(&self, key: Noun) -> Result<()> {
        self.cast(StorageRequest::PutSnapshot { key }).await
    }

    /// Await the value at an explicit qualified key `[version, key | 0]`.
    ///
    /// Bypasses the mailbox: acquires the storage via `state`, then drives
    /// the table manager directly, so an unbounded wait never blocks other
    /// requests.
    pub async fn blocking_read(&self, qkey: &Noun) -> Result<StoredValue> {
        let storage = self.state().await?;
        Ok(storage.blocking_read(qkey).await?)
    }
}

//! Shared helpers for facade integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use vellum_node::facade::{StorageHandle, StorageNode};
use vellum_storage::{Storage, StorageConfig, Topic};
use vellum_tables::MemoryTables;
use vellum_types::Atom;

/// Polling interval for [`eventually`].
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Spawn a facade over fresh in-memory tables, no topic.
pub fn spawn_node() -> StorageHandle<MemoryTables> {
    StorageNode::spawn(Storage::new(MemoryTables::new(), StorageConfig::default()))
}

/// Spawn a facade publishing on a topic.
pub fn spawn_node_with_topic() -> (StorageHandle<MemoryTables>, Topic) {
    let topic = Topic::new(64);
    let storage = Storage::with_topic(
        MemoryTables::new(),
        StorageConfig::default(),
        topic.clone(),
    );
    (StorageNode::spawn(storage), topic)
}

/// Spawn a facade under a one-element namespace, over shared tables.
pub fn spawn_namespaced(tables: MemoryTables, element: &str) -> StorageHandle<MemoryTables> {
    let config = StorageConfig::with_namespace(vec![Atom::from(element)]);
    StorageNode::spawn(Storage::new(tables, config))
}

/// Polls an async condition until it holds or the timeout expires.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL).await;
    }
}

//! End-to-end tests of the storage request API.
//!
//! Each test drives a facade over fresh in-memory tables. Casts followed by
//! calls need no synchronization: the mailbox serializes them in FIFO order.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::time::Duration;

use vellum_node::FacadeError;
use vellum_storage::StorageError;
use vellum_tables::MemoryTables;
use vellum_types::{Noun, StoredValue, decode};

fn list(parts: &[&str]) -> Noun {
    Noun::list(parts.iter().map(|p| Noun::from(*p)))
}

fn qualified(version: u64, key: &str) -> Noun {
    Noun::cell(
        Noun::atom(version),
        Noun::cell(Noun::from(key), Noun::zero()),
    )
}

#[tokio::test]
async fn put_then_get() {
    let node = common::spawn_node();
    node.put(Noun::from("x"), Noun::from(42u64)).await.unwrap();
    assert_eq!(
        node.get(Noun::from("x")).await.unwrap(),
        Some(Noun::from(42u64))
    );

    let order = node
        .read_order(Noun::from("x"))
        .await
        .unwrap()
        .committed()
        .expect("committed");
    assert_eq!(order.len(), 1);
    assert_eq!(order[0].key, Noun::from("x"));
    assert_eq!(decode::<u64>(&order[0].value).unwrap(), 1);
}

#[tokio::test]
async fn versions_accumulate_and_stay_readable() {
    let node = common::spawn_node();
    let key = Noun::from("x");
    for value in ["v1", "v2", "v3"] {
        node.put(key.clone(), Noun::from(value)).await.unwrap();
    }
    assert_eq!(node.get(key.clone()).await.unwrap(), Some(Noun::from("v3")));

    let rows = node
        .read_at_order(key, 2)
        .await
        .unwrap()
        .committed()
        .expect("committed");
    assert_eq!(rows.len(), 1);
    let stored: StoredValue = decode(&rows[0].value).unwrap();
    assert_eq!(stored.as_value(), Some(&Noun::from("v2")));
}

#[tokio::test]
async fn delete_tombstones_but_keeps_history() {
    let node = common::spawn_node();
    let key = Noun::from("x");
    node.put(key.clone(), Noun::from(7u64)).await.unwrap();
    node.delete_key(key.clone()).await.unwrap();

    assert_eq!(node.get(key.clone()).await.unwrap(), None);

    let order = node
        .read_order(key.clone())
        .await
        .unwrap()
        .committed()
        .expect("committed");
    assert_eq!(decode::<u64>(&order[0].value).unwrap(), 2);

    let rows = node
        .read_at_order(key, 2)
        .await
        .unwrap()
        .committed()
        .expect("committed");
    let stored: StoredValue = decode(&rows[0].value).unwrap();
    assert!(stored.is_tombstone());
}

#[tokio::test]
async fn blocking_read_waits_for_the_write() {
    let node = common::spawn_node();
    let reader = {
        let node = node.clone();
        tokio::spawn(async move { node.blocking_read(&qualified(1, "y")).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    node.put(Noun::from("y"), Noun::from("hello")).await.unwrap();

    let stored = reader.await.unwrap().expect("present");
    assert_eq!(stored.as_value(), Some(&Noun::from("hello")));
}

#[tokio::test]
async fn blocking_read_rejects_version_zero() {
    let node = common::spawn_node();
    let result = node.blocking_read(&qualified(0, "z")).await;
    assert!(matches!(
        result,
        Err(FacadeError::Storage {
            source: StorageError::BadVersion
        })
    ));
}

#[tokio::test]
async fn keyspace_is_all_or_nothing() {
    let node = common::spawn_node();
    node.put(list(&["a", "1"]), Noun::from(10u64)).await.unwrap();
    node.put(list(&["a", "2"]), Noun::from(20u64)).await.unwrap();

    let entries = node
        .get_keyspace(vec![Noun::from("a")])
        .await
        .unwrap()
        .expect("present");
    assert_eq!(entries.len(), 2);

    node.delete_key(list(&["a", "1"])).await.unwrap();
    assert_eq!(node.get_keyspace(vec![Noun::from("a")]).await.unwrap(), None);
}

#[tokio::test]
async fn snapshots_survive_later_writes() {
    let node = common::spawn_node();
    let key = Noun::from("k");
    node.put(key.clone(), Noun::from("v1")).await.unwrap();

    let snapshot = node
        .snapshot_order()
        .await
        .unwrap()
        .committed()
        .expect("committed");
    node.put(key.clone(), Noun::from("v2")).await.unwrap();

    assert_eq!(snapshot.get(&key), Some(Noun::from("v1")));
    assert_eq!(node.get(key).await.unwrap(), Some(Noun::from("v2")));
}

#[tokio::test]
async fn put_snapshot_stores_the_capture() {
    let node = common::spawn_node();
    node.put(Noun::from("a"), Noun::from(1u64)).await.unwrap();
    node.put_snapshot(Noun::from("snap")).await.unwrap();

    let stored = node
        .get(Noun::from("snap"))
        .await
        .unwrap()
        .expect("snapshot stored");
    let (entries, _) = stored.elements();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn namespaces_isolate_shared_tables() {
    let tables = MemoryTables::new();
    let a = common::spawn_namespaced(tables.clone(), "A");
    let b = common::spawn_namespaced(tables, "B");

    let key = Noun::from("k");
    a.put(key.clone(), Noun::from(1u64)).await.unwrap();
    b.put(key.clone(), Noun::from(2u64)).await.unwrap();

    assert_eq!(a.get(key.clone()).await.unwrap(), Some(Noun::from(1u64)));
    assert_eq!(b.get(key).await.unwrap(), Some(Noun::from(2u64)));
}

#[tokio::test]
async fn calls_observe_earlier_casts() {
    let node = common::spawn_node();
    // No barrier between the cast and the call: FIFO processing is the
    // causality guarantee under test.
    node.put(Noun::from("x"), Noun::from(1u64)).await.unwrap();
    assert_eq!(
        node.get(Noun::from("x")).await.unwrap(),
        Some(Noun::from(1u64))
    );
}

#[tokio::test]
async fn ensure_new_resets_the_tables() {
    let node = common::spawn_node();
    node.put(Noun::from("x"), Noun::from(1u64)).await.unwrap();
    node.ensure_new().await.unwrap();
    assert_eq!(node.get(Noun::from("x")).await.unwrap(), None);

    // The reset tables are writable again, versions restarting at 1.
    node.put(Noun::from("x"), Noun::from(2u64)).await.unwrap();
    let order = node
        .read_order(Noun::from("x"))
        .await
        .unwrap()
        .committed()
        .expect("committed");
    assert_eq!(decode::<u64>(&order[0].value).unwrap(), 1);
}

#[tokio::test]
async fn state_returns_a_live_handle() {
    let node = common::spawn_node();
    node.put(Noun::from("x"), Noun::from(1u64)).await.unwrap();

    let storage = node.state().await.unwrap();
    assert_eq!(storage.get(&Noun::from("x")), Some(Noun::from(1u64)));
}

#[tokio::test]
async fn write_at_order_replays_a_specific_version() {
    let node = common::spawn_node();
    let key = Noun::from("x");
    node.write_at_order(key.clone(), Noun::from("replayed"), 5)
        .await
        .unwrap();

    assert!(common::eventually(Duration::from_secs(1), || {
        let node = node.clone();
        let key = key.clone();
        async move { node.get(key).await.unwrap() == Some(Noun::from("replayed")) }
    })
    .await);
}

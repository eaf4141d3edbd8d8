//! Vellum node binary.
//!
//! Starts a storage facade over an in-memory table backend and logs every
//! published write event until shut down.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults
//! vellum
//!
//! # Start under a namespace, with environment variables
//! VELLUM_NAMESPACE=sys,acct vellum
//! ```

use std::io::IsTerminal;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vellum_node::facade::StorageNode;
use vellum_node::{Config, shutdown};
use vellum_storage::{Storage, Topic};
use vellum_tables::MemoryTables;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(std::io::stdout().is_terminal())
        .init();
}

#[tokio::main]
async fn main() {
    let config = Config::parse();
    init_logging();

    let tables = MemoryTables::new();
    let storage_config = config.storage_config();
    let topic = (config.topic_capacity > 0).then(|| Topic::new(config.topic_capacity));

    let storage = match &topic {
        Some(topic) => Storage::with_topic(tables, storage_config, topic.clone()),
        None => Storage::new(tables, storage_config),
    };

    if let Some(topic) = &topic {
        let mut events = topic.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => info!(?event, "published"),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event log lagged");
                    },
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    let _handle = StorageNode::spawn(storage);
    info!(
        namespace = ?config.namespace,
        order_table = %config.order_table,
        qualified_table = %config.qualified_table,
        commitments_table = %config.commitments_table,
        "vellum node running"
    );

    let cause = shutdown::wait().await;
    info!(?cause, "vellum node stopped");
}

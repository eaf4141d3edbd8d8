//! The storage handle.

use vellum_tables::TableManager;
use vellum_types::Atom;

use crate::events::{StorageEvent, Topic};

/// Table names and namespace for one storage handle.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Order table: namespaced key → latest version.
    pub order_table: String,
    /// Qualified table: `[version, namespaced key | 0]` → value.
    pub qualified_table: String,
    /// Commitments table backing the accumulator.
    pub commitments_table: String,
    /// Namespace prefix; empty for the root namespace.
    pub namespace: Vec<Atom>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            order_table: "vellum_order".to_string(),
            qualified_table: "vellum_qualified".to_string(),
            commitments_table: "vellum_commitments".to_string(),
            namespace: Vec::new(),
        }
    }
}

impl StorageConfig {
    /// Default table names under the given namespace.
    pub fn with_namespace(namespace: Vec<Atom>) -> Self {
        StorageConfig {
            namespace,
            ..StorageConfig::default()
        }
    }
}

/// A handle onto the shared tables.
///
/// The handle owns nothing exclusively: all state lives in the table
/// manager, and handles with distinct namespaces may share tables safely
/// because their key prefixes disambiguate. Construction idempotently
/// ensures the three tables exist.
#[derive(Clone)]
pub struct Storage<M: TableManager> {
    tables: M,
    config: StorageConfig,
    topic: Option<Topic>,
}

impl<M: TableManager> Storage<M> {
    /// Build a handle without a publish topic.
    pub fn new(tables: M, config: StorageConfig) -> Self {
        Self::build(tables, config, None)
    }

    /// Build a handle that publishes write events on `topic`.
    pub fn with_topic(tables: M, config: StorageConfig, topic: Topic) -> Self {
        Self::build(tables, config, Some(topic))
    }

    fn build(tables: M, config: StorageConfig, topic: Option<Topic>) -> Self {
        let storage = Storage {
            tables,
            config,
            topic,
        };
        storage.setup();
        storage
    }

    /// The underlying table manager.
    pub fn tables(&self) -> &M {
        &self.tables
    }

    /// This handle's configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// This handle's namespace prefix.
    pub fn namespace(&self) -> &[Atom] {
        &self.config.namespace
    }

    /// The publish topic, if configured.
    pub fn topic(&self) -> Option<&Topic> {
        self.topic.as_ref()
    }

    pub(crate) fn order_table(&self) -> &str {
        &self.config.order_table
    }

    pub(crate) fn qualified_table(&self) -> &str {
        &self.config.qualified_table
    }

    pub(crate) fn commitments_table(&self) -> &str {
        &self.config.commitments_table
    }

    /// Publish `event` if a topic is configured.
    pub(crate) fn publish(&self, event: StorageEvent) {
        if let Some(topic) = &self.topic {
            topic.cast(event);
        }
    }
}

//! Node configuration.
//!
//! Every field has a default, so a bare `vellum` invocation starts a usable
//! node; CLI flags and environment variables override per field.

use vellum_storage::StorageConfig;
use vellum_types::Atom;

/// Node configuration.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "vellum", about = "Versioned, namespaced key-value storage node")]
pub struct Config {
    /// Order table name.
    #[arg(long, env = "VELLUM_ORDER_TABLE", default_value = "vellum_order")]
    pub order_table: String,

    /// Qualified table name.
    #[arg(long, env = "VELLUM_QUALIFIED_TABLE", default_value = "vellum_qualified")]
    pub qualified_table: String,

    /// Commitments table name.
    #[arg(
        long,
        env = "VELLUM_COMMITMENTS_TABLE",
        default_value = "vellum_commitments"
    )]
    pub commitments_table: String,

    /// Namespace elements applied to every key, outermost first.
    #[arg(long = "namespace", env = "VELLUM_NAMESPACE", value_delimiter = ',')]
    pub namespace: Vec<String>,

    /// Capacity of the publish topic. Zero disables publishing.
    #[arg(long, env = "VELLUM_TOPIC_CAPACITY", default_value_t = 1024)]
    pub topic_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            order_table: "vellum_order".to_string(),
            qualified_table: "vellum_qualified".to_string(),
            commitments_table: "vellum_commitments".to_string(),
            namespace: Vec::new(),
            topic_capacity: 1024,
        }
    }
}

impl Config {
    /// The storage-layer view of this configuration.
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            order_table: self.order_table.clone(),
            qualified_table: self.qualified_table.clone(),
            commitments_table: self.commitments_table.clone(),
            namespace: self
                .namespace
                .iter()
                .map(|element| Atom::from(element.as_str()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_name_the_three_tables() {
        let config = Config::default();
        assert_eq!(config.order_table, "vellum_order");
        assert_eq!(config.qualified_table, "vellum_qualified");
        assert_eq!(config.commitments_table, "vellum_commitments");
        assert!(config.namespace.is_empty());
        assert_eq!(config.topic_capacity, 1024);
    }

    #[test]
    fn namespace_elements_become_atoms() {
        let config = Config {
            namespace: vec!["sys".to_string(), "acct".to_string()],
            ..Config::default()
        };
        let storage = config.storage_config();
        assert_eq!(
            storage.namespace,
            vec![Atom::from("sys"), Atom::from("acct")]
        );
    }
}

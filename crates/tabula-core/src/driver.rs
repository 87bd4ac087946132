//! Database driver trait definition

use crate::{Connection, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Core driver trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Unique identifier, also the connection string scheme (e.g. "sqlite")
    fn name(&self) -> &'static str;

    /// Create a new connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Parse a connection string into a configuration
    fn parse_connection_string(&self, conn_str: &str) -> Result<ConnectionConfig>;
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Driver ID (e.g., "sqlite")
    pub driver: String,
    /// Database name or file path
    pub database: Option<String>,
}

impl ConnectionConfig {
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            database: None,
        }
    }

    /// Create a SQLite configuration
    pub fn new_sqlite(database_path: &str) -> Self {
        Self {
            database: Some(database_path.to_string()),
            ..Self::new("sqlite")
        }
    }
}

/// Split `<scheme>://<rest>` (or `<scheme>:<rest>`) into its parts.
///
/// Returns `None` when there is no scheme separator at all.
pub fn split_connection_string(conn_str: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = conn_str.split_once(':')?;
    if scheme.is_empty() {
        return None;
    }
    Some((scheme, rest.strip_prefix("//").unwrap_or(rest)))
}

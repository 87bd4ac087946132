//! SQLite driver implementation

use async_trait::async_trait;
use std::sync::Arc;
use tabula_core::{
    Connection, ConnectionConfig, DatabaseDriver, Result, TabulaError, split_connection_string,
};

use crate::SqliteConnection;

/// SQLite database driver
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, config), fields(path = ?config.database))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let path = config.database.as_deref().ok_or_else(|| {
            TabulaError::Configuration(
                "SQLite requires a database path. Example: sqlite://./data/app.db".into(),
            )
        })?;

        let conn = SqliteConnection::open(path).map_err(|e| {
            tracing::error!(error = %e, "failed to connect to SQLite database");
            e
        })?;

        tracing::info!(path = %path, "SQLite connection created");
        Ok(Arc::new(conn))
    }

    fn parse_connection_string(&self, conn_str: &str) -> Result<ConnectionConfig> {
        let (scheme, location) = split_connection_string(conn_str).ok_or_else(|| {
            TabulaError::Configuration(format!("Invalid connection string: '{}'", conn_str))
        })?;
        if scheme != self.name() {
            return Err(TabulaError::Configuration(format!(
                "Connection string scheme '{}' is not handled by the SQLite driver",
                scheme
            )));
        }
        if location.is_empty() {
            return Err(TabulaError::Configuration(
                "SQLite connection string has no database path".into(),
            ));
        }
        Ok(ConnectionConfig::new_sqlite(location))
    }
}

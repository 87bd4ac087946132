//! Driver registry for managing available database drivers

use std::collections::HashMap;
use std::sync::Arc;
use tabula_core::{
    Connection, DatabaseDriver, Result, TabulaError, split_connection_string,
};

/// Registry of available database drivers
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(crate::sqlite::SqliteDriver::new()));

        registry
    }

    /// Register a new driver
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let name = driver.name().to_string();
        tracing::info!(driver = %name, "registering database driver");
        self.drivers.insert(name, driver);
    }

    /// Get a driver by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(name).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// List all registered driver names
    pub fn list(&self) -> Vec<&str> {
        self.drivers.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a driver is registered
    pub fn has(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Find the driver for a `<scheme>://...` connection string
    pub fn driver_for(&self, conn_str: &str) -> Result<Arc<dyn DatabaseDriver>> {
        let (scheme, _) = split_connection_string(conn_str).ok_or_else(|| {
            TabulaError::Configuration(format!(
                "Connection string has no driver scheme: '{}'",
                conn_str
            ))
        })?;
        self.get(scheme).ok_or_else(|| {
            TabulaError::Configuration(format!(
                "No driver registered for scheme '{}' (available: {})",
                scheme,
                self.list().join(", ")
            ))
        })
    }

    /// Parse a connection string and open a connection with the matching driver
    #[tracing::instrument(skip(self, conn_str))]
    pub async fn connect(&self, conn_str: &str) -> Result<Arc<dyn Connection>> {
        let driver = self.driver_for(conn_str)?;
        let config = driver.parse_connection_string(conn_str)?;
        tracing::debug!(driver = %driver.name(), "opening connection");
        driver.connect(&config).await
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

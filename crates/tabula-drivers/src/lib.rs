//! Tabula Drivers - Database driver implementations
//!
//! This crate provides concrete implementations of the database driver traits
//! defined in `tabula-core`, and a registry that resolves connection strings
//! to the driver that handles them.

#[cfg(feature = "sqlite")]
pub use tabula_driver_sqlite as sqlite;

mod registry;

pub use registry::DriverRegistry;

/// Re-export commonly used types from tabula-core
pub use tabula_core::{
    Connection, ConnectionConfig, DatabaseDriver, QueryResult, Result, Row, SchemaIntrospection,
    StatementResult, TabulaError, Transaction, Value,
};

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connects_through_registry_by_scheme() {
        let registry = DriverRegistry::with_defaults();
        let conn = registry
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory db");

        conn.execute(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
            &[],
        )
        .await
        .expect("Failed to create table");
        conn.execute("INSERT INTO users (name) VALUES ('Alice')", &[])
            .await
            .expect("Failed to insert");

        let result = conn
            .query("SELECT * FROM users", &[])
            .await
            .expect("Failed to query");
        assert_eq!(result.rows.len(), 1);
    }
}

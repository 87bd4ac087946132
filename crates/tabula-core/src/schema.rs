//! Schema introspection traits and types

use crate::Result;
use async_trait::async_trait;

/// Schema introspection interface
#[async_trait]
pub trait SchemaIntrospection: Send + Sync {
    /// Get the physical columns of a table, in ordinal order.
    ///
    /// Returns an empty list when the table does not exist; callers decide
    /// whether that is an error.
    async fn get_columns(&self, schema: Option<&str>, table: &str) -> Result<Vec<ColumnInfo>>;
}

/// Column information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub ordinal: usize,
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub is_primary_key: bool,
}

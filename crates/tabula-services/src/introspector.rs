//! Typed schema reflection
//!
//! The live schema is reflected on every request that needs it; nothing is
//! cached between requests.

use tabula_core::{ColumnInfo, Connection, TabulaError};

use crate::error::{ServiceError, ServiceResult};

/// The physical columns of one reflected table
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    table: String,
    columns: Vec<ColumnInfo>,
}

impl ColumnSet {
    /// Qualified name the set was reflected from, for error messages
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Look up a column that the catalog references
    pub fn require(&self, name: &str) -> ServiceResult<&ColumnInfo> {
        self.get(name).ok_or_else(|| ServiceError::SchemaReference {
            table: self.table.clone(),
            column: name.to_string(),
        })
    }

    /// Declared physical type, `None` when the column is missing or untyped
    pub fn data_type(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(|c| c.data_type.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

/// Reflects table structure through the connection's introspection interface
pub struct Introspector<'a> {
    connection: &'a dyn Connection,
}

impl<'a> Introspector<'a> {
    pub fn new(connection: &'a dyn Connection) -> Self {
        Self { connection }
    }

    /// Reflect a table's columns, failing with `TableNotFound` when it is absent
    #[tracing::instrument(skip(self))]
    pub async fn reflect(&self, table: &str, schema: Option<&str>) -> ServiceResult<ColumnSet> {
        let introspection = self.connection.as_schema_introspection().ok_or_else(|| {
            TabulaError::NotSupported(format!(
                "schema introspection for driver '{}'",
                self.connection.driver_name()
            ))
        })?;

        let columns = introspection.get_columns(schema, table).await?;
        let qualified = match schema {
            Some(s) => format!("{}.{}", s, table),
            None => table.to_string(),
        };

        if columns.is_empty() {
            tracing::debug!(table = %qualified, "table not found during reflection");
            return Err(ServiceError::TableNotFound(qualified));
        }

        tracing::debug!(table = %qualified, columns = columns.len(), "table reflected");
        Ok(ColumnSet {
            table: qualified,
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> ColumnSet {
        ColumnSet {
            table: "employees".into(),
            columns: vec![
                ColumnInfo {
                    name: "id".into(),
                    data_type: "INTEGER".into(),
                    is_primary_key: true,
                    ..Default::default()
                },
                ColumnInfo {
                    name: "note".into(),
                    ordinal: 1,
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn require_reports_table_and_column() {
        let columns = set();
        assert!(columns.require("id").is_ok());
        match columns.require("salary") {
            Err(ServiceError::SchemaReference { table, column }) => {
                assert_eq!(table, "employees");
                assert_eq!(column, "salary");
            }
            other => panic!("expected SchemaReference, got {:?}", other),
        }
    }

    #[test]
    fn untyped_columns_have_no_data_type() {
        let columns = set();
        assert_eq!(columns.data_type("id"), Some("INTEGER"));
        assert_eq!(columns.data_type("note"), None);
        assert_eq!(columns.data_type("missing"), None);
    }
}

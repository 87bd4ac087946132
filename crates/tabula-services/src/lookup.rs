//! Foreign-key value lists and display-to-key resolution
//!
//! Shared by the column-definition builder, the insert form and both
//! writers so the grid offers exactly the values the writer can resolve.

use tabula_catalog::ForeignKeyDescriptor;
use tabula_core::{Connection, Transaction, Value};

use crate::error::{ServiceError, ServiceResult};
use crate::introspector::{ColumnSet, Introspector};
use crate::sql::{escape_identifier_for, order_by_clause, param_placeholder, qualified_table_name};
use crate::values::parse_value;

/// A foreign-key descriptor bound to a driver's SQL dialect
pub(crate) struct ForeignKeyLookup<'a> {
    fk: &'a ForeignKeyDescriptor,
    driver: &'a str,
}

impl<'a> ForeignKeyLookup<'a> {
    pub(crate) fn new(fk: &'a ForeignKeyDescriptor, driver: &'a str) -> Self {
        Self { fk, driver }
    }

    fn referenced_table(&self) -> String {
        qualified_table_name(&self.fk.table_name, self.fk.schema_name.as_deref(), self.driver)
    }

    /// Reflect the referenced table and check the key and display columns exist
    pub(crate) async fn reflect(&self, connection: &dyn Connection) -> ServiceResult<ColumnSet> {
        let columns = Introspector::new(connection)
            .reflect(&self.fk.table_name, self.fk.schema_name.as_deref())
            .await?;
        columns.require(&self.fk.column_name)?;
        columns.require(&self.fk.column_display)?;
        Ok(columns)
    }

    /// Every display value of the referenced table, ordered per `order_by`.
    ///
    /// A plain SELECT, not DISTINCT: the key/display mapping is validated as
    /// a bijection at startup, and DISTINCT would forbid ordering by
    /// columns outside the select list on some databases.
    pub(crate) async fn display_values(
        &self,
        connection: &dyn Connection,
    ) -> ServiceResult<Vec<Value>> {
        let columns = self.reflect(connection).await?;
        for key in &self.fk.order_by {
            columns.require(&key.column)?;
        }

        let sql = format!(
            "SELECT {} FROM {}{}",
            escape_identifier_for(&self.fk.column_display, self.driver),
            self.referenced_table(),
            order_by_clause(&self.fk.order_by, self.driver)
        );
        tracing::debug!(sql = %sql, "loading foreign-key values");

        let result = connection.query(&sql, &[]).await?;
        Ok(result
            .rows
            .into_iter()
            .map(|row| row.values.into_iter().next().unwrap_or(Value::Null))
            .collect())
    }

    /// Resolve a display value to its key inside an open transaction.
    ///
    /// `display_type` is the referenced display column's physical type, used
    /// to bind the untyped input correctly.
    pub(crate) async fn resolve(
        &self,
        tx: &dyn Transaction,
        display: &str,
        display_type: Option<&str>,
    ) -> ServiceResult<Value> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            escape_identifier_for(&self.fk.column_name, self.driver),
            self.referenced_table(),
            escape_identifier_for(&self.fk.column_display, self.driver),
            param_placeholder(self.driver, 1)
        );
        // Input that cannot be bound as the display type matches no row
        let Ok(param) = parse_value(display, display_type) else {
            return Err(self.unresolved(display));
        };
        let mut result = tx.query(&sql, &[param]).await?;

        match result.rows.len() {
            0 => Err(self.unresolved(display)),
            1 => {
                let row = result.rows.remove(0);
                Ok(row.values.into_iter().next().unwrap_or(Value::Null))
            }
            n => Err(ServiceError::SchemaIntegrity(format!(
                "{} rows of `{}` have {} = '{}'; the lookup is no longer unique",
                n, self.fk.table_name, self.fk.column_display, display
            ))),
        }
    }

    fn unresolved(&self, display: &str) -> ServiceError {
        ServiceError::ForeignKeyResolution {
            table: self.fk.table_name.clone(),
            column: self.fk.column_display.clone(),
            value: display.to_string(),
        }
    }

    /// The aggregate used to prove the key/display mapping is 1:1
    pub(crate) fn uniqueness_sql(&self) -> String {
        format!(
            "SELECT COUNT(*), COUNT(DISTINCT {}), COUNT(DISTINCT {}) FROM {}",
            escape_identifier_for(&self.fk.column_name, self.driver),
            escape_identifier_for(&self.fk.column_display, self.driver),
            self.referenced_table()
        )
    }
}

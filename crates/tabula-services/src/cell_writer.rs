//! Transactional cell updates and row inserts
//!
//! Foreign-key columns are edited by display value; the writer resolves the
//! display value to its key inside the same transaction that writes it.

use tabula_catalog::{ColumnDescriptor, TableDescriptor};
use tabula_core::{Connection, Transaction, Value};

use crate::error::{ServiceError, ServiceResult};
use crate::introspector::{ColumnSet, Introspector};
use crate::lookup::ForeignKeyLookup;
use crate::sql::{escape_identifier_for, param_placeholder, qualified_table_name};
use crate::values::parse_value;

/// How one incoming value becomes a bound parameter
enum PendingValue<'a> {
    Null,
    Plain(Value),
    Lookup {
        lookup: ForeignKeyLookup<'a>,
        display: &'a str,
        display_type: Option<String>,
    },
}

impl PendingValue<'_> {
    async fn resolve(self, tx: &dyn Transaction) -> ServiceResult<Value> {
        match self {
            PendingValue::Null => Ok(Value::Null),
            PendingValue::Plain(value) => Ok(value),
            PendingValue::Lookup {
                lookup,
                display,
                display_type,
            } => lookup.resolve(tx, display, display_type.as_deref()).await,
        }
    }
}

pub struct CellWriter<'a> {
    connection: &'a dyn Connection,
}

impl<'a> CellWriter<'a> {
    pub fn new(connection: &'a dyn Connection) -> Self {
        Self { connection }
    }

    /// Update one cell of the row whose primary key is `row_id`.
    ///
    /// `new_value` is the untyped UI input (the display value for a
    /// foreign-key column); `None` stores NULL.
    #[tracing::instrument(skip(self, table, new_value), fields(table_name = %table.name))]
    pub async fn update(
        &self,
        table: &TableDescriptor,
        row_id: &str,
        column_name: &str,
        new_value: Option<&str>,
    ) -> ServiceResult<()> {
        let column = table
            .column(column_name)
            .ok_or_else(|| ServiceError::UnknownColumn {
                table: table.name.clone(),
                column: column_name.to_string(),
            })?;

        let driver = self.connection.driver_name();
        let schema = table.schema_name.as_deref();
        let physical = Introspector::new(self.connection)
            .reflect(&table.name, schema)
            .await?;
        let pk_name = &table.primary_key.name;
        physical.require(pk_name)?;
        physical.require(&column.name)?;

        let key = parse_value(row_id, physical.data_type(pk_name))?;
        let pending = self.pending_value(column, new_value, &physical).await?;

        let sql = format!(
            "UPDATE {} SET {} = {} WHERE {} = {}",
            qualified_table_name(&table.name, schema, driver),
            escape_identifier_for(&column.name, driver),
            param_placeholder(driver, 1),
            escape_identifier_for(pk_name, driver),
            param_placeholder(driver, 2)
        );

        let tx = self.connection.begin_transaction().await?;
        let outcome = async {
            let value = pending.resolve(tx.as_ref()).await?;
            tracing::debug!(sql = %sql, "updating cell");
            let result = tx.execute(&sql, &[value, key]).await?;
            if result.affected_rows == 0 {
                return Err(ServiceError::StaleRow {
                    table: table.name.clone(),
                    row_id: row_id.to_string(),
                });
            }
            Ok::<_, ServiceError>(result.affected_rows)
        }
        .await;

        let affected_rows = finish(tx, outcome).await?;
        tracing::info!(
            table_name = %table.name,
            column = %column.name,
            affected_rows = affected_rows,
            "Cell updated successfully"
        );
        Ok(())
    }

    /// Insert one row from `(column, value)` pairs.
    ///
    /// Names may include the primary key. A `None` value is left out when
    /// the column has a default (or is the primary key), otherwise it
    /// stores NULL.
    #[tracing::instrument(skip(self, table, values), fields(table_name = %table.name))]
    pub async fn insert(
        &self,
        table: &TableDescriptor,
        values: &[(String, Option<String>)],
    ) -> ServiceResult<()> {
        if values.is_empty() {
            return Err(ServiceError::InvalidValue(
                "No values provided for insert".to_string(),
            ));
        }

        let driver = self.connection.driver_name();
        let schema = table.schema_name.as_deref();
        let physical = Introspector::new(self.connection)
            .reflect(&table.name, schema)
            .await?;

        let mut columns = Vec::new();
        let mut pending = Vec::new();
        for (name, value) in values {
            if columns.contains(&name.as_str()) {
                return Err(ServiceError::InvalidValue(format!(
                    "Column `{}` given more than once",
                    name
                )));
            }
            let is_pk = *name == table.primary_key.name;
            let descriptor = table.column(name);
            if !is_pk && descriptor.is_none() {
                return Err(ServiceError::UnknownColumn {
                    table: table.name.clone(),
                    column: name.clone(),
                });
            }
            let info = physical.require(name)?;

            if value.is_none()
                && (is_pk
                    || info
                        .default_value
                        .as_ref()
                        .is_some_and(|d| !d.trim().is_empty()))
            {
                continue;
            }

            let next = match descriptor {
                Some(column) => self.pending_value(column, value.as_deref(), &physical).await?,
                None => match value {
                    Some(v) => PendingValue::Plain(parse_value(v, physical.data_type(name))?),
                    None => PendingValue::Null,
                },
            };
            columns.push(name.as_str());
            pending.push(next);
        }

        if columns.is_empty() {
            return Err(ServiceError::InvalidValue(
                "No values provided for insert".to_string(),
            ));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            qualified_table_name(&table.name, schema, driver),
            columns
                .iter()
                .map(|c| escape_identifier_for(c, driver))
                .collect::<Vec<_>>()
                .join(", "),
            (1..=columns.len())
                .map(|i| param_placeholder(driver, i))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let tx = self.connection.begin_transaction().await?;
        let outcome = async {
            let mut params = Vec::with_capacity(pending.len());
            for value in pending {
                params.push(value.resolve(tx.as_ref()).await?);
            }
            tracing::debug!(sql = %sql, "inserting row");
            Ok::<_, ServiceError>(tx.execute(&sql, &params).await?.affected_rows)
        }
        .await;

        finish(tx, outcome).await?;
        tracing::info!(table_name = %table.name, "Row inserted successfully");
        Ok(())
    }

    /// Work out, before any transaction is open, how a column's input will
    /// be bound
    async fn pending_value<'c>(
        &self,
        column: &'c ColumnDescriptor,
        input: Option<&'c str>,
        physical: &ColumnSet,
    ) -> ServiceResult<PendingValue<'c>>
    where
        'a: 'c,
    {
        let Some(input) = input else {
            return Ok(PendingValue::Null);
        };

        match &column.foreign_key {
            Some(fk) => {
                let connection: &'a dyn Connection = self.connection;
                let lookup = ForeignKeyLookup::new(fk, connection.driver_name());
                let referenced = lookup.reflect(connection).await?;
                Ok(PendingValue::Lookup {
                    display_type: referenced.data_type(&fk.column_display).map(str::to_string),
                    lookup,
                    display: input,
                })
            }
            None => {
                let column_type = column
                    .datatype
                    .as_deref()
                    .or_else(|| physical.data_type(&column.name));
                Ok(PendingValue::Plain(parse_value(input, column_type)?))
            }
        }
    }
}

/// Commit on success, roll back on any error
async fn finish(tx: Box<dyn Transaction>, outcome: ServiceResult<u64>) -> ServiceResult<u64> {
    match outcome {
        Ok(affected_rows) => {
            tx.commit().await?;
            Ok(affected_rows)
        }
        Err(e) => {
            tracing::debug!(error = %e, "rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
            Err(e)
        }
    }
}

//! Startup check that every foreign-key lookup is a 1:1 mapping

use std::ops::Deref;
use tabula_catalog::TableCatalog;
use tabula_core::{Connection, TabulaError, Value};

use crate::error::{ServiceError, ServiceResult};
use crate::lookup::ForeignKeyLookup;

/// A catalog whose foreign-key lookups were proven unique against the
/// live database.
///
/// Only [`ForeignKeyValidator::validate`] can build one, so serving code that
/// takes a `ValidatedCatalog` cannot run before validation.
#[derive(Debug, Clone)]
pub struct ValidatedCatalog {
    catalog: TableCatalog,
}

impl ValidatedCatalog {
    pub fn catalog(&self) -> &TableCatalog {
        &self.catalog
    }

    pub fn into_inner(self) -> TableCatalog {
        self.catalog
    }
}

impl Deref for ValidatedCatalog {
    type Target = TableCatalog;

    fn deref(&self) -> &Self::Target {
        &self.catalog
    }
}

pub struct ForeignKeyValidator;

impl ForeignKeyValidator {
    /// Check every foreign-key column of the catalog.
    ///
    /// For each lookup the referenced table must exist, both referenced
    /// columns must exist, and no key or display value may repeat or be NULL.
    /// The first violation aborts validation.
    #[tracing::instrument(skip_all)]
    pub async fn validate(
        catalog: TableCatalog,
        connection: &dyn Connection,
    ) -> ServiceResult<ValidatedCatalog> {
        let driver = connection.driver_name();
        let mut checked = 0usize;

        for (table, column, fk) in catalog.foreign_keys() {
            let lookup = ForeignKeyLookup::new(fk, driver);
            lookup.reflect(connection).await?;

            let result = connection.query(&lookup.uniqueness_sql(), &[]).await?;
            let counts = result
                .rows
                .first()
                .map(|row| row.values.iter().map(Value::as_i64).collect::<Vec<_>>())
                .unwrap_or_default();
            let (rows, keys, displays) = match counts.as_slice() {
                [Some(rows), Some(keys), Some(displays)] => (*rows, *keys, *displays),
                _ => {
                    return Err(TabulaError::Query(format!(
                        "unexpected uniqueness result for `{}`",
                        fk.table_name
                    ))
                    .into());
                }
            };

            tracing::debug!(
                table = %table.name,
                column = %column.name,
                referenced = %fk.table_name,
                rows,
                distinct_keys = keys,
                distinct_displays = displays,
                "foreign-key lookup checked"
            );

            if keys < rows || displays < rows {
                return Err(ServiceError::SchemaIntegrity(format!(
                    "`{}.{}` looks up `{}` by ({}, {}), but {} rows have only {} distinct keys and {} distinct display values",
                    table.name,
                    column.name,
                    fk.table_name,
                    fk.column_name,
                    fk.column_display,
                    rows,
                    keys,
                    displays
                )));
            }
            checked += 1;
        }

        tracing::info!(lookups = checked, "foreign-key lookups validated");
        Ok(ValidatedCatalog { catalog })
    }
}

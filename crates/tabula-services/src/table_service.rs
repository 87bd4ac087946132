//! Table operations service
//!
//! Resolves navigation paths against the validated catalog and runs the
//! column-definition builder, row reader and cell writer for them.

use std::sync::Arc;
use tabula_catalog::{TableCatalog, TableDescriptor, TablePath};
use tabula_core::Connection;

use crate::cell_writer::CellWriter;
use crate::column_defs::ColumnDefinitionBuilder;
use crate::error::{ServiceError, ServiceResult};
use crate::lookup::ForeignKeyLookup;
use crate::row_reader::RowReader;
use crate::validator::ValidatedCatalog;
use crate::view_models::{CellEdit, FormField, MenuEntry, MenuGroup, RowInsertData, TableView};

/// Service for table-level operations
///
/// Handles:
/// - Table views (column definitions plus row data)
/// - Cell edits with foreign-key resolution
/// - The navigation menu and insert form
pub struct TableService {
    catalog: Arc<ValidatedCatalog>,
    connection: Arc<dyn Connection>,
}

impl TableService {
    pub fn new(catalog: ValidatedCatalog, connection: Arc<dyn Connection>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            connection,
        }
    }

    pub fn catalog(&self) -> &TableCatalog {
        self.catalog.catalog()
    }

    /// Groups and their tables in catalog order
    pub fn menu(&self) -> Vec<MenuGroup> {
        self.catalog
            .groups()
            .iter()
            .map(|group| MenuGroup {
                name: group.name.clone(),
                display_name: group.display_name.clone(),
                tables: group
                    .tables
                    .iter()
                    .map(|table| MenuEntry {
                        display_name: table.display_name.clone(),
                        href: TablePath::new(&group.name, &table.name).to_string(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Build the view for a table path.
    ///
    /// A path naming only a group selects no table and yields `None`.
    #[tracing::instrument(skip(self, path), fields(path = %path))]
    pub async fn load_table(&self, path: &TablePath) -> ServiceResult<Option<TableView>> {
        if path.table().is_none() {
            self.catalog.group(path.group())?;
            return Ok(None);
        }
        let table = self.resolve(path)?;
        let connection = self.connection.as_ref();

        let column_definitions = ColumnDefinitionBuilder::new(connection).build(table).await?;
        let row_data = RowReader::new(connection).read(table).await?;

        tracing::info!(
            table_name = %table.name,
            columns = column_definitions.len(),
            rows = row_data.len(),
            "table view loaded"
        );

        Ok(Some(TableView {
            column_definitions,
            row_data,
            row_id_expression: table.row_id_expression(),
            table_title: table.display_name.clone(),
            default_col_def: table.default_col_def.clone(),
            grid_options: table.grid_options.clone(),
        }))
    }

    #[tracing::instrument(skip(self, path, edit), fields(path = %path, column = %edit.column_id))]
    pub async fn update_cell(&self, path: &TablePath, edit: CellEdit) -> ServiceResult<()> {
        let table = self.resolve(path)?;
        CellWriter::new(self.connection.as_ref())
            .update(table, &edit.row_id, &edit.column_id, edit.new_value.as_deref())
            .await
    }

    /// Insert-form inputs: the primary key, then every declared column
    #[tracing::instrument(skip(self, path), fields(path = %path))]
    pub async fn form_fields(&self, path: &TablePath) -> ServiceResult<Vec<FormField>> {
        let table = self.resolve(path)?;
        let connection = self.connection.as_ref();

        let mut fields = vec![FormField {
            name: table.primary_key.name.clone(),
            display_name: table.primary_key.display_name.clone(),
            values: None,
        }];
        for column in &table.columns {
            let values = match &column.foreign_key {
                Some(fk) => Some(
                    ForeignKeyLookup::new(fk, connection.driver_name())
                        .display_values(connection)
                        .await?
                        .iter()
                        .map(|v| v.to_json())
                        .collect(),
                ),
                None => None,
            };
            fields.push(FormField {
                name: column.name.clone(),
                display_name: column.display_name.clone(),
                values,
            });
        }
        Ok(fields)
    }

    #[tracing::instrument(skip(self, path, row_data), fields(path = %path))]
    pub async fn insert_row(&self, path: &TablePath, row_data: RowInsertData) -> ServiceResult<()> {
        if row_data.column_names.len() != row_data.values.len() {
            return Err(ServiceError::InvalidValue(
                "Column/value count mismatch for insert".to_string(),
            ));
        }
        let table = self.resolve(path)?;
        let values = row_data
            .column_names
            .into_iter()
            .zip(row_data.values)
            .collect::<Vec<_>>();
        CellWriter::new(self.connection.as_ref())
            .insert(table, &values)
            .await
    }

    fn resolve(&self, path: &TablePath) -> ServiceResult<&TableDescriptor> {
        Ok(self.catalog.resolve(path)?)
    }
}

use serde::{Deserialize, Serialize};
use tabula_catalog::UiOverrides;

use crate::column_defs::ColumnDefinition;
use crate::row_reader::RowData;

/// Everything the grid needs to render one table
#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    pub column_definitions: Vec<ColumnDefinition>,
    pub row_data: Vec<RowData>,
    /// Row key expression, `params.data.<primary key>`
    pub row_id_expression: String,
    pub table_title: String,
    pub default_col_def: UiOverrides,
    pub grid_options: UiOverrides,
}

/// A single cell edit coming back from the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEdit {
    /// Physical column name (the column definition's `field`)
    pub column_id: String,
    /// Primary key of the edited row, as the grid sends it
    pub row_id: String,
    /// Display value for foreign-key columns; `None` means NULL
    pub new_value: Option<String>,
}

/// Data required to insert a new row
#[derive(Debug, Clone, Default)]
pub struct RowInsertData {
    /// Column names for the values being inserted
    pub column_names: Vec<String>,
    /// Values to insert (None means NULL, or the column default when it has one)
    pub values: Vec<Option<String>>,
}

impl RowInsertData {
    pub fn with_value(mut self, column: impl Into<String>, value: Option<&str>) -> Self {
        self.column_names.push(column.into());
        self.values.push(value.map(str::to_string));
        self
    }
}

/// Navigation menu: one entry per group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuGroup {
    pub name: String,
    pub display_name: String,
    pub tables: Vec<MenuEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub display_name: String,
    /// `/<group>/<table>`
    pub href: String,
}

/// One input of the insert form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: String,
    pub display_name: String,
    /// Selectable display values for foreign-key columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<serde_json::Value>>,
}

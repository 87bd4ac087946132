//! Typed table descriptors
//!
//! Each descriptor deserializes through a `Raw*` shadow struct so that
//! optional display names are filled in once, when the value is built.

use serde::Deserialize;

/// Opaque UI column-definition hints, merged over derived defaults
pub type UiOverrides = serde_json::Map<String, serde_json::Value>;

/// The primary key column of an editable table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawPrimaryKey")]
pub struct PrimaryKeyDescriptor {
    pub name: String,
    pub display_name: String,
    pub column_def: UiOverrides,
}

impl PrimaryKeyDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        RawPrimaryKey {
            name: name.into(),
            display_name: None,
            column_def: UiOverrides::new(),
        }
        .into()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPrimaryKey {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    column_def: UiOverrides,
}

impl From<RawPrimaryKey> for PrimaryKeyDescriptor {
    fn from(raw: RawPrimaryKey) -> Self {
        Self {
            display_name: raw.display_name.unwrap_or_else(|| raw.name.clone()),
            name: raw.name,
            column_def: raw.column_def,
        }
    }
}

/// One sort key of a foreign-key value list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderByDescriptor {
    pub column: String,
    #[serde(default)]
    pub desc: bool,
}

/// A lookup into another table's key/display pair
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignKeyDescriptor {
    pub table_name: String,
    #[serde(default)]
    pub schema_name: Option<String>,
    /// Referenced key column, the value actually stored
    pub column_name: String,
    /// Referenced human-readable column shown in the grid
    pub column_display: String,
    #[serde(default)]
    pub order_by: Vec<OrderByDescriptor>,
}

impl ForeignKeyDescriptor {
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        column_display: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            schema_name: None,
            column_name: column_name.into(),
            column_display: column_display.into(),
            order_by: Vec::new(),
        }
    }

    pub fn order_by(mut self, column: impl Into<String>, desc: bool) -> Self {
        self.order_by.push(OrderByDescriptor {
            column: column.into(),
            desc,
        });
        self
    }
}

/// A declared, editable column
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawColumn")]
pub struct ColumnDescriptor {
    pub name: String,
    pub display_name: String,
    /// Optional type hint for parsing untyped UI input
    pub datatype: Option<String>,
    pub foreign_key: Option<ForeignKeyDescriptor>,
    pub column_def: UiOverrides,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        RawColumn {
            name: name.into(),
            display_name: None,
            datatype: None,
            foreign_key: None,
            column_def: UiOverrides::new(),
        }
        .into()
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    pub fn foreign_key(mut self, foreign_key: ForeignKeyDescriptor) -> Self {
        self.foreign_key = Some(foreign_key);
        self
    }

    pub fn column_def(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.column_def.insert(key.into(), value);
        self
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawColumn {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    datatype: Option<String>,
    #[serde(default)]
    foreign_key: Option<ForeignKeyDescriptor>,
    #[serde(default)]
    column_def: UiOverrides,
}

impl From<RawColumn> for ColumnDescriptor {
    fn from(raw: RawColumn) -> Self {
        Self {
            display_name: raw.display_name.unwrap_or_else(|| raw.name.clone()),
            name: raw.name,
            datatype: raw.datatype,
            foreign_key: raw.foreign_key,
            column_def: raw.column_def,
        }
    }
}

/// One row-editable table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawTable")]
pub struct TableDescriptor {
    pub name: String,
    pub schema_name: Option<String>,
    pub display_name: String,
    pub primary_key: PrimaryKeyDescriptor,
    pub columns: Vec<ColumnDescriptor>,
    /// Grid-wide column defaults, passed through to the table view
    pub default_col_def: UiOverrides,
    /// Grid options, passed through to the table view
    pub grid_options: UiOverrides,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, primary_key: PrimaryKeyDescriptor) -> Self {
        RawTable {
            name: name.into(),
            schema_name: None,
            display_name: None,
            primary_key,
            columns: Vec::new(),
            default_col_def: UiOverrides::new(),
            grid_options: UiOverrides::new(),
        }
        .into()
    }

    pub fn schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Look up a declared column by physical name
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// `[primary key] + columns`, the fixed projection order of the grid
    pub fn field_names(&self) -> Vec<&str> {
        std::iter::once(self.primary_key.name.as_str())
            .chain(self.columns.iter().map(|c| c.name.as_str()))
            .collect()
    }

    /// Expression the grid uses to derive a stable row key
    pub fn row_id_expression(&self) -> String {
        format!("params.data.{}", self.primary_key.name)
    }

    pub fn has_foreign_keys(&self) -> bool {
        self.columns.iter().any(|c| c.foreign_key.is_some())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTable {
    name: String,
    #[serde(default)]
    schema_name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    primary_key: PrimaryKeyDescriptor,
    #[serde(default)]
    columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    default_col_def: UiOverrides,
    #[serde(default)]
    grid_options: UiOverrides,
}

impl From<RawTable> for TableDescriptor {
    fn from(raw: RawTable) -> Self {
        Self {
            display_name: raw.display_name.unwrap_or_else(|| raw.name.clone()),
            name: raw.name,
            schema_name: raw.schema_name,
            primary_key: raw.primary_key,
            columns: raw.columns,
            default_col_def: raw.default_col_def,
            grid_options: raw.grid_options,
        }
    }
}

//! The table catalog: ordered groups of table descriptors

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::descriptor::{ColumnDescriptor, ForeignKeyDescriptor, TableDescriptor};
use crate::error::{CatalogError, CatalogResult};
use crate::path::TablePath;

/// A named group of tables, the first segment of a navigation path
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawGroup")]
pub struct TableGroup {
    pub name: String,
    pub display_name: String,
    pub tables: Vec<TableDescriptor>,
}

impl TableGroup {
    pub fn new(name: impl Into<String>) -> Self {
        RawGroup {
            name: name.into(),
            display_name: None,
            tables: Vec::new(),
        }
        .into()
    }

    pub fn with_table(mut self, table: TableDescriptor) -> Self {
        self.tables.push(table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGroup {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    tables: Vec<TableDescriptor>,
}

impl From<RawGroup> for TableGroup {
    fn from(raw: RawGroup) -> Self {
        Self {
            display_name: raw.display_name.unwrap_or_else(|| raw.name.clone()),
            name: raw.name,
            tables: raw.tables,
        }
    }
}

/// Every editable table, loaded once at startup and read-only afterwards
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct TableCatalog {
    groups: Vec<TableGroup>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCatalog {
    #[serde(default)]
    groups: Vec<TableGroup>,
}

impl TryFrom<RawCatalog> for TableCatalog {
    type Error = String;

    fn try_from(raw: RawCatalog) -> Result<Self, Self::Error> {
        Self::new(raw.groups)
    }
}

impl TableCatalog {
    /// Build a catalog, checking that every name it will be addressed by is unique.
    pub fn new(groups: Vec<TableGroup>) -> Result<Self, String> {
        let mut group_names = HashSet::new();
        for group in &groups {
            if group.name.is_empty() || group.name.contains('/') {
                return Err(format!("invalid group name `{}`", group.name));
            }
            if !group_names.insert(group.name.as_str()) {
                return Err(format!("duplicate group `{}`", group.name));
            }

            let mut table_names = HashSet::new();
            for table in &group.tables {
                if table.name.is_empty() {
                    return Err(format!("table with empty name in group `{}`", group.name));
                }
                if !table_names.insert(table.name.as_str()) {
                    return Err(format!(
                        "duplicate table `{}` in group `{}`",
                        table.name, group.name
                    ));
                }

                let mut column_names = HashSet::from([table.primary_key.name.as_str()]);
                for column in &table.columns {
                    if !column_names.insert(column.name.as_str()) {
                        return Err(format!(
                            "duplicate column `{}` in table `{}`",
                            column.name, table.name
                        ));
                    }
                }
            }
        }
        Ok(Self { groups })
    }

    /// Load the catalog from a TOML tables file
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&content, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            groups = catalog.groups.len(),
            tables = catalog.tables().count(),
            "table catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse a catalog from TOML text
    pub fn from_toml_str(content: &str) -> CatalogResult<Self> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> CatalogResult<Self> {
        toml::from_str(content).map_err(|source| CatalogError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    pub fn groups(&self) -> &[TableGroup] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> CatalogResult<&TableGroup> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| CatalogError::GroupNotFound(name.to_string()))
    }

    /// Look up one table by `(group, table)`
    pub fn table(&self, group: &str, table: &str) -> CatalogResult<&TableDescriptor> {
        self.group(group)?
            .table(table)
            .ok_or_else(|| CatalogError::TableNotFound {
                group: group.to_string(),
                table: table.to_string(),
            })
    }

    /// Look up the table a navigation path points at
    pub fn resolve(&self, path: &TablePath) -> CatalogResult<&TableDescriptor> {
        match path.table() {
            Some(table) => self.table(path.group(), table),
            None => Err(CatalogError::InvalidPath(path.to_string())),
        }
    }

    /// All tables with their group, in catalog order
    pub fn tables(&self) -> impl Iterator<Item = (&TableGroup, &TableDescriptor)> {
        self.groups
            .iter()
            .flat_map(|g| g.tables.iter().map(move |t| (g, t)))
    }

    /// Every declared foreign-key lookup with its owning table and column
    pub fn foreign_keys(
        &self,
    ) -> impl Iterator<Item = (&TableDescriptor, &ColumnDescriptor, &ForeignKeyDescriptor)> {
        self.tables().flat_map(|(_, table)| {
            table.columns.iter().filter_map(move |column| {
                column
                    .foreign_key
                    .as_ref()
                    .map(|fk| (table, column, fk))
            })
        })
    }
}

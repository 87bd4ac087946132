//! Tabula Catalog - declarative table descriptions
//!
//! Tables are described once, in a TOML file, instead of with per-table code.
//! This crate parses that description into immutable descriptor values:
//!
//! - [`TableCatalog`] - ordered groups of tables, validated for unique names
//! - [`TableDescriptor`] / [`ColumnDescriptor`] / [`ForeignKeyDescriptor`]
//! - [`TablePath`] - the `/<group>/<table>` navigation path
//! - [`AppConfig`] - process configuration (connection string, tables file)
//!
//! Display names default to the physical name when the description omits them;
//! that rule is applied while deserializing, never at call sites.

mod catalog;
mod config;
mod descriptor;
mod error;
mod path;

pub use catalog::{TableCatalog, TableGroup};
pub use config::AppConfig;
pub use descriptor::{
    ColumnDescriptor, ForeignKeyDescriptor, OrderByDescriptor, PrimaryKeyDescriptor,
    TableDescriptor, UiOverrides,
};
pub use error::{CatalogError, CatalogResult};
pub use path::TablePath;

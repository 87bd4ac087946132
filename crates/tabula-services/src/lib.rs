//! Tabula Services Layer
//!
//! The metadata-driven query and column-definition engine. Given a table
//! description from the catalog and a live connection, the services here
//! derive grid column definitions, read row data, and write cell edits,
//! translating foreign-key display values back to keys.
//!
//! # Architecture
//!
//! ```text
//! Front end (tabula-cli)
//!     ↓
//! Service Layer (tabula-services) ← This crate
//!     ↓
//! Catalog (tabula-catalog)    Infrastructure (tabula-core, tabula-drivers)
//! ```
//!
//! # Services
//!
//! - [`ForeignKeyValidator`] - Startup proof that every lookup is 1:1
//! - [`ColumnDefinitionBuilder`] - Column definitions with select-editor values
//! - [`RowReader`] - Row data ordered by primary key
//! - [`CellWriter`] - Transactional cell updates and inserts
//! - [`TableService`] - Path-based facade over all of the above
//!
//! The schema is reflected through [`Introspector`] on every request; only the
//! [`ValidatedCatalog`] is shared between requests.

mod cell_writer;
mod column_defs;
mod error;
mod introspector;
mod lookup;
mod row_reader;
mod sql;
mod table_service;
mod validator;
mod values;
mod view_models;

pub use cell_writer::CellWriter;
pub use column_defs::{ColumnDefinition, ColumnDefinitionBuilder, SELECT_CELL_EDITOR};
pub use error::{ServiceError, ServiceResult};
pub use introspector::{ColumnSet, Introspector};
pub use row_reader::{RowData, RowReader};
pub use table_service::TableService;
pub use validator::{ForeignKeyValidator, ValidatedCatalog};
pub use view_models::{CellEdit, FormField, MenuEntry, MenuGroup, RowInsertData, TableView};

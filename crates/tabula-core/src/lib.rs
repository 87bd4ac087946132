//! Tabula Core - Core abstractions and traits for the table engine
//!
//! This crate provides the fundamental traits and types that all other
//! Tabula crates depend on. It defines:
//!
//! - `DatabaseDriver` - Trait for database driver implementations
//! - `Connection` / `Transaction` - Traits for live database access
//! - `SchemaIntrospection` - Trait for reflecting physical table columns
//! - Common types like `Value`, `Row`, `QueryResult`

mod connection;
mod driver;
mod error;
mod schema;
mod types;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use schema::*;
pub use types::*;

use std::path::PathBuf;
use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while loading or querying the table catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cannot expand environment variables in {origin}: {message}")]
    Env { origin: String, message: String },

    #[error("Table group `{0}` not found")]
    GroupNotFound(String),

    #[error("Table `{table}` not found in group `{group}`")]
    TableNotFound { group: String, table: String },

    #[error("Invalid table path `{0}`, expected /<group>/<table>")]
    InvalidPath(String),
}

use tabula_catalog::CatalogError;
use tabula_core::TabulaError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level errors with user-friendly messages
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(CatalogError),

    /// A foreign-key lookup is not a 1:1 key/display mapping
    #[error("Schema integrity violation: {0}")]
    SchemaIntegrity(String),

    #[error("Table `{0}` does not exist in the database")]
    TableNotFound(String),

    #[error("Column `{column}` does not exist in table `{table}`")]
    SchemaReference { table: String, column: String },

    #[error("No `{table}` row has {column} = '{value}'")]
    ForeignKeyResolution {
        table: String,
        column: String,
        value: String,
    },

    #[error("No row in `{table}` matched id {row_id}; it may have been deleted")]
    StaleRow { table: String, row_id: String },

    #[error("Column `{column}` is not an editable column of table `{table}`")]
    UnknownColumn { table: String, column: String },

    #[error("Invalid table path: {0}")]
    InvalidPath(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Database error: {0}")]
    Database(#[from] TabulaError),
}

impl From<CatalogError> for ServiceError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidPath(_)
            | CatalogError::GroupNotFound(_)
            | CatalogError::TableNotFound { .. } => ServiceError::InvalidPath(err.to_string()),
            other => ServiceError::Config(other),
        }
    }
}

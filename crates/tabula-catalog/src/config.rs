//! Process configuration

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, CatalogResult};

fn default_tables_file() -> PathBuf {
    PathBuf::from("tables.toml")
}

/// Application configuration, read once at startup.
///
/// `${VAR}` references in `connection_string` are expanded from the
/// environment so credentials can stay out of the file. No other value is
/// expanded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// `<driver>://<location>`, e.g. `sqlite://./data/app.db`
    pub connection_string: String,
    /// Path of the table catalog; relative paths resolve against the config file
    #[serde(default = "default_tables_file")]
    pub tables_file: PathBuf,
    /// Raise the default log level to debug
    #[serde(default)]
    pub debug: bool,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();
        let mut config = Self::parse(&raw, &origin)?;

        if config.tables_file.is_relative()
            && let Some(dir) = path.parent()
        {
            config.tables_file = dir.join(&config.tables_file);
        }

        tracing::debug!(
            config = %origin,
            tables_file = %config.tables_file.display(),
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> CatalogResult<Self> {
        Self::parse(raw, "<inline>")
    }

    fn parse(raw: &str, origin: &str) -> CatalogResult<Self> {
        let mut config: Self = toml::from_str(raw).map_err(|source| CatalogError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        config.connection_string = shellexpand::env(&config.connection_string)
            .map_err(|e| CatalogError::Env {
                origin: origin.to_string(),
                message: e.to_string(),
            })?
            .into_owned();
        Ok(config)
    }
}

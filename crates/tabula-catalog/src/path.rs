use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

/// A `/<group>/<table>` navigation path.
///
/// A path naming only a group is valid: it selects the group with no table
/// open yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TablePath {
    group: String,
    table: Option<String>,
}

impl TablePath {
    pub fn new(group: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            table: Some(table.into()),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }
}

impl FromStr for TablePath {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let mut segments = trimmed.split('/');
        let group = segments.next().filter(|g| !g.is_empty());
        let table = segments.next();

        match (group, table, segments.next()) {
            (Some(group), None, None) => Ok(Self {
                group: group.to_string(),
                table: None,
            }),
            (Some(group), Some(table), None) if !table.is_empty() => {
                Ok(Self::new(group, table))
            }
            _ => Err(CatalogError::InvalidPath(s.to_string())),
        }
    }
}

impl fmt::Display for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "/{}/{}", self.group, table),
            None => write!(f, "/{}", self.group),
        }
    }
}

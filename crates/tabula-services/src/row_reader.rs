//! Main-grid row data

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tabula_catalog::TableDescriptor;
use tabula_core::{Connection, Value};

use crate::error::ServiceResult;
use crate::introspector::Introspector;
use crate::sql::{escape_identifier_for, qualified_table_name};

/// One grid row, keyed `[primary key] + columns` in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct RowData(IndexMap<String, Value>);

impl RowData {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.0
    }
}

impl FromIterator<(String, Value)> for RowData {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Serializes as a plain JSON object (`{"id": 5, "full_name": "A. Smith"}`)
impl Serialize for RowData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, &value.to_json())?;
        }
        map.end()
    }
}

pub struct RowReader<'a> {
    connection: &'a dyn Connection,
}

impl<'a> RowReader<'a> {
    pub fn new(connection: &'a dyn Connection) -> Self {
        Self { connection }
    }

    /// Read every row of the table, ordered by primary key.
    ///
    /// Foreign-key columns carry their stored keys; the grid maps them to
    /// display values.
    #[tracing::instrument(skip(self, table), fields(table_name = %table.name))]
    pub async fn read(&self, table: &TableDescriptor) -> ServiceResult<Vec<RowData>> {
        let schema = table.schema_name.as_deref();
        let columns = Introspector::new(self.connection)
            .reflect(&table.name, schema)
            .await?;

        let fields = table.field_names();
        for field in &fields {
            columns.require(field)?;
        }

        let driver = self.connection.driver_name();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            fields
                .iter()
                .map(|f| escape_identifier_for(f, driver))
                .collect::<Vec<_>>()
                .join(", "),
            qualified_table_name(&table.name, schema, driver),
            escape_identifier_for(&table.primary_key.name, driver)
        );
        tracing::debug!(sql = %sql, "reading rows");

        let result = self.connection.query(&sql, &[]).await?;
        let rows = result
            .rows
            .into_iter()
            .map(|row| {
                fields
                    .iter()
                    .map(|f| f.to_string())
                    .zip(row.values.into_iter().chain(std::iter::repeat(Value::Null)))
                    .collect::<RowData>()
            })
            .collect::<Vec<_>>();

        tracing::debug!(rows = rows.len(), "rows read");
        Ok(rows)
    }
}

//! Grid column definitions derived from table descriptors

use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};
use tabula_catalog::{ColumnDescriptor, TableDescriptor, UiOverrides};
use tabula_core::Connection;

use crate::error::ServiceResult;
use crate::lookup::ForeignKeyLookup;

pub const SELECT_CELL_EDITOR: &str = "agSelectCellEditor";

/// One grid column definition: an open JSON object.
///
/// Derived keys are `headerName`, `field`, `editable`, `cellEditor` and
/// `cellEditorParams`; descriptor overrides may add or replace any key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColumnDefinition(Map<String, JsonValue>);

impl ColumnDefinition {
    pub fn new(header_name: &str, field: &str) -> Self {
        let mut map = Map::new();
        map.insert("headerName".into(), json!(header_name));
        map.insert("field".into(), json!(field));
        Self(map)
    }

    pub fn field(&self) -> Option<&str> {
        self.0.get("field").and_then(JsonValue::as_str)
    }

    pub fn header_name(&self) -> Option<&str> {
        self.0.get("headerName").and_then(JsonValue::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: JsonValue) {
        self.0.insert(key.into(), value);
    }

    /// Shallow merge; override keys always win
    pub fn merge(&mut self, overrides: &UiOverrides) {
        for (key, value) in overrides {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Values offered by a select editor, if this column has one
    pub fn select_values(&self) -> Option<&Vec<JsonValue>> {
        self.0
            .get("cellEditorParams")
            .and_then(|p| p.get("values"))
            .and_then(JsonValue::as_array)
    }

    pub fn into_json(self) -> JsonValue {
        JsonValue::Object(self.0)
    }
}

/// Builds column definitions, querying foreign-key value lists live
pub struct ColumnDefinitionBuilder<'a> {
    connection: &'a dyn Connection,
}

impl<'a> ColumnDefinitionBuilder<'a> {
    pub fn new(connection: &'a dyn Connection) -> Self {
        Self { connection }
    }

    /// Primary key first, then declared columns in order.
    ///
    /// Any failure aborts the whole list.
    #[tracing::instrument(skip(self, table), fields(table_name = %table.name))]
    pub async fn build(&self, table: &TableDescriptor) -> ServiceResult<Vec<ColumnDefinition>> {
        let mut definitions = Vec::with_capacity(table.columns.len() + 1);

        let pk = &table.primary_key;
        let mut pk_def = ColumnDefinition::new(&pk.display_name, &pk.name);
        pk_def.set("editable", json!(false));
        pk_def.merge(&pk.column_def);
        definitions.push(pk_def);

        for column in &table.columns {
            definitions.push(self.build_column(column).await?);
        }

        tracing::debug!(columns = definitions.len(), "column definitions built");
        Ok(definitions)
    }

    async fn build_column(&self, column: &ColumnDescriptor) -> ServiceResult<ColumnDefinition> {
        let mut definition = ColumnDefinition::new(&column.display_name, &column.name);

        if let Some(fk) = &column.foreign_key {
            let lookup = ForeignKeyLookup::new(fk, self.connection.driver_name());
            let values = lookup
                .display_values(self.connection)
                .await?
                .iter()
                .map(|v| v.to_json())
                .collect::<Vec<_>>();
            tracing::debug!(column = %column.name, values = values.len(), "select editor populated");
            definition.set("cellEditor", json!(SELECT_CELL_EDITOR));
            definition.set("cellEditorParams", json!({ "values": values }));
        }

        definition.merge(&column.column_def);
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn overrides_replace_derived_keys() {
        let mut definition = ColumnDefinition::new("Salary", "salary");
        let mut overrides = UiOverrides::new();
        overrides.insert("headerName".into(), json!("Pay"));
        overrides.insert("width".into(), json!(90));
        definition.merge(&overrides);

        assert_eq!(
            definition.into_json(),
            json!({ "headerName": "Pay", "field": "salary", "width": 90 })
        );
    }

    #[test]
    fn select_values_reads_editor_params() {
        let mut definition = ColumnDefinition::new("Manager", "manager_id");
        assert_eq!(definition.select_values(), None);
        definition.set("cellEditorParams", json!({ "values": ["A", "B"] }));
        assert_eq!(
            definition.select_values(),
            Some(&vec![json!("A"), json!("B")])
        );
        assert_eq!(definition.field(), Some("manager_id"));
        assert_eq!(definition.header_name(), Some("Manager"));
    }
}

//! Terminal rendering of service view models

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use tabula_services::{FormField, MenuGroup, TableView};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Grid rows under their header names, in column-definition order
pub fn render_view(view: &TableView) -> String {
    let mut table = new_table();
    table.set_header(
        view.column_definitions
            .iter()
            .map(|d| d.header_name().or(d.field()).unwrap_or_default().to_string())
            .collect::<Vec<_>>(),
    );

    for row in &view.row_data {
        table.add_row(
            view.column_definitions
                .iter()
                .map(|d| {
                    d.field()
                        .and_then(|f| row.get(f))
                        .map(|v| cell_text(&v.to_json()))
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>(),
        );
    }
    table.to_string()
}

pub fn render_menu(menu: &[MenuGroup]) -> String {
    let mut out = String::new();
    for group in menu {
        out.push_str(&format!("{} ({})\n", group.display_name, group.name));
        for entry in &group.tables {
            out.push_str(&format!("  {:<24} {}\n", entry.display_name, entry.href));
        }
    }
    out
}

pub fn render_form(fields: &[FormField]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Field", "Label", "Choices"]);
    for field in fields {
        let choices = field
            .values
            .as_ref()
            .map(|values| values.iter().map(cell_text).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        table.add_row(vec![field.name.clone(), field.display_name.clone(), choices]);
    }
    table.to_string()
}

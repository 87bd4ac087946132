//! Dialect-aware SQL fragments
//!
//! Every identifier that reaches generated SQL comes from the table catalog
//! and is quoted here; values always travel as bound parameters.

use tabula_catalog::OrderByDescriptor;

/// Escape SQL identifier (table/column name) using the appropriate
/// quoting style for the target database.
pub(crate) fn escape_identifier_for(identifier: &str, driver_name: &str) -> String {
    match driver_name {
        "mysql" => format!("`{}`", identifier.replace('`', "``")),
        "mssql" => format!("[{}]", identifier.replace(']', "]]")),
        _ => format!("\"{}\"", identifier.replace('"', "\"\"")),
    }
}

/// Build a possibly schema-qualified table reference.
pub(crate) fn qualified_table_name(
    table_name: &str,
    schema: Option<&str>,
    driver_name: &str,
) -> String {
    match schema {
        Some(s) => format!(
            "{}.{}",
            escape_identifier_for(s, driver_name),
            escape_identifier_for(table_name, driver_name)
        ),
        None => escape_identifier_for(table_name, driver_name),
    }
}

/// Placeholder for the 1-based `param_index`-th bound parameter
pub(crate) fn param_placeholder(driver_name: &str, param_index: usize) -> String {
    match driver_name {
        "postgresql" => format!("${}", param_index),
        "mssql" => format!("@P{}", param_index),
        _ => "?".to_string(),
    }
}

/// ` ORDER BY a ASC, b DESC`, or an empty string for no sort keys
pub(crate) fn order_by_clause(order_by: &[OrderByDescriptor], driver_name: &str) -> String {
    if order_by.is_empty() {
        return String::new();
    }
    let keys = order_by
        .iter()
        .map(|o| {
            format!(
                "{} {}",
                escape_identifier_for(&o.column, driver_name),
                if o.desc { "DESC" } else { "ASC" }
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(" ORDER BY {}", keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier_postgresql() {
        assert_eq!(escape_identifier_for("users", "postgresql"), "\"users\"");
        assert_eq!(
            escape_identifier_for("user\"table", "postgresql"),
            "\"user\"\"table\""
        );
        assert_eq!(escape_identifier_for("my table", "postgresql"), "\"my table\"");
    }

    #[test]
    fn test_escape_identifier_mysql() {
        assert_eq!(escape_identifier_for("users", "mysql"), "`users`");
        assert_eq!(escape_identifier_for("user`table", "mysql"), "`user``table`");
    }

    #[test]
    fn test_escape_identifier_mssql() {
        assert_eq!(escape_identifier_for("users", "mssql"), "[users]");
        assert_eq!(escape_identifier_for("user]table", "mssql"), "[user]]table]");
    }

    #[test]
    fn qualifies_with_schema() {
        assert_eq!(
            qualified_table_name("employees", Some("hr"), "sqlite"),
            "\"hr\".\"employees\""
        );
        assert_eq!(qualified_table_name("employees", None, "mysql"), "`employees`");
    }

    #[test]
    fn placeholders_follow_driver() {
        assert_eq!(param_placeholder("postgresql", 2), "$2");
        assert_eq!(param_placeholder("mssql", 1), "@P1");
        assert_eq!(param_placeholder("sqlite", 2), "?");
        assert_eq!(param_placeholder("mysql", 2), "?");
    }

    #[test]
    fn order_by_keeps_declared_order_and_direction() {
        let keys = vec![
            OrderByDescriptor {
                column: "last".into(),
                desc: false,
            },
            OrderByDescriptor {
                column: "hired".into(),
                desc: true,
            },
        ];
        assert_eq!(
            order_by_clause(&keys, "sqlite"),
            " ORDER BY \"last\" ASC, \"hired\" DESC"
        );
        assert_eq!(order_by_clause(&[], "sqlite"), "");
    }
}

//! Parsing of untyped UI input into typed values

use tabula_core::Value;

use crate::error::{ServiceError, ServiceResult};

/// Parse string value to typed Value
///
/// Uses the column type when available to avoid misinterpreting
/// numeric-looking strings (e.g. phone numbers, postal codes) as integers.
/// Falls back to heuristic inference when no type hint is provided.
pub(crate) fn parse_value(value_str: &str, column_type: Option<&str>) -> ServiceResult<Value> {
    if let Some(col_type) = column_type.filter(|t| !t.trim().is_empty()) {
        return parse_value_with_type(value_str, col_type);
    }

    if value_str.is_empty() {
        return Ok(Value::String(String::new()));
    }

    if let Ok(int_val) = value_str.parse::<i64>() {
        return Ok(Value::Int64(int_val));
    }

    if let Ok(float_val) = value_str.parse::<f64>() {
        return Ok(Value::Float64(float_val));
    }

    if value_str.eq_ignore_ascii_case("true") {
        return Ok(Value::Bool(true));
    }

    if value_str.eq_ignore_ascii_case("false") {
        return Ok(Value::Bool(false));
    }

    Ok(Value::String(value_str.to_string()))
}

/// Parse a value string using the known column type
fn parse_value_with_type(value_str: &str, column_type: &str) -> ServiceResult<Value> {
    let col_type = column_type.trim().to_lowercase();

    // tinyint(1) is MySQL's boolean; everything else ignores the length suffix
    if is_boolean_type(&col_type) || is_boolean_type(base_type(&col_type)) {
        return match value_str.trim().to_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Ok(Value::Bool(true)),
            "false" | "f" | "0" | "no" => Ok(Value::Bool(false)),
            _ => Err(invalid(value_str, column_type)),
        };
    }

    let col_type = base_type(&col_type);

    if is_string_type(col_type) {
        return Ok(Value::String(value_str.to_string()));
    }

    if is_integer_type(col_type) {
        let val = value_str
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(value_str, column_type))?;
        if val >= i32::MIN as i64 && val <= i32::MAX as i64 {
            return Ok(Value::Int32(val as i32));
        }
        return Ok(Value::Int64(val));
    }

    if is_float_type(col_type) {
        return value_str
            .trim()
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|_| invalid(value_str, column_type));
    }

    // Dates, timestamps, UUIDs, JSON, etc. stay as strings and the driver
    // binds them as text
    Ok(Value::String(value_str.to_string()))
}

fn invalid(value_str: &str, column_type: &str) -> ServiceError {
    ServiceError::InvalidValue(format!(
        "'{}' is not a valid {} value",
        value_str, column_type
    ))
}

/// `varchar(40)` -> `varchar`, `numeric(10, 2)` -> `numeric`
fn base_type(col_type: &str) -> &str {
    col_type
        .split_once('(')
        .map(|(base, _)| base)
        .unwrap_or(col_type)
        .trim()
}

fn is_string_type(col_type: &str) -> bool {
    matches!(
        col_type,
        "text"
            | "varchar"
            | "char"
            | "bpchar"
            | "name"
            | "citext"
            | "character varying"
            | "character"
            | "nvarchar"
            | "nchar"
            | "clob"
            | "longtext"
            | "mediumtext"
            | "tinytext"
            | "enum"
            | "set"
    )
}

fn is_boolean_type(col_type: &str) -> bool {
    matches!(col_type, "bool" | "boolean" | "tinyint(1)")
}

fn is_integer_type(col_type: &str) -> bool {
    matches!(
        col_type,
        "int2"
            | "int4"
            | "int8"
            | "smallint"
            | "integer"
            | "bigint"
            | "int"
            | "mediumint"
            | "tinyint"
            | "serial"
            | "bigserial"
            | "smallserial"
    )
}

fn is_float_type(col_type: &str) -> bool {
    matches!(
        col_type,
        "float4"
            | "float8"
            | "real"
            | "double precision"
            | "double"
            | "float"
            | "numeric"
            | "decimal"
            | "money"
    )
}

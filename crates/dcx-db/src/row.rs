//! Converts a `sqlx::sqlite::SqliteRow` into the protocol-neutral
//! [`dcx_core::ports::adapter::Row`] (`HashMap<String, Value>`) that
//! `DatabaseAdapter::execute` returns.
//!
//! `sqlx` only lets you decode a column once you know its Rust type, so this
//! walks each column's declared SQLite type affinity and decodes into the
//! closest `serde_json::Value` shape.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use dcx_core::ports::adapter::Row;

use crate::error::DbAdapterError;

pub fn row_to_map(row: &SqliteRow) -> Result<Row, DbAdapterError> {
    let mut map = Row::new();
    for column in row.columns() {
        let name = column.name().to_string();
        let value = column_value(row, column.ordinal(), column.type_info().name())
            .map_err(|_| DbAdapterError::UnsupportedColumn(name.clone()))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn column_value(row: &SqliteRow, index: usize, declared_type: &str) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    match declared_type.to_ascii_uppercase().as_str() {
        "INTEGER" | "INT" | "BIGINT" => Ok(row
            .try_get::<i64, _>(index)
            .map(Value::from)
            .unwrap_or(Value::Null)),
        "REAL" | "FLOAT" | "DOUBLE" => Ok(row
            .try_get::<f64, _>(index)
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        "BOOLEAN" => Ok(row.try_get::<bool, _>(index).map(Value::from).unwrap_or(Value::Null)),
        "BLOB" => Ok(row
            .try_get::<Vec<u8>, _>(index)
            .map(|bytes| Value::String(STANDARD.encode(bytes)))
            .unwrap_or(Value::Null)),
        _ => Ok(row.try_get::<String, _>(index).map(Value::from).unwrap_or(Value::Null)),
    }
}

/// Rejects parameter shapes `sqlx` cannot bind directly (nested JSON).
/// Binding itself happens inline at each call site since `sqlx::query::Query`
/// carries a borrow tied to the query string's lifetime, which a free
/// function would have to fight rather than thread through cleanly.
pub fn check_bindable(params: &[Value]) -> Result<(), DbAdapterError> {
    for (index, param) in params.iter().enumerate() {
        if matches!(param, Value::Array(_) | Value::Object(_)) {
            return Err(DbAdapterError::UnsupportedParam(index));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_nested_shapes_with_their_index() {
        let params = vec![Value::from(1), Value::Array(vec![])];
        let err = check_bindable(&params).unwrap_err();
        assert!(matches!(err, DbAdapterError::UnsupportedParam(1)));
    }
}

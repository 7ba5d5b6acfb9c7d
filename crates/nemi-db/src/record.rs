//! Dynamic result rows

use indexmap::IndexMap;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// One result row: column name to value, in select order.
pub type Record = IndexMap<String, Value>;

/// Decode a SQLite row by the storage class of each value.
pub(crate) fn decode_row(row: &SqliteRow) -> Record {
	let mut record = Record::with_capacity(row.len());
	for (index, column) in row.columns().iter().enumerate() {
		record.insert(column.name().to_string(), decode_value(row, index));
	}
	record
}

fn decode_value(row: &SqliteRow, index: usize) -> Value {
	let type_name = match row.try_get_raw(index) {
		Ok(raw) if raw.is_null() => return Value::Null,
		Ok(raw) => raw.type_info().name().to_ascii_uppercase(),
		Err(e) => {
			tracing::debug!(index, error = %e, "column not readable, decoding as null");
			return Value::Null;
		}
	};

	match type_name.as_str() {
		"INTEGER" | "INT" | "INT8" | "BIGINT" | "BOOLEAN" => row
			.try_get_unchecked::<i64, _>(index)
			.map(Value::from)
			.unwrap_or(Value::Null),
		"REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => row
			.try_get_unchecked::<f64, _>(index)
			.map(Value::from)
			.unwrap_or(Value::Null),
		"BLOB" => row
			.try_get_unchecked::<Vec<u8>, _>(index)
			.map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
			.unwrap_or(Value::Null),
		_ => row
			.try_get_unchecked::<String, _>(index)
			.map(Value::String)
			.unwrap_or(Value::Null),
	}
}

/// Read a column as an integer, accepting integral floats and numeric text.
pub fn value_as_i64(value: &Value) -> Option<i64> {
	match value {
		Value::Number(n) => n
			.as_i64()
			.or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
		Value::String(s) => s.trim().parse().ok(),
		Value::Bool(b) => Some(i64::from(*b)),
		_ => None,
	}
}

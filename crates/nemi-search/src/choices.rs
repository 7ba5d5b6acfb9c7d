//! Loading select-field choices from the store

use nemi_db::{Database, DatabaseResult, Filter, QuerySet};
use serde_json::Value;

/// `(id, label)` pairs from two columns of `base`, ordered by label.
/// Rows with a null id or label are skipped.
pub async fn id_choices(
	db: &Database,
	base: QuerySet,
	id_column: &str,
	label_column: &str,
) -> DatabaseResult<Vec<(i64, String)>> {
	let rows = base
		.filter(Filter::is_null(id_column, false))
		.values(&[id_column, label_column])
		.distinct()
		.order_by(&[label_column, id_column])
		.fetch_values(db)
		.await?;
	let mut choices: Vec<(i64, String)> = Vec::with_capacity(rows.len());
	for row in rows {
		if let [id, Value::String(label)] = row.as_slice()
			&& let Some(id) = nemi_db::record::value_as_i64(id)
			&& !choices.iter().any(|(seen, _)| *seen == id)
		{
			choices.push((id, label.clone()));
		}
	}
	Ok(choices)
}

/// Distinct non-empty values of one column, each its own label.
pub async fn value_choices(
	db: &Database,
	base: QuerySet,
	column: &str,
) -> DatabaseResult<Vec<(String, String)>> {
	let values = base
		.filter(Filter::is_null(column, false))
		.values(&[column])
		.distinct()
		.order_by(&[column])
		.fetch_column(db)
		.await?;
	Ok(values
		.into_iter()
		.filter_map(|value| match value {
			Value::String(s) if !s.trim().is_empty() => Some((s.clone(), s)),
			_ => None,
		})
		.collect())
}

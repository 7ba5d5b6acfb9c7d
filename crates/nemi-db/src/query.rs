//! Predicate objects and the `QuerySet` builder
//!
//! A [`QuerySet`] accumulates [`FilterCondition`]s against one table or view.
//! Nothing touches the database until one of the executing methods
//! (`fetch`, `fetch_values`, `fetch_column`, `get`, `count`, `aggregate_max`)
//! is awaited, and each of those issues exactly one statement.

use crate::connection::Database;
use crate::error::{DatabaseError, DatabaseResult};
use crate::record::Record;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
	/// Case-sensitive equality
	Eq,
	/// Case-insensitive equality
	IEq,
	/// Case-sensitive substring
	Contains,
	/// Case-insensitive substring
	IContains,
	StartsWith,
	/// Set membership; an empty set matches nothing
	In,
	/// `Bool(true)` for `IS NULL`, `Bool(false)` for `IS NOT NULL`
	IsNull,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
	Text(String),
	Integer(i64),
	Float(f64),
	Bool(bool),
	Null,
	Array(Vec<FilterValue>),
}

impl FilterValue {
	/// Convert a cleaned form value.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_db::FilterValue;
	/// use serde_json::json;
	///
	/// assert_eq!(FilterValue::from_json(&json!(7)), FilterValue::Integer(7));
	/// assert_eq!(
	///     FilterValue::from_json(&json!(["a", 2])),
	///     FilterValue::Array(vec![FilterValue::Text("a".into()), FilterValue::Integer(2)])
	/// );
	/// ```
	pub fn from_json(value: &Value) -> Self {
		match value {
			Value::Null => FilterValue::Null,
			Value::Bool(b) => FilterValue::Bool(*b),
			Value::Number(n) => match n.as_i64() {
				Some(i) => FilterValue::Integer(i),
				None => FilterValue::Float(n.as_f64().unwrap_or_default()),
			},
			Value::String(s) => FilterValue::Text(s.clone()),
			Value::Array(items) => FilterValue::Array(items.iter().map(Self::from_json).collect()),
			Value::Object(_) => FilterValue::Text(value.to_string()),
		}
	}
}

impl From<&str> for FilterValue {
	fn from(value: &str) -> Self {
		FilterValue::Text(value.to_string())
	}
}

impl From<String> for FilterValue {
	fn from(value: String) -> Self {
		FilterValue::Text(value)
	}
}

impl From<i64> for FilterValue {
	fn from(value: i64) -> Self {
		FilterValue::Integer(value)
	}
}

impl From<f64> for FilterValue {
	fn from(value: f64) -> Self {
		FilterValue::Float(value)
	}
}

impl From<bool> for FilterValue {
	fn from(value: bool) -> Self {
		FilterValue::Bool(value)
	}
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(FilterValue::Null)
	}
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
	fn from(values: Vec<T>) -> Self {
		FilterValue::Array(values.into_iter().map(Into::into).collect())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
	pub field: String,
	pub operator: FilterOperator,
	pub value: FilterValue,
}

impl Filter {
	pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
		Self {
			field: field.into(),
			operator,
			value,
		}
	}

	pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
		Self::new(field, FilterOperator::Eq, value.into())
	}

	pub fn ieq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
		Self::new(field, FilterOperator::IEq, value.into())
	}

	pub fn contains(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
		Self::new(field, FilterOperator::Contains, value.into())
	}

	pub fn icontains(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
		Self::new(field, FilterOperator::IContains, value.into())
	}

	pub fn starts_with(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
		Self::new(field, FilterOperator::StartsWith, value.into())
	}

	pub fn is_in(field: impl Into<String>, values: impl Into<FilterValue>) -> Self {
		Self::new(field, FilterOperator::In, values.into())
	}

	pub fn is_null(field: impl Into<String>, is_null: bool) -> Self {
		Self::new(field, FilterOperator::IsNull, FilterValue::Bool(is_null))
	}
}

/// Composite condition supporting AND/OR/NOT nesting.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
	Single(Filter),
	And(Vec<FilterCondition>),
	Or(Vec<FilterCondition>),
	Not(Box<FilterCondition>),
}

impl From<Filter> for FilterCondition {
	fn from(filter: Filter) -> Self {
		FilterCondition::Single(filter)
	}
}

/// Quote a column or table name after checking it is a plain identifier.
fn quote_ident(name: &str) -> DatabaseResult<String> {
	let valid = !name.is_empty()
		&& name
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '_');
	if !valid {
		return Err(DatabaseError::InvalidIdentifier(name.to_string()));
	}
	Ok(format!("\"{}\"", name))
}

fn filter_sql(filter: &Filter, params: &mut Vec<FilterValue>) -> DatabaseResult<String> {
	let column = quote_ident(&filter.field)?;
	let sql = match filter.operator {
		FilterOperator::Eq if filter.value == FilterValue::Null => format!("{} IS NULL", column),
		FilterOperator::Eq => {
			params.push(filter.value.clone());
			format!("{} = ?", column)
		}
		FilterOperator::IEq => {
			params.push(filter.value.clone());
			format!("LOWER({}) = LOWER(?)", column)
		}
		FilterOperator::Contains => {
			params.push(filter.value.clone());
			format!("instr({}, ?) > 0", column)
		}
		FilterOperator::IContains => {
			params.push(filter.value.clone());
			format!("instr(LOWER({}), LOWER(?)) > 0", column)
		}
		FilterOperator::StartsWith => {
			params.push(filter.value.clone());
			format!("instr({}, ?) = 1", column)
		}
		FilterOperator::In => {
			let items = match &filter.value {
				FilterValue::Array(items) => items.clone(),
				single => vec![single.clone()],
			};
			if items.is_empty() {
				return Ok("0 = 1".to_string());
			}
			let placeholders = vec!["?"; items.len()].join(", ");
			params.extend(items);
			format!("{} IN ({})", column, placeholders)
		}
		FilterOperator::IsNull => match filter.value {
			FilterValue::Bool(false) => format!("{} IS NOT NULL", column),
			_ => format!("{} IS NULL", column),
		},
	};
	Ok(sql)
}

fn condition_sql(condition: &FilterCondition, params: &mut Vec<FilterValue>) -> DatabaseResult<String> {
	match condition {
		FilterCondition::Single(filter) => filter_sql(filter, params),
		FilterCondition::And(items) if items.is_empty() => Ok("1 = 1".to_string()),
		FilterCondition::Or(items) if items.is_empty() => Ok("0 = 1".to_string()),
		FilterCondition::And(items) => {
			let parts = items
				.iter()
				.map(|item| condition_sql(item, params))
				.collect::<DatabaseResult<Vec<_>>>()?;
			Ok(format!("({})", parts.join(" AND ")))
		}
		FilterCondition::Or(items) => {
			let parts = items
				.iter()
				.map(|item| condition_sql(item, params))
				.collect::<DatabaseResult<Vec<_>>>()?;
			Ok(format!("({})", parts.join(" OR ")))
		}
		// A null inner result counts as false, so the negation keeps the row.
		FilterCondition::Not(inner) => Ok(format!("NOT COALESCE({}, 0)", condition_sql(inner, params)?)),
	}
}

pub(crate) fn bind_all<'q>(
	mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
	params: &[FilterValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
	for param in params {
		query = match param {
			FilterValue::Text(s) => query.bind(s.clone()),
			FilterValue::Integer(i) => query.bind(*i),
			FilterValue::Float(f) => query.bind(*f),
			FilterValue::Bool(b) => query.bind(*b),
			FilterValue::Null => query.bind(None::<String>),
			// Arrays are expanded into placeholders before binding.
			FilterValue::Array(items) => query.bind(items.len() as i64),
		};
	}
	query
}

/// Lazily evaluated query against one table or view.
#[derive(Debug, Clone)]
pub struct QuerySet {
	table: String,
	conditions: Vec<FilterCondition>,
	fields: Vec<String>,
	distinct: bool,
	order_by: Vec<String>,
	limit: Option<u64>,
}

impl QuerySet {
	pub fn new(table: impl Into<String>) -> Self {
		Self {
			table: table.into(),
			conditions: Vec::new(),
			fields: Vec::new(),
			distinct: false,
			order_by: Vec::new(),
			limit: None,
		}
	}

	pub fn table(&self) -> &str {
		&self.table
	}

	pub fn conditions(&self) -> &[FilterCondition] {
		&self.conditions
	}

	/// Add a condition; all conditions are combined with AND.
	pub fn filter(mut self, condition: impl Into<FilterCondition>) -> Self {
		self.conditions.push(condition.into());
		self
	}

	/// Keep only rows that do not satisfy the condition.
	pub fn exclude(mut self, condition: impl Into<FilterCondition>) -> Self {
		self.conditions
			.push(FilterCondition::Not(Box::new(condition.into())));
		self
	}

	/// Keep rows satisfying at least one of the filters.
	pub fn filter_any(mut self, filters: Vec<Filter>) -> Self {
		self.conditions.push(FilterCondition::Or(
			filters.into_iter().map(FilterCondition::Single).collect(),
		));
		self
	}

	/// Restrict the selected columns, in order.
	pub fn values(mut self, fields: &[&str]) -> Self {
		self.fields = fields.iter().map(|f| f.to_string()).collect();
		self
	}

	pub fn distinct(mut self) -> Self {
		self.distinct = true;
		self
	}

	/// Order by columns; a leading `-` sorts descending.
	pub fn order_by(mut self, fields: &[&str]) -> Self {
		self.order_by = fields.iter().map(|f| f.to_string()).collect();
		self
	}

	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = Some(limit);
		self
	}

	fn where_sql(&self, params: &mut Vec<FilterValue>) -> DatabaseResult<String> {
		if self.conditions.is_empty() {
			return Ok(String::new());
		}
		let parts = self
			.conditions
			.iter()
			.map(|condition| condition_sql(condition, params))
			.collect::<DatabaseResult<Vec<_>>>()?;
		Ok(format!(" WHERE {}", parts.join(" AND ")))
	}

	fn select_sql(&self, with_order: bool) -> DatabaseResult<(String, Vec<FilterValue>)> {
		let mut params = Vec::new();
		let columns = if self.fields.is_empty() {
			"*".to_string()
		} else {
			self.fields
				.iter()
				.map(|f| quote_ident(f))
				.collect::<DatabaseResult<Vec<_>>>()?
				.join(", ")
		};

		let mut sql = format!(
			"SELECT {}{} FROM {}",
			if self.distinct { "DISTINCT " } else { "" },
			columns,
			quote_ident(&self.table)?
		);
		sql.push_str(&self.where_sql(&mut params)?);

		if with_order && !self.order_by.is_empty() {
			let terms = self
				.order_by
				.iter()
				.map(|term| match term.strip_prefix('-') {
					Some(field) => quote_ident(field).map(|c| format!("{} DESC", c)),
					None => quote_ident(term).map(|c| format!("{} ASC", c)),
				})
				.collect::<DatabaseResult<Vec<_>>>()?;
			sql.push_str(" ORDER BY ");
			sql.push_str(&terms.join(", "));
		}

		if with_order && let Some(limit) = self.limit {
			sql.push_str(&format!(" LIMIT {}", limit));
		}

		Ok((sql, params))
	}

	/// The SELECT statement this set would run, with its parameters.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_db::{Filter, QuerySet};
	///
	/// let (sql, params) = QuerySet::new("method_vw")
	///     .filter(Filter::eq("media_name", "WATER"))
	///     .values(&["method_id"])
	///     .distinct()
	///     .order_by(&["-method_id"])
	///     .to_sql()
	///     .unwrap();
	/// assert_eq!(
	///     sql,
	///     "SELECT DISTINCT \"method_id\" FROM \"method_vw\" WHERE \"media_name\" = ? ORDER BY \"method_id\" DESC"
	/// );
	/// assert_eq!(params.len(), 1);
	/// ```
	pub fn to_sql(&self) -> DatabaseResult<(String, Vec<FilterValue>)> {
		self.select_sql(true)
	}

	pub async fn fetch(&self, db: &Database) -> DatabaseResult<Vec<Record>> {
		let (sql, params) = self.to_sql()?;
		db.fetch_all(&sql, &params).await
	}

	/// Rows as positional tuples in select order.
	pub async fn fetch_values(&self, db: &Database) -> DatabaseResult<Vec<Vec<Value>>> {
		let records = self.fetch(db).await?;
		Ok(records
			.into_iter()
			.map(|record| record.into_values().collect())
			.collect())
	}

	/// The single selected column of every row.
	pub async fn fetch_column(&self, db: &Database) -> DatabaseResult<Vec<Value>> {
		if self.fields.len() != 1 {
			return Err(DatabaseError::Query(format!(
				"fetch_column needs exactly one selected field, got {}",
				self.fields.len()
			)));
		}
		let records = self.fetch(db).await?;
		Ok(records
			.into_iter()
			.filter_map(|record| record.into_values().next())
			.collect())
	}

	/// Exactly one matching row.
	pub async fn get(&self, db: &Database) -> DatabaseResult<Record> {
		let mut rows = self.clone().limit(2).fetch(db).await?;
		match rows.len() {
			0 => Err(DatabaseError::NotFound(self.table.clone())),
			1 => Ok(rows.remove(0)),
			_ => Err(DatabaseError::MultipleObjectsReturned(self.table.clone())),
		}
	}

	pub async fn count(&self, db: &Database) -> DatabaseResult<i64> {
		let (inner, params) = self.select_sql(false)?;
		let sql = format!("SELECT COUNT(*) AS n FROM ({})", inner);
		let rows = db.fetch_all(&sql, &params).await?;
		Ok(rows
			.first()
			.and_then(|row| row.get("n"))
			.and_then(Value::as_i64)
			.unwrap_or(0))
	}

	/// Maximum of a column over the matching rows; null when none match.
	pub async fn aggregate_max(&self, db: &Database, field: &str) -> DatabaseResult<Value> {
		let mut params = Vec::new();
		let sql = format!(
			"SELECT MAX({}) AS max_value FROM {}{}",
			quote_ident(field)?,
			quote_ident(&self.table)?,
			self.where_sql(&mut params)?
		);
		let rows = db.fetch_all(&sql, &params).await?;
		Ok(rows
			.into_iter()
			.next()
			.and_then(|mut row| row.shift_remove("max_value"))
			.unwrap_or(Value::Null))
	}
}

//! News items shown on the home page

use crate::model_admin::ModelAdmin;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nemi_core::{Error, Result};
use nemi_db::record::value_as_i64;
use nemi_db::{Database, Filter, FilterValue, QuerySet, Record};
use nemi_forms::{CharField, Form, Widget};
use serde::Serialize;
use serde_json::Value;

pub const TABLE: &str = "news_item";

/// One news entry. `headline` is trusted HTML written by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
	pub id: i64,
	pub headline: String,
	pub created: DateTime<Utc>,
}

impl NewsItem {
	pub fn from_record(record: &Record) -> Result<Self> {
		let id = record
			.get("id")
			.and_then(value_as_i64)
			.ok_or_else(|| Error::Database("news_item.id is not an integer".to_string()))?;
		let headline = record
			.get("headline")
			.and_then(Value::as_str)
			.unwrap_or_default()
			.to_string();
		let created = record
			.get("created")
			.and_then(Value::as_str)
			.and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
			.map(|dt| dt.with_timezone(&Utc))
			.ok_or_else(|| Error::Database(format!("news_item {} has no valid created time", id)))?;
		Ok(Self {
			id,
			headline,
			created,
		})
	}
}

/// The `limit` most recent news items, newest first.
pub async fn latest(db: &Database, limit: usize) -> Result<Vec<NewsItem>> {
	let records = QuerySet::new(TABLE)
		.order_by(&["-created", "-id"])
		.limit(limit as u64)
		.fetch(db)
		.await?;
	records.iter().map(NewsItem::from_record).collect()
}

/// Admin for [`NewsItem`]: the list shows the rendered headline and the
/// creation time, newest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewsItemAdmin;

impl NewsItemAdmin {
	fn headline(form: &Form) -> Result<String> {
		form.cleaned("headline")
			.and_then(Value::as_str)
			.map(str::to_string)
			.ok_or_else(|| Error::Validation("headline is required".to_string()))
	}
}

#[async_trait]
impl ModelAdmin for NewsItemAdmin {
	fn model_name(&self) -> &str {
		"newsitem"
	}

	fn app_label(&self) -> &str {
		"newsfeed"
	}

	fn table_name(&self) -> &str {
		TABLE
	}

	fn list_display(&self) -> Vec<&str> {
		vec!["headline_display", "created"]
	}

	fn ordering(&self) -> Vec<&str> {
		vec!["-created"]
	}

	fn column_label(&self, column: &str) -> String {
		match column {
			"headline_display" => "Headline".to_string(),
			other => nemi_forms::pretty_name(other),
		}
	}

	fn display_value(&self, column: &str, record: &Record) -> Value {
		match column {
			// Rendered unescaped by the list template.
			"headline_display" => record.get("headline").cloned().unwrap_or(Value::Null),
			other => record.get(other).cloned().unwrap_or(Value::Null),
		}
	}

	fn form(&self) -> Form {
		Form::new().with_field(
			CharField::new("headline")
				.required()
				.with_widget(Widget::TextArea),
		)
	}

	async fn create(&self, db: &Database, form: &Form) -> Result<i64> {
		let rows = db
			.fetch_all(
				"INSERT INTO news_item (headline, created) VALUES (?, ?) RETURNING id",
				&[
					FilterValue::from(Self::headline(form)?),
					FilterValue::from(Utc::now().to_rfc3339()),
				],
			)
			.await?;
		let id = rows
			.first()
			.and_then(|row| row.get("id"))
			.and_then(value_as_i64)
			.ok_or_else(|| Error::Internal("insert returned no news item id".to_string()))?;
		tracing::info!(news_item = id, "news item created");
		Ok(id)
	}

	async fn update(&self, db: &Database, pk: i64, form: &Form) -> Result<()> {
		let updated = db
			.execute(
				"UPDATE news_item SET headline = ? WHERE id = ?",
				&[FilterValue::from(Self::headline(form)?), FilterValue::from(pk)],
			)
			.await?;
		if updated == 0 {
			return Err(Error::NotFound(format!("news item {} does not exist", pk)));
		}
		tracing::info!(news_item = pk, "news item updated");
		Ok(())
	}
}

/// Row `pk` of the admin's table, or 404.
pub async fn get_object(db: &Database, admin: &dyn ModelAdmin, pk: i64) -> Result<Record> {
	Ok(QuerySet::new(admin.table_name())
		.filter(Filter::eq(admin.pk_field(), pk))
		.get(db)
		.await?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	async fn db() -> Database {
		let db = Database::connect_in_memory().await.unwrap();
		db.apply_schema().await.unwrap();
		db.execute_script(
			"INSERT INTO news_item (headline, created) VALUES
			 ('<b>First</b>', '2024-01-01T00:00:00+00:00'),
			 ('Second', '2024-02-01T00:00:00+00:00'),
			 ('Third', '2024-03-01T00:00:00+00:00');",
		)
		.await
		.unwrap();
		db
	}

	#[rstest]
	#[tokio::test]
	async fn test_latest_is_newest_first(#[future] db: Database) {
		// Act
		let items = latest(&db.await, 2).await.unwrap();

		// Assert
		let headlines: Vec<&str> = items.iter().map(|i| i.headline.as_str()).collect();
		assert_eq!(headlines, vec!["Third", "Second"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_create_then_update(#[future] db: Database) {
		// Arrange
		let db = db.await;
		let admin = NewsItemAdmin;
		let mut form = admin.form();
		form.bind(std::collections::HashMap::from([(
			"headline".to_string(),
			json!("<i>Fourth</i>"),
		)]));
		assert!(form.is_valid());

		// Act
		let id = admin.create(&db, &form).await.unwrap();
		admin.update(&db, id, &form).await.unwrap();
		let missing = admin.update(&db, 999, &form).await;

		// Assert
		assert_eq!(id, 4);
		let record = get_object(&db, &admin, id).await.unwrap();
		assert_eq!(record["headline"], "<i>Fourth</i>");
		assert_eq!(missing.unwrap_err().status_code(), 404);
	}

	#[rstest]
	fn test_headline_display_is_raw_html() {
		// Arrange
		let mut record = Record::new();
		record.insert("headline".into(), json!("<b>Hi</b>"));

		// Act
		let value = NewsItemAdmin.display_value("headline_display", &record);

		// Assert
		assert_eq!(value, json!("<b>Hi</b>"));
		assert_eq!(NewsItemAdmin.column_label("headline_display"), "Headline");
		assert_eq!(NewsItemAdmin.change_url(4), "/admin/newsfeed/newsitem/4/change/");
	}
}

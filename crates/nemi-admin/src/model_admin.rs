//! Model admin configuration and trait
//!
//! A [`ModelAdmin`] tells the generic admin views which table to list, how to
//! order and display it, and how a submitted form is saved.

use async_trait::async_trait;
use nemi_core::Result;
use nemi_db::{Database, Record};
use nemi_forms::{Form, pretty_name};
use serde_json::Value;

/// Trait for configuring model administration
#[async_trait]
pub trait ModelAdmin: Send + Sync {
	/// Lowercase model name used in URLs, e.g. `newsitem`.
	fn model_name(&self) -> &str;

	/// Application label used in URLs, e.g. `newsfeed`.
	fn app_label(&self) -> &str;

	fn table_name(&self) -> &str;

	fn pk_field(&self) -> &str {
		"id"
	}

	/// Columns of the list view. Names without a table column are computed by
	/// [`ModelAdmin::display_value`].
	fn list_display(&self) -> Vec<&str> {
		vec![self.pk_field()]
	}

	/// Ordering for list view (prefix with "-" for descending)
	fn ordering(&self) -> Vec<&str> {
		vec!["-id"]
	}

	fn column_label(&self, column: &str) -> String {
		pretty_name(column)
	}

	/// Value of one list column for a row.
	fn display_value(&self, column: &str, record: &Record) -> Value {
		record.get(column).cloned().unwrap_or(Value::Null)
	}

	/// Unbound add/change form.
	fn form(&self) -> Form;

	/// Insert a validated form, returning the new primary key.
	async fn create(&self, db: &Database, form: &Form) -> Result<i64>;

	/// Update row `pk` from a validated form.
	async fn update(&self, db: &Database, pk: i64, form: &Form) -> Result<()>;

	/// `/admin/<app_label>/<model_name>/`
	fn changelist_url(&self) -> String {
		format!("/admin/{}/{}/", self.app_label(), self.model_name())
	}

	fn add_url(&self) -> String {
		format!("{}add/", self.changelist_url())
	}

	fn change_url(&self, pk: i64) -> String {
		format!("{}{}/change/", self.changelist_url(), pk)
	}
}

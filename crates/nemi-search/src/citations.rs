//! Statistical source citations: create, update, detail and summary
//!
//! Creating and updating require an authenticated user. New citations are
//! unapproved and typed `Statistic`; their id is one past the current maximum,
//! allocated inside the insert statement itself.

use crate::page::record_value;
use crate::renderer::ResponseRenderer;
use async_trait::async_trait;
use chrono::Utc;
use nemi_core::{Error, Handler, Method, Request, Response, Result, TemplateContext};
use nemi_db::record::value_as_i64;
use nemi_db::{Database, DatabaseError, Filter, FilterValue, QuerySet, Record};
use nemi_forms::{CharField, Form, IntegerField, Widget};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const TABLE: &str = "source_citation_ref";
const CITATION_TYPE: &str = "Statistic";
const UNAPPROVED: &str = "F";

pub const TITLE_MAX_LENGTH: usize = 450;

/// Editable columns, in form order.
pub const EDIT_FIELDS: &[&str] = &[
	"title",
	"author",
	"abstract_summary",
	"source_organization",
	"source_url",
	"publication_year",
	"item_type",
	"complexity",
	"analysis_types",
	"sponser_types",
	"design_objectives",
	"media_emphasized",
	"special_topics",
];

pub fn edit_form() -> Form {
	let text = |name: &str| CharField::new(name);
	Form::new()
		.with_field(
			CharField::new("title")
				.required()
				.with_max_length(TITLE_MAX_LENGTH),
		)
		.with_field(text("author"))
		.with_field(text("abstract_summary").with_widget(Widget::TextArea))
		.with_field(text("source_organization"))
		.with_field(text("source_url").with_label("Source URL"))
		.with_field(IntegerField::new("publication_year"))
		.with_field(text("item_type"))
		.with_field(text("complexity"))
		.with_field(text("analysis_types"))
		.with_field(text("sponser_types").with_label("Sponsor types"))
		.with_field(text("design_objectives"))
		.with_field(text("media_emphasized"))
		.with_field(text("special_topics"))
}

/// Cleaned edit values as statement parameters; empty text is stored as null.
fn edit_params(form: &Form) -> Vec<FilterValue> {
	EDIT_FIELDS
		.iter()
		.map(|field| match form.cleaned(field) {
			None | Some(Value::Null) => FilterValue::Null,
			Some(Value::String(s)) if s.is_empty() => FilterValue::Null,
			Some(value) => FilterValue::from_json(value),
		})
		.collect()
}

pub fn detail_url(id: i64) -> String {
	format!("/statistics/sources/{}/", id)
}

fn require_user(request: &Request) -> Result<String> {
	request
		.user()
		.map(|user| user.username.clone())
		.ok_or_else(|| Error::Unauthorized("Authentication required".to_string()))
}

fn bound_edit_form(request: &Request) -> Result<Form> {
	let mut form = edit_form();
	form.bind_pairs(&request.form_pairs()?);
	Ok(form)
}

/// Id of the `Statistic` citation type. Its absence is a deployment error.
pub async fn statistic_type_id(db: &Database) -> Result<i64> {
	let record = QuerySet::new("citation_type_ref")
		.filter(Filter::eq("citation_type", CITATION_TYPE))
		.get(db)
		.await
		.map_err(|e| match e {
			DatabaseError::NotFound(_) => Error::ImproperlyConfigured(format!(
				"citation type {:?} is missing from citation_type_ref",
				CITATION_TYPE
			)),
			other => other.into(),
		})?;
	record
		.get("citation_type_id")
		.and_then(value_as_i64)
		.ok_or_else(|| Error::ImproperlyConfigured("citation_type_id is not an integer".to_string()))
}

/// Insert a new statistical citation and return its id.
pub async fn create_citation(db: &Database, form: &Form, username: &str) -> Result<i64> {
	let type_id = statistic_type_id(db).await?;
	let now = Utc::now().to_rfc3339();

	let placeholders = vec!["?"; EDIT_FIELDS.len()].join(", ");
	let sql = format!(
		"INSERT INTO {table} (source_citation_id, {columns}, approve_flag, citation_type_id, \
		 insert_person_name, insert_date, last_update_date) \
		 SELECT COALESCE(MAX(source_citation_id), 0) + 1, {placeholders}, ?, ?, ?, ?, ? FROM {table} \
		 RETURNING source_citation_id",
		table = TABLE,
		columns = EDIT_FIELDS.join(", "),
		placeholders = placeholders,
	);

	let mut params = edit_params(form);
	params.extend([
		FilterValue::from(UNAPPROVED),
		FilterValue::from(type_id),
		FilterValue::from(username),
		FilterValue::from(now.clone()),
		FilterValue::from(now),
	]);

	let rows = db.fetch_all(&sql, &params).await?;
	let id = rows
		.first()
		.and_then(|row| row.get("source_citation_id"))
		.and_then(value_as_i64)
		.ok_or_else(|| Error::Internal("insert returned no citation id".to_string()))?;
	tracing::info!(citation_id = id, user = %username, "statistical source created");
	Ok(id)
}

/// Overwrite the editable columns of citation `id`.
pub async fn update_citation(db: &Database, id: i64, form: &Form) -> Result<()> {
	let assignments = EDIT_FIELDS
		.iter()
		.map(|field| format!("{} = ?", field))
		.collect::<Vec<_>>()
		.join(", ");
	let sql = format!(
		"UPDATE {} SET {}, last_update_date = ? WHERE source_citation_id = ?",
		TABLE, assignments
	);

	let mut params = edit_params(form);
	params.push(FilterValue::from(Utc::now().to_rfc3339()));
	params.push(FilterValue::from(id));

	if db.execute(&sql, &params).await? == 0 {
		return Err(Error::NotFound(format!("citation {} does not exist", id)));
	}
	tracing::info!(citation_id = id, "statistical source updated");
	Ok(())
}

pub async fn citation(db: &Database, id: i64) -> Result<Record> {
	Ok(QuerySet::new(TABLE)
		.filter(Filter::eq("source_citation_id", id))
		.get(db)
		.await?)
}

fn form_context(form: &Form) -> TemplateContext {
	let mut context = TemplateContext::new();
	context.insert("form".into(), form.to_context());
	context
}

/// `/statistics/sources/add/`
pub struct AddStatisticalSourceView {
	db: Database,
	renderer: Arc<dyn ResponseRenderer>,
}

impl AddStatisticalSourceView {
	pub const TEMPLATE: &'static str = "create_statistic_source.html";

	pub fn new(db: Database, renderer: Arc<dyn ResponseRenderer>) -> Self {
		Self { db, renderer }
	}
}

#[async_trait]
impl Handler for AddStatisticalSourceView {
	async fn handle(&self, request: Request) -> Result<Response> {
		let username = require_user(&request)?;
		match request.method {
			Method::GET => self.renderer.render(Self::TEMPLATE, &form_context(&edit_form())),
			Method::POST => {
				let mut form = bound_edit_form(&request)?;
				if !form.is_valid() {
					return self.renderer.render(Self::TEMPLATE, &form_context(&form));
				}
				let id = create_citation(&self.db, &form, &username).await?;
				Ok(Response::found(&detail_url(id)))
			}
			_ => Err(Error::MethodNotAllowed(request.method.to_string())),
		}
	}
}

/// `/statistics/sources/{pk}/edit/`
pub struct UpdateStatisticalSourceView {
	db: Database,
	renderer: Arc<dyn ResponseRenderer>,
}

impl UpdateStatisticalSourceView {
	pub const TEMPLATE: &'static str = "update_statistic_source.html";

	pub fn new(db: Database, renderer: Arc<dyn ResponseRenderer>) -> Self {
		Self { db, renderer }
	}
}

#[async_trait]
impl Handler for UpdateStatisticalSourceView {
	async fn handle(&self, request: Request) -> Result<Response> {
		require_user(&request)?;
		let id: i64 = request.parse_path_param("pk")?;
		let current = citation(&self.db, id).await?;

		let form = match request.method {
			Method::GET => {
				let mut form = edit_form();
				let initial: HashMap<String, Value> = EDIT_FIELDS
					.iter()
					.filter_map(|field| {
						current
							.get(*field)
							.map(|value| (field.to_string(), value.clone()))
					})
					.collect();
				form.set_initial(initial);
				form
			}
			Method::POST => {
				let mut form = bound_edit_form(&request)?;
				if form.is_valid() {
					update_citation(&self.db, id, &form).await?;
					return Ok(Response::found(&detail_url(id)));
				}
				form
			}
			_ => return Err(Error::MethodNotAllowed(request.method.to_string())),
		};

		let mut context = form_context(&form);
		context.insert("object".into(), record_value(current));
		self.renderer.render(Self::TEMPLATE, &context)
	}
}

/// Read-only citation page: the detail and summary views differ only by template.
pub struct StatisticalSourceView {
	db: Database,
	renderer: Arc<dyn ResponseRenderer>,
	template: &'static str,
}

impl StatisticalSourceView {
	pub fn detail(db: Database, renderer: Arc<dyn ResponseRenderer>) -> Self {
		Self {
			db,
			renderer,
			template: "statistical_source_detail.html",
		}
	}

	pub fn summary(db: Database, renderer: Arc<dyn ResponseRenderer>) -> Self {
		Self {
			db,
			renderer,
			template: "statistical_source_summary.html",
		}
	}
}

#[async_trait]
impl Handler for StatisticalSourceView {
	async fn handle(&self, request: Request) -> Result<Response> {
		let id: i64 = request.parse_path_param("pk")?;
		let mut context = TemplateContext::new();
		context.insert("data".into(), record_value(citation(&self.db, id).await?));
		self.renderer.render(self.template, &context)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::renderer::JsonRenderer;
	use nemi_core::AuthenticatedUser;
	use rstest::{fixture, rstest};

	#[fixture]
	async fn db() -> Database {
		let db = Database::connect_in_memory().await.unwrap();
		db.apply_schema().await.unwrap();
		db
	}

	fn post(uri: &str, body: &str, user: Option<&str>) -> Request {
		let mut request = Request::builder()
			.method(Method::POST)
			.uri(uri)
			.header("content-type", "application/x-www-form-urlencoded")
			.body(body.to_string())
			.build()
			.unwrap();
		if let Some(user) = user {
			request.set_user(AuthenticatedUser::new(user));
		}
		request
	}

	fn get(uri: &str, pk: Option<&str>) -> Request {
		let mut request = Request::builder().uri(uri).build().unwrap();
		request.set_user(AuthenticatedUser::new("editor"));
		if let Some(pk) = pk {
			request.set_path_param("pk", pk);
		}
		request
	}

	#[rstest]
	#[tokio::test]
	async fn test_first_citation_gets_id_one(#[future] db: Database) {
		// Arrange
		let db = db.await;
		let view = AddStatisticalSourceView::new(db.clone(), Arc::new(JsonRenderer));

		// Act
		let response = view
			.handle(post(
				"/statistics/sources/add/",
				"title=Trend+analysis&publication_year=2004&item_type=Book",
				Some("editor"),
			))
			.await
			.unwrap();

		// Assert
		assert_eq!(response.status.as_u16(), 302);
		assert_eq!(response.headers.get("location").unwrap(), "/statistics/sources/1/");
		let row = citation(&db, 1).await.unwrap();
		assert_eq!(row["title"], "Trend analysis");
		assert_eq!(row["publication_year"], 2004);
		assert_eq!(row["approve_flag"], UNAPPROVED);
		assert_eq!(row["citation_type_id"], 2);
		assert_eq!(row["insert_person_name"], "editor");
		assert_eq!(row["author"], Value::Null);
	}

	#[rstest]
	#[tokio::test]
	async fn test_next_id_is_max_plus_one(#[future] db: Database) {
		// Arrange
		let db = db.await;
		db.execute_script("INSERT INTO source_citation_ref (source_citation_id, title) VALUES (41, 'Old');")
			.await
			.unwrap();
		let view = AddStatisticalSourceView::new(db.clone(), Arc::new(JsonRenderer));

		// Act
		let response = view
			.handle(post("/statistics/sources/add/", "title=New", Some("editor")))
			.await
			.unwrap();

		// Assert
		assert_eq!(response.headers.get("location").unwrap(), "/statistics/sources/42/");
	}

	#[rstest]
	#[tokio::test]
	async fn test_create_requires_user(#[future] db: Database) {
		// Arrange
		let view = AddStatisticalSourceView::new(db.await, Arc::new(JsonRenderer));

		// Act
		let result = view
			.handle(post("/statistics/sources/add/", "title=New", None))
			.await;

		// Assert
		assert_eq!(result.unwrap_err().status_code(), 401);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_title_rerenders_form(#[future] db: Database) {
		// Arrange
		let db = db.await;
		let view = AddStatisticalSourceView::new(db.clone(), Arc::new(JsonRenderer));

		// Act
		let response = view
			.handle(post("/statistics/sources/add/", "author=Helsel", Some("editor")))
			.await
			.unwrap();

		// Assert
		assert_eq!(response.status.as_u16(), 200);
		let body: Value = serde_json::from_slice(&response.body).unwrap();
		assert!(
			!body["context"]["form"]["field"]["title"]["errors"]
				.as_array()
				.unwrap()
				.is_empty()
		);
		assert_eq!(QuerySet::new(TABLE).count(&db).await.unwrap(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_statistic_type_is_misconfiguration(#[future] db: Database) {
		// Arrange
		let db = db.await;
		db.execute_script("DELETE FROM citation_type_ref WHERE citation_type = 'Statistic';")
			.await
			.unwrap();
		let view = AddStatisticalSourceView::new(db, Arc::new(JsonRenderer));

		// Act
		let result = view
			.handle(post("/statistics/sources/add/", "title=New", Some("editor")))
			.await;

		// Assert
		let err = result.unwrap_err();
		assert!(matches!(err, Error::ImproperlyConfigured(_)));
		assert_eq!(err.status_code(), 500);
	}

	#[rstest]
	#[tokio::test]
	async fn test_update_prefills_and_saves(#[future] db: Database) {
		// Arrange
		let db = db.await;
		db.execute_script(
			"INSERT INTO source_citation_ref (source_citation_id, title, complexity, citation_type_id)
			 VALUES (5, 'Draft', 'Low', 2);",
		)
		.await
		.unwrap();
		let view = UpdateStatisticalSourceView::new(db.clone(), Arc::new(JsonRenderer));
		let mut request = post("/statistics/sources/5/edit/", "title=Final&complexity=High", Some("editor"));
		request.set_path_param("pk", "5");

		// Act
		let prefilled = view
			.handle(get("/statistics/sources/5/edit/", Some("5")))
			.await
			.unwrap();
		let saved = view.handle(request).await.unwrap();

		// Assert
		let body: Value = serde_json::from_slice(&prefilled.body).unwrap();
		assert_eq!(body["context"]["form"]["field"]["title"]["value"], "Draft");
		assert_eq!(saved.headers.get("location").unwrap(), "/statistics/sources/5/");
		let row = citation(&db, 5).await.unwrap();
		assert_eq!(row["title"], "Final");
		assert_eq!(row["complexity"], "High");
	}

	#[rstest]
	#[case(true)]
	#[case(false)]
	#[tokio::test]
	async fn test_unknown_citation_is_not_found(#[future] db: Database, #[case] summary: bool) {
		// Arrange
		let db = db.await;
		let renderer = Arc::new(JsonRenderer);
		let view = if summary {
			StatisticalSourceView::summary(db, renderer)
		} else {
			StatisticalSourceView::detail(db, renderer)
		};

		// Act
		let result = view.handle(get("/statistics/sources/9/", Some("9"))).await;

		// Assert
		assert_eq!(result.unwrap_err().status_code(), 404);
	}
}

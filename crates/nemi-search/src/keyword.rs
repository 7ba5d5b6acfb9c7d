//! Paginated keyword search over the full-text index

use crate::renderer::ResponseRenderer;
use async_trait::async_trait;
use nemi_core::{Handler, Paginator, Request, Response, Result, TemplateContext};
use nemi_db::{Database, FullTextSearch};
use nemi_forms::{CharField, Form};
use serde_json::{Value, json};
use std::sync::Arc;

pub const TEMPLATE: &str = "keyword_search.html";

pub const DEFAULT_PAGE_SIZE: usize = 20;

pub fn keyword_form() -> Form {
	Form::new().with_field(
		CharField::new("keywords")
			.with_label("Keywords")
			.with_help_text("Methods matching any of the words are listed, best matches first.")
			.required(),
	)
}

/// Keyword search page.
///
/// Results are ranked by the [`FullTextSearch`] backend and paginated; an
/// out-of-range `page` is served as the last page.
pub struct KeywordSearchView {
	db: Database,
	search: Arc<dyn FullTextSearch>,
	renderer: Arc<dyn ResponseRenderer>,
	page_size: usize,
}

impl KeywordSearchView {
	pub fn new(
		db: Database,
		search: Arc<dyn FullTextSearch>,
		renderer: Arc<dyn ResponseRenderer>,
	) -> Self {
		Self {
			db,
			search,
			renderer,
			page_size: DEFAULT_PAGE_SIZE,
		}
	}

	pub fn with_page_size(mut self, page_size: usize) -> Self {
		self.page_size = page_size.max(1);
		self
	}
}

/// The request path and query without the `page` parameter, so templates can
/// append `&page=N`.
pub fn current_url(request: &Request) -> String {
	format!("{}?{}", request.path(), request.query_string_without(&["page"]))
}

#[async_trait]
impl Handler for KeywordSearchView {
	async fn handle(&self, request: Request) -> Result<Response> {
		let mut form = keyword_form();
		let mut context = TemplateContext::new();

		if request.has_query() {
			form.bind_pairs(request.query_pairs());
			if form.is_valid() {
				let keywords = form
					.cleaned("keywords")
					.and_then(Value::as_str)
					.unwrap_or_default();
				let rows = self.search.search(&self.db, keywords).await?;
				tracing::debug!(keywords = %keywords, matches = rows.len(), "keyword search");

				let page = Paginator::new(rows, self.page_size)
					.page_or_last(request.query_param("page"));
				context.insert("results".into(), serde_json::to_value(&page)?);
				context.insert("current_url".into(), json!(current_url(&request)));
			}
		}

		context.insert("form".into(), form.to_context());
		self.renderer.render(TEMPLATE, &context)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::renderer::JsonRenderer;
	use nemi_db::Fts5Search;
	use rstest::{fixture, rstest};

	#[fixture]
	async fn view() -> KeywordSearchView {
		let db = Database::connect_in_memory().await.unwrap();
		db.apply_schema().await.unwrap();
		let mut script = String::new();
		for id in 1..=45 {
			script.push_str(&format!(
				"INSERT INTO method_fact (method_id, source_method_identifier, method_official_name) \
				 VALUES ({id}, 'M-{id}', 'Method {id}');
				 INSERT INTO method_fts (rowid, source_method_identifier, method_text) \
				 VALUES ({id}, 'M-{id}', 'nitrate in water');"
			));
		}
		db.execute_script(&script).await.unwrap();
		KeywordSearchView::new(db, Arc::new(Fts5Search), Arc::new(JsonRenderer))
	}

	async fn context(view: &KeywordSearchView, uri: &str) -> Value {
		let request = Request::builder().uri(uri).build().unwrap();
		let response = view.handle(request).await.unwrap();
		let body: Value = serde_json::from_slice(&response.body).unwrap();
		body["context"].clone()
	}

	#[rstest]
	#[tokio::test]
	async fn test_blank_request_renders_unbound_form(#[future] view: KeywordSearchView) {
		// Act
		let context = context(&view.await, "/search/keyword/").await;

		// Assert
		assert_eq!(context["form"]["is_bound"], false);
		assert!(context.get("results").is_none());
		assert!(
			context["form"]["field"]["keywords"]["help_text"]
				.as_str()
				.unwrap()
				.starts_with("Methods matching any")
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_keywords_rerender_form(#[future] view: KeywordSearchView) {
		// Act
		let context = context(&view.await, "/search/keyword/?keywords=").await;

		// Assert
		assert_eq!(context["form"]["is_bound"], true);
		assert!(context.get("results").is_none());
		assert!(context.get("current_url").is_none());
	}

	#[rstest]
	#[case("1", 1, 20)]
	#[case("3", 3, 5)]
	#[case("9999", 3, 5)]
	#[case("x", 1, 20)]
	#[tokio::test]
	async fn test_pages_clamp_to_last(
		#[future] view: KeywordSearchView,
		#[case] page: &str,
		#[case] number: u64,
		#[case] len: usize,
	) {
		// Act
		let context = context(
			&view.await,
			&format!("/search/keyword/?keywords=nitrate&page={}", page),
		)
		.await;

		// Assert
		let results = &context["results"];
		assert_eq!(results["number"].as_u64().unwrap(), number);
		assert_eq!(results["num_pages"], 3);
		assert_eq!(results["count"], 45);
		assert_eq!(results["object_list"].as_array().unwrap().len(), len);
		assert_eq!(context["current_url"], "/search/keyword/?keywords=nitrate");
	}

	#[rstest]
	#[tokio::test]
	async fn test_no_matches_is_one_empty_page(#[future] view: KeywordSearchView) {
		// Act
		let context = context(&view.await, "/search/keyword/?keywords=cyanide").await;

		// Assert
		let results = &context["results"];
		assert_eq!(results["num_pages"], 1);
		assert_eq!(results["number"], 1);
		assert!(results["object_list"].as_array().unwrap().is_empty());
	}
}

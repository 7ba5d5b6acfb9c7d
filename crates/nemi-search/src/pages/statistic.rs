//! Statistical source search over `statistical_source_vw`
//!
//! Apart from complexity, every classification select is optional: leaving it
//! empty adds no filter. Results are the raw citation rows.

use super::value_select;
use crate::choices::value_choices;
use crate::page::{FilterChain, FilterRule, FormValidator, SearchPage};
use crate::renderer::ResponseRenderer;
use async_trait::async_trait;
use nemi_core::Result;
use nemi_db::{Database, Filter, QuerySet};
use nemi_forms::{ChoiceField, Form};
use std::sync::Arc;

pub const TEMPLATE: &str = "statistic_search.html";

const CITATION_TYPE: &str = "Statistic";

/// Optional classification selects as `(field, label)`.
const OPTIONAL_FIELDS: &[(&str, &str)] = &[
	("item_type", "Item type"),
	("analysis_types", "Analysis types"),
	("sponser_types", "Sponsor types"),
	("design_objectives", "Design objectives"),
	("media_emphasized", "Media emphasized"),
	("special_topics", "Special topics"),
];

fn base() -> QuerySet {
	QuerySet::new("statistical_source_vw").filter(Filter::eq("citation_type", CITATION_TYPE))
}

async fn optional_select(db: &Database, name: &str, label: &str) -> Result<ChoiceField<String>> {
	let choices = value_choices(db, base(), name).await?;
	Ok(ChoiceField::new(name)
		.with_label(label)
		.with_choices(choices)
		.not_required())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticSearchForm;

#[async_trait]
impl FormValidator for StatisticSearchForm {
	async fn build_form(&self, db: &Database) -> Result<Form> {
		let mut form = Form::new();
		for (position, (name, label)) in OPTIONAL_FIELDS.iter().enumerate() {
			form.add_field(Box::new(optional_select(db, name, label).await?));
			if position == 0 {
				form.add_field(Box::new(
					value_select(db, base(), "complexity", "Complexity", "complexity").await?,
				));
			}
		}
		Ok(form)
	}
}

pub fn filter_chain() -> FilterChain {
	FilterChain::new(base())
		.with_rule(FilterRule::exact("item_type", "item_type"))
		.with_rule(FilterRule::exact("complexity", "complexity"))
		.with_rule(FilterRule::exact("analysis_types", "analysis_types"))
		.with_rule(FilterRule::exact("sponser_types", "sponser_types"))
		.with_rule(FilterRule::exact("design_objectives", "design_objectives"))
		.with_rule(FilterRule::exact("media_emphasized", "media_emphasized"))
		.with_rule(FilterRule::exact("special_topics", "special_topics"))
}

pub fn page(db: Database, renderer: Arc<dyn ResponseRenderer>) -> SearchPage {
	SearchPage::new(
		TEMPLATE,
		Arc::new(StatisticSearchForm),
		Arc::new(filter_chain()),
		renderer,
		db,
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::renderer::JsonRenderer;
	use nemi_core::Request;
	use rstest::{fixture, rstest};
	use serde_json::{Value, json};

	#[fixture]
	async fn db() -> Database {
		let db = Database::connect_in_memory().await.unwrap();
		db.apply_schema().await.unwrap();
		db.execute_script(
			"INSERT INTO source_citation_ref (source_citation_id, title, item_type, complexity, citation_type_id, approve_flag) VALUES
			 (1, 'Trend analysis primer', 'Book', 'Low', 2, 'T'),
			 (2, 'Censored data methods', 'Journal article', 'High', 2, 'T'),
			 (3, 'A method citation', 'Book', 'Low', 1, 'T');",
		)
		.await
		.unwrap();
		db
	}

	async fn context(db: Database, query: &str) -> Value {
		let page = page(db, Arc::new(JsonRenderer));
		let request = Request::builder()
			.uri(format!("/search/statistics/?{}", query))
			.build()
			.unwrap();
		let response = page.render_results(&request).await.unwrap();
		let body: Value = serde_json::from_slice(&response.body).unwrap();
		body["context"].clone()
	}

	#[rstest]
	#[tokio::test]
	async fn test_fields_keep_display_order(#[future] db: Database) {
		// Act
		let form = StatisticSearchForm.build_form(&db.await).await.unwrap();

		// Assert
		let names: Vec<&str> = form.fields().iter().map(|f| f.name()).collect();
		assert_eq!(
			names,
			vec![
				"item_type",
				"complexity",
				"analysis_types",
				"sponser_types",
				"design_objectives",
				"media_emphasized",
				"special_topics",
			]
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_empty_optionals_return_only_statistics(#[future] db: Database) {
		// Act
		let context = context(db.await, "item_type=&complexity=all").await;

		// Assert
		let results = context["results"].as_array().unwrap();
		assert_eq!(results.len(), 2);
		assert!(results.iter().all(|row| row["citation_type"] == "Statistic"));
		assert_eq!(context["header_defs"], Value::Null);
		assert_eq!(context["criteria"], json!([]));
		assert!(context.get("selected_method_types").is_none());
	}

	#[rstest]
	#[tokio::test]
	async fn test_optional_value_filters_and_is_named(#[future] db: Database) {
		// Act
		let context = context(db.await, "item_type=Book&complexity=Low").await;

		// Assert
		let results = context["results"].as_array().unwrap();
		assert_eq!(results.len(), 1);
		assert_eq!(results[0]["title"], "Trend analysis primer");
		assert_eq!(
			context["criteria"],
			json!([
				{"label": "Item type", "value": "Book"},
				{"label": "Complexity", "value": "Low"},
			])
		);
	}
}

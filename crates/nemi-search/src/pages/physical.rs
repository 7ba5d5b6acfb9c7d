//! Physical search (method subcategory 9)

use super::{id_select, method_type_descs};
use crate::page::{FilterChain, FilterRule, FormValidator, SearchPage};
use crate::renderer::ResponseRenderer;
use async_trait::async_trait;
use nemi_core::Result;
use nemi_db::{Database, Filter, QuerySet};
use nemi_forms::Form;
use std::sync::Arc;

pub const TEMPLATE: &str = "physical_search.html";

const SUBCATEGORY_ID: i64 = 9;

pub const RESULT_FIELDS: &[&str] = &[
	"method_id",
	"source_method_identifier",
	"method_descriptive_name",
	"method_source",
	"method_source_contact",
	"method_source_url",
	"media_name",
	"instrumentation_description",
];

pub const HEADER_ABBREVS: &[&str] = &[
	"SOURCE_METHOD_IDENTIFIER",
	"METHOD_DESCRIPTIVE_NAME",
	"METHOD_SOURCE",
	"MEDIA_NAME",
	"GEAR_TYPE",
];

fn base() -> QuerySet {
	QuerySet::new("method_analyte_all_vw").filter(Filter::eq("method_subcategory_id", SUBCATEGORY_ID))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicalSearchForm;

#[async_trait]
impl FormValidator for PhysicalSearchForm {
	async fn build_form(&self, db: &Database) -> Result<Form> {
		Ok(Form::new()
			.with_field(id_select(db, base(), "analyte", "Analyte", "analyte_id", "analyte_name").await?)
			.with_field(method_type_descs(db, base()).await?))
	}
}

pub fn filter_chain() -> FilterChain {
	FilterChain::new(base())
		.with_rule(FilterRule::exact("analyte", "analyte_id"))
		.with_rule(FilterRule::is_in("method_types", "method_type_desc"))
}

pub fn page(db: Database, renderer: Arc<dyn ResponseRenderer>) -> SearchPage {
	SearchPage::new(
		TEMPLATE,
		Arc::new(PhysicalSearchForm),
		Arc::new(filter_chain()),
		renderer,
		db,
	)
	.with_result_fields(RESULT_FIELDS)
	.with_header_abbrevs(HEADER_ABBREVS)
	.with_selection_field("method_types")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pages::fixtures::seeded;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_choices_are_limited_to_subcategory() {
		// Arrange
		let db = seeded().await;

		// Act
		let form = PhysicalSearchForm.build_form(&db).await.unwrap();

		// Assert
		let analytes = form.get_field("analyte").unwrap().choices();
		let labels: Vec<&str> = analytes.iter().map(|c| c.label.as_str()).collect();
		assert_eq!(labels, vec!["Any", "Temperature"]);
	}
}

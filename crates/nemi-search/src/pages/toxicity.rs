//! Toxicity assay search

use super::{method_type_descs, value_select};
use crate::page::{FilterChain, FilterRule, FormValidator, SearchPage};
use crate::renderer::ResponseRenderer;
use async_trait::async_trait;
use nemi_core::Result;
use nemi_db::{Database, Filter, QuerySet};
use nemi_forms::Form;
use std::sync::Arc;

pub const TEMPLATE: &str = "toxicity_search.html";

const CATEGORY: &str = "TOXICITY ASSAY";

/// Listed under the toxicity category but not a toxicity assay.
const EXCLUDED_METHOD: &str = "ORNL-UDLP-01";

pub const RESULT_FIELDS: &[&str] = &[
	"method_id",
	"source_method_identifier",
	"method_descriptive_name",
	"method_subcategory",
	"method_source",
	"method_source_contact",
	"method_source_url",
	"media_name",
	"matrix",
	"relative_cost_symbol",
	"cost_effort_key",
];

pub const HEADER_ABBREVS: &[&str] = &[
	"SOURCE_METHOD_IDENTIFIER",
	"METHOD_DESCRIPTIVE_NAME",
	"METHOD_SUBCATEGORY",
	"METHOD_SOURCE",
	"MEDIA_NAME",
	"MATRIX",
	"RELATIVE_COST",
];

fn base() -> QuerySet {
	QuerySet::new("method_analyte_all_vw")
		.filter(Filter::eq("method_category", CATEGORY))
		.exclude(Filter::eq("source_method_identifier", EXCLUDED_METHOD))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ToxicitySearchForm;

#[async_trait]
impl FormValidator for ToxicitySearchForm {
	async fn build_form(&self, db: &Database) -> Result<Form> {
		Ok(Form::new()
			.with_field(value_select(db, base(), "subcategory", "Subcategory", "method_subcategory").await?)
			.with_field(value_select(db, base(), "media", "Media", "media_name").await?)
			.with_field(value_select(db, base(), "matrix", "Matrix", "matrix").await?)
			.with_field(method_type_descs(db, base()).await?))
	}
}

pub fn filter_chain() -> FilterChain {
	FilterChain::new(base())
		.with_rule(FilterRule::exact("subcategory", "method_subcategory"))
		.with_rule(FilterRule::exact("media", "media_name"))
		.with_rule(FilterRule::exact("matrix", "matrix"))
		.with_rule(FilterRule::is_in("method_types", "method_type_desc"))
}

pub fn page(db: Database, renderer: Arc<dyn ResponseRenderer>) -> SearchPage {
	SearchPage::new(
		TEMPLATE,
		Arc::new(ToxicitySearchForm),
		Arc::new(filter_chain()),
		renderer,
		db,
	)
	.with_result_fields(RESULT_FIELDS)
	.with_header_abbrevs(HEADER_ABBREVS)
	.with_selection_field("method_types")
}

//! General search over `method_vw`

use super::{id_select, value_select};
use crate::choices::id_choices;
use crate::greenness::decorate;
use crate::page::{ExportSpec, FilterChain, FilterRule, FormValidator, SearchPage};
use crate::renderer::ResponseRenderer;
use async_trait::async_trait;
use nemi_core::Result;
use nemi_db::{Database, QuerySet};
use nemi_forms::{Form, MultipleChoiceField};
use std::sync::Arc;

pub const TEMPLATE: &str = "general_search.html";

const TABLE: &str = "method_vw";

pub const RESULT_FIELDS: &[&str] = &[
	"source_method_identifier",
	"method_source",
	"instrumentation_description",
	"method_descriptive_name",
	"media_name",
	"method_category",
	"method_subcategory",
	"method_type_desc",
	"method_id",
	"assumptions_comments",
	"pbt",
	"toxic",
	"corrosive",
	"waste",
];

pub const HEADER_ABBREVS: &[&str] = &[
	"SOURCE_METHOD_IDENTIFIER",
	"METHOD_DESCRIPTIVE_NAME",
	"MEDIA_NAME",
	"METHOD_SOURCE",
	"INSTRUMENTATION",
	"METHOD_CATEGORY",
	"METHOD_SUBCATEGORY",
	"METHOD_TYPE",
	"GREENNESS",
];

pub const EXPORT_FIELDS: &[&str] = &[
	"method_id",
	"source_method_identifier",
	"method_descriptive_name",
	"media_name",
	"method_source",
	"instrumentation_description",
	"method_subcategory",
	"method_category",
	"method_type_desc",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralSearchForm;

#[async_trait]
impl FormValidator for GeneralSearchForm {
	async fn build_form(&self, db: &Database) -> Result<Form> {
		let base = || QuerySet::new(TABLE);
		let method_types = id_choices(db, base(), "method_type_id", "method_type_desc").await?;

		Ok(Form::new()
			.with_field(value_select(db, base(), "media_name", "Media", "media_name").await?)
			.with_field(value_select(db, base(), "source", "Source", "method_source").await?)
			.with_field(
				id_select(
					db,
					base(),
					"method_number",
					"Method number",
					"method_id",
					"source_method_identifier",
				)
				.await?,
			)
			.with_field(
				id_select(
					db,
					base(),
					"instrumentation",
					"Instrumentation",
					"instrumentation_id",
					"instrumentation_description",
				)
				.await?,
			)
			.with_field(
				id_select(
					db,
					base(),
					"method_subcategory",
					"Method subcategory",
					"method_subcategory_id",
					"method_subcategory",
				)
				.await?,
			)
			.with_field(
				MultipleChoiceField::<i64>::new("method_types")
					.with_label("Method types")
					.with_choices(method_types)
					.with_all_selected(),
			))
	}
}

pub fn filter_chain() -> FilterChain {
	FilterChain::new(QuerySet::new(TABLE))
		.with_rule(FilterRule::exact("media_name", "media_name"))
		.with_rule(FilterRule::contains("source", "method_source"))
		.with_rule(FilterRule::exact("method_number", "method_id"))
		.with_rule(FilterRule::exact("instrumentation", "instrumentation_id"))
		.with_rule(FilterRule::exact("method_subcategory", "method_subcategory_id"))
		.with_rule(FilterRule::is_in("method_types", "method_type_id"))
}

pub fn page(db: Database, renderer: Arc<dyn ResponseRenderer>) -> SearchPage {
	SearchPage::new(
		TEMPLATE,
		Arc::new(GeneralSearchForm),
		Arc::new(filter_chain()),
		renderer,
		db,
	)
	.with_result_fields(RESULT_FIELDS)
	.with_order_by("source_method_identifier")
	.with_header_abbrevs(HEADER_ABBREVS)
	.with_decorator(decorate)
	.with_selection_field("method_types")
	.with_export(ExportSpec {
		name: "general_search",
		fields: EXPORT_FIELDS,
		order_by: "source_method_identifier",
	})
}

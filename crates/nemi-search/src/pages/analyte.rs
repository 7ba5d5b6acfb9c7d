//! Analyte search over `method_analyte_all_vw`
//!
//! The first rule matches the analyte by name or by code, case-insensitively,
//! depending on `analyte_kind`.

use super::{id_select, method_type_descs, value_select};
use crate::criteria::Criterion;
use crate::greenness::decorate;
use crate::page::{ExportSpec, FilterChain, FilterRule, FormValidator, SearchPage};
use crate::renderer::ResponseRenderer;
use async_trait::async_trait;
use nemi_core::Result;
use nemi_db::{Database, Filter, FilterCondition, QuerySet};
use nemi_forms::{CharField, ChoiceField, Form};
use serde_json::Value;
use std::sync::Arc;

pub const TEMPLATE: &str = "analyte_search.html";

const TABLE: &str = "method_analyte_all_vw";

pub const RESULT_FIELDS: &[&str] = &[
	"method_source_id",
	"method_id",
	"source_method_identifier",
	"method_source",
	"method_descriptive_name",
	"dl_value",
	"dl_units_description",
	"dl_type_description",
	"dl_type",
	"accuracy",
	"accuracy_units_description",
	"accuracy_units",
	"precision",
	"precision_units_description",
	"precision_units",
	"prec_acc_conc_used",
	"dl_units",
	"instrumentation_description",
	"instrumentation",
	"relative_cost",
	"relative_cost_symbol",
	"pbt",
	"toxic",
	"corrosive",
	"waste",
	"assumptions_comments",
];

pub const HEADER_ABBREVS: &[&str] = &[
	"SOURCE_METHOD_IDENTIFIER",
	"METHOD_SOURCE",
	"METHOD_DESCRIPTIVE_NAME",
	"DL_VALUE",
	"DL_TYPE",
	"ACCURACY",
	"PRECISION",
	"PREC_ACC_CONC_USED",
	"INSTRUMENTATION",
	"RELATIVE_COST",
	"GREENNESS",
];

pub const EXPORT_FIELDS: &[&str] = &[
	"method_id",
	"method_descriptive_name",
	"method_subcategory",
	"method_category",
	"method_source_id",
	"method_source",
	"source_method_identifier",
	"analyte_name",
	"analyte_code",
	"media_name",
	"instrumentation",
	"instrumentation_description",
	"sub_dl_value",
	"dl_units",
	"dl_type",
	"dl_type_description",
	"dl_units_description",
	"sub_accuracy",
	"accuracy_units",
	"accuracy_units_description",
	"sub_precision",
	"precision_units",
	"precision_units_description",
	"false_negative_value",
	"false_positive_value",
	"prec_acc_conc_used",
	"precision_descriptor_notes",
	"relative_cost",
	"relative_cost_symbol",
];

/// Whether the analyte value is a code rather than a name.
fn by_code(form: &Form) -> bool {
	form.cleaned("analyte_kind").and_then(Value::as_str) == Some("code")
}

fn analyte_value(form: &Form) -> Option<&str> {
	form.cleaned("analyte_value")
		.and_then(Value::as_str)
		.filter(|value| !value.is_empty())
}

fn analyte_filter(form: &Form) -> Option<FilterCondition> {
	let value = analyte_value(form)?;
	let column = if by_code(form) { "analyte_code" } else { "analyte_name" };
	Some(Filter::ieq(column, value).into())
}

fn analyte_criterion(form: &Form) -> Option<Criterion> {
	let value = analyte_value(form)?;
	let label = if by_code(form) {
		"Analyte code"
	} else {
		"Analyte name"
	};
	Some(Criterion::new(label, value))
}

/// The name/code selector shared with the analyte select popup.
pub fn analyte_kind_field(name: &str) -> ChoiceField<String> {
	ChoiceField::new(name)
		.with_label("Analyte kind")
		.with_choices(vec![
			("name".to_string(), "Name".to_string()),
			("code".to_string(), "Code".to_string()),
		])
		.with_initial("name".to_string())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyteSearchForm;

#[async_trait]
impl FormValidator for AnalyteSearchForm {
	async fn build_form(&self, db: &Database) -> Result<Form> {
		let base = || QuerySet::new(TABLE);
		Ok(Form::new()
			.with_field(analyte_kind_field("analyte_kind"))
			.with_field(
				CharField::new("analyte_value")
					.with_label("Analyte")
					.required(),
			)
			.with_field(value_select(db, base(), "media_name", "Media", "media_name").await?)
			.with_field(value_select(db, base(), "source", "Source", "method_source").await?)
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
			.with_field(method_type_descs(db, base()).await?))
	}
}

pub fn filter_chain() -> FilterChain {
	FilterChain::new(QuerySet::new(TABLE))
		.with_rule(FilterRule::custom(analyte_filter, analyte_criterion))
		.with_rule(FilterRule::exact("media_name", "media_name"))
		.with_rule(FilterRule::contains("source", "method_source"))
		.with_rule(FilterRule::exact("instrumentation", "instrumentation_id"))
		.with_rule(FilterRule::exact("method_subcategory", "method_subcategory_id"))
		.with_rule(FilterRule::is_in("method_types", "method_type_desc"))
}

pub fn page(db: Database, renderer: Arc<dyn ResponseRenderer>) -> SearchPage {
	SearchPage::new(
		TEMPLATE,
		Arc::new(AnalyteSearchForm),
		Arc::new(filter_chain()),
		renderer,
		db,
	)
	.with_result_fields(RESULT_FIELDS)
	.with_header_abbrevs(HEADER_ABBREVS)
	.with_decorator(decorate)
	.with_selection_field("method_types")
	.with_export(ExportSpec {
		name: "analyte_search",
		fields: EXPORT_FIELDS,
		order_by: "method_id",
	})
}

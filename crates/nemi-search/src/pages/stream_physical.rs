//! Stream physical methods: a fixed listing with no form

use crate::header_defs::header_defs;
use crate::page::record_value;
use crate::renderer::ResponseRenderer;
use async_trait::async_trait;
use nemi_core::{Handler, Request, Response, Result, TemplateContext};
use nemi_db::{Database, Filter, QuerySet};
use serde_json::{Value, json};
use std::sync::Arc;

pub const TEMPLATE: &str = "stream_physical_search.html";

/// Identifier prefix of the stream physical methods.
const IDENTIFIER_PREFIX: &str = "WRIR";

pub const RESULT_FIELDS: &[&str] = &[
	"method_id",
	"source_method_identifier",
	"method_descriptive_name",
	"method_source",
	"method_source_contact",
	"method_source_url",
	"media_name",
	"relative_cost_symbol",
	"cost_effort_key",
];

pub const HEADER_ABBREVS: &[&str] = &[
	"SOURCE_METHOD_IDENTIFIER",
	"METHOD_DESCRIPTIVE_NAME",
	"METHOD_SOURCE",
	"MEDIA_NAME",
	"RELATIVE_COST",
];

pub fn query() -> QuerySet {
	QuerySet::new("method_analyte_jn_stg_vw")
		.filter(Filter::starts_with("source_method_identifier", IDENTIFIER_PREFIX))
		.values(RESULT_FIELDS)
		.distinct()
}

pub struct StreamPhysicalSearchView {
	db: Database,
	renderer: Arc<dyn ResponseRenderer>,
}

impl StreamPhysicalSearchView {
	pub fn new(db: Database, renderer: Arc<dyn ResponseRenderer>) -> Self {
		Self { db, renderer }
	}
}

#[async_trait]
impl Handler for StreamPhysicalSearchView {
	async fn handle(&self, _request: Request) -> Result<Response> {
		let rows = query().fetch(&self.db).await?;
		let defs = header_defs(&self.db, HEADER_ABBREVS).await?;

		let mut context = TemplateContext::new();
		context.insert("header_defs".into(), serde_json::to_value(defs)?);
		context.insert(
			"results".into(),
			Value::Array(rows.into_iter().map(record_value).collect()),
		);
		context.insert("show_results".into(), json!(true));
		self.renderer.render(TEMPLATE, &context)
	}
}

//! Analyte picker popup used by the analyte search form

use super::analyte::analyte_kind_field;
use crate::renderer::ResponseRenderer;
use async_trait::async_trait;
use nemi_core::{Handler, Request, Response, Result, TemplateContext};
use nemi_db::{Database, Filter, QuerySet};
use nemi_forms::{CharField, Form};
use serde_json::{Value, json};
use std::sync::Arc;

pub const TEMPLATE: &str = "find_analyte.html";

pub fn select_form() -> Form {
	Form::new()
		.with_field(analyte_kind_field("kind"))
		.with_field(CharField::new("value").with_label("Analyte"))
}

pub struct AnalyteSelectView {
	db: Database,
	renderer: Arc<dyn ResponseRenderer>,
}

impl AnalyteSelectView {
	pub fn new(db: Database, renderer: Arc<dyn ResponseRenderer>) -> Self {
		Self { db, renderer }
	}

	/// Analyte names (or codes) containing `value`, ignoring case.
	pub async fn matches(&self, kind: &str, value: &str) -> Result<Vec<Value>> {
		let column = if kind == "code" {
			"analyte_code"
		} else {
			"analyte_name"
		};
		Ok(QuerySet::new("analyte_code_rel")
			.filter(Filter::icontains(column, value))
			.values(&[column])
			.distinct()
			.order_by(&[column])
			.fetch_column(&self.db)
			.await?)
	}
}

#[async_trait]
impl Handler for AnalyteSelectView {
	async fn handle(&self, request: Request) -> Result<Response> {
		let mut form = select_form();
		let mut kind = "name".to_string();
		let mut analytes = Vec::new();

		if request.has_query() {
			form.bind_pairs(request.query_pairs());
			if form.is_valid() {
				if let Some(cleaned) = form.cleaned("kind").and_then(Value::as_str) {
					kind = cleaned.to_string();
				}
				if let Some(value) = form.cleaned("value").and_then(Value::as_str)
					&& !value.is_empty()
				{
					analytes = self.matches(&kind, value).await?;
				}
			}
		}

		let mut context = TemplateContext::new();
		context.insert("select_form".into(), form.to_context());
		context.insert("kind".into(), json!(kind));
		context.insert("analytes".into(), Value::Array(analytes));
		self.renderer.render(TEMPLATE, &context)
	}
}

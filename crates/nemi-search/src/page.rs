//! Search page framework
//!
//! A [`SearchPage`] is configuration plus three injected capabilities:
//!
//! - a [`FormValidator`] builds the page form, loading choices from the store
//! - a [`QueryBuilder`] turns cleaned values into filters on a base query
//! - a [`ResponseRenderer`] renders the context
//!
//! [`SearchResultView`] and [`ExportView`] are the two handlers a page is
//! served through. Both bind the query string to the same form and build the
//! same query, so a download always matches the results page it came from.

use crate::criteria::{
	Criterion, choice_criterion, covers_every_choice, criterion_with_name, multi_choice_criteria,
};
use crate::export::{ExportFormat, headings};
use crate::header_defs::header_defs;
use crate::renderer::ResponseRenderer;
use async_trait::async_trait;
use nemi_core::{Error, Handler, Request, Response, Result, TemplateContext};
use nemi_db::{Database, Filter, FilterCondition, FilterValue, QuerySet, Record};
use nemi_forms::{ALL_CHOICE, Form, FormField};
use serde_json::{Value, json};
use std::sync::Arc;

/// Builds the (unbound) form of a page.
#[async_trait]
pub trait FormValidator: Send + Sync {
	async fn build_form(&self, db: &Database) -> Result<Form>;
}

/// How a rule compares its column with the cleaned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
	Exact,
	IExact,
	Contains,
	StartsWith,
	In,
}

/// Maps one form field onto one filter clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
	pub field: &'static str,
	pub column: &'static str,
	pub lookup: Lookup,
}

/// Rule whose filter and criterion depend on more than one field.
#[derive(Clone, Copy)]
pub struct CustomRule {
	pub filter: fn(&Form) -> Option<FilterCondition>,
	pub criterion: fn(&Form) -> Option<Criterion>,
}

#[derive(Clone)]
pub enum FilterRule {
	Field(FieldRule),
	Custom(CustomRule),
}

impl FilterRule {
	pub fn exact(field: &'static str, column: &'static str) -> Self {
		Self::field(field, column, Lookup::Exact)
	}

	pub fn contains(field: &'static str, column: &'static str) -> Self {
		Self::field(field, column, Lookup::Contains)
	}

	pub fn is_in(field: &'static str, column: &'static str) -> Self {
		Self::field(field, column, Lookup::In)
	}

	pub fn field(field: &'static str, column: &'static str, lookup: Lookup) -> Self {
		FilterRule::Field(FieldRule {
			field,
			column,
			lookup,
		})
	}

	pub fn custom(
		filter: fn(&Form) -> Option<FilterCondition>,
		criterion: fn(&Form) -> Option<Criterion>,
	) -> Self {
		FilterRule::Custom(CustomRule { filter, criterion })
	}

	/// The clause this rule adds, or `None` when the value means "any".
	pub fn condition(&self, form: &Form) -> Option<FilterCondition> {
		match self {
			FilterRule::Field(rule) => rule.condition(form),
			FilterRule::Custom(rule) => (rule.filter)(form),
		}
	}

	/// The criterion displayed for this rule. Multi-selects are reported
	/// separately and never produce one.
	pub fn criterion(&self, form: &Form) -> Option<Criterion> {
		match self {
			FilterRule::Field(rule) => {
				let field = form.get_field(rule.field)?;
				if field.is_multiple() {
					None
				} else if offers_all(field) {
					choice_criterion(form, rule.field)
				} else {
					criterion_with_name(form, rule.field)
				}
			}
			FilterRule::Custom(rule) => (rule.criterion)(form),
		}
	}
}

fn offers_all(field: &dyn FormField) -> bool {
	field.choices().iter().any(|choice| choice.value == ALL_CHOICE)
}

impl FieldRule {
	fn condition(&self, form: &Form) -> Option<FilterCondition> {
		let field = form.get_field(self.field)?;
		let value = form.cleaned(self.field)?;
		let skip = match value {
			Value::Null => true,
			Value::String(s) => s.is_empty() || (s == ALL_CHOICE && offers_all(field)),
			Value::Array(items) => items.is_empty() || covers_every_choice(field, items),
			_ => false,
		};
		if skip {
			return None;
		}

		let value = FilterValue::from_json(value);
		let filter = match self.lookup {
			Lookup::Exact => Filter::eq(self.column, value),
			Lookup::IExact => Filter::ieq(self.column, value),
			Lookup::Contains => Filter::contains(self.column, value),
			Lookup::StartsWith => Filter::starts_with(self.column, value),
			Lookup::In => Filter::is_in(self.column, value),
		};
		Some(filter.into())
	}
}

/// Base query, ordered filter rules, and the criteria they display.
pub trait QueryBuilder: Send + Sync {
	fn base_query(&self) -> QuerySet;

	fn rules(&self) -> &[FilterRule];

	/// The base query narrowed by every active rule.
	fn build(&self, form: &Form) -> QuerySet {
		self.rules()
			.iter()
			.filter_map(|rule| rule.condition(form))
			.fold(self.base_query(), |query, condition| query.filter(condition))
	}

	/// Criteria of the active rules, in rule order.
	fn criteria(&self, form: &Form) -> Vec<Criterion> {
		self.rules()
			.iter()
			.filter_map(|rule| rule.criterion(form))
			.collect()
	}
}

/// A [`QueryBuilder`] holding its base query and rules as data.
///
/// # Examples
///
/// ```
/// use nemi_db::{Filter, QuerySet};
/// use nemi_forms::{ChoiceField, Form};
/// use nemi_search::page::{FilterChain, FilterRule, QueryBuilder};
///
/// let chain = FilterChain::new(QuerySet::new("method_vw"))
///     .with_rule(FilterRule::exact("media_name", "media_name"));
///
/// let mut form = Form::new().with_field(
///     ChoiceField::<String>::new("media_name")
///         .with_choices(vec![("WATER".to_string(), "Water".to_string())])
///         .with_all_choice("Any"),
/// );
/// form.bind_pairs(&[("media_name".to_string(), "all".to_string())]);
/// assert!(form.is_valid());
///
/// // "all" adds no filter
/// assert!(chain.build(&form).conditions().is_empty());
/// ```
#[derive(Clone)]
pub struct FilterChain {
	base: QuerySet,
	rules: Vec<FilterRule>,
}

impl FilterChain {
	pub fn new(base: QuerySet) -> Self {
		Self {
			base,
			rules: Vec::new(),
		}
	}

	pub fn with_rule(mut self, rule: FilterRule) -> Self {
		self.rules.push(rule);
		self
	}
}

impl QueryBuilder for FilterChain {
	fn base_query(&self) -> QuerySet {
		self.base.clone()
	}

	fn rules(&self) -> &[FilterRule] {
		&self.rules
	}
}

/// Columns and order of a page's download.
#[derive(Debug, Clone)]
pub struct ExportSpec {
	/// File name without extension.
	pub name: &'static str,
	pub fields: &'static [&'static str],
	pub order_by: &'static str,
}

/// Turns a result row into the value a template iterates over.
pub type RowDecorator = fn(Record) -> Value;

/// Configuration of one faceted search page.
pub struct SearchPage {
	pub template: &'static str,
	pub result_fields: &'static [&'static str],
	pub order_by: Option<&'static str>,
	/// `None` renders `header_defs` as null.
	pub header_abbrevs: Option<&'static [&'static str]>,
	pub decorator: Option<RowDecorator>,
	/// Multi-select whose chosen labels are shown as `selected_method_types`.
	pub selection_field: Option<&'static str>,
	pub export: Option<ExportSpec>,
	form: Arc<dyn FormValidator>,
	query: Arc<dyn QueryBuilder>,
	renderer: Arc<dyn ResponseRenderer>,
	db: Database,
}

impl SearchPage {
	pub fn new(
		template: &'static str,
		form: Arc<dyn FormValidator>,
		query: Arc<dyn QueryBuilder>,
		renderer: Arc<dyn ResponseRenderer>,
		db: Database,
	) -> Self {
		Self {
			template,
			result_fields: &[],
			order_by: None,
			header_abbrevs: None,
			decorator: None,
			selection_field: None,
			export: None,
			form,
			query,
			renderer,
			db,
		}
	}

	pub fn with_result_fields(mut self, fields: &'static [&'static str]) -> Self {
		self.result_fields = fields;
		self
	}

	pub fn with_order_by(mut self, field: &'static str) -> Self {
		self.order_by = Some(field);
		self
	}

	pub fn with_header_abbrevs(mut self, abbrevs: &'static [&'static str]) -> Self {
		self.header_abbrevs = Some(abbrevs);
		self
	}

	pub fn with_decorator(mut self, decorator: RowDecorator) -> Self {
		self.decorator = Some(decorator);
		self
	}

	pub fn with_selection_field(mut self, field: &'static str) -> Self {
		self.selection_field = Some(field);
		self
	}

	pub fn with_export(mut self, export: ExportSpec) -> Self {
		self.export = Some(export);
		self
	}

	/// The form bound to the request query, or `None` when there is no query.
	async fn bound_form(&self, request: &Request) -> Result<Option<Form>> {
		if !request.has_query() {
			return Ok(None);
		}
		let mut form = self.form.build_form(&self.db).await?;
		form.bind_pairs(request.query_pairs());
		Ok(Some(form))
	}

	fn form_only_context(form: &Form) -> TemplateContext {
		let mut context = TemplateContext::new();
		context.insert("search_form".into(), form.to_context());
		context.insert("hide_search".into(), json!(false));
		context.insert("show_results".into(), json!(false));
		context
	}

	/// Rows of a validated search, decorated when the page has a decorator.
	pub async fn results(&self, form: &Form) -> Result<Vec<Value>> {
		let mut query = self
			.query
			.build(form)
			.values(self.result_fields)
			.distinct();
		if let Some(order_by) = self.order_by {
			query = query.order_by(&[order_by]);
		}
		let rows = query.fetch(&self.db).await?;
		Ok(match self.decorator {
			Some(decorate) => rows.into_iter().map(decorate).collect(),
			None => rows.into_iter().map(record_value).collect(),
		})
	}

	/// Full context of a search result page.
	pub async fn results_context(&self, form: &Form, request: &Request) -> Result<TemplateContext> {
		let results = self.results(form).await?;
		let header_defs = match self.header_abbrevs {
			Some(abbrevs) => serde_json::to_value(header_defs(&self.db, abbrevs).await?)?,
			None => Value::Null,
		};

		let mut context = TemplateContext::new();
		context.insert("search_form".into(), form.to_context());
		context.insert("results".into(), Value::Array(results));
		context.insert(
			"criteria".into(),
			serde_json::to_value(self.query.criteria(form))?,
		);
		if let Some(field) = self.selection_field {
			context.insert(
				"selected_method_types".into(),
				json!(multi_choice_criteria(form, field)),
			);
		}
		context.insert("header_defs".into(), header_defs);
		context.insert(
			"query_string".into(),
			json!(format!("?{}", request.query_string_without(&["page"]))),
		);
		context.insert("hide_search".into(), json!(true));
		context.insert("show_results".into(), json!(true));
		Ok(context)
	}

	/// GET handler body for the results page.
	pub async fn render_results(&self, request: &Request) -> Result<Response> {
		let context = match self.bound_form(request).await? {
			None => Self::form_only_context(&self.form.build_form(&self.db).await?),
			Some(mut form) => {
				if form.is_valid() {
					tracing::debug!(template = self.template, "search form valid");
					self.results_context(&form, request).await?
				} else {
					tracing::debug!(template = self.template, errors = ?form.errors(), "search form invalid");
					Self::form_only_context(&form)
				}
			}
		};
		self.renderer.render(self.template, &context)
	}

	/// GET handler body for the export download. Every failure to produce a
	/// download, including an unknown format, is a 404.
	pub async fn render_export(&self, request: &Request) -> Result<Response> {
		let export = self
			.export
			.as_ref()
			.ok_or_else(|| Error::NotFound(format!("{} has no export", self.template)))?;
		let format = ExportFormat::from_segment(request.path_param("format").unwrap_or_default())?;
		let mut form = self
			.bound_form(request)
			.await?
			.ok_or_else(|| Error::NotFound("Export needs search parameters".to_string()))?;
		if !form.is_valid() {
			return Err(Error::NotFound("Invalid search parameters".to_string()));
		}

		let rows = self
			.query
			.build(&form)
			.values(export.fields)
			.distinct()
			.order_by(&[export.order_by])
			.fetch_values(&self.db)
			.await?;
		Ok(format.response(export.name, &headings(export.fields), &rows)?)
	}
}

/// A record as a JSON object, keeping column order.
pub fn record_value(record: Record) -> Value {
	Value::Object(record.into_iter().collect())
}

/// Results page handler.
#[derive(Clone)]
pub struct SearchResultView {
	page: Arc<SearchPage>,
}

impl SearchResultView {
	pub fn new(page: Arc<SearchPage>) -> Self {
		Self { page }
	}
}

#[async_trait]
impl Handler for SearchResultView {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.page.render_results(&request).await
	}
}

/// Export download handler; the format comes from the `{format}` capture.
#[derive(Clone)]
pub struct ExportView {
	page: Arc<SearchPage>,
}

impl ExportView {
	pub fn new(page: Arc<SearchPage>) -> Self {
		Self { page }
	}
}

#[async_trait]
impl Handler for ExportView {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.page.render_export(&request).await
	}
}

//! Method summary pages and the per-method analyte download

use crate::renderer::ResponseRenderer;
use async_trait::async_trait;
use nemi_core::{Handler, Request, Response, Result, TemplateContext};
use nemi_db::{Database, DatabaseError, DatabaseResult, Filter, FilterValue, QuerySet, Record};
use serde_json::{Value, json};
use std::fmt::Write;
use std::sync::Arc;

/// Analyte columns shown on a summary and written to the analyte download.
pub const ANALYTE_FIELDS: &[&str] = &[
	"analyte_name",
	"analyte_code",
	"dl_value",
	"dl_units_description",
	"dl_units",
	"accuracy",
	"accuracy_units_description",
	"accuracy_units",
	"precision",
	"precision_units_description",
	"precision_units",
	"false_positive_value",
	"false_negative_value",
	"prec_acc_conc_used",
];

/// Marks the preferred name row of an analyte.
const PREFERRED: i64 = -1;

/// Distinct preferred analyte rows of a method, ordered by name.
pub fn analyte_query(method_id: i64) -> QuerySet {
	QuerySet::new("method_analyte_vw")
		.filter(Filter::eq("preferred", PREFERRED))
		.filter(Filter::eq("method_id", method_id))
		.values(ANALYTE_FIELDS)
		.distinct()
		.order_by(&["analyte_name"])
}

/// Every name sharing a code with the analyte, ordered by name.
///
/// The codes are those whose name or code matches the analyte's
/// case-insensitively.
pub async fn synonyms(db: &Database, name: &str, code: &str) -> DatabaseResult<Vec<String>> {
	let codes = QuerySet::new("analyte_code_rel")
		.filter_any(vec![
			Filter::ieq("analyte_name", name),
			Filter::ieq("analyte_code", code),
		])
		.values(&["analyte_code"])
		.distinct()
		.fetch_column(db)
		.await?;
	if codes.is_empty() {
		return Ok(Vec::new());
	}

	let codes = FilterValue::Array(codes.iter().map(FilterValue::from_json).collect());
	let names = QuerySet::new("analyte_code_rel")
		.filter(Filter::is_in("analyte_code", codes))
		.values(&["analyte_name"])
		.order_by(&["analyte_name"])
		.fetch_column(db)
		.await?;
	Ok(names
		.into_iter()
		.filter_map(|name| name.as_str().map(str::to_string))
		.collect())
}

fn text_of<'a>(record: &'a Record, column: &str) -> &'a str {
	record.get(column).and_then(Value::as_str).unwrap_or_default()
}

/// Which summary template a method is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
	/// Includes the precision and detection-level notes.
	Standard,
	Biological,
	Toxicity,
}

impl SummaryKind {
	pub fn template(self) -> &'static str {
		match self {
			SummaryKind::Standard => "method_summary.html",
			SummaryKind::Biological => "biological_method_summary.html",
			SummaryKind::Toxicity => "toxicity_method_summary.html",
		}
	}
}

/// Summary of one method with its analytes and their synonyms.
pub struct MethodSummaryView {
	db: Database,
	renderer: Arc<dyn ResponseRenderer>,
	kind: SummaryKind,
}

impl MethodSummaryView {
	pub fn new(db: Database, renderer: Arc<dyn ResponseRenderer>, kind: SummaryKind) -> Self {
		Self { db, renderer, kind }
	}

	pub async fn context(&self, method_id: i64) -> Result<TemplateContext> {
		// A missing summary row still renders the page.
		let data = match QuerySet::new("method_summary_vw")
			.filter(Filter::eq("method_id", method_id))
			.get(&self.db)
			.await
		{
			Ok(record) => Value::Object(record.into_iter().collect()),
			Err(DatabaseError::NotFound(_)) => Value::Null,
			Err(e) => return Err(e.into()),
		};

		let mut analyte_data = Vec::new();
		for row in analyte_query(method_id).fetch(&self.db).await? {
			let syn = synonyms(
				&self.db,
				text_of(&row, "analyte_name"),
				text_of(&row, "analyte_code"),
			)
			.await?;
			analyte_data.push(json!({
				"r": Value::Object(row.into_iter().collect()),
				"syn": syn,
			}));
		}

		let mut context = TemplateContext::new();
		if self.kind == SummaryKind::Standard {
			let notes = QuerySet::new("method_analyte_vw")
				.filter(Filter::eq("method_id", method_id))
				.values(&["precision_descriptor_notes", "dl_note"])
				.distinct()
				.fetch(&self.db)
				.await?;
			context.insert(
				"notes".into(),
				Value::Array(
					notes
						.into_iter()
						.map(|r| Value::Object(r.into_iter().collect()))
						.collect(),
				),
			);
		}
		context.insert("data".into(), data);
		context.insert("analyte_data".into(), Value::Array(analyte_data));
		Ok(context)
	}
}

#[async_trait]
impl Handler for MethodSummaryView {
	async fn handle(&self, request: Request) -> Result<Response> {
		let method_id: i64 = request.parse_path_param("method_id")?;
		let context = self.context(method_id).await?;
		self.renderer.render(self.kind.template(), &context)
	}
}

/// Summary of a stream physical method; 404 when the method is unknown.
pub struct StreamPhysicalSummaryView {
	db: Database,
	renderer: Arc<dyn ResponseRenderer>,
}

impl StreamPhysicalSummaryView {
	pub const TEMPLATE: &'static str = "stream_physical_method_summary.html";

	pub fn new(db: Database, renderer: Arc<dyn ResponseRenderer>) -> Self {
		Self { db, renderer }
	}
}

#[async_trait]
impl Handler for StreamPhysicalSummaryView {
	async fn handle(&self, request: Request) -> Result<Response> {
		let pk: i64 = request.parse_path_param("pk")?;
		let record = QuerySet::new("method_stg_summary_vw")
			.filter(Filter::eq("method_id", pk))
			.get(&self.db)
			.await?;

		let mut context = TemplateContext::new();
		context.insert("data".into(), Value::Object(record.into_iter().collect()));
		self.renderer.render(Self::TEMPLATE, &context)
	}
}

pub const ANALYTE_HEADINGS: &[&str] = &[
	"Analyte",
	"Detection Level",
	"Bias",
	"Precision",
	"Pct False Positive",
	"Pct False Negative",
	"Spiking Level",
];

/// Sentinel meaning "not applicable" for detection level and precision.
const NOT_APPLICABLE: f64 = 999.0;
/// Sentinel meaning "not applicable" for bias.
const BIAS_NOT_APPLICABLE: f64 = -999.0;

fn number(record: &Record, column: &str) -> Option<f64> {
	record.get(column).and_then(Value::as_f64)
}

fn measurement(value: f64, units: &str) -> String {
	format!("{:.2} {}", value, units)
}

fn detection_level(row: &Record) -> String {
	match number(row, "dl_value") {
		Some(v) if v == NOT_APPLICABLE => "N/A".to_string(),
		Some(v) => measurement(v, text_of(row, "dl_units")),
		None => String::new(),
	}
}

fn bias(row: &Record) -> String {
	match number(row, "accuracy") {
		Some(v) if v == BIAS_NOT_APPLICABLE => "N/A".to_string(),
		Some(v) => format!("{} {}", v.trunc() as i64, text_of(row, "accuracy_units")),
		None => String::new(),
	}
}

fn precision(row: &Record) -> String {
	match number(row, "precision") {
		Some(v) if v == NOT_APPLICABLE => "N/A".to_string(),
		Some(v) => measurement(v, text_of(row, "precision_units")),
		None => String::new(),
	}
}

fn optional_value(row: &Record, column: &str) -> String {
	match row.get(column) {
		None | Some(Value::Null) => String::new(),
		Some(Value::String(s)) => s.clone(),
		Some(other) => other.to_string(),
	}
}

fn spiking_level(row: &Record) -> String {
	match number(row, "prec_acc_conc_used") {
		Some(v) if v != 0.0 => measurement(v, text_of(row, "dl_units")),
		_ => String::new(),
	}
}

/// The analyte download body: tab-joined headings, then one line per row
/// with every cell followed by a tab.
///
/// # Examples
///
/// ```
/// use nemi_db::Record;
/// use nemi_search::summary::analyte_tsv;
/// use serde_json::json;
///
/// let mut row = Record::new();
/// row.insert("analyte_name".into(), json!("Lead"));
/// row.insert("dl_value".into(), json!(999));
/// row.insert("accuracy".into(), json!(-999));
/// row.insert("precision".into(), json!(999));
/// let tsv = analyte_tsv(&[row]);
/// assert!(tsv.ends_with("\nLead\tN/A\tN/A\tN/A\t\t\t\t\n"));
/// ```
pub fn analyte_tsv(rows: &[Record]) -> String {
	let mut out = ANALYTE_HEADINGS.join("\t");
	out.push('\n');
	for row in rows {
		let cells = [
			text_of(row, "analyte_name").to_string(),
			detection_level(row),
			bias(row),
			precision(row),
			optional_value(row, "false_positive_value"),
			optional_value(row, "false_negative_value"),
			spiking_level(row),
		];
		for cell in cells {
			let _ = write!(out, "{}\t", cell);
		}
		out.push('\n');
	}
	out
}

/// Tab-separated download of a method's analytes.
pub struct AnalyteExportView {
	db: Database,
}

impl AnalyteExportView {
	pub fn new(db: Database) -> Self {
		Self { db }
	}
}

#[async_trait]
impl Handler for AnalyteExportView {
	async fn handle(&self, request: Request) -> Result<Response> {
		let method_id: i64 = request.parse_path_param("method_id")?;
		let rows = analyte_query(method_id).fetch(&self.db).await?;
		Ok(Response::attachment(
			&format!("{}_analytes.tsv", method_id),
			"text/tab-separated-values",
			analyte_tsv(&rows),
		))
	}
}

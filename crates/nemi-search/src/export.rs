//! Download serializers for search results
//!
//! Rows are positional value lists in export-field order; the first line of
//! each download holds the headings.

use crate::header_defs::title_case;
use nemi_core::Response;
use rust_xlsxwriter::{Workbook, XlsxError};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
	#[error("Unsupported export format: {0}")]
	UnsupportedFormat(String),
	#[error("Spreadsheet error: {0}")]
	Xlsx(#[from] XlsxError),
	#[error("Too many rows or columns for a worksheet")]
	TooLarge,
}

pub type ExportResult<T> = Result<T, ExportError>;

impl From<ExportError> for nemi_core::Error {
	fn from(err: ExportError) -> Self {
		match err {
			ExportError::UnsupportedFormat(_) => nemi_core::Error::NotFound(err.to_string()),
			other => nemi_core::Error::Serialization(other.to_string()),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
	Tsv,
	Xls,
}

impl ExportFormat {
	/// Parse the format path segment.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_search::export::ExportFormat;
	///
	/// assert_eq!(ExportFormat::from_segment("tsv").unwrap(), ExportFormat::Tsv);
	/// assert!(ExportFormat::from_segment("csv").is_err());
	/// ```
	pub fn from_segment(segment: &str) -> ExportResult<Self> {
		match segment {
			"tsv" => Ok(ExportFormat::Tsv),
			"xls" => Ok(ExportFormat::Xls),
			other => Err(ExportError::UnsupportedFormat(other.to_string())),
		}
	}

	pub fn extension(&self) -> &'static str {
		match self {
			ExportFormat::Tsv => "tsv",
			ExportFormat::Xls => "xls",
		}
	}

	pub fn mime_type(&self) -> &'static str {
		match self {
			ExportFormat::Tsv => "text/tab-separated-values",
			ExportFormat::Xls => "application/vnd.ms-excel",
		}
	}

	/// Serialize and wrap as an attachment named `<name>.<extension>`.
	pub fn response(
		&self,
		name: &str,
		headings: &[String],
		rows: &[Vec<Value>],
	) -> ExportResult<Response> {
		let body = match self {
			ExportFormat::Tsv => tsv(headings, rows).into_bytes(),
			ExportFormat::Xls => xls(headings, rows)?,
		};
		tracing::debug!(name = %name, format = self.extension(), rows = rows.len(), "export");
		Ok(Response::attachment(
			&format!("{}.{}", name, self.extension()),
			self.mime_type(),
			body,
		))
	}
}

/// Headings for export columns: underscores become spaces, then title case.
pub fn headings(fields: &[&str]) -> Vec<String> {
	fields
		.iter()
		.map(|field| title_case(&field.replace('_', " ")))
		.collect()
}

/// Text of one cell: strings raw, null empty, numbers in natural display.
pub fn cell_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

/// Tab-separated text. Every data cell is followed by a tab, so data rows
/// end with a trailing tab; the heading row does not.
///
/// # Examples
///
/// ```
/// use nemi_search::export::tsv;
/// use serde_json::json;
///
/// let headings = vec!["A".to_string(), "B".to_string()];
/// let rows = vec![vec![json!(1), json!("x")], vec![json!(2), json!("y")]];
/// assert_eq!(tsv(&headings, &rows), "A\tB\n1\tx\t\n2\ty\t\n");
/// ```
pub fn tsv(headings: &[String], rows: &[Vec<Value>]) -> String {
	let mut output = headings.join("\t");
	output.push('\n');
	for row in rows {
		for value in row {
			output.push_str(&cell_text(value));
			output.push('\t');
		}
		output.push('\n');
	}
	output
}

/// Spreadsheet with a single sheet named `sheet 1`: headings in row 0,
/// data from row 1, null cells left blank.
///
/// The payload is an Office Open XML workbook (a zip archive), while the
/// download keeps the `.xls` name and `application/vnd.ms-excel` type that
/// existing links expect. Excel warns that the extension does not match the
/// content and then opens the file.
pub fn xls(headings: &[String], rows: &[Vec<Value>]) -> ExportResult<Vec<u8>> {
	let mut workbook = Workbook::new();
	let sheet = workbook.add_worksheet();
	sheet.set_name("sheet 1")?;

	for (col, heading) in headings.iter().enumerate() {
		sheet.write_string(0, column_index(col)?, heading)?;
	}

	for (index, row) in rows.iter().enumerate() {
		let row_num = u32::try_from(index + 1).map_err(|_| ExportError::TooLarge)?;
		for (col, value) in row.iter().enumerate() {
			let col = column_index(col)?;
			match value {
				Value::Null => {}
				Value::Bool(b) => {
					sheet.write_boolean(row_num, col, *b)?;
				}
				Value::Number(n) => {
					sheet.write_number(row_num, col, n.as_f64().unwrap_or_default())?;
				}
				Value::String(s) => {
					sheet.write_string(row_num, col, s)?;
				}
				other => {
					sheet.write_string(row_num, col, other.to_string())?;
				}
			}
		}
	}

	Ok(workbook.save_to_buffer()?)
}

fn column_index(col: usize) -> ExportResult<u16> {
	u16::try_from(col).map_err(|_| ExportError::TooLarge)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_headings_follow_title_case() {
		// Act
		let headings = headings(&["method_id", "source_method_identifier", "dl_type"]);

		// Assert
		assert_eq!(headings, vec!["Method Id", "Source Method Identifier", "Dl Type"]);
	}

	#[rstest]
	fn test_tsv_nulls_are_empty_and_floats_keep_display() {
		// Arrange
		let headings = vec!["Id".to_string(), "Value".to_string(), "Note".to_string()];
		let rows = vec![vec![json!(7), json!(0.5), Value::Null]];

		// Act
		let text = tsv(&headings, &rows);

		// Assert
		assert_eq!(text, "Id\tValue\tNote\n7\t0.5\t\t\n");
	}

	#[rstest]
	fn test_tsv_without_rows_is_heading_line() {
		assert_eq!(tsv(&["A".to_string()], &[]), "A\n");
	}

	#[rstest]
	#[case("tsv", "text/tab-separated-values", "attachment; filename=general_search.tsv")]
	#[case("xls", "application/vnd.ms-excel", "attachment; filename=general_search.xls")]
	fn test_response_is_typed_download(
		#[case] segment: &str,
		#[case] mime: &str,
		#[case] disposition: &str,
	) {
		// Arrange
		let format = ExportFormat::from_segment(segment).unwrap();
		let headings = vec!["A".to_string()];
		let rows = vec![vec![json!("x")]];

		// Act
		let response = format.response("general_search", &headings, &rows).unwrap();

		// Assert
		assert_eq!(response.headers.get("content-type").unwrap(), mime);
		assert_eq!(response.headers.get("content-disposition").unwrap(), disposition);
		assert!(!response.body.is_empty());
	}

	#[rstest]
	fn test_xls_payload_is_zip_container() {
		// Arrange
		let headings = vec!["A".to_string(), "B".to_string()];
		let rows = vec![vec![json!(1), Value::Null], vec![json!(true), json!("y")]];

		// Act
		let bytes = xls(&headings, &rows).unwrap();

		// Assert
		assert_eq!(&bytes[..2], b"PK");
	}

	#[rstest]
	#[case("csv")]
	#[case("")]
	#[case("XLS")]
	fn test_unknown_format_is_not_found(#[case] segment: &str) {
		// Act
		let err: nemi_core::Error = ExportFormat::from_segment(segment).unwrap_err().into();

		// Assert
		assert_eq!(err.status_code(), 404);
	}
}

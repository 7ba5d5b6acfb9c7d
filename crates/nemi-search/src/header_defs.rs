//! Column header definitions from `definitions_dom`

use nemi_db::{Database, DatabaseResult, Filter, QuerySet, Record};
use serde::Serialize;
use serde_json::Value;

pub const NO_DEFINITION: &str = "No definition available.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderDef {
	pub definition_name: String,
	pub definition_description: String,
}

impl HeaderDef {
	/// Placeholder for an abbreviation with zero or several definitions.
	pub fn fallback(abbrev: &str) -> Self {
		Self {
			definition_name: title_case(&abbrev.replace('_', " ")),
			definition_description: NO_DEFINITION.to_string(),
		}
	}

	fn from_record(record: &Record) -> Self {
		let text = |column: &str| {
			record
				.get(column)
				.and_then(Value::as_str)
				.unwrap_or_default()
				.to_string()
		};
		Self {
			definition_name: text("definition_name"),
			definition_description: text("definition_description"),
		}
	}
}

/// Title-case the way Python's `str.title` does: a letter following a
/// letter is lowercased, any other letter is uppercased.
///
/// # Examples
///
/// ```
/// use nemi_search::header_defs::title_case;
///
/// assert_eq!(title_case("source method identifier"), "Source Method Identifier");
/// assert_eq!(title_case("DL VALUE"), "Dl Value");
/// assert_eq!(title_case("pct2false"), "Pct2False");
/// ```
pub fn title_case(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut previous_cased = false;
	for c in text.chars() {
		if c.is_alphabetic() {
			if previous_cased {
				out.extend(c.to_lowercase());
			} else {
				out.extend(c.to_uppercase());
			}
			previous_cased = true;
		} else {
			out.push(c);
			previous_cased = false;
		}
	}
	out
}

/// One definition per abbreviation, in the order given.
///
/// Abbreviations matching no row, or more than one row, fall back to
/// [`HeaderDef::fallback`]. Runs a single query for the whole set.
pub async fn header_defs(db: &Database, abbrevs: &[&str]) -> DatabaseResult<Vec<HeaderDef>> {
	if abbrevs.is_empty() {
		return Ok(Vec::new());
	}
	let keys: Vec<String> = abbrevs.iter().map(|a| a.to_string()).collect();
	let rows = QuerySet::new("definitions_dom")
		.filter(Filter::is_in("definition_abbrev", keys))
		.values(&["definition_abbrev", "definition_name", "definition_description"])
		.fetch(db)
		.await?;

	Ok(abbrevs
		.iter()
		.map(|abbrev| {
			let mut matches = rows
				.iter()
				.filter(|row| row.get("definition_abbrev").and_then(Value::as_str) == Some(abbrev));
			match (matches.next(), matches.next()) {
				(Some(row), None) => HeaderDef::from_record(row),
				_ => {
					tracing::debug!(abbrev = %abbrev, "no unique header definition");
					HeaderDef::fallback(abbrev)
				}
			}
		})
		.collect())
}

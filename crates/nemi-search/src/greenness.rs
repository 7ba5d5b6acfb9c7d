//! Greenness profile of a method row
//!
//! Four Y/N flags (pbt, toxic, corrosive, waste) each select one quadrant
//! icon. A profile is drawn only when every quadrant is known.

use nemi_db::Record;
use serde::Serialize;
use serde_json::{Value, json};

/// `(flag column, icon when N, icon when Y)` in quadrant order.
const QUADRANTS: [(&str, &str, &str); 4] = [
	("pbt", "ULG2.gif", "ULW2.gif"),
	("toxic", "URG2.gif", "URW2.gif"),
	("corrosive", "LLG2.gif", "LLW2.gif"),
	("waste", "LRG2.gif", "LRW2.gif"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GreennessProfile {
	/// Four icon names, or empty when any flag is unset.
	pub profile: Vec<&'static str>,
	pub pbt: &'static str,
	pub hazardous: &'static str,
	pub corrosive: &'static str,
	pub waste_amt: &'static str,
}

fn flag<'a>(row: &'a Record, column: &str) -> Option<&'a str> {
	row.get(column).and_then(Value::as_str)
}

/// Verbose reading of a single flag.
pub fn flag_label(flag: Option<&str>) -> &'static str {
	match flag {
		Some("N") => "Green",
		Some("Y") => "Not Green",
		_ => "N.S.",
	}
}

impl GreennessProfile {
	/// # Examples
	///
	/// ```
	/// use nemi_db::Record;
	/// use nemi_search::greenness::GreennessProfile;
	/// use serde_json::json;
	///
	/// let mut row = Record::new();
	/// for column in ["pbt", "toxic", "corrosive", "waste"] {
	///     row.insert(column.to_string(), json!("N"));
	/// }
	/// let profile = GreennessProfile::of(&row);
	/// assert_eq!(profile.profile, vec!["ULG2.gif", "URG2.gif", "LLG2.gif", "LRG2.gif"]);
	/// assert_eq!(profile.waste_amt, "Green");
	/// ```
	pub fn of(row: &Record) -> Self {
		let mut profile: Vec<&'static str> = QUADRANTS
			.iter()
			.filter_map(|(column, green, not_green)| match flag(row, column) {
				Some("N") => Some(*green),
				Some("Y") => Some(*not_green),
				_ => None,
			})
			.collect();
		if profile.len() != QUADRANTS.len() {
			profile.clear();
		}

		Self {
			profile,
			pbt: flag_label(flag(row, "pbt")),
			hazardous: flag_label(flag(row, "toxic")),
			corrosive: flag_label(flag(row, "corrosive")),
			waste_amt: flag_label(flag(row, "waste")),
		}
	}
}

/// Wrap a result row as `{"m": row, "greenness": profile}`.
pub fn decorate(row: Record) -> Value {
	let greenness = GreennessProfile::of(&row);
	json!({ "m": row, "greenness": greenness })
}

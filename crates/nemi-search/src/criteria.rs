//! Human-readable summaries of the filters a search applied

use nemi_forms::{ALL_CHOICE, Form, FormField};
use serde::Serialize;
use serde_json::Value;

/// One applied filter as shown above the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Criterion {
	pub label: String,
	pub value: String,
}

impl Criterion {
	pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			value: value.into(),
		}
	}
}

fn field_label(field: &dyn FormField) -> String {
	field
		.label()
		.map(str::to_string)
		.unwrap_or_else(|| nemi_forms::pretty_name(field.name()))
}

fn display_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

/// Criterion for a single-select field: nothing when it is the `"all"`
/// sentinel, otherwise the field label and the label of the chosen key.
///
/// # Examples
///
/// ```
/// use nemi_forms::{ChoiceField, Form};
/// use nemi_search::criteria::{Criterion, choice_criterion};
///
/// let mut form = Form::new().with_field(
///     ChoiceField::<i64>::new("instrumentation")
///         .with_label("Instrumentation")
///         .with_choices(vec![(3, "GC-MS".to_string())])
///         .with_all_choice("Any"),
/// );
/// form.bind_pairs(&[("instrumentation".to_string(), "3".to_string())]);
/// assert!(form.is_valid());
/// assert_eq!(
///     choice_criterion(&form, "instrumentation"),
///     Some(Criterion::new("Instrumentation", "GC-MS"))
/// );
/// ```
pub fn choice_criterion(form: &Form, name: &str) -> Option<Criterion> {
	let field = form.get_field(name)?;
	let value = form.cleaned(name)?;
	if value.is_null() || value.as_str() == Some(ALL_CHOICE) {
		return None;
	}
	let choice = field
		.choice_label(value)
		.unwrap_or_else(|| display_text(value));
	Some(Criterion::new(field_label(field), choice))
}

/// Criterion for an optional field: its label and cleaned value, when the
/// value is non-empty.
pub fn criterion_with_name(form: &Form, name: &str) -> Option<Criterion> {
	let field = form.get_field(name)?;
	let value = form.cleaned(name)?;
	let text = display_text(value);
	if text.is_empty() {
		return None;
	}
	Some(Criterion::new(field_label(field), text))
}

/// Labels of the selected subset of a multi-select. Selecting every choice
/// means no restriction, which is shown as an empty list.
pub fn multi_choice_criteria(form: &Form, name: &str) -> Vec<String> {
	let (Some(field), Some(Value::Array(selected))) = (form.get_field(name), form.cleaned(name))
	else {
		return Vec::new();
	};
	if covers_every_choice(field, selected) {
		return Vec::new();
	}
	selected
		.iter()
		.filter_map(|key| field.choice_label(key))
		.collect()
}

/// Whether a multi-select value selects every offered choice.
pub fn covers_every_choice(field: &dyn FormField, selected: &[Value]) -> bool {
	let choices = field.choices();
	!choices.is_empty()
		&& choices.iter().all(|choice| {
			selected
				.iter()
				.any(|value| display_text(value) == choice.value)
		})
}

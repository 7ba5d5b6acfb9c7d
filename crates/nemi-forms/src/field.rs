//! The `FormField` trait and the pieces every field shares.

use serde::Serialize;
use serde_json::Value;

/// HTML widget used to render a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
	TextInput,
	TextArea,
	NumberInput,
	Select,
	SelectMultiple,
	RadioSelect,
	HiddenInput,
}

impl Widget {
	/// Name templates switch on.
	pub fn as_str(&self) -> &'static str {
		match self {
			Widget::TextInput => "text",
			Widget::TextArea => "textarea",
			Widget::NumberInput => "number",
			Widget::Select => "select",
			Widget::SelectMultiple => "select_multiple",
			Widget::RadioSelect => "radio",
			Widget::HiddenInput => "hidden",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
	#[error("This field is required.")]
	Required(String),
	#[error("Select a valid choice. {0} is not one of the available choices.")]
	InvalidChoice(String),
	#[error("Enter a whole number.")]
	InvalidInteger(String),
	#[error("{0}")]
	Validation(String),
}

pub type FieldResult<T> = Result<T, FieldError>;

/// One rendered choice of a select widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
	pub value: String,
	pub label: String,
}

impl ChoiceOption {
	pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			label: label.into(),
		}
	}
}

/// A single form field: metadata for rendering plus a `clean` step.
pub trait FormField: Send + Sync {
	fn name(&self) -> &str;
	fn label(&self) -> Option<&str>;
	fn required(&self) -> bool;
	fn help_text(&self) -> Option<&str> {
		None
	}
	fn widget(&self) -> &Widget;
	fn initial(&self) -> Option<&Value>;

	/// Validate and normalise a raw bound value.
	fn clean(&self, value: Option<&Value>) -> FieldResult<Value>;

	/// Choices offered by the field, in display order. Empty for free-text fields.
	fn choices(&self) -> Vec<ChoiceOption> {
		Vec::new()
	}

	/// Display label for a cleaned choice value.
	fn choice_label(&self, _value: &Value) -> Option<String> {
		None
	}

	/// Whether the field binds every value of a repeated parameter.
	fn is_multiple(&self) -> bool {
		false
	}
}

/// Default label derived from a field name.
///
/// # Examples
///
/// ```
/// use nemi_forms::pretty_name;
///
/// assert_eq!(pretty_name("method_number"), "Method number");
/// assert_eq!(pretty_name(""), "");
/// ```
pub fn pretty_name(name: &str) -> String {
	let spaced = name.replace('_', " ");
	let mut chars = spaced.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Reduce a bound value to the single raw string a scalar field cleans.
///
/// Repeated parameters bind as arrays; scalar fields take the last element.
pub(crate) fn scalar_text(value: Option<&Value>) -> Option<String> {
	match value? {
		Value::Null => None,
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		Value::Array(items) => items.last().and_then(|last| scalar_text(Some(last))),
		Value::Object(_) => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(None, None)]
	#[case(Some(json!(null)), None)]
	#[case(Some(json!("WATER")), Some("WATER"))]
	#[case(Some(json!(12)), Some("12"))]
	#[case(Some(json!(["1", "2"])), Some("2"))]
	fn test_scalar_text(#[case] value: Option<Value>, #[case] expected: Option<&str>) {
		// Act
		let text = scalar_text(value.as_ref());

		// Assert
		assert_eq!(text.as_deref(), expected);
	}

	#[rstest]
	fn test_required_error_message() {
		assert_eq!(
			FieldError::Required("title".into()).to_string(),
			"This field is required."
		);
	}
}

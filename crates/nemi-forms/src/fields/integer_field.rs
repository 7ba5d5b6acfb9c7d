//! Integer field

use crate::field::{FieldError, FieldResult, FormField, Widget, scalar_text};
use serde_json::Value;

/// Whole-number field with optional bounds. Empty optional input cleans to null.
#[derive(Debug, Clone)]
pub struct IntegerField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub initial: Option<Value>,
	pub min_value: Option<i64>,
	pub max_value: Option<i64>,
}

impl IntegerField {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			label: None,
			required: false,
			help_text: None,
			widget: Widget::NumberInput,
			initial: None,
			min_value: None,
			max_value: None,
		}
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn with_min_value(mut self, min_value: i64) -> Self {
		self.min_value = Some(min_value);
		self
	}

	pub fn with_max_value(mut self, max_value: i64) -> Self {
		self.max_value = Some(max_value);
		self
	}
}

impl FormField for IntegerField {
	fn name(&self) -> &str {
		&self.name
	}

	fn label(&self) -> Option<&str> {
		self.label.as_deref()
	}

	fn required(&self) -> bool {
		self.required
	}

	fn help_text(&self) -> Option<&str> {
		self.help_text.as_deref()
	}

	fn widget(&self) -> &Widget {
		&self.widget
	}

	fn initial(&self) -> Option<&Value> {
		self.initial.as_ref()
	}

	fn clean(&self, value: Option<&Value>) -> FieldResult<Value> {
		let raw = scalar_text(value).unwrap_or_default();
		let raw = raw.trim();
		if raw.is_empty() {
			if self.required {
				return Err(FieldError::Required(self.name.clone()));
			}
			return Ok(Value::Null);
		}

		let number: i64 = raw
			.parse()
			.map_err(|_| FieldError::InvalidInteger(raw.to_string()))?;

		if let Some(min_value) = self.min_value
			&& number < min_value
		{
			return Err(FieldError::Validation(format!(
				"Ensure this value is greater than or equal to {}.",
				min_value
			)));
		}
		if let Some(max_value) = self.max_value
			&& number > max_value
		{
			return Err(FieldError::Validation(format!(
				"Ensure this value is less than or equal to {}.",
				max_value
			)));
		}

		Ok(Value::from(number))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(json!("1998"), Ok(json!(1998)))]
	#[case(json!(" 2004 "), Ok(json!(2004)))]
	#[case(json!(""), Ok(Value::Null))]
	#[case(json!("19x8"), Err(FieldError::InvalidInteger("19x8".into())))]
	fn test_integer_field_clean(#[case] raw: Value, #[case] expected: FieldResult<Value>) {
		// Arrange
		let field = IntegerField::new("publication_year");

		// Act
		let cleaned = field.clean(Some(&raw));

		// Assert
		assert_eq!(cleaned, expected);
	}

	#[rstest]
	fn test_integer_field_bounds() {
		// Arrange
		let field = IntegerField::new("publication_year")
			.with_min_value(1900)
			.with_max_value(2100);

		// Act & Assert
		assert!(field.clean(Some(&json!("1899"))).is_err());
		assert!(field.clean(Some(&json!("2101"))).is_err());
		assert!(field.clean(Some(&json!("1900"))).is_ok());
	}

	#[rstest]
	fn test_integer_field_required() {
		let field = IntegerField::new("year").required();

		assert_eq!(field.clean(None), Err(FieldError::Required("year".into())));
	}
}

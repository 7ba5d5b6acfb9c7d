//! Character field for text input

use crate::field::{FieldError, FieldResult, FormField, Widget, scalar_text};

/// Character field with length validation
#[derive(Debug, Clone)]
pub struct CharField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub initial: Option<serde_json::Value>,
	pub max_length: Option<usize>,
	pub min_length: Option<usize>,
	pub strip: bool,
}

impl CharField {
	/// Create a new, optional CharField with the given name
	///
	/// # Examples
	///
	/// ```
	/// use nemi_forms::CharField;
	///
	/// let field = CharField::new("keywords");
	/// assert_eq!(field.name, "keywords");
	/// assert!(!field.required);
	/// ```
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			label: None,
			required: false,
			help_text: None,
			widget: Widget::TextInput,
			initial: None,
			max_length: None,
			min_length: None,
			strip: true,
		}
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn with_max_length(mut self, max_length: usize) -> Self {
		self.max_length = Some(max_length);
		self
	}

	pub fn with_min_length(mut self, min_length: usize) -> Self {
		self.min_length = Some(min_length);
		self
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
		self.help_text = Some(help_text.into());
		self
	}

	pub fn with_initial(mut self, initial: impl Into<String>) -> Self {
		self.initial = Some(serde_json::json!(initial.into()));
		self
	}

	pub fn with_widget(mut self, widget: Widget) -> Self {
		self.widget = widget;
		self
	}
}

impl FormField for CharField {
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

	fn initial(&self) -> Option<&serde_json::Value> {
		self.initial.as_ref()
	}

	fn clean(&self, value: Option<&serde_json::Value>) -> FieldResult<serde_json::Value> {
		let raw = scalar_text(value).unwrap_or_default();
		let text = if self.strip { raw.trim() } else { raw.as_str() };

		if text.is_empty() {
			if self.required {
				return Err(FieldError::Required(self.name.clone()));
			}
			return Ok(serde_json::Value::String(String::new()));
		}

		// Character count, not bytes, so accented names validate correctly
		let char_count = text.chars().count();
		if let Some(max_length) = self.max_length
			&& char_count > max_length
		{
			return Err(FieldError::Validation(format!(
				"Ensure this value has at most {} characters (it has {}).",
				max_length, char_count
			)));
		}

		if let Some(min_length) = self.min_length
			&& char_count < min_length
		{
			return Err(FieldError::Validation(format!(
				"Ensure this value has at least {} characters (it has {}).",
				min_length, char_count
			)));
		}

		Ok(serde_json::Value::String(text.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_char_field_required() {
		// Arrange
		let field = CharField::new("keywords").required();

		// Act & Assert
		assert!(field.clean(None).is_err());
		assert!(field.clean(Some(&json!(""))).is_err());
		assert!(field.clean(Some(&json!("  "))).is_err());
	}

	#[rstest]
	fn test_char_field_strips_whitespace() {
		// Arrange
		let field = CharField::new("analyte_value");

		// Act
		let cleaned = field.clean(Some(&json!("  Nitrate  "))).unwrap();

		// Assert
		assert_eq!(cleaned, json!("Nitrate"));
	}

	#[rstest]
	fn test_char_field_optional_empty_is_empty_string() {
		let field = CharField::new("author");

		assert_eq!(field.clean(None).unwrap(), json!(""));
	}

	#[rstest]
	fn test_char_field_max_length_counts_characters() {
		// Arrange
		let field = CharField::new("title").with_max_length(5);

		// Act & Assert
		assert!(field.clean(Some(&json!("Ångström"))).is_err());
		assert!(field.clean(Some(&json!("Åström"))).is_err());
		assert!(field.clean(Some(&json!("Åstrm"))).is_ok());
	}

	#[rstest]
	fn test_char_field_min_length() {
		// Arrange
		let field = CharField::new("keywords").with_min_length(3);

		// Act & Assert
		assert!(field.clean(Some(&json!("pH"))).is_err());
		assert!(field.clean(Some(&json!("lead"))).is_ok());
	}
}

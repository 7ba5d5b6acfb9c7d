use crate::field::{FormField, pretty_name};
use serde_json::{Value, json};

/// BoundField represents a field bound to form data
pub struct BoundField<'a> {
	field: &'a dyn FormField,
	data: Option<&'a Value>,
	errors: &'a [String],
	is_bound: bool,
	initial: Option<&'a Value>,
}

impl<'a> BoundField<'a> {
	pub fn new(
		field: &'a dyn FormField,
		data: Option<&'a Value>,
		errors: &'a [String],
		is_bound: bool,
	) -> Self {
		Self {
			field,
			data,
			errors,
			is_bound,
			initial: None,
		}
	}

	/// Override the field's own initial value for unbound rendering.
	pub fn with_initial(mut self, initial: Option<&'a Value>) -> Self {
		self.initial = initial;
		self
	}

	pub fn name(&self) -> &str {
		self.field.name()
	}

	pub fn id_for_label(&self) -> String {
		format!("id_{}", self.field.name())
	}

	/// The explicit label, or one derived from the field name.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_forms::{BoundField, CharField, FormField};
	///
	/// let field = CharField::new("analyte_value");
	/// let bound = BoundField::new(&field, None, &[], false);
	/// assert_eq!(bound.label(), "Analyte value");
	/// ```
	pub fn label(&self) -> String {
		self.field
			.label()
			.map(str::to_string)
			.unwrap_or_else(|| pretty_name(self.field.name()))
	}

	/// Submitted data when bound, otherwise the field's initial value.
	pub fn value(&self) -> Option<&Value> {
		if self.is_bound {
			self.data
		} else {
			self.initial.or_else(|| self.field.initial())
		}
	}

	pub fn errors(&self) -> &[String] {
		self.errors
	}

	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}

	/// Current value as the strings a widget compares against.
	fn selected_values(&self) -> Vec<String> {
		match self.value() {
			None | Some(Value::Null) => Vec::new(),
			Some(Value::Array(items)) => items.iter().map(value_text).collect(),
			Some(other) => vec![value_text(other)],
		}
	}

	/// Template-facing representation of this field.
	pub fn to_context(&self) -> Value {
		let selected = self.selected_values();
		let choices: Vec<Value> = self
			.field
			.choices()
			.into_iter()
			.map(|choice| {
				let is_selected = selected.contains(&choice.value);
				json!({
					"value": choice.value,
					"label": choice.label,
					"selected": is_selected,
				})
			})
			.collect();

		let value = if self.field.is_multiple() {
			Value::from(selected)
		} else {
			selected
				.last()
				.map(|v| Value::String(v.clone()))
				.unwrap_or(Value::Null)
		};

		json!({
			"name": self.name(),
			"id_for_label": self.id_for_label(),
			"label": self.label(),
			"required": self.field.required(),
			"help_text": self.field.help_text(),
			"widget": self.field.widget().as_str(),
			"multiple": self.field.is_multiple(),
			"value": value,
			"choices": choices,
			"errors": self.errors,
		})
	}
}

fn value_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fields::{ChoiceField, MultipleChoiceField};
	use rstest::rstest;

	#[rstest]
	fn test_unbound_field_renders_initial_selection() {
		// Arrange
		let field = MultipleChoiceField::<i64>::new("method_types")
			.with_choices(vec![(1, "Regulatory".to_string()), (2, "Screening".to_string())])
			.with_all_selected();
		let bound = BoundField::new(&field, None, &[], false);

		// Act
		let context = bound.to_context();

		// Assert
		assert_eq!(context["value"], json!(["1", "2"]));
		assert_eq!(context["choices"][0]["selected"], true);
		assert_eq!(context["choices"][1]["selected"], true);
		assert_eq!(context["widget"], "select_multiple");
	}

	#[rstest]
	fn test_bound_field_marks_submitted_choice() {
		// Arrange
		let field = ChoiceField::<String>::new("media_name")
			.with_choices(vec![("WATER".to_string(), "Water".to_string())])
			.with_all_choice("Any");
		let data = json!("WATER");
		let errors = vec!["bad".to_string()];
		let bound = BoundField::new(&field, Some(&data), &errors, true);

		// Act
		let context = bound.to_context();

		// Assert
		assert_eq!(context["value"], "WATER");
		assert_eq!(context["choices"][0]["selected"], false);
		assert_eq!(context["choices"][1]["selected"], true);
		assert_eq!(context["errors"], json!(["bad"]));
		assert_eq!(context["label"], "Media name");
	}
}

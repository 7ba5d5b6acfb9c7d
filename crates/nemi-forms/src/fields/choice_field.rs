//! Select fields with statically typed choice keys.
//!
//! The key kind of a choice field is a type parameter fixed where the field is
//! declared: `ChoiceField<i64>` for numeric identifiers, `ChoiceField<String>`
//! for textual codes. Cleaned values carry the typed key as JSON, so numeric
//! keys clean to JSON numbers and textual keys to JSON strings.

use crate::field::{ChoiceOption, FieldError, FieldResult, FormField, Widget, scalar_text};
use serde_json::Value;
use std::fmt;

/// Sentinel choice value meaning "do not filter on this field".
pub const ALL_CHOICE: &str = "all";

/// A type usable as the stored key of a choice.
pub trait ChoiceKey: Clone + PartialEq + fmt::Display + Send + Sync + 'static {
	/// Parse the submitted form representation of a key.
	fn parse_key(raw: &str) -> Option<Self>;

	/// Recover a key from a cleaned JSON value.
	fn from_value(value: &Value) -> Option<Self>;

	fn to_value(&self) -> Value;
}

impl ChoiceKey for i64 {
	fn parse_key(raw: &str) -> Option<Self> {
		raw.trim().parse().ok()
	}

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Number(n) => n.as_i64(),
			Value::String(s) => Self::parse_key(s),
			_ => None,
		}
	}

	fn to_value(&self) -> Value {
		Value::from(*self)
	}
}

impl ChoiceKey for String {
	fn parse_key(raw: &str) -> Option<Self> {
		Some(raw.to_string())
	}

	fn from_value(value: &Value) -> Option<Self> {
		value.as_str().map(str::to_string)
	}

	fn to_value(&self) -> Value {
		Value::String(self.clone())
	}
}

/// Single-select field.
///
/// # Examples
///
/// ```
/// use nemi_forms::{ChoiceField, FormField};
/// use serde_json::json;
///
/// let field = ChoiceField::<i64>::new("instrumentation")
///     .with_choices(vec![(3, "GC-MS".to_string()), (7, "ICP-AES".to_string())])
///     .with_all_choice("Any");
///
/// assert_eq!(field.clean(Some(&json!("7"))).unwrap(), json!(7));
/// assert_eq!(field.clean(Some(&json!("all"))).unwrap(), json!("all"));
/// assert!(field.clean(Some(&json!("8"))).is_err());
/// assert_eq!(field.choice_label(&json!(7)).as_deref(), Some("ICP-AES"));
/// ```
#[derive(Debug, Clone)]
pub struct ChoiceField<K: ChoiceKey> {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub initial: Option<Value>,
	pub choices: Vec<(K, String)>,
	/// Label of the leading `"all"` choice, when the field offers one.
	pub all_choice: Option<String>,
}

impl<K: ChoiceKey> ChoiceField<K> {
	/// Create a required select field with no choices.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			label: None,
			required: true,
			help_text: None,
			widget: Widget::Select,
			initial: None,
			choices: Vec::new(),
			all_choice: None,
		}
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn with_choices(mut self, choices: impl IntoIterator<Item = (K, String)>) -> Self {
		self.choices = choices.into_iter().collect();
		self
	}

	/// Offer the `"all"` sentinel first and select it initially.
	pub fn with_all_choice(mut self, label: impl Into<String>) -> Self {
		self.all_choice = Some(label.into());
		self.initial = Some(Value::String(ALL_CHOICE.to_string()));
		self
	}

	pub fn with_initial(mut self, key: K) -> Self {
		self.initial = Some(key.to_value());
		self
	}

	pub fn with_widget(mut self, widget: Widget) -> Self {
		self.widget = widget;
		self
	}

	/// Allow an empty submission, cleaned to null.
	pub fn not_required(mut self) -> Self {
		self.required = false;
		self
	}

	/// Whether a cleaned value is the `"all"` sentinel of this field.
	pub fn is_all(&self, value: &Value) -> bool {
		self.all_choice.is_some() && value.as_str() == Some(ALL_CHOICE)
	}

	fn label_for(&self, key: &K) -> Option<&str> {
		self.choices
			.iter()
			.find(|(candidate, _)| candidate == key)
			.map(|(_, label)| label.as_str())
	}
}

/// The offered key matching `raw` as submitted, or failing that, trimmed.
fn find_key<K: ChoiceKey>(choices: &[(K, String)], raw: &str) -> Option<K> {
	[raw, raw.trim()]
		.into_iter()
		.filter_map(K::parse_key)
		.find(|key| choices.iter().any(|(candidate, _)| candidate == key))
}

impl<K: ChoiceKey> FormField for ChoiceField<K> {
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
		if raw.trim().is_empty() {
			if self.required {
				return Err(FieldError::Required(self.name.clone()));
			}
			return Ok(Value::Null);
		}

		if self.all_choice.is_some() && raw.trim() == ALL_CHOICE {
			return Ok(Value::String(ALL_CHOICE.to_string()));
		}

		find_key(&self.choices, &raw)
			.map(|key| key.to_value())
			.ok_or_else(|| FieldError::InvalidChoice(raw.trim().to_string()))
	}

	fn choices(&self) -> Vec<ChoiceOption> {
		let all = self
			.all_choice
			.iter()
			.map(|label| ChoiceOption::new(ALL_CHOICE, label.clone()));
		all.chain(
			self.choices
				.iter()
				.map(|(key, label)| ChoiceOption::new(key.to_string(), label.clone())),
		)
		.collect()
	}

	fn choice_label(&self, value: &Value) -> Option<String> {
		if self.is_all(value) {
			return self.all_choice.clone();
		}
		K::from_value(value)
			.and_then(|key| self.label_for(&key).map(str::to_string))
	}
}

/// Multi-select field. Selecting every choice is meaningful to callers, so
/// the cleaned value keeps the selection without collapsing it.
#[derive(Debug, Clone)]
pub struct MultipleChoiceField<K: ChoiceKey> {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub initial: Option<Value>,
	pub choices: Vec<(K, String)>,
}

impl<K: ChoiceKey> MultipleChoiceField<K> {
	/// Create a required multi-select with no choices.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			label: None,
			required: true,
			help_text: None,
			widget: Widget::SelectMultiple,
			initial: None,
			choices: Vec::new(),
		}
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn with_choices(mut self, choices: impl IntoIterator<Item = (K, String)>) -> Self {
		self.choices = choices.into_iter().collect();
		self
	}

	/// Initially select every choice. Call after [`Self::with_choices`].
	pub fn with_all_selected(mut self) -> Self {
		self.initial = Some(Value::Array(
			self.choices.iter().map(|(key, _)| key.to_value()).collect(),
		));
		self
	}

	pub fn with_widget(mut self, widget: Widget) -> Self {
		self.widget = widget;
		self
	}

	pub fn not_required(mut self) -> Self {
		self.required = false;
		self
	}

	fn label_for(&self, key: &K) -> Option<&str> {
		self.choices
			.iter()
			.find(|(candidate, _)| candidate == key)
			.map(|(_, label)| label.as_str())
	}
}

impl<K: ChoiceKey> FormField for MultipleChoiceField<K> {
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
		let raw_values: Vec<String> = match value {
			None | Some(Value::Null) => Vec::new(),
			Some(Value::Array(items)) => items
				.iter()
				.filter_map(|item| scalar_text(Some(item)))
				.collect(),
			Some(other) => scalar_text(Some(other)).into_iter().collect(),
		};
		let raw_values: Vec<&str> = raw_values
			.iter()
			.map(String::as_str)
			.filter(|raw| !raw.trim().is_empty())
			.collect();

		if raw_values.is_empty() {
			if self.required {
				return Err(FieldError::Required(self.name.clone()));
			}
			return Ok(Value::Array(Vec::new()));
		}

		let mut selected: Vec<K> = Vec::with_capacity(raw_values.len());
		for raw in raw_values {
			let key = find_key(&self.choices, raw)
				.ok_or_else(|| FieldError::InvalidChoice(raw.trim().to_string()))?;
			if !selected.contains(&key) {
				selected.push(key);
			}
		}

		Ok(Value::Array(selected.iter().map(K::to_value).collect()))
	}

	fn choices(&self) -> Vec<ChoiceOption> {
		self.choices
			.iter()
			.map(|(key, label)| ChoiceOption::new(key.to_string(), label.clone()))
			.collect()
	}

	fn choice_label(&self, value: &Value) -> Option<String> {
		K::from_value(value).and_then(|key| self.label_for(&key).map(str::to_string))
	}

	fn is_multiple(&self) -> bool {
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn media() -> ChoiceField<String> {
		ChoiceField::new("media_name")
			.with_choices(vec![
				("WATER".to_string(), "Water".to_string()),
				("SOIL".to_string(), "Soil".to_string()),
			])
			.with_all_choice("Any")
	}

	#[fixture]
	fn method_types() -> MultipleChoiceField<i64> {
		MultipleChoiceField::new("method_types")
			.with_choices(vec![
				(1, "Regulatory".to_string()),
				(2, "Non-regulatory".to_string()),
				(3, "Screening".to_string()),
			])
			.with_all_selected()
	}

	#[rstest]
	fn test_string_choice_cleans_to_string(media: ChoiceField<String>) {
		assert_eq!(media.clean(Some(&json!("SOIL"))).unwrap(), json!("SOIL"));
	}

	#[rstest]
	#[case(" SOIL", " SOIL")]
	#[case(" WATER ", "WATER")]
	#[case("WATER", "WATER")]
	fn test_padded_keys_match_as_stored(#[case] raw: &str, #[case] expected: &str) {
		// Arrange
		let field = ChoiceField::<String>::new("media_name").with_choices(vec![
			("WATER".to_string(), "Water".to_string()),
			(" SOIL".to_string(), "Soil".to_string()),
		]);

		// Act
		let cleaned = field.clean(Some(&json!(raw))).unwrap();

		// Assert
		assert_eq!(cleaned, json!(expected));
	}

	#[rstest]
	fn test_padded_multiple_choice_key_matches_as_stored() {
		// Arrange
		let field = MultipleChoiceField::<String>::new("media").with_choices(vec![
			(" SOIL".to_string(), "Soil".to_string()),
			("WATER".to_string(), "Water".to_string()),
		]);

		// Act
		let cleaned = field.clean(Some(&json!([" SOIL", "WATER "]))).unwrap();

		// Assert
		assert_eq!(cleaned, json!([" SOIL", "WATER"]));
	}

	#[rstest]
	fn test_all_sentinel_is_accepted_only_when_offered() {
		// Arrange
		let without_all = ChoiceField::<String>::new("complexity")
			.with_choices(vec![("Low".to_string(), "Low".to_string())]);

		// Act
		let result = without_all.clean(Some(&json!("all")));

		// Assert
		assert_eq!(result, Err(FieldError::InvalidChoice("all".into())));
	}

	#[rstest]
	fn test_choices_start_with_all(media: ChoiceField<String>) {
		// Act
		let choices = media.choices();

		// Assert
		assert_eq!(choices[0], ChoiceOption::new("all", "Any"));
		assert_eq!(choices.len(), 3);
		assert_eq!(media.initial(), Some(&json!("all")));
	}

	#[rstest]
	fn test_choice_label_uses_typed_key() {
		// Arrange
		let field = ChoiceField::<i64>::new("method_number")
			.with_choices(vec![(4021, "EPA 200.7".to_string())]);

		// Act & Assert
		assert_eq!(field.choice_label(&json!(4021)).as_deref(), Some("EPA 200.7"));
		assert_eq!(field.choice_label(&json!("4021")).as_deref(), Some("EPA 200.7"));
		assert_eq!(field.choice_label(&json!(1)), None);
	}

	#[rstest]
	fn test_optional_choice_cleans_empty_to_null() {
		let field = ChoiceField::<String>::new("item_type")
			.with_choices(vec![("Book".to_string(), "Book".to_string())])
			.not_required();

		assert_eq!(field.clean(Some(&json!(""))).unwrap(), Value::Null);
	}

	#[rstest]
	fn test_multiple_choice_cleans_and_dedupes(method_types: MultipleChoiceField<i64>) {
		// Act
		let cleaned = method_types.clean(Some(&json!(["3", "1", "3"]))).unwrap();

		// Assert
		assert_eq!(cleaned, json!([3, 1]));
	}

	#[rstest]
	fn test_multiple_choice_rejects_unknown(method_types: MultipleChoiceField<i64>) {
		assert_eq!(
			method_types.clean(Some(&json!(["1", "9"]))),
			Err(FieldError::InvalidChoice("9".into()))
		);
	}

	#[rstest]
	fn test_multiple_choice_required(method_types: MultipleChoiceField<i64>) {
		assert!(method_types.clean(None).is_err());
		assert!(method_types.clean(Some(&json!([]))).is_err());
	}

	#[rstest]
	fn test_multiple_choice_initial_selects_everything(method_types: MultipleChoiceField<i64>) {
		assert_eq!(method_types.initial(), Some(&json!([1, 2, 3])));
		assert!(method_types.is_multiple());
	}
}

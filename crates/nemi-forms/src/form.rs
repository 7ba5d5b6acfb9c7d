use crate::bound_field::BoundField;
use crate::field::{FieldError, FormField};
use serde_json::{Map, Value, json};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum FormError {
	#[error("Field error in {field}: {error}")]
	Field { field: String, error: FieldError },
	#[error("Validation error: {0}")]
	Validation(String),
}

pub type FormResult<T> = Result<T, FormError>;

type CleanFunction = Box<dyn Fn(&HashMap<String, Value>) -> FormResult<()> + Send + Sync>;

/// Key under which form-level (non-field) errors are collected.
pub const ALL_FIELDS_KEY: &str = "_all";

/// A set of fields bound to submitted data.
///
/// Raw submitted values are kept apart from cleaned values so an invalid form
/// re-renders exactly what the user entered.
pub struct Form {
	fields: Vec<Box<dyn FormField>>,
	data: HashMap<String, Value>,
	cleaned_data: HashMap<String, Value>,
	initial: HashMap<String, Value>,
	errors: HashMap<String, Vec<String>>,
	is_bound: bool,
	clean_functions: Vec<CleanFunction>,
}

impl Default for Form {
	fn default() -> Self {
		Self::new()
	}
}

impl Form {
	/// Create a new empty form
	///
	/// # Examples
	///
	/// ```
	/// use nemi_forms::Form;
	///
	/// let form = Form::new();
	/// assert!(!form.is_bound());
	/// assert!(form.fields().is_empty());
	/// ```
	pub fn new() -> Self {
		Self {
			fields: vec![],
			data: HashMap::new(),
			cleaned_data: HashMap::new(),
			initial: HashMap::new(),
			errors: HashMap::new(),
			is_bound: false,
			clean_functions: vec![],
		}
	}

	pub fn add_field(&mut self, field: Box<dyn FormField>) {
		self.fields.push(field);
	}

	pub fn with_field(mut self, field: impl FormField + 'static) -> Self {
		self.fields.push(Box::new(field));
		self
	}

	pub fn bind(&mut self, data: HashMap<String, Value>) {
		self.data = data;
		self.is_bound = true;
	}

	/// Bind decoded query or form pairs.
	///
	/// Multi-valued fields collect every occurrence of their key into an
	/// array; every other key keeps the last occurrence.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_forms::{Form, CharField};
	/// use serde_json::json;
	///
	/// let mut form = Form::new().with_field(CharField::new("keywords"));
	/// form.bind_pairs(&[("keywords".to_string(), "lead".to_string())]);
	/// assert!(form.is_valid());
	/// assert_eq!(form.cleaned("keywords"), Some(&json!("lead")));
	/// ```
	pub fn bind_pairs(&mut self, pairs: &[(String, String)]) {
		let mut data: HashMap<String, Value> = HashMap::new();
		for (key, value) in pairs {
			let multiple = self
				.get_field(key)
				.map(|field| field.is_multiple())
				.unwrap_or(false);
			if multiple {
				let entry = data
					.entry(key.clone())
					.or_insert_with(|| Value::Array(Vec::new()));
				if let Value::Array(items) = entry {
					items.push(Value::String(value.clone()));
				}
			} else {
				data.insert(key.clone(), Value::String(value.clone()));
			}
		}
		self.bind(data);
	}

	/// Validate every field, then the form-level clean functions.
	pub fn is_valid(&mut self) -> bool {
		if !self.is_bound {
			return false;
		}

		self.errors.clear();
		self.cleaned_data.clear();

		for field in &self.fields {
			match field.clean(self.data.get(field.name())) {
				Ok(cleaned) => {
					self.cleaned_data.insert(field.name().to_string(), cleaned);
				}
				Err(e) => {
					self.errors
						.entry(field.name().to_string())
						.or_default()
						.push(e.to_string());
				}
			}
		}

		for clean_fn in &self.clean_functions {
			if let Err(e) = clean_fn(&self.cleaned_data) {
				match e {
					FormError::Field { field, error } => {
						self.errors
							.entry(field)
							.or_default()
							.push(error.to_string());
					}
					FormError::Validation(msg) => {
						self.errors
							.entry(ALL_FIELDS_KEY.to_string())
							.or_default()
							.push(msg);
					}
				}
			}
		}

		self.errors.is_empty()
	}

	pub fn cleaned_data(&self) -> &HashMap<String, Value> {
		&self.cleaned_data
	}

	pub fn cleaned(&self, name: &str) -> Option<&Value> {
		self.cleaned_data.get(name)
	}

	pub fn data(&self) -> &HashMap<String, Value> {
		&self.data
	}

	pub fn errors(&self) -> &HashMap<String, Vec<String>> {
		&self.errors
	}

	pub fn non_field_errors(&self) -> &[String] {
		self.errors
			.get(ALL_FIELDS_KEY)
			.map(Vec::as_slice)
			.unwrap_or(&[])
	}

	pub fn is_bound(&self) -> bool {
		self.is_bound
	}

	pub fn fields(&self) -> &[Box<dyn FormField>] {
		&self.fields
	}

	pub fn get_field(&self, name: &str) -> Option<&dyn FormField> {
		self.fields
			.iter()
			.find(|f| f.name() == name)
			.map(|f| f.as_ref())
	}

	pub fn get_bound_field(&self, name: &str) -> Option<BoundField<'_>> {
		let field = self.get_field(name)?;
		Some(self.bound(field))
	}

	fn bound<'a>(&'a self, field: &'a dyn FormField) -> BoundField<'a> {
		let errors = self
			.errors
			.get(field.name())
			.map(Vec::as_slice)
			.unwrap_or(&[]);
		BoundField::new(field, self.data.get(field.name()), errors, self.is_bound)
			.with_initial(self.initial.get(field.name()))
	}

	/// Override initial values for an unbound form, such as an edit form
	/// populated from a stored record.
	pub fn set_initial(&mut self, initial: HashMap<String, Value>) {
		self.initial = initial;
	}

	pub fn initial(&self) -> &HashMap<String, Value> {
		&self.initial
	}

	pub fn add_clean_function<F>(&mut self, f: F)
	where
		F: Fn(&HashMap<String, Value>) -> FormResult<()> + Send + Sync + 'static,
	{
		self.clean_functions.push(Box::new(f));
	}

	/// Template context: fields in declaration order plus a lookup by name.
	pub fn to_context(&self) -> Value {
		let mut by_name = Map::new();
		let mut fields = Vec::with_capacity(self.fields.len());
		for field in &self.fields {
			let context = self.bound(field.as_ref()).to_context();
			by_name.insert(field.name().to_string(), context.clone());
			fields.push(context);
		}
		json!({
			"fields": fields,
			"field": by_name,
			"non_field_errors": self.non_field_errors(),
			"is_bound": self.is_bound,
		})
	}
}

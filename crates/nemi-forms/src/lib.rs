//! Form processing and validation for NEMI web
//!
//! Search pages bind query-string parameters to a [`Form`], validate it, and
//! read typed cleaned values back out. Choice fields declare their key kind
//! (`i64` or `String`) where they are defined, so labels are looked up without
//! inspecting key types at runtime.

pub mod bound_field;
pub mod field;
pub mod fields;
pub mod form;

pub use bound_field::BoundField;
pub use field::{ChoiceOption, FieldError, FieldResult, FormField, Widget, pretty_name};
pub use fields::{
	ALL_CHOICE, CharField, ChoiceField, ChoiceKey, IntegerField, MultipleChoiceField,
};
pub use form::{ALL_FIELDS_KEY, Form, FormError, FormResult};

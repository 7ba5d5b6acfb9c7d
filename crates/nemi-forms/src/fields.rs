pub mod char_field;
pub mod choice_field;
pub mod integer_field;

pub use char_field::CharField;
pub use choice_field::{ALL_CHOICE, ChoiceField, ChoiceKey, MultipleChoiceField};
pub use integer_field::IntegerField;

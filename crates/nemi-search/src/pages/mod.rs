//! The concrete search pages
//!
//! Each module declares one page: its form, base query, ordered rules, result
//! columns and header abbreviations.

pub mod analyte;
pub mod analyte_select;
pub mod biological;
pub mod general;
pub mod microbiological;
pub mod physical;
pub mod statistic;
pub mod stream_physical;
pub mod toxicity;

use crate::choices::{id_choices, value_choices};
use nemi_core::Result;
use nemi_db::{Database, QuerySet};
use nemi_forms::{ChoiceField, MultipleChoiceField};

/// Label of the leading `"all"` choice on every select.
pub const ANY_LABEL: &str = "Any";

/// Select over `(id, label)` pairs of `base`, starting with "Any".
pub(crate) async fn id_select(
	db: &Database,
	base: QuerySet,
	name: &str,
	label: &str,
	id_column: &str,
	label_column: &str,
) -> Result<ChoiceField<i64>> {
	let choices = id_choices(db, base, id_column, label_column).await?;
	Ok(ChoiceField::new(name)
		.with_label(label)
		.with_choices(choices)
		.with_all_choice(ANY_LABEL))
}

/// Select over the distinct values of one column of `base`, starting with "Any".
pub(crate) async fn value_select(
	db: &Database,
	base: QuerySet,
	name: &str,
	label: &str,
	column: &str,
) -> Result<ChoiceField<String>> {
	let choices = value_choices(db, base, column).await?;
	Ok(ChoiceField::new(name)
		.with_label(label)
		.with_choices(choices)
		.with_all_choice(ANY_LABEL))
}

/// Method type multi-select keyed by description, every type selected.
pub(crate) async fn method_type_descs(
	db: &Database,
	base: QuerySet,
) -> Result<MultipleChoiceField<String>> {
	let choices = value_choices(db, base, "method_type_desc").await?;
	Ok(MultipleChoiceField::new("method_types")
		.with_label("Method types")
		.with_choices(choices)
		.with_all_selected())
}

//! Search pages, exports, method summaries and statistical sources
//!
//! Every faceted search page is a [`page::SearchPage`]: a form built from the
//! store, an ordered list of filter rules over a base query, and a renderer.
//! The concrete pages live in [`pages`]; the remaining views are
//!
//! - [`keyword`]: ranked, paginated full-text search
//! - [`summary`]: method summaries and the per-method analyte download
//! - [`citations`]: statistical source create/update/detail/summary

pub mod choices;
pub mod citations;
pub mod criteria;
pub mod export;
pub mod greenness;
pub mod header_defs;
pub mod keyword;
pub mod page;
pub mod pages;
pub mod renderer;
pub mod summary;

pub use criteria::Criterion;
pub use export::{ExportError, ExportFormat, ExportResult};
pub use page::{
	ExportView, FilterChain, FilterRule, FormValidator, QueryBuilder, SearchPage, SearchResultView,
};
pub use renderer::{JsonRenderer, ResponseRenderer, TemplateRenderer};

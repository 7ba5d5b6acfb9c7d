//! Full-text search over method documents
//!
//! The search page only needs "rows ranked by relevance for these keywords";
//! how keywords become a vendor predicate is the backend's business.

use crate::connection::Database;
use crate::error::DatabaseResult;
use crate::query::FilterValue;
use crate::record::Record;
use async_trait::async_trait;

#[async_trait]
pub trait FullTextSearch: Send + Sync {
	/// Matching method rows, most relevant first.
	async fn search(&self, db: &Database, keywords: &str) -> DatabaseResult<Vec<Record>>;
}

/// Build an FTS5 MATCH expression: every token quoted, alternatives OR-ed so
/// documents matching more terms score higher.
///
/// # Examples
///
/// ```
/// use nemi_db::fts5_query;
///
/// assert_eq!(fts5_query("lead  water"), Some("\"lead\" OR \"water\"".to_string()));
/// assert_eq!(fts5_query("say \"hi\""), Some("\"say\" OR \"\"\"hi\"\"\"".to_string()));
/// assert_eq!(fts5_query("   "), None);
/// ```
pub fn fts5_query(keywords: &str) -> Option<String> {
	let terms: Vec<String> = keywords
		.split_whitespace()
		.map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
		.collect();
	if terms.is_empty() {
		None
	} else {
		Some(terms.join(" OR "))
	}
}

const FTS5_SEARCH_SQL: &str = "SELECT -bm25(method_fts) AS method_summary_score, \
	mf.method_id, mf.source_method_identifier AS method_number, mf.link_to_full_method, \
	mf.mimetype, mf.revision_id, mf.method_official_name, mf.method_descriptive_name, \
	mf.method_source \
	FROM method_fts JOIN method_fact mf ON mf.method_id = method_fts.rowid \
	WHERE method_fts MATCH ? \
	ORDER BY method_summary_score DESC, mf.method_id ASC";

/// SQLite FTS5 backend over `method_fts`, whose rowid is the method id.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fts5Search;

#[async_trait]
impl FullTextSearch for Fts5Search {
	async fn search(&self, db: &Database, keywords: &str) -> DatabaseResult<Vec<Record>> {
		let Some(expression) = fts5_query(keywords) else {
			return Ok(Vec::new());
		};
		tracing::debug!(expression = %expression, "full-text search");
		db.fetch_all(FTS5_SEARCH_SQL, &[FilterValue::Text(expression)])
			.await
	}
}

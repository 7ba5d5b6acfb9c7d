//! Connection pool wrapper

use crate::error::DatabaseResult;
use crate::query::{FilterValue, bind_all};
use crate::record::{Record, decode_row};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Development and test schema: the read views as plain tables plus the
/// writable citation, news and full-text tables.
pub const SCHEMA: &str = include_str!("../schema.sql");

/// Mask the password in a database URL for safe display.
fn mask_url_password(url: &str) -> String {
	if let Some(scheme_end) = url.find("://") {
		let after_scheme = &url[scheme_end + 3..];
		if let Some(at_pos) = after_scheme.rfind('@') {
			let user_info = &after_scheme[..at_pos];
			if let Some(colon_pos) = user_info.find(':') {
				let scheme_and_user = &url[..scheme_end + 3 + colon_pos + 1];
				let rest = &url[scheme_end + 3 + at_pos..];
				return format!("{}***{}", scheme_and_user, rest);
			}
		}
	}
	url.to_string()
}

/// Shared handle to the SQLite pool. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Database {
	pool: SqlitePool,
}

impl Database {
	/// Connect to a database URL such as `sqlite://nemi.db?mode=rwc`.
	pub async fn connect(url: &str) -> DatabaseResult<Self> {
		tracing::info!(url = %mask_url_password(url), "connecting to database");
		let pool = SqlitePoolOptions::new()
			.max_connections(5)
			.connect(url)
			.await?;
		Ok(Self { pool })
	}

	/// A private in-memory database.
	///
	/// Every SQLite in-memory connection is its own database, so the pool is
	/// pinned to a single connection that never expires.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_db::Database;
	///
	/// # async fn example() {
	/// let db = Database::connect_in_memory().await.unwrap();
	/// db.apply_schema().await.unwrap();
	/// let rows = db.fetch_all("SELECT COUNT(*) AS n FROM news_item", &[]).await.unwrap();
	/// assert_eq!(rows[0]["n"], 0);
	/// # }
	/// # tokio::runtime::Runtime::new().unwrap().block_on(example());
	/// ```
	pub async fn connect_in_memory() -> DatabaseResult<Self> {
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
			.connect("sqlite::memory:")
			.await?;
		Ok(Self { pool })
	}

	pub fn from_pool(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Create the bundled schema. Safe to run repeatedly.
	pub async fn apply_schema(&self) -> DatabaseResult<()> {
		self.execute_script(SCHEMA).await
	}

	/// Run a multi-statement script without parameters.
	pub async fn execute_script(&self, script: &str) -> DatabaseResult<()> {
		sqlx::raw_sql(script).execute(&self.pool).await?;
		Ok(())
	}

	/// Run one parameterised query and decode every row.
	pub async fn fetch_all(&self, sql: &str, params: &[FilterValue]) -> DatabaseResult<Vec<Record>> {
		tracing::debug!(sql = %sql, params = params.len(), "executing query");
		let rows = bind_all(sqlx::query(sql), params)
			.fetch_all(&self.pool)
			.await?;
		Ok(rows.iter().map(decode_row).collect())
	}

	/// Run one parameterised statement and return the number of affected rows.
	pub async fn execute(&self, sql: &str, params: &[FilterValue]) -> DatabaseResult<u64> {
		tracing::debug!(sql = %sql, params = params.len(), "executing statement");
		let result = bind_all(sqlx::query(sql), params)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected())
	}

	pub async fn close(&self) {
		self.pool.close().await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("sqlite://nemi.db?mode=rwc", "sqlite://nemi.db?mode=rwc")]
	#[case("postgres://nemi:s3cr@t@db/nemi", "postgres://nemi:***@db/nemi")]
	fn test_mask_url_password(#[case] url: &str, #[case] expected: &str) {
		assert_eq!(mask_url_password(url), expected);
	}

	#[rstest]
	#[tokio::test]
	async fn test_schema_is_idempotent() {
		// Arrange
		let db = Database::connect_in_memory().await.unwrap();

		// Act
		db.apply_schema().await.unwrap();
		let second = db.apply_schema().await;

		// Assert
		assert!(second.is_ok());
	}

	#[rstest]
	#[tokio::test]
	async fn test_execute_binds_parameters() {
		// Arrange
		let db = Database::connect_in_memory().await.unwrap();
		db.apply_schema().await.unwrap();

		// Act
		let inserted = db
			.execute(
				"INSERT INTO definitions_dom (definition_abbrev, definition_name, definition_description) VALUES (?, ?, ?)",
				&[
					FilterValue::from("MEDIA_NAME"),
					FilterValue::from("Media"),
					FilterValue::from("Sample matrix"),
				],
			)
			.await
			.unwrap();
		let rows = db
			.fetch_all("SELECT definition_name FROM definitions_dom", &[])
			.await
			.unwrap();

		// Assert
		assert_eq!(inserted, 1);
		assert_eq!(rows[0]["definition_name"], "Media");
	}
}

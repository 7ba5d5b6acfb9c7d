//! Database errors

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid identifier: {0}")]
	InvalidIdentifier(String),
	#[error("{0} matching query does not exist")]
	NotFound(String),
	#[error("get() returned more than one row from {0}")]
	MultipleObjectsReturned(String),
	#[error("Query error: {0}")]
	Query(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

impl From<DatabaseError> for nemi_core::Error {
	fn from(err: DatabaseError) -> Self {
		match err {
			DatabaseError::NotFound(_) => nemi_core::Error::NotFound(err.to_string()),
			other => nemi_core::Error::Database(other.to_string()),
		}
	}
}

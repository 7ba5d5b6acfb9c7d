//! Application error taxonomy.

/// Errors surfaced by views and the services behind them.
///
/// Every variant maps onto exactly one HTTP status through [`Error::status_code`].
/// Validation failures of search forms are not errors: they re-render the form.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Validation error: {0}")]
	Validation(String),

	#[error("Authentication required: {0}")]
	Unauthorized(String),

	#[error("Method not allowed: {0}")]
	MethodNotAllowed(String),

	#[error("Database error: {0}")]
	Database(String),

	#[error("Template error: {0}")]
	Template(String),

	#[error("Serialization error: {0}")]
	Serialization(String),

	#[error("Improperly configured: {0}")]
	ImproperlyConfigured(String),

	#[error("Internal server error: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// HTTP status code for this error.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_core::Error;
	///
	/// assert_eq!(Error::NotFound("method 12".into()).status_code(), 404);
	/// assert_eq!(Error::Database("locked".into()).status_code(), 500);
	/// ```
	pub fn status_code(&self) -> u16 {
		match self {
			Error::NotFound(_) => 404,
			Error::Validation(_) => 400,
			Error::Unauthorized(_) => 401,
			Error::MethodNotAllowed(_) => 405,
			Error::Database(_)
			| Error::Template(_)
			| Error::Serialization(_)
			| Error::ImproperlyConfigured(_)
			| Error::Internal(_) => 500,
		}
	}

	/// Whether the error message may be shown to the client.
	///
	/// Server-side failures are logged but never echoed back.
	pub fn is_client_error(&self) -> bool {
		self.status_code() < 500
	}
}

impl From<serde_json::Error> for Error {
	fn from(error: serde_json::Error) -> Self {
		Error::Serialization(error.to_string())
	}
}

impl From<tera::Error> for Error {
	fn from(error: tera::Error) -> Self {
		// tera nests the useful part of the message in the source chain
		let mut message = error.to_string();
		let mut source = std::error::Error::source(&error);
		while let Some(inner) = source {
			message.push_str(": ");
			message.push_str(&inner.to_string());
			source = inner.source();
		}
		Error::Template(message)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Error::NotFound("x".into()), 404)]
	#[case(Error::Validation("x".into()), 400)]
	#[case(Error::Unauthorized("x".into()), 401)]
	#[case(Error::MethodNotAllowed("x".into()), 405)]
	#[case(Error::Database("x".into()), 500)]
	#[case(Error::Template("x".into()), 500)]
	#[case(Error::ImproperlyConfigured("x".into()), 500)]
	fn test_status_code_mapping(#[case] error: Error, #[case] expected: u16) {
		// Act
		let status = error.status_code();

		// Assert
		assert_eq!(status, expected);
	}

	#[rstest]
	fn test_server_errors_are_not_client_errors() {
		assert!(Error::NotFound("page".into()).is_client_error());
		assert!(!Error::Internal("boom".into()).is_client_error());
	}
}

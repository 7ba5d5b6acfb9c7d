use super::Request;
use crate::exception::{Error, Result};
use hyper::Uri;

impl Request {
	/// Parse query parameters from the URI as ordered, decoded pairs.
	pub(super) fn parse_query_pairs(uri: &Uri) -> Vec<(String, String)> {
		match uri.query() {
			Some(query) => serde_urlencoded::from_str(query).unwrap_or_else(|e| {
				tracing::debug!(error = %e, query, "discarding undecodable query string");
				Vec::new()
			}),
			None => Vec::new(),
		}
	}

	/// Get the request path
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Path plus query string, as the client sent it.
	pub fn full_path(&self) -> String {
		match self.uri.query() {
			Some(query) => format!("{}?{}", self.uri.path(), query),
			None => self.uri.path().to_string(),
		}
	}

	/// Whether any query parameter was supplied.
	pub fn has_query(&self) -> bool {
		!self.query_pairs.is_empty()
	}

	/// All decoded query pairs in request order.
	pub fn query_pairs(&self) -> &[(String, String)] {
		&self.query_pairs
	}

	/// Last value supplied for `name`.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_core::Request;
	///
	/// let request = Request::builder()
	///     .uri("/search/keyword/?keywords=lead+water&page=2&page=3")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.query_param("keywords"), Some("lead water"));
	/// assert_eq!(request.query_param("page"), Some("3"));
	/// assert_eq!(request.query_param("missing"), None);
	/// ```
	pub fn query_param(&self, name: &str) -> Option<&str> {
		self.query_pairs
			.iter()
			.rev()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	/// Every value supplied for `name`, in request order.
	pub fn query_values(&self, name: &str) -> Vec<&str> {
		self.query_pairs
			.iter()
			.filter(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
			.collect()
	}

	/// Re-encode the query string without the given parameters.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_core::Request;
	///
	/// let request = Request::builder()
	///     .uri("/search/keyword/?keywords=lead&page=4")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.query_string_without(&["page"]), "keywords=lead");
	/// ```
	pub fn query_string_without(&self, excluded: &[&str]) -> String {
		let kept: Vec<(&str, &str)> = self
			.query_pairs
			.iter()
			.filter(|(key, _)| !excluded.contains(&key.as_str()))
			.map(|(key, value)| (key.as_str(), value.as_str()))
			.collect();
		serde_urlencoded::to_string(kept).unwrap_or_default()
	}

	/// Decode an `application/x-www-form-urlencoded` body.
	pub fn form_pairs(&self) -> Result<Vec<(String, String)>> {
		serde_urlencoded::from_bytes(&self.body)
			.map_err(|e| Error::Validation(format!("Malformed form body: {}", e)))
	}

	/// Set a path parameter (used by the router for `{name}` captures)
	pub fn set_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(name.into(), value.into());
	}

	pub fn path_param(&self, name: &str) -> Option<&str> {
		self.path_params.get(name).map(String::as_str)
	}

	/// Parse a path parameter, treating absence or a parse failure as not found.
	pub fn parse_path_param<T: std::str::FromStr>(&self, name: &str) -> Result<T> {
		self.path_param(name)
			.and_then(|raw| raw.parse().ok())
			.ok_or_else(|| Error::NotFound(format!("No match for path parameter '{}'", name)))
	}
}

#[cfg(test)]
mod tests {
	use crate::Request;
	use hyper::Method;
	use rstest::rstest;

	#[rstest]
	fn test_repeated_keys_are_preserved() {
		// Arrange
		let request = Request::builder()
			.uri("/search/general/?method_types=1&method_types=3&media_name=all")
			.build()
			.unwrap();

		// Act
		let values = request.query_values("method_types");

		// Assert
		assert_eq!(values, vec!["1", "3"]);
		assert_eq!(request.query_pairs().len(), 3);
	}

	#[rstest]
	fn test_query_string_without_keeps_order() {
		// Arrange
		let request = Request::builder()
			.uri("/search/general/?page=2&media_name=WATER&method_types=1&method_types=2")
			.build()
			.unwrap();

		// Act
		let query = request.query_string_without(&["page"]);

		// Assert
		assert_eq!(query, "media_name=WATER&method_types=1&method_types=2");
	}

	#[rstest]
	fn test_full_path_includes_query() {
		let request = Request::builder()
			.uri("/search/keyword/?keywords=nitrate")
			.build()
			.unwrap();

		assert_eq!(request.full_path(), "/search/keyword/?keywords=nitrate");
	}

	#[rstest]
	fn test_form_pairs_decodes_body() {
		// Arrange
		let request = Request::builder()
			.method(Method::POST)
			.uri("/statistics/sources/add/")
			.body("title=Trend+analysis&author=R%26D")
			.build()
			.unwrap();

		// Act
		let pairs = request.form_pairs().unwrap();

		// Assert
		assert_eq!(
			pairs,
			vec![
				("title".to_string(), "Trend analysis".to_string()),
				("author".to_string(), "R&D".to_string()),
			]
		);
	}

	#[rstest]
	#[case(Some("42"), Some(42))]
	#[case(Some("abc"), None)]
	#[case(None, None)]
	fn test_parse_path_param(#[case] raw: Option<&str>, #[case] expected: Option<i64>) {
		// Arrange
		let mut request = Request::builder().uri("/methods/").build().unwrap();
		if let Some(raw) = raw {
			request.set_path_param("method_id", raw);
		}

		// Act
		let parsed = request.parse_path_param::<i64>("method_id").ok();

		// Assert
		assert_eq!(parsed, expected);
	}
}

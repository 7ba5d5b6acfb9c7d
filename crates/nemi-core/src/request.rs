//! HTTP request representation.

mod params;

use crate::exception::{Error, Result};
use bytes::Bytes;
use hyper::{HeaderMap, Method, Uri};
use std::collections::HashMap;
use std::net::SocketAddr;

/// The actor a request was authenticated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
	pub username: String,
}

impl AuthenticatedUser {
	pub fn new(username: impl Into<String>) -> Self {
		Self {
			username: username.into(),
		}
	}
}

/// HTTP request as seen by views.
///
/// Query parameters are kept as ordered pairs so repeated keys (multi-select
/// form fields) survive parsing.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub path_params: HashMap<String, String>,
	pub remote_addr: Option<SocketAddr>,
	query_pairs: Vec<(String, String)>,
	user: Option<AuthenticatedUser>,
}

impl Request {
	/// Create a request from its parts, parsing the query string eagerly.
	pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
		let query_pairs = Self::parse_query_pairs(&uri);
		Self {
			method,
			uri,
			headers,
			body,
			path_params: HashMap::new(),
			remote_addr: None,
			query_pairs,
			user: None,
		}
	}

	/// Start building a request.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_core::{Method, Request};
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/search/general/?media_name=WATER")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/search/general/");
	/// assert_eq!(request.query_param("media_name"), Some("WATER"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// The authenticated user, if an authentication layer set one.
	pub fn user(&self) -> Option<&AuthenticatedUser> {
		self.user.as_ref()
	}

	pub fn set_user(&mut self, user: AuthenticatedUser) {
		self.user = Some(user);
	}
}

/// Builder for [`Request`].
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<String>,
	headers: HeaderMap,
	body: Bytes,
	remote_addr: Option<SocketAddr>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	/// Add a header. Invalid names or values are ignored.
	pub fn header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = hyper::header::HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = hyper::header::HeaderValue::from_str(value)
		{
			self.headers.append(header_name, header_value);
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	pub fn build(self) -> Result<Request> {
		let raw_uri = self.uri.unwrap_or_else(|| "/".to_string());
		let uri: Uri = raw_uri
			.parse()
			.map_err(|e| Error::Validation(format!("Invalid URI '{}': {}", raw_uri, e)))?;
		let mut request = Request::new(
			self.method.unwrap_or(Method::GET),
			uri,
			self.headers,
			self.body,
		);
		request.remote_addr = self.remote_addr;
		Ok(request)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_builder_defaults_to_get_root() {
		// Act
		let request = Request::builder().build().unwrap();

		// Assert
		assert_eq!(request.method, Method::GET);
		assert_eq!(request.path(), "/");
		assert!(!request.has_query());
	}

	#[rstest]
	fn test_builder_rejects_invalid_uri() {
		// Act
		let result = Request::builder().uri("/search general/").build();

		// Assert
		assert!(matches!(result, Err(Error::Validation(_))));
	}

	#[rstest]
	fn test_user_is_attached() {
		// Arrange
		let mut request = Request::builder().uri("/admin/").build().unwrap();

		// Act
		request.set_user(AuthenticatedUser::new("curator"));

		// Assert
		assert_eq!(request.user().map(|u| u.username.as_str()), Some("curator"));
	}
}

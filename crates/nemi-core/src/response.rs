use crate::exception::Error;
use bytes::Bytes;
use hyper::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderValue, LOCATION};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;

/// HTTP Response representation
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use nemi_core::{Response, StatusCode};
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn bad_request() -> Self {
		Self::new(StatusCode::BAD_REQUEST)
	}

	pub fn unauthorized() -> Self {
		Self::new(StatusCode::UNAUTHORIZED)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn method_not_allowed() -> Self {
		Self::new(StatusCode::METHOD_NOT_ALLOWED)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// 302 redirect to `location`, the status browsers follow after a form POST.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_core::{Response, StatusCode};
	///
	/// let response = Response::found("/statistics/sources/7/");
	/// assert_eq!(response.status, StatusCode::FOUND);
	/// assert_eq!(response.headers.get("location").unwrap(), "/statistics/sources/7/");
	/// ```
	pub fn found(location: &str) -> Self {
		Self::new(StatusCode::FOUND).with_location(location)
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a custom header to the response. Invalid names or values are ignored.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = hyper::header::HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}

	pub fn with_location(mut self, location: &str) -> Self {
		if let Ok(value) = HeaderValue::from_str(location) {
			self.headers.insert(LOCATION, value);
		}
		self
	}

	pub fn with_content_type(mut self, content_type: &str) -> Self {
		if let Ok(value) = HeaderValue::from_str(content_type) {
			self.headers.insert(CONTENT_TYPE, value);
		}
		self
	}

	/// Set an HTML body with the matching content type.
	pub fn with_html(self, html: impl Into<Bytes>) -> Self {
		self.with_content_type("text/html; charset=utf-8")
			.with_body(html)
	}

	/// Set the response body to JSON and add appropriate Content-Type header
	pub fn with_json<T: Serialize>(self, data: &T) -> crate::Result<Self> {
		let body = serde_json::to_vec(data)?;
		Ok(self
			.with_content_type("application/json")
			.with_body(body))
	}

	/// Build a file download.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_core::Response;
	///
	/// let response = Response::attachment("general_search.tsv", "text/tab-separated-values", "A\tB\n");
	/// assert_eq!(
	///     response.headers.get("content-disposition").unwrap(),
	///     "attachment; filename=general_search.tsv"
	/// );
	/// assert_eq!(response.headers.get("content-type").unwrap(), "text/tab-separated-values");
	/// ```
	pub fn attachment(filename: &str, content_type: &str, body: impl Into<Bytes>) -> Self {
		let mut response = Self::ok().with_content_type(content_type).with_body(body);
		if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename={}", filename)) {
			response.headers.insert(CONTENT_DISPOSITION, value);
		}
		response
	}

	/// Body as UTF-8 text, lossily decoded.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

impl From<Error> for Response {
	fn from(error: Error) -> Self {
		let status =
			StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let message = if error.is_client_error() {
			error.to_string()
		} else {
			tracing::error!(error = %error, "request failed");
			status
				.canonical_reason()
				.unwrap_or("Internal Server Error")
				.to_string()
		};

		Response::new(status)
			.with_content_type("text/plain; charset=utf-8")
			.with_body(message)
	}
}

//! Path routing with `{name}` captures
//!
//! Patterns match segment by segment; a trailing slash on either side is
//! optional. Routes are tried in registration order and the first match wins.

use async_trait::async_trait;
use nemi_core::{Error, Handler, Method, Request, Response, Result};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param(String),
}

fn split(path: &str) -> impl Iterator<Item = &str> {
	path.trim_matches('/').split('/').filter(|s| !s.is_empty())
}

fn compile(pattern: &str) -> Vec<Segment> {
	split(pattern)
		.map(|segment| {
			match segment
				.strip_prefix('{')
				.and_then(|rest| rest.strip_suffix('}'))
			{
				Some(name) => Segment::Param(name.to_string()),
				None => Segment::Literal(segment.to_string()),
			}
		})
		.collect()
}

/// A path pattern bound to a handler.
pub struct Route {
	pub path: String,
	pub handler: Arc<dyn Handler>,
	pub name: Option<String>,
	methods: Vec<Method>,
	segments: Vec<Segment>,
}

impl Route {
	/// A GET route.
	pub fn new(path: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
		let path = path.into();
		let segments = compile(&path);
		Self {
			path,
			handler,
			name: None,
			methods: vec![Method::GET],
			segments,
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn with_methods(mut self, methods: &[Method]) -> Self {
		self.methods = methods.to_vec();
		self
	}

	pub fn allows(&self, method: &Method) -> bool {
		self.methods.contains(method) || (*method == Method::HEAD && self.methods.contains(&Method::GET))
	}

	/// Captured parameters when `path` matches this pattern.
	pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
		let parts: Vec<&str> = split(path).collect();
		if parts.len() != self.segments.len() {
			return None;
		}
		let mut params = HashMap::new();
		for (segment, part) in self.segments.iter().zip(parts) {
			match segment {
				Segment::Literal(literal) if literal == part => {}
				Segment::Literal(_) => return None,
				Segment::Param(name) => {
					params.insert(name.clone(), part.to_string());
				}
			}
		}
		Some(params)
	}
}

/// Dispatches requests to the first matching [`Route`].
///
/// An unknown path is a 404; a known path with no route accepting the
/// method is a 405 listing the allowed methods.
#[derive(Default)]
pub struct Router {
	routes: Vec<Route>,
}

impl Router {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn route(mut self, route: Route) -> Self {
		self.routes.push(route);
		self
	}

	pub fn routes(&self) -> &[Route] {
		&self.routes
	}

	/// Path of the route called `name`, with `params` substituted.
	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
		let route = self
			.routes
			.iter()
			.find(|route| route.name.as_deref() == Some(name))?;
		let mut path = route.path.clone();
		for (key, value) in params {
			path = path.replace(&format!("{{{}}}", key), value);
		}
		Some(path)
	}
}

#[async_trait]
impl Handler for Router {
	async fn handle(&self, mut request: Request) -> Result<Response> {
		let mut allowed: Vec<Method> = Vec::new();
		for route in &self.routes {
			let Some(params) = route.matches(request.path()) else {
				continue;
			};
			if !route.allows(&request.method) {
				allowed.extend(route.methods.iter().cloned());
				continue;
			}
			tracing::debug!(path = %request.path(), route = %route.path, "route matched");
			for (name, value) in params {
				request.set_path_param(name, value);
			}
			return route.handler.handle(request).await;
		}

		if allowed.is_empty() {
			return Err(Error::NotFound(format!("No route for {}", request.path())));
		}
		allowed.dedup();
		let allow = allowed
			.iter()
			.map(Method::as_str)
			.collect::<Vec<_>>()
			.join(", ");
		Ok(Response::method_not_allowed()
			.with_header("Allow", &allow)
			.with_body(format!("Method {} not allowed", request.method)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	struct Echo(&'static str);

	#[async_trait]
	impl Handler for Echo {
		async fn handle(&self, request: Request) -> Result<Response> {
			let mut params: Vec<String> = request
				.path_params
				.iter()
				.map(|(k, v)| format!("{}={}", k, v))
				.collect();
			params.sort();
			Ok(Response::ok().with_body(format!("{} {}", self.0, params.join(","))))
		}
	}

	#[fixture]
	fn router() -> Router {
		Router::new()
			.route(Route::new("/", Arc::new(Echo("home"))).with_name("home"))
			.route(Route::new("/methods/stream_physical/{pk}/", Arc::new(Echo("stream"))))
			.route(Route::new("/methods/{method_id}/", Arc::new(Echo("summary"))).with_name("summary"))
			.route(Route::new("/methods/{method_id}/analytes.tsv", Arc::new(Echo("tsv"))))
			.route(
				Route::new("/statistics/sources/add/", Arc::new(Echo("add")))
					.with_methods(&[Method::GET, Method::POST]),
			)
	}

	async fn call(router: &Router, method: Method, uri: &str) -> Result<Response> {
		let request = Request::builder().method(method).uri(uri).build().unwrap();
		router.handle(request).await
	}

	#[rstest]
	#[case("/", "home ")]
	#[case("/methods/12/", "summary method_id=12")]
	#[case("/methods/12", "summary method_id=12")]
	#[case("/methods/12/analytes.tsv", "tsv method_id=12")]
	#[case("/methods/stream_physical/4/", "stream pk=4")]
	#[case("/methods/12/?page=2", "summary method_id=12")]
	#[tokio::test]
	async fn test_dispatch(router: Router, #[case] uri: &str, #[case] expected: &str) {
		// Act
		let response = call(&router, Method::GET, uri).await.unwrap();

		// Assert
		assert_eq!(response.text(), expected);
	}

	#[rstest]
	#[case("/methods/")]
	#[case("/methods/12/extra/")]
	#[case("/unknown/")]
	#[tokio::test]
	async fn test_unknown_path_is_not_found(router: Router, #[case] uri: &str) {
		// Act
		let result = call(&router, Method::GET, uri).await;

		// Assert
		assert_eq!(result.unwrap_err().status_code(), 404);
	}

	#[rstest]
	#[tokio::test]
	async fn test_wrong_method_is_not_allowed(router: Router) {
		// Act
		let response = call(&router, Method::POST, "/methods/12/").await.unwrap();

		// Assert
		assert_eq!(response.status.as_u16(), 405);
		assert_eq!(response.headers.get("allow").unwrap(), "GET");
	}

	#[rstest]
	#[tokio::test]
	async fn test_post_allowed_where_declared(router: Router) {
		// Act
		let response = call(&router, Method::POST, "/statistics/sources/add/").await.unwrap();

		// Assert
		assert_eq!(response.text(), "add ");
	}

	#[rstest]
	fn test_reverse(router: Router) {
		// Act / Assert
		assert_eq!(router.reverse("summary", &[("method_id", "7")]).as_deref(), Some("/methods/7/"));
		assert_eq!(router.reverse("home", &[]).as_deref(), Some("/"));
		assert!(router.reverse("missing", &[]).is_none());
	}
}

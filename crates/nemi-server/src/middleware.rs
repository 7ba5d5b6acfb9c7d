//! Middleware chain and request logging

use async_trait::async_trait;
use chrono::Utc;
use nemi_core::{Handler, Request, Response, Result};
use std::sync::Arc;

/// Wraps the handling of a request; `next` is the rest of the chain.
#[async_trait]
pub trait Middleware: Send + Sync {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;
}

/// A handler behind an ordered list of middleware. The first middleware added
/// sees the request first.
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			middlewares: Vec::new(),
			handler,
		}
	}

	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}
}

/// One link of the chain: `middleware` with everything after it as `next`.
struct Link {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for Link {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.middleware.process(request, self.next.clone()).await
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		let handler = self
			.middlewares
			.iter()
			.rev()
			.fold(self.handler.clone(), |next, middleware| {
				Arc::new(Link {
					middleware: middleware.clone(),
					next,
				}) as Arc<dyn Handler>
			});
		handler.handle(request).await
	}
}

/// Logs method, path, status and elapsed milliseconds of every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Middleware for LoggingMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let start = Utc::now();
		let method = request.method.to_string();
		let path = request.path().to_string();

		let result = next.handle(request).await;

		let elapsed_ms = Utc::now().signed_duration_since(start).num_milliseconds();
		match &result {
			Ok(response) => tracing::info!(
				method = %method,
				path = %path,
				status = response.status.as_u16(),
				elapsed_ms,
				"request"
			),
			Err(err) => tracing::info!(
				method = %method,
				path = %path,
				status = err.status_code(),
				elapsed_ms,
				error = %err,
				"request failed"
			),
		}
		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use nemi_core::Error;
	use rstest::rstest;
	use std::sync::Mutex;

	struct Recorder {
		name: &'static str,
		log: Arc<Mutex<Vec<&'static str>>>,
	}

	#[async_trait]
	impl Middleware for Recorder {
		async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
			self.log.lock().unwrap().push(self.name);
			next.handle(request).await
		}
	}

	struct Ok200;

	#[async_trait]
	impl Handler for Ok200 {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Ok(Response::ok().with_body("done"))
		}
	}

	struct Fails;

	#[async_trait]
	impl Handler for Fails {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Err(Error::NotFound("nothing here".into()))
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_chain_runs_in_insertion_order() {
		// Arrange
		let log = Arc::new(Mutex::new(Vec::new()));
		let chain = MiddlewareChain::new(Arc::new(Ok200))
			.with_middleware(Arc::new(Recorder {
				name: "outer",
				log: log.clone(),
			}))
			.with_middleware(Arc::new(Recorder {
				name: "inner",
				log: log.clone(),
			}));
		let request = Request::builder().uri("/").build().unwrap();

		// Act
		let response = chain.handle(request).await.unwrap();

		// Assert
		assert_eq!(response.text(), "done");
		assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_logging_passes_errors_through() {
		// Arrange
		let chain = MiddlewareChain::new(Arc::new(Fails)).with_middleware(Arc::new(LoggingMiddleware));
		let request = Request::builder().uri("/missing/").build().unwrap();

		// Act
		let result = chain.handle(request).await;

		// Assert
		assert_eq!(result.unwrap_err().status_code(), 404);
	}
}

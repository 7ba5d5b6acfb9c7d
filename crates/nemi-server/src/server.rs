//! hyper HTTP/1 server

use crate::middleware::{Middleware, MiddlewareChain};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use nemi_core::{Handler, Request, Response, StatusCode};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

/// How long open connections get to finish after a shutdown signal.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Pause after a failed accept before trying again.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Largest request body read into memory, in bytes.
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("Failed to bind {addr}: {source}")]
	Bind {
		addr: SocketAddr,
		source: std::io::Error,
	},
}

pub type ServerResult<T> = Result<T, ServerError>;

/// A source of client connections.
#[async_trait]
pub trait Listener: Send + Sync {
	type Io: AsyncRead + AsyncWrite + Unpin + Send + 'static;

	async fn accept(&self) -> std::io::Result<(Self::Io, SocketAddr)>;
}

#[async_trait]
impl Listener for TcpListener {
	type Io = TcpStream;

	async fn accept(&self) -> std::io::Result<(TcpStream, SocketAddr)> {
		TcpListener::accept(self).await
	}
}

pub struct HttpServer {
	handler: Arc<dyn Handler>,
	middlewares: Vec<Arc<dyn Middleware>>,
	max_body_size: usize,
}

impl HttpServer {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			middlewares: Vec::new(),
			max_body_size: DEFAULT_MAX_BODY_SIZE,
		}
	}

	/// Requests with a larger body are answered with 413.
	pub fn with_max_body_size(mut self, bytes: usize) -> Self {
		self.max_body_size = bytes;
		self
	}

	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	fn build_handler(&self) -> Arc<dyn Handler> {
		if self.middlewares.is_empty() {
			return self.handler.clone();
		}
		let chain = self
			.middlewares
			.iter()
			.fold(MiddlewareChain::new(self.handler.clone()), |chain, m| {
				chain.with_middleware(m.clone())
			});
		Arc::new(chain)
	}

	/// Serve until Ctrl-C.
	pub async fn listen(self, addr: SocketAddr) -> ServerResult<()> {
		self.listen_with_shutdown(addr, async {
			if let Err(err) = tokio::signal::ctrl_c().await {
				tracing::error!(error = %err, "failed to listen for Ctrl-C");
			}
		})
		.await
	}

	/// Serve until `shutdown` resolves, then drain open connections.
	pub async fn listen_with_shutdown(
		self,
		addr: SocketAddr,
		shutdown: impl Future<Output = ()>,
	) -> ServerResult<()> {
		let listener = TcpListener::bind(addr)
			.await
			.map_err(|source| ServerError::Bind { addr, source })?;
		tracing::info!(addr = %addr, "server listening");
		self.serve(listener, shutdown).await
	}

	/// Serve on an already bound listener. A failed accept is logged and
	/// retried after [`ACCEPT_BACKOFF`].
	pub async fn serve<L: Listener>(
		self,
		listener: L,
		shutdown: impl Future<Output = ()>,
	) -> ServerResult<()> {
		let handler = self.build_handler();
		let graceful = GracefulShutdown::new();
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, remote_addr) = match result {
						Ok(accepted) => accepted,
						Err(err) => {
							tracing::warn!(error = %err, "failed to accept connection");
							tokio::time::sleep(ACCEPT_BACKOFF).await;
							continue;
						}
					};
					let service = RequestService {
						handler: handler.clone(),
						remote_addr,
						max_body_size: self.max_body_size,
					};
					let connection = http1::Builder::new()
						.serve_connection(TokioIo::new(stream), service);
					let connection = graceful.watch(connection);
					tokio::spawn(async move {
						if let Err(err) = connection.await {
							tracing::debug!(remote_addr = %remote_addr, error = %err, "connection error");
						}
					});
				}
				_ = &mut shutdown => {
					tracing::info!("shutdown signal received, stopping server");
					break;
				}
			}
		}

		tokio::select! {
			_ = graceful.shutdown() => tracing::info!("all connections closed"),
			_ = tokio::time::sleep(SHUTDOWN_GRACE) => {
				tracing::warn!("timed out waiting for connections to close");
			}
		}
		Ok(())
	}
}

/// Adapts a [`Handler`] to hyper's `Service`.
struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
	max_body_size: usize,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;
		let max_body_size = self.max_body_size;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			let body = match Limited::new(body, max_body_size).collect().await {
				Ok(collected) => collected.to_bytes(),
				Err(err) if err.is::<LengthLimitError>() => {
					tracing::warn!(
						remote_addr = %remote_addr,
						path = %parts.uri.path(),
						limit = max_body_size,
						"request body too large"
					);
					return into_hyper(
						Response::new(StatusCode::PAYLOAD_TOO_LARGE).with_body("Request body too large"),
					);
				}
				Err(err) => return Err(err),
			};

			let mut request = Request::new(parts.method, parts.uri, parts.headers, body);
			request.remote_addr = Some(remote_addr);

			let response = handler
				.handle(request)
				.await
				.unwrap_or_else(Response::from);
			into_hyper(response)
		})
	}
}

fn into_hyper(
	response: Response,
) -> Result<hyper::Response<Full<Bytes>>, Box<dyn std::error::Error + Send + Sync>> {
	let mut builder = hyper::Response::builder().status(response.status);
	for (key, value) in response.headers.iter() {
		builder = builder.header(key, value);
	}
	Ok(builder.body(Full::new(response.body))?)
}

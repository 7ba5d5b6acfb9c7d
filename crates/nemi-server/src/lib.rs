//! Serving NEMI web
//!
//! [`urls::url_patterns`] builds the [`router::Router`] over every view,
//! wrapping the write endpoints in [`auth::LoginRequired`].
//! [`server::HttpServer`] runs it on hyper behind the middleware chain.

pub mod auth;
pub mod middleware;
pub mod router;
pub mod server;
pub mod urls;

pub use auth::{AuthBackend, BasicAuthBackend, LoginRequired, hash_password};
pub use middleware::{LoggingMiddleware, Middleware, MiddlewareChain};
pub use router::{Route, Router};
pub use server::{DEFAULT_MAX_BODY_SIZE, HttpServer, Listener, ServerError, ServerResult};
pub use urls::{AppState, application, url_patterns};

//! Core types shared by every NEMI web crate.
//!
//! - [`exception`]: the application error taxonomy and its HTTP status mapping
//! - [`request`] and [`response`]: the request/response pair handlers operate on
//! - [`handler`]: the async `Handler` trait implemented by every view
//! - [`pagination`]: list pagination with last-page clamping
//! - [`template`]: the tera-backed template engine

pub mod exception;
pub mod handler;
pub mod pagination;
pub mod request;
pub mod response;
pub mod template;

pub use exception::{Error, Result};
pub use handler::Handler;
pub use pagination::{Page, PageError, Paginator};
pub use request::{AuthenticatedUser, Request, RequestBuilder};
pub use response::Response;
pub use template::{TemplateContext, TemplateEngine};

// Re-exported so downstream crates share one version of the HTTP types.
pub use hyper::{HeaderMap, Method, StatusCode, Uri};

//! # NEMI web
//!
//! Search and export web application for the National Environmental Methods
//! Index.
//!
//! The member crates are re-exported under short names:
//!
//! - [`core`]: errors, request/response, `Handler`, pagination, templates
//! - [`forms`]: form fields and validation
//! - [`db`]: the SQLite store, query builder and full-text search
//! - [`conf`]: layered settings and logging
//! - [`search`]: search pages, exports, summaries and statistical sources
//! - [`admin`]: the news admin and home page
//! - [`server`]: routing, authentication and the HTTP server
//!
//! [`commands`] implements the `nemi` management binary.

pub mod commands;

pub use nemi_admin as admin;
pub use nemi_conf as conf;
pub use nemi_core as core;
pub use nemi_db as db;
pub use nemi_forms as forms;
pub use nemi_search as search;
pub use nemi_server as server;

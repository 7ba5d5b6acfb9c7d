//! Database layer for NEMI web
//!
//! The method and analyte views are owned by an external store and read
//! through an explicit [`QuerySet`] builder: filters accumulate as predicate
//! objects and the set executes once as a single parameterised statement.
//! Rows come back as ordered column-name maps ([`Record`]) so pages can select
//! arbitrary column lists without declaring a struct per view.
//!
//! ```no_run
//! use nemi_db::{Database, Filter, QuerySet};
//!
//! # async fn example() -> nemi_db::DatabaseResult<()> {
//! let db = Database::connect("sqlite://nemi.db").await?;
//! let rows = QuerySet::new("method_vw")
//!     .filter(Filter::eq("media_name", "WATER"))
//!     .values(&["method_id", "source_method_identifier"])
//!     .distinct()
//!     .order_by(&["source_method_identifier"])
//!     .fetch(&db)
//!     .await?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod fulltext;
pub mod query;
pub mod record;

pub use connection::{Database, SCHEMA};
pub use error::{DatabaseError, DatabaseResult};
pub use fulltext::{FullTextSearch, Fts5Search, fts5_query};
pub use query::{Filter, FilterCondition, FilterOperator, FilterValue, QuerySet};
pub use record::Record;

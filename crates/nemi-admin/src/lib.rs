//! News administration and the home page
//!
//! [`model_admin::ModelAdmin`] describes one administered table; the generic
//! views in [`views`] list, add and change its rows. [`news::NewsItemAdmin`]
//! is the only registered admin.

pub mod home;
pub mod model_admin;
pub mod news;
pub mod views;

pub use home::HomeView;
pub use model_admin::ModelAdmin;
pub use news::{NewsItem, NewsItemAdmin};
pub use views::{AdminAddView, AdminChangeView, AdminListView};

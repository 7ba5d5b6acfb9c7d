//! Management commands behind the `nemi` binary

use anyhow::{Context, bail};
use nemi_conf::Settings;
use nemi_core::TemplateEngine;
use nemi_db::Database;
use nemi_server::{AppState, application};
use std::net::SocketAddr;

/// Templates the route table renders.
pub const REQUIRED_TEMPLATES: &[&str] = &[
	"home.html",
	"general_search.html",
	"analyte_search.html",
	"find_analyte.html",
	"microbiological_search.html",
	"biological_search.html",
	"toxicity_search.html",
	"physical_search.html",
	"stream_physical_search.html",
	"keyword_search.html",
	"statistic_search.html",
	"method_summary.html",
	"biological_method_summary.html",
	"toxicity_method_summary.html",
	"stream_physical_method_summary.html",
	"create_statistic_source.html",
	"update_statistic_source.html",
	"statistical_source_detail.html",
	"statistical_source_summary.html",
	"admin/change_list.html",
	"admin/change_form.html",
];

/// Serve the application until Ctrl-C.
pub async fn runserver(settings: Settings, addr: Option<String>) -> anyhow::Result<()> {
	let addr: SocketAddr = addr
		.as_deref()
		.unwrap_or(&settings.bind_address)
		.parse()
		.context("Invalid bind address")?;
	let state = AppState::from_settings(settings)
		.await
		.context("Failed to build application state")?;
	let db = state.db.clone();
	application(&state).listen(addr).await?;
	db.close().await;
	Ok(())
}

/// Apply the bundled schema to the configured database.
pub async fn migrate(settings: &Settings) -> anyhow::Result<()> {
	let db = Database::connect(&settings.database_url)
		.await
		.with_context(|| format!("Failed to connect to {}", settings.database_url))?;
	db.apply_schema().await.context("Failed to apply schema")?;
	tracing::info!(database_url = %settings.database_url, "schema applied");
	db.close().await;
	Ok(())
}

/// Required templates `engine` does not have.
pub fn missing_templates(engine: &TemplateEngine) -> Vec<&'static str> {
	REQUIRED_TEMPLATES
		.iter()
		.copied()
		.filter(|name| !engine.has_template(name))
		.collect()
}

/// Connect to the database and compile the templates.
pub async fn check(settings: &Settings) -> anyhow::Result<()> {
	let engine = TemplateEngine::from_dir(&settings.template_dir).with_context(|| {
		format!("Failed to load templates from {}", settings.template_dir.display())
	})?;
	let missing = missing_templates(&engine);
	if !missing.is_empty() {
		bail!("Missing templates: {}", missing.join(", "));
	}

	let db = Database::connect(&settings.database_url)
		.await
		.with_context(|| format!("Failed to connect to {}", settings.database_url))?;
	db.fetch_all("SELECT 1", &[])
		.await
		.context("Database is not reachable")?;
	db.close().await;

	if settings.auth_users.is_empty() {
		tracing::warn!("no users configured; protected pages will reject every request");
	}
	Ok(())
}

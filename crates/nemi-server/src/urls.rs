//! URL configuration: every view and the paths it is served at

use crate::auth::{AuthBackend, BasicAuthBackend, LoginRequired};
use crate::middleware::LoggingMiddleware;
use crate::router::{Route, Router};
use crate::server::HttpServer;
use nemi_admin::{AdminAddView, AdminChangeView, AdminListView, HomeView, ModelAdmin, NewsItemAdmin};
use nemi_conf::Settings;
use nemi_core::{Handler, Method, Result, TemplateEngine};
use nemi_db::{Database, Fts5Search};
use nemi_search::citations::{
	AddStatisticalSourceView, StatisticalSourceView, UpdateStatisticalSourceView,
};
use nemi_search::keyword::KeywordSearchView;
use nemi_search::pages::analyte_select::AnalyteSelectView;
use nemi_search::pages::stream_physical::StreamPhysicalSearchView;
use nemi_search::pages::{analyte, biological, general, microbiological, physical, statistic, toxicity};
use nemi_search::summary::{
	AnalyteExportView, MethodSummaryView, StreamPhysicalSummaryView, SummaryKind,
};
use nemi_search::{ExportView, ResponseRenderer, SearchPage, SearchResultView, TemplateRenderer};
use std::sync::Arc;

/// Shared, immutable state the views are built from.
#[derive(Clone)]
pub struct AppState {
	pub settings: Arc<Settings>,
	pub db: Database,
	pub renderer: Arc<dyn ResponseRenderer>,
	pub auth: Arc<dyn AuthBackend>,
}

impl AppState {
	pub fn new(settings: Settings, db: Database, renderer: Arc<dyn ResponseRenderer>) -> Self {
		let auth = Arc::new(BasicAuthBackend::new(settings.auth_users.clone()));
		Self {
			settings: Arc::new(settings),
			db,
			renderer,
			auth,
		}
	}

	pub fn with_auth(mut self, auth: Arc<dyn AuthBackend>) -> Self {
		self.auth = auth;
		self
	}

	/// Connect to the configured database and load the template directory.
	pub async fn from_settings(settings: Settings) -> Result<Self> {
		let engine = TemplateEngine::from_dir(&settings.template_dir)?;
		let db = Database::connect(&settings.database_url).await?;
		tracing::info!(
			database_url = %settings.database_url,
			template_dir = %settings.template_dir.display(),
			"application state ready"
		);
		Ok(Self::new(
			settings,
			db,
			Arc::new(TemplateRenderer::new(Arc::new(engine))),
		))
	}

	fn login_required(&self, handler: impl Handler + 'static) -> Arc<dyn Handler> {
		Arc::new(
			LoginRequired::new(Arc::new(handler), self.auth.clone())
				.with_realm(self.settings.auth_realm.clone()),
		)
	}
}

const GET_POST: &[Method] = &[Method::GET, Method::POST];

fn search_routes(router: Router, prefix: &str, page: SearchPage) -> Router {
	let page = Arc::new(page);
	let name = prefix.trim_matches('/').replace('/', "_");
	let has_export = page.export.is_some();
	let router = router.route(
		Route::new(prefix, Arc::new(SearchResultView::new(page.clone()))).with_name(name.clone()),
	);
	if has_export {
		router.route(
			Route::new(format!("{}export/{{format}}/", prefix), Arc::new(ExportView::new(page)))
				.with_name(format!("{}_export", name)),
		)
	} else {
		router
	}
}

/// The application's route table.
pub fn url_patterns(state: &AppState) -> Router {
	let db = || state.db.clone();
	let renderer = || state.renderer.clone();

	let mut router = Router::new().route(
		Route::new(
			"/",
			Arc::new(HomeView::new(db(), renderer()).with_news_count(state.settings.news_on_home as usize)),
		)
		.with_name("home"),
	);

	router = search_routes(router, "/search/general/", general::page(db(), renderer()));
	router = router.route(
		Route::new(
			"/search/analyte/select/",
			Arc::new(AnalyteSelectView::new(db(), renderer())),
		)
		.with_name("analyte_select"),
	);
	router = search_routes(router, "/search/analyte/", analyte::page(db(), renderer()));
	router = search_routes(
		router,
		"/search/microbiological/",
		microbiological::page(db(), renderer()),
	);
	router = search_routes(router, "/search/biological/", biological::page(db(), renderer()));
	router = search_routes(router, "/search/toxicity/", toxicity::page(db(), renderer()));
	router = search_routes(router, "/search/physical/", physical::page(db(), renderer()));
	router = search_routes(router, "/search/statistics/", statistic::page(db(), renderer()));

	router = router
		.route(
			Route::new(
				"/search/stream_physical/",
				Arc::new(StreamPhysicalSearchView::new(db(), renderer())),
			)
			.with_name("search_stream_physical"),
		)
		.route(
			Route::new(
				"/search/keyword/",
				Arc::new(
					KeywordSearchView::new(db(), Arc::new(Fts5Search), renderer())
						.with_page_size(state.settings.keyword_page_size),
				),
			)
			.with_name("search_keyword"),
		);

	router = router
		.route(
			Route::new(
				"/methods/stream_physical/{pk}/",
				Arc::new(StreamPhysicalSummaryView::new(db(), renderer())),
			)
			.with_name("stream_physical_summary"),
		)
		.route(
			Route::new(
				"/methods/{method_id}/",
				Arc::new(MethodSummaryView::new(db(), renderer(), SummaryKind::Standard)),
			)
			.with_name("method_summary"),
		)
		.route(
			Route::new(
				"/methods/{method_id}/biological/",
				Arc::new(MethodSummaryView::new(db(), renderer(), SummaryKind::Biological)),
			)
			.with_name("biological_method_summary"),
		)
		.route(
			Route::new(
				"/methods/{method_id}/toxicity/",
				Arc::new(MethodSummaryView::new(db(), renderer(), SummaryKind::Toxicity)),
			)
			.with_name("toxicity_method_summary"),
		)
		.route(
			Route::new(
				"/methods/{method_id}/analytes.tsv",
				Arc::new(AnalyteExportView::new(db())),
			)
			.with_name("analyte_export"),
		);

	router = router
		.route(
			Route::new(
				"/statistics/sources/add/",
				state.login_required(AddStatisticalSourceView::new(db(), renderer())),
			)
			.with_methods(GET_POST)
			.with_name("add_statistical_source"),
		)
		.route(
			Route::new(
				"/statistics/sources/{pk}/",
				Arc::new(StatisticalSourceView::detail(db(), renderer())),
			)
			.with_name("statistical_source_detail"),
		)
		.route(
			Route::new(
				"/statistics/sources/{pk}/summary/",
				Arc::new(StatisticalSourceView::summary(db(), renderer())),
			)
			.with_name("statistical_source_summary"),
		)
		.route(
			Route::new(
				"/statistics/sources/{pk}/edit/",
				state.login_required(UpdateStatisticalSourceView::new(db(), renderer())),
			)
			.with_methods(GET_POST)
			.with_name("update_statistical_source"),
		);

	let news: Arc<dyn ModelAdmin> = Arc::new(NewsItemAdmin);
	router
		.route(
			Route::new(
				news.changelist_url(),
				state.login_required(AdminListView::new(db(), news.clone(), renderer())),
			)
			.with_name("admin_newsitem_changelist"),
		)
		.route(
			Route::new(
				news.add_url(),
				state.login_required(AdminAddView::new(db(), news.clone(), renderer())),
			)
			.with_methods(GET_POST)
			.with_name("admin_newsitem_add"),
		)
		.route(
			Route::new(
				format!("{}{{id}}/change/", news.changelist_url()),
				state.login_required(AdminChangeView::new(db(), news, renderer())),
			)
			.with_methods(GET_POST)
			.with_name("admin_newsitem_change"),
		)
}

/// The routed application behind request logging.
pub fn application(state: &AppState) -> HttpServer {
	HttpServer::new(Arc::new(url_patterns(state))).with_middleware(Arc::new(LoggingMiddleware::new()))
}

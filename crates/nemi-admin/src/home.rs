//! Home page with the latest news

use crate::news::latest;
use async_trait::async_trait;
use nemi_core::{Handler, Request, Response, Result, TemplateContext};
use nemi_db::Database;
use nemi_search::ResponseRenderer;
use std::sync::Arc;

pub const TEMPLATE: &str = "home.html";

pub const DEFAULT_NEWS_COUNT: usize = 5;

pub struct HomeView {
	db: Database,
	renderer: Arc<dyn ResponseRenderer>,
	news_count: usize,
}

impl HomeView {
	pub fn new(db: Database, renderer: Arc<dyn ResponseRenderer>) -> Self {
		Self {
			db,
			renderer,
			news_count: DEFAULT_NEWS_COUNT,
		}
	}

	pub fn with_news_count(mut self, news_count: usize) -> Self {
		self.news_count = news_count;
		self
	}
}

#[async_trait]
impl Handler for HomeView {
	async fn handle(&self, _request: Request) -> Result<Response> {
		let news = latest(&self.db, self.news_count).await?;
		let mut context = TemplateContext::new();
		context.insert("news".into(), serde_json::to_value(&news)?);
		self.renderer.render(TEMPLATE, &context)
	}
}

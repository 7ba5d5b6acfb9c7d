//! Rendering seam between views and templates

use nemi_core::{Response, Result, TemplateContext, TemplateEngine};
use serde_json::{Value, json};
use std::sync::Arc;

/// Turns a template name and context into a response.
pub trait ResponseRenderer: Send + Sync {
	fn render(&self, template: &str, context: &TemplateContext) -> Result<Response>;
}

/// Renders HTML with the shared tera templates.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
	engine: Arc<TemplateEngine>,
}

impl TemplateRenderer {
	pub fn new(engine: Arc<TemplateEngine>) -> Self {
		Self { engine }
	}
}

impl ResponseRenderer for TemplateRenderer {
	fn render(&self, template: &str, context: &TemplateContext) -> Result<Response> {
		let html = self.engine.render(template, context)?;
		Ok(Response::ok().with_html(html))
	}
}

/// Returns `{"template": name, "context": {...}}` as JSON instead of HTML.
/// Lets tests assert on the exact context a view built.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ResponseRenderer for JsonRenderer {
	fn render(&self, template: &str, context: &TemplateContext) -> Result<Response> {
		Response::ok().with_json(&json!({
			"template": template,
			"context": Value::Object(context.clone()),
		}))
	}
}

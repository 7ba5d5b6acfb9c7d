//! Template rendering backed by tera.

use crate::exception::{Error, Result};
use std::path::Path;
use tera::{Context, Tera};

/// Context handed to templates: a JSON object keyed by variable name.
pub type TemplateContext = serde_json::Map<String, serde_json::Value>;

/// Loaded, compiled templates.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
	tera: Tera,
}

impl TemplateEngine {
	/// Load every `*.html` template below `dir`.
	pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
		let dir = dir.as_ref();
		let pattern = format!("{}/**/*.html", dir.display());
		let tera = Tera::new(&pattern)?;
		tracing::debug!(
			dir = %dir.display(),
			templates = tera.get_template_names().count(),
			"loaded templates"
		);
		Ok(Self { tera })
	}

	/// Build an engine from in-memory `(name, source)` pairs.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_core::{TemplateContext, TemplateEngine};
	///
	/// let engine = TemplateEngine::from_raw(vec![("hello.html", "Hello {{ name }}")]).unwrap();
	/// let mut context = TemplateContext::new();
	/// context.insert("name".into(), "water".into());
	/// assert_eq!(engine.render("hello.html", &context).unwrap(), "Hello water");
	/// ```
	pub fn from_raw<'a>(templates: Vec<(&'a str, &'a str)>) -> Result<Self> {
		let mut tera = Tera::default();
		tera.add_raw_templates(templates)?;
		Ok(Self { tera })
	}

	pub fn has_template(&self, name: &str) -> bool {
		self.tera.get_template_names().any(|n| n == name)
	}

	pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
		if !self.has_template(name) {
			return Err(Error::Template(format!("Template not found: {}", name)));
		}
		let context = Context::from_value(serde_json::Value::Object(context.clone()))?;
		Ok(self.tera.render(name, &context)?)
	}
}

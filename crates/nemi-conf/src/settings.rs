//! Application settings and the builder that layers sources

use crate::sources::{ConfigSource, DefaultSource, EnvSource, SourceError, TomlFileSource};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Prefix of environment variables read by [`Settings::load`].
pub const ENV_PREFIX: &str = "NEMI_";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Failed to load {source_name}: {error}")]
	Source {
		source_name: String,
		error: SourceError,
	},
	#[error("Invalid settings: {0}")]
	Invalid(#[from] serde_json::Error),
}

/// Runtime settings for the web application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub debug: bool,
	pub bind_address: String,
	pub database_url: String,
	pub template_dir: PathBuf,
	pub log_level: String,
	pub keyword_page_size: usize,
	pub news_on_home: u64,
	pub auth_realm: String,
	/// Username to argon2 PHC password hash.
	pub auth_users: BTreeMap<String, String>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			debug: false,
			bind_address: "127.0.0.1:8000".to_string(),
			database_url: "sqlite://nemi.db?mode=rwc".to_string(),
			template_dir: PathBuf::from("templates"),
			log_level: "info".to_string(),
			keyword_page_size: 20,
			news_on_home: 5,
			auth_realm: "nemi".to_string(),
			auth_users: BTreeMap::new(),
		}
	}
}

impl Settings {
	/// Defaults, then `path` if it exists, then `NEMI_*` environment variables.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let defaults = DefaultSource::from_serializable(&Settings::default()).map_err(|error| {
			SettingsError::Source {
				source_name: "Default values".to_string(),
				error,
			}
		})?;
		SettingsBuilder::new()
			.add_source(defaults)
			.add_source(TomlFileSource::new(path.as_ref()))
			.add_source(EnvSource::new().with_prefix(ENV_PREFIX))
			.build()
	}
}

/// Merges sources in ascending priority; later keys replace earlier ones.
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// The merged key/value map before deserialization.
	pub fn merged(&self) -> Result<IndexMap<String, Value>, SettingsError> {
		let mut ordered: Vec<&Box<dyn ConfigSource>> = self.sources.iter().collect();
		ordered.sort_by_key(|source| source.priority());

		let mut merged = IndexMap::new();
		for source in ordered {
			let values = source.load().map_err(|error| SettingsError::Source {
				source_name: source.description(),
				error,
			})?;
			tracing::debug!(source = %source.description(), keys = values.len(), "loaded settings source");
			merged.extend(values);
		}
		Ok(merged)
	}

	/// Build the final settings.
	///
	/// # Examples
	///
	/// ```
	/// use nemi_conf::{DefaultSource, SettingsBuilder};
	/// use serde_json::json;
	///
	/// let settings = SettingsBuilder::new()
	///     .add_source(DefaultSource::new().with_value("keyword_page_size", json!(50)))
	///     .build()
	///     .unwrap();
	/// assert_eq!(settings.keyword_page_size, 50);
	/// assert_eq!(settings.auth_realm, "nemi");
	/// ```
	pub fn build(&self) -> Result<Settings, SettingsError> {
		let merged = self.merged()?;
		let object: serde_json::Map<String, Value> = merged.into_iter().collect();
		Ok(serde_json::from_value(Value::Object(object))?)
	}
}

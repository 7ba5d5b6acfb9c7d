//! Settings and logging for NEMI web
//!
//! Settings are merged from prioritised [`ConfigSource`]s: built-in defaults,
//! then a TOML file, then `NEMI_`-prefixed environment variables.
//!
//! ```no_run
//! use nemi_conf::Settings;
//!
//! let settings = Settings::load("nemi.toml").unwrap();
//! nemi_conf::init_logging(&settings.log_level, 0);
//! ```

pub mod logging;
pub mod settings;
pub mod sources;

pub use logging::init_logging;
pub use settings::{Settings, SettingsBuilder, SettingsError};
pub use sources::{ConfigSource, DefaultSource, EnvSource, SourceError, TomlFileSource};

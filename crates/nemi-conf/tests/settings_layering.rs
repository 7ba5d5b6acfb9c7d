//! Settings layering across defaults, TOML file and environment

use nemi_conf::Settings;
use rstest::*;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[fixture]
fn config_dir() -> TempDir {
	let dir = TempDir::new().expect("Failed to create temporary directory");
	fs::write(
		dir.path().join("nemi.toml"),
		r#"
bind_address = "0.0.0.0:9000"
log_level = "warn"
keyword_page_size = 30

[auth_users]
editor = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaA"
"#,
	)
	.expect("Failed to write nemi.toml");
	dir
}

fn clear_env() {
	for key in ["NEMI_LOG_LEVEL", "NEMI_KEYWORD_PAGE_SIZE", "NEMI_DEBUG"] {
		unsafe {
			env::remove_var(key);
		}
	}
}

#[rstest]
#[serial(nemi_env)]
fn test_file_overrides_defaults(config_dir: TempDir) {
	// Arrange
	clear_env();

	// Act
	let settings = Settings::load(config_dir.path().join("nemi.toml")).unwrap();

	// Assert
	assert_eq!(settings.bind_address, "0.0.0.0:9000");
	assert_eq!(settings.log_level, "warn");
	assert_eq!(settings.keyword_page_size, 30);
	assert_eq!(settings.database_url, "sqlite://nemi.db?mode=rwc");
	assert!(settings.auth_users.contains_key("editor"));
}

#[rstest]
#[serial(nemi_env)]
fn test_env_overrides_file(config_dir: TempDir) {
	// Arrange
	clear_env();
	unsafe {
		env::set_var("NEMI_LOG_LEVEL", "debug");
		env::set_var("NEMI_KEYWORD_PAGE_SIZE", "5");
		env::set_var("NEMI_DEBUG", "true");
	}

	// Act
	let settings = Settings::load(config_dir.path().join("nemi.toml"));
	clear_env();
	let settings = settings.unwrap();

	// Assert
	assert_eq!(settings.log_level, "debug");
	assert_eq!(settings.keyword_page_size, 5);
	assert!(settings.debug);
	assert_eq!(settings.bind_address, "0.0.0.0:9000");
}

#[rstest]
#[serial(nemi_env)]
fn test_missing_file_uses_defaults() {
	// Arrange
	clear_env();

	// Act
	let settings = Settings::load("/nonexistent/nemi.toml").unwrap();

	// Assert
	assert_eq!(settings, Settings::default());
}

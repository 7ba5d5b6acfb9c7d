//! Logging initialisation

use tracing_subscriber::EnvFilter;

/// Level directive for a base level raised by `-v` flags.
pub fn effective_level(level: &str, verbosity: u8) -> String {
	match verbosity {
		0 => level.to_string(),
		1 => "debug".to_string(),
		_ => "trace".to_string(),
	}
}

/// Install the global fmt subscriber. `RUST_LOG` wins over the configured
/// level. Returns `false` when a subscriber was already installed.
pub fn init_logging(level: &str, verbosity: u8) -> bool {
	let directive = effective_level(level, verbosity);
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(true)
		.try_init()
		.is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("info", 0, "info")]
	#[case("warn", 1, "debug")]
	#[case("info", 3, "trace")]
	fn test_effective_level(#[case] level: &str, #[case] verbosity: u8, #[case] expected: &str) {
		assert_eq!(effective_level(level, verbosity), expected);
	}

	#[rstest]
	fn test_repeated_initialisation_is_tolerated() {
		let _ = init_logging("info", 0);

		assert!(!init_logging("info", 0));
	}
}

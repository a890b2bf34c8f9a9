//! Tracing subscriber setup.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, writing to stderr.
///
/// `-v` flags take precedence over `RUST_LOG`; without them `RUST_LOG` is
/// honored and the default is `warn`.
pub fn init_logging(verbose: u8) -> anyhow::Result<()> {
	let filter = match verbose {
		0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
		level => EnvFilter::new(level_for(level)),
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.try_init()
		.map_err(|err| anyhow!(err))
}

fn level_for(verbose: u8) -> &'static str {
	match verbose {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_maps_to_levels() {
		assert_eq!(level_for(0), "warn");
		assert_eq!(level_for(1), "info");
		assert_eq!(level_for(2), "debug");
		assert_eq!(level_for(9), "trace");
	}
}

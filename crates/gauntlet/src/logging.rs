//! Tracing setup for the CLI.
//!
//! Log output goes to stderr; stdout is reserved for command output such
//! as `config show`. The `RUST_LOG` environment variable, when set, takes
//! precedence over everything below.

use gauntlet_core::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber from the `[logging]` config section.
///
/// `--verbose` forces debug level and `--json-logs` forces JSON lines,
/// regardless of what the config file says.
pub fn init(config: &LoggingConfig, verbose: bool, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive(config, verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs || config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Effective filter directive. The configured level string ("error" through
/// "trace") feeds the filter directly; `--verbose` wins over it.
fn directive(config: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        config.level.clone()
    }
}

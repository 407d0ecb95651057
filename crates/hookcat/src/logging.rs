//! Logging initialization.
//!
//! Logs go to stderr so they never mix with the echoed input on stdout.
//! `RUST_LOG` overrides the level chosen from the verbose flag, and
//! `HOOKCAT_LOG_FORMAT=json` switches the output to JSON lines.

use std::io;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "HOOKCAT_LOG_FORMAT";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable compact lines.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parse a format name, falling back to [`LogFormat::Compact`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }

    fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|raw| Self::parse(&raw))
            .unwrap_or_default()
    }
}

/// Default filter directive for the verbose flag.
pub fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "error"
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    let (compact_layer, json_layer) = match LogFormat::from_env() {
        LogFormat::Compact => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .compact()
                    .with_writer(io::stderr),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(io::stderr),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(compact_layer)
        .with(json_layer)
        .init();
}

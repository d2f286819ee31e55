//! `tracing` subscriber setup. Logs always go to stderr.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "IPPCODE_LOG";

pub const DEFAULT_FILTER: &str = "warn";

/// Filter from `IPPCODE_LOG`, else the config value, else `warn`.
pub fn filter(config_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| match config_level {
            Some(level) => EnvFilter::try_new(level),
            None => EnvFilter::try_new(DEFAULT_FILTER),
        })
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config_level: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(config_level))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}

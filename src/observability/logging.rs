//! Logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Env var with the highest-priority filter directive.
pub const LOG_FILTER_ENV: &str = "QUOTESYNC_LOG";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// Log file to append to; stderr when `None`.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds the config from file settings and the process environment.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        let filter = resolve_filter(
            std::env::var(LOG_FILTER_ENV).ok(),
            std::env::var("RUST_LOG").ok(),
            settings.filter.as_deref(),
            verbose,
        );

        let format = settings
            .format
            .as_deref()
            .and_then(|value| {
                let parsed = LogFormat::parse(value);
                if parsed.is_none() {
                    eprintln_unknown_format(value);
                }
                parsed
            })
            .unwrap_or_default();

        Self {
            filter,
            format,
            file: settings.file.clone(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Picks the first non-blank directive in precedence order.
pub(crate) fn resolve_filter(
    env_filter: Option<String>,
    rust_log: Option<String>,
    configured: Option<&str>,
    verbose: bool,
) -> String {
    [env_filter, rust_log, configured.map(str::to_string)]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| if verbose { "debug" } else { "info" }.to_string())
}

// Logging is not installed yet when settings are resolved.
#[allow(clippy::print_stderr)]
fn eprintln_unknown_format(value: &str) {
    eprintln!("Unknown log format '{value}', using pretty");
}

//! Configuration management.
//!
//! Configuration comes from an optional TOML file, then environment
//! overrides. Every file field is optional.

use crate::remote::DEFAULT_ENDPOINT;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "QUOTESYNC_CONFIG_PATH";

/// Main configuration for quotesync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteSyncConfig {
    /// Durable storage directory.
    pub data_dir: PathBuf,
    /// Session storage directory; `<data_dir>/session` when unset.
    pub session_dir: Option<PathBuf>,
    /// Sync settings.
    pub sync: SyncSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Sync agent and remote settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSettings {
    /// Remote list endpoint.
    pub endpoint: String,
    /// Seconds between periodic cycles.
    pub interval_secs: u64,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Maximum posts used per fetch (0 means all).
    pub fetch_limit: usize,
    /// Maximum category length in characters.
    pub category_max_chars: usize,
    /// Whether remote-origin quotes missing from a fetch are removed.
    pub prune_missing: bool,
    /// Whether `add` also posts the quote to the remote.
    pub post_new_quotes: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            interval_secs: 30,
            timeout_ms: 10_000,
            connect_timeout_ms: 3_000,
            fetch_limit: 10,
            category_max_chars: 20,
            prune_missing: true,
            post_new_quotes: true,
        }
    }
}

impl SyncSettings {
    /// Returns the validated period between sync cycles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `interval_secs` is zero.
    pub fn period(&self) -> Result<Duration> {
        sync_period(self.interval_secs)
    }
}

/// Converts a sync interval in seconds into a period.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for zero.
pub fn sync_period(interval_secs: u64) -> Result<Duration> {
    if interval_secs == 0 {
        return Err(Error::InvalidInput(
            "sync interval must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(interval_secs))
}

/// Logging settings (the `[logging]` section).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive.
    pub filter: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path; stderr when unset.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Session directory.
    pub session_dir: Option<String>,
    /// Sync section.
    pub sync: Option<ConfigFileSync>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

/// Sync section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileSync {
    /// Endpoint URL.
    pub endpoint: Option<String>,
    /// Interval in seconds.
    pub interval_secs: Option<u64>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
    /// Connect timeout.
    pub connect_timeout_ms: Option<u64>,
    /// Fetch limit.
    pub fetch_limit: Option<usize>,
    /// Category length limit.
    pub category_max_chars: Option<usize>,
    /// Prune remote-origin quotes missing from a fetch.
    pub prune_missing: Option<bool>,
    /// Post added quotes.
    pub post_new_quotes: Option<bool>,
}

impl Default for QuoteSyncConfig {
    fn default() -> Self {
        let data_dir = directories::BaseDirs::new().map_or_else(
            || PathBuf::from(".quotesync"),
            |dirs| dirs.data_local_dir().join("quotesync"),
        );

        Self {
            data_dir,
            session_dir: None,
            sync: SyncSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl QuoteSyncConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the effective configuration.
    ///
    /// Uses `explicit`, else the file named by [`CONFIG_PATH_ENV`], else
    /// [`QuoteSyncConfig::load_default`]; environment overrides are applied
    /// last.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be read or parsed,
    /// or the effective settings are invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let config = match named {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds
    /// invalid settings.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::Parse {
            what: format!("config file {}", path.display()),
            cause: e.to_string(),
        })?;

        let config = Self::from_config_file(file);
        config.validate()?;
        Ok(config)
    }

    /// Checks settings that have no usable zero value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the sync interval is zero.
    pub fn validate(&self) -> Result<()> {
        self.sync.period().map(|_| ())
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir, then `~/.config/quotesync/`. A file
    /// that fails to load is logged and skipped.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("quotesync").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("quotesync")
                .join("config.toml"),
        ];

        for path in candidates.iter().filter(|path| path.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring config file");
                },
            }
        }

        Self::default()
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup("QUOTESYNC_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("QUOTESYNC_SESSION_DIR").filter(|v| !v.trim().is_empty()) {
            self.session_dir = Some(PathBuf::from(dir));
        }
        if let Some(endpoint) = lookup("QUOTESYNC_ENDPOINT").filter(|v| !v.trim().is_empty()) {
            self.sync.endpoint = endpoint;
        }
        if let Some(secs) = parse_env(&lookup, "QUOTESYNC_SYNC_INTERVAL_SECS") {
            self.sync.interval_secs = secs;
        }
        if let Some(ms) = parse_env(&lookup, "QUOTESYNC_TIMEOUT_MS") {
            self.sync.timeout_ms = ms;
        }
        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Returns the effective session directory.
    #[must_use]
    pub fn session_dir(&self) -> PathBuf {
        self.session_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("session"))
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::OperationFailed {
            operation: "serialize_config".to_string(),
            cause: e.to_string(),
        })
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(session_dir) = file.session_dir {
            config.session_dir = Some(PathBuf::from(session_dir));
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }
        if let Some(sync) = file.sync {
            let target = &mut config.sync;
            if let Some(endpoint) = sync.endpoint {
                target.endpoint = endpoint;
            }
            if let Some(v) = sync.interval_secs {
                target.interval_secs = v;
            }
            if let Some(v) = sync.timeout_ms {
                target.timeout_ms = v;
            }
            if let Some(v) = sync.connect_timeout_ms {
                target.connect_timeout_ms = v;
            }
            if let Some(v) = sync.fetch_limit {
                target.fetch_limit = v;
            }
            if let Some(v) = sync.category_max_chars {
                target.category_max_chars = v;
            }
            if let Some(v) = sync.prune_missing {
                target.prune_missing = v;
            }
            if let Some(v) = sync.post_new_quotes {
                target.post_new_quotes = v;
            }
        }

        config
    }
}

fn parse_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup(name)?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(name, value = %raw, "Ignoring unparseable env override");
    }
    parsed
}

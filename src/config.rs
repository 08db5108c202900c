//! Player configuration
//!
//! Read from environment variables (a `.env` file is honoured) with defaults
//! suitable for running from the project directory.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_LOG_DIR: &str = ".logs";
const DEFAULT_LOG_FILTER: &str = "rhevo_player=debug,warn";
const DEFAULT_STATUS_INTERVAL_MS: u64 = 250;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LIBRARY: &str = "library.json";

#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Directory for rolling log files.
    pub log_dir: PathBuf,
    /// Filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// How often live sessions report progress.
    pub status_interval: Duration,
    /// Timeout for fetching remote audio.
    pub http_timeout: Duration,
    /// Track list loaded by the console driver.
    pub library: PathBuf,
    /// Fixed shuffle seed, for reproducible runs.
    pub shuffle_seed: Option<u64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            status_interval: Duration::from_millis(DEFAULT_STATUS_INTERVAL_MS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            library: PathBuf::from(DEFAULT_LIBRARY),
            shuffle_seed: None,
        }
    }
}

impl PlayerConfig {
    /// Load `.env` (if any) and read the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(dir) = lookup("RHEVO_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(filter) = lookup("RHEVO_LOG_FILTER") {
            config.log_filter = filter;
        }
        if let Some(ms) = parse_u64(&lookup, "RHEVO_STATUS_INTERVAL_MS")? {
            if ms == 0 {
                return Err(ConfigError::Invalid {
                    name: "RHEVO_STATUS_INTERVAL_MS",
                    value: ms.to_string(),
                });
            }
            config.status_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_u64(&lookup, "RHEVO_HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = lookup("RHEVO_LIBRARY") {
            config.library = PathBuf::from(path);
        }
        config.shuffle_seed = parse_u64(&lookup, "RHEVO_SHUFFLE_SEED")?;

        Ok(config)
    }
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

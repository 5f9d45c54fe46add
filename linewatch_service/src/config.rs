/// Service configuration.
///
/// Values come from three layers, later ones winning:
///   1. built-in defaults
///   2. an optional `config.toml`
///   3. environment variables prefixed `LINEWATCH_` (a `.env` file in the
///      working directory is loaded first via `dotenv`)
///
/// Environment lookups go through a closure so tests can feed overrides
/// without touching the process environment.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::logging::LogLevel;

pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
/// Longest horizon the forecast endpoint serves.
pub const MAX_FORECAST_DAYS: u32 = 16;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading configuration or the point registry.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// File could not be read.
    Io(String),
    /// File was not valid TOML for the expected shape.
    Parse(String),
    /// Values parsed but violate a constraint.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config read error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub forecast_url: String,
    pub archive_url: String,
    /// Passed through as the API's `timezone` parameter.
    pub timezone: String,
    /// Forecast horizon sent to the forecast endpoint only (1 to 16).
    pub forecast_days: Option<u32>,
    /// Points requested concurrently per chunk.
    pub chunk_size: usize,
    /// Pause after each chunk except the last.
    pub chunk_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Largest alert-scan window, in days between start and end.
    pub max_window_days: i64,
    pub points_file: String,
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            timezone: "auto".to_string(),
            forecast_days: None,
            chunk_size: 30,
            chunk_delay_ms: 1500,
            request_timeout_secs: 30,
            max_window_days: 7,
            points_file: "points.toml".to_string(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Loads `.env`, then the TOML file if it exists, then environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        dotenv::dotenv().ok();

        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
            Config::from_toml(&content)?
        } else {
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml(content: &str) -> Result<Config, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies `LINEWATCH_*` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LINEWATCH_FORECAST_URL") {
            self.forecast_url = v;
        }
        if let Some(v) = lookup("LINEWATCH_ARCHIVE_URL") {
            self.archive_url = v;
        }
        if let Some(v) = lookup("LINEWATCH_TIMEZONE") {
            self.timezone = v;
        }
        if let Some(v) = lookup("LINEWATCH_FORECAST_DAYS") {
            self.forecast_days = if v.trim().is_empty() {
                None
            } else {
                Some(parse_number("LINEWATCH_FORECAST_DAYS", &v)?)
            };
        }
        if let Some(v) = lookup("LINEWATCH_CHUNK_SIZE") {
            self.chunk_size = parse_number("LINEWATCH_CHUNK_SIZE", &v)?;
        }
        if let Some(v) = lookup("LINEWATCH_CHUNK_DELAY_MS") {
            self.chunk_delay_ms = parse_number("LINEWATCH_CHUNK_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("LINEWATCH_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number("LINEWATCH_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("LINEWATCH_MAX_WINDOW_DAYS") {
            self.max_window_days = parse_number("LINEWATCH_MAX_WINDOW_DAYS", &v)?;
        }
        if let Some(v) = lookup("LINEWATCH_POINTS_FILE") {
            self.points_file = v;
        }
        if let Some(v) = lookup("LINEWATCH_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = lookup("LINEWATCH_LOG_FILE") {
            self.log_file = if v.is_empty() { None } else { Some(v) };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be at least 1".to_string()));
        }
        if self.max_window_days < 0 {
            return Err(ConfigError::Invalid("max_window_days must not be negative".to_string()));
        }
        if let Some(days) = self.forecast_days {
            if !(1..=MAX_FORECAST_DAYS).contains(&days) {
                return Err(ConfigError::Invalid(format!(
                    "forecast_days must be between 1 and {}, got {}",
                    MAX_FORECAST_DAYS, days
                )));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        self.parsed_log_level()?;
        Ok(())
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn parsed_log_level(&self) -> Result<LogLevel, ConfigError> {
        self.log_level
            .parse()
            .map_err(|e: String| ConfigError::Invalid(e))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} must be a number, got '{}'", key, value)))
}

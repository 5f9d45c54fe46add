/// Structured logging for the weather alert service
///
/// Provides context-rich logging with point identifiers, timestamps,
/// and severity levels. Supports both console output and an append-only
/// log file for unattended scans.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use crate::model::FetchError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Log Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    OpenMeteo,
    Scan,
    Registry,
    Export,
    System,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::OpenMeteo => write!(f, "METEO"),
            Source::Scan => write!(f, "SCAN"),
            Source::Registry => write!(f, "REG"),
            Source::Export => write!(f, "EXPORT"),
            Source::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the API is throttling us
    Expected,
    /// Unexpected failure - indicates service degradation or an API change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut guard) = LOGGER.lock() {
            *guard = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, source: &Source, point_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = format_entry(level, source, point_id, message);
        let point_part = point_id.map(|p| format!(" [{}]", p)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, point_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, point_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// One log line: `2025-03-01 12:00:00 UTC WARN METEO [T-001]: message`.
fn format_entry(level: LogLevel, source: &Source, point_id: Option<&str>, message: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let point_part = point_id.map(|p| format!(" [{}]", p)).unwrap_or_default();
    format!("{} {} {}{}: {}", timestamp, level, source, point_part, message)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, source: Source, point_id: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &source, point_id, message);
        }
    }
}

/// Log a general informational message
pub fn info(source: Source, point_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, source, point_id, message);
}

/// Log a warning message
pub fn warn(source: Source, point_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, source, point_id, message);
}

/// Log an error message
pub fn error(source: Source, point_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, source, point_id, message);
}

/// Log a debug message
pub fn debug(source: Source, point_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, source, point_id, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a per-point fetch failure
pub fn classify_fetch_failure(err: &FetchError) -> FailureType {
    match err {
        // Chunk pacing is meant to avoid this, but the limit is unadvertised
        FetchError::RateLimited => FailureType::Expected,
        FetchError::HttpError(_) | FetchError::ParseError(_) => FailureType::Unexpected,
        // Coordinates outside model coverage come back without daily data
        FetchError::MissingDailyTime => FailureType::Unknown,
        FetchError::Network(msg) if msg.contains("timed out") => FailureType::Unexpected,
        FetchError::Network(_) => FailureType::Unknown,
    }
}

/// Log a point failure with automatic classification.
///
/// A failed point never stops a scan, so nothing here logs below warning.
pub fn log_point_failure(point_id: &str, operation: &str, err: &FetchError) {
    let failure_type = classify_fetch_failure(err);

    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Unexpected => error(Source::OpenMeteo, Some(point_id), &message),
        FailureType::Expected | FailureType::Unknown => {
            warn(Source::OpenMeteo, Some(point_id), &message)
        }
    }
}

// ---------------------------------------------------------------------------
// Scan Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a finished scan
pub fn log_scan_summary(total: usize, failed: usize, alerts: usize) {
    let successful = total.saturating_sub(failed);
    let message = format!(
        "Scan complete: {}/{} points answered, {} failed, {} alerts",
        successful, total, failed, alerts
    );

    if failed == 0 {
        info(Source::Scan, None, &message);
    } else if successful == 0 {
        error(Source::Scan, None, &message);
    } else {
        warn(Source::Scan, None, &message);
    }
}

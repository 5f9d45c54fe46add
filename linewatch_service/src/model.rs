/// Core data types for the power-line weather alert service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic beyond accessors, no I/O, and no HTTP types. Only
/// points, observations, alert records and the error enums that travel
/// between them.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::alert::severity::{classify, Severity};

// ---------------------------------------------------------------------------
// Point types
// ---------------------------------------------------------------------------

/// A named geographic location from the point registry, typically a tower
/// along a transmission-line route.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Optional human name; the display label falls back to `Torre <id>`.
    pub name: Option<String>,
    /// Route or group the point belongs to, if any.
    pub route: Option<String>,
}

impl GeoPoint {
    /// Label shown in tables and exports.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("Torre {}", self.id),
        }
    }
}

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// Parsed `daily` block of one point's response.
///
/// `dates[i]` pairs with `series[key][i]` for every variable. Dates that the
/// upstream returned in an unparseable form are kept as `None` so the index
/// alignment with the series survives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailyObservation {
    pub dates: Vec<Option<NaiveDate>>,
    pub series: BTreeMap<String, Vec<Option<f64>>>,
}

impl DailyObservation {
    /// Returns the numeric values of a variable, skipping gaps.
    pub fn numeric_values(&self, key: &str) -> Vec<f64> {
        self.series
            .get(key)
            .map(|values| values.iter().flatten().copied().collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Alert types
// ---------------------------------------------------------------------------

/// One threshold breach: a point exceeded a variable's limit on a date.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    pub point_id: String,
    pub point_label: String,
    pub date: NaiveDate,
    pub variable_key: String,
    pub alert_label: String,
    pub value: f64,
    pub limit: f64,
    pub unit: String,
    pub icon: String,
}

impl AlertRecord {
    /// Severity derived from `value` against `limit`.
    ///
    /// Records only exist for breaching values, so the classifier always
    /// yields a level here; `Baja` is returned for the impossible case.
    pub fn severity(&self) -> Severity {
        classify(self.value, self.limit).unwrap_or(Severity::Baja)
    }

    /// Value with one decimal and its unit, e.g. `65.0 km/h`.
    pub fn formatted_value(&self) -> String {
        if self.unit.is_empty() {
            format!("{:.1}", self.value)
        } else {
            format!("{:.1} {}", self.value, self.unit)
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or parsing one point's daily series.
#[derive(Debug, PartialEq)]
pub enum FetchError {
    /// HTTP 429 from the weather API.
    RateLimited,
    /// Any other non-2xx HTTP response.
    HttpError(u16),
    /// Transport failure: DNS, connect, TLS or timeout.
    Network(String),
    /// The body was not valid JSON.
    ParseError(String),
    /// The body parsed but carried no `daily.time` array.
    MissingDailyTime,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::RateLimited => write!(f, "HTTP error: 429 (rate limited)"),
            FetchError::HttpError(code) => write!(f, "HTTP error: {}", code),
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            FetchError::MissingDailyTime => write!(f, "No data available: missing daily.time"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Input validation failures, raised before any network call.
#[derive(Debug, PartialEq)]
pub enum QueryError {
    MissingDate(&'static str),
    InvalidDate { field: &'static str, value: String },
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    WindowTooLarge { days: i64, max_days: i64 },
    DaysBackOutOfRange { days_back: i64, min: i64, max: i64 },
    FutureEndDate { end: NaiveDate, today: NaiveDate },
    UnknownPoint(String),
    CoordinateOutOfRange { field: &'static str, value: f64 },
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::MissingDate(field) => write!(f, "{} is required", field),
            QueryError::InvalidDate { field, value } => {
                write!(f, "{} '{}' is not a YYYY-MM-DD date", field, value)
            }
            QueryError::EndBeforeStart { start, end } => {
                write!(f, "end date {} is before start date {}", end, start)
            }
            QueryError::WindowTooLarge { days, max_days } => {
                write!(f, "date range spans {} days, maximum is {}", days, max_days)
            }
            QueryError::DaysBackOutOfRange { days_back, min, max } => {
                write!(f, "days back must be between {} and {}, got {}", min, max, days_back)
            }
            QueryError::FutureEndDate { end, today } => {
                write!(f, "end date {} is in the future (today is {})", end, today)
            }
            QueryError::UnknownPoint(id) => write!(f, "point '{}' is not in the registry", id),
            QueryError::CoordinateOutOfRange { field, value } => {
                write!(f, "{} {} is out of range", field, value)
            }
        }
    }
}

impl std::error::Error for QueryError {}

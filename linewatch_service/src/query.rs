/// Query validation.
///
/// Every user-facing query is checked here before any request is made.
/// A failure is a `QueryError` for the caller to show; nothing partial runs.
///
/// # Clock injection
/// Checks that depend on the current date take `today` as a parameter
/// rather than reading the clock, so tests stay deterministic.

use chrono::{Duration, NaiveDate};

use crate::ingest::open_meteo::Endpoint;
use crate::model::{GeoPoint, QueryError};
use crate::scan::ScanRequest;

/// Shortest look-back for the single-point view.
pub const MIN_DAYS_BACK: i64 = 7;
/// Longest look-back for the single-point view.
pub const MAX_DAYS_BACK: i64 = 56;

/// Parses a required ISO calendar date.
pub fn parse_date(field: &'static str, value: Option<&str>) -> Result<NaiveDate, QueryError> {
    let value = value.map(str::trim).filter(|v| !v.is_empty());
    let Some(value) = value else {
        return Err(QueryError::MissingDate(field));
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| QueryError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Validates an alert-scan window.
///
/// Both dates are required, `end >= start`, and `end - start` may not
/// exceed `max_window_days`.
pub fn validate_scan_window(
    start: Option<&str>,
    end: Option<&str>,
    max_window_days: i64,
    endpoint: Endpoint,
) -> Result<ScanRequest, QueryError> {
    let start = parse_date("start date", start)?;
    let end = parse_date("end date", end)?;

    if end < start {
        return Err(QueryError::EndBeforeStart { start, end });
    }
    let days = (end - start).num_days();
    if days > max_window_days {
        return Err(QueryError::WindowTooLarge {
            days,
            max_days: max_window_days,
        });
    }

    Ok(ScanRequest {
        start,
        end,
        endpoint,
    })
}

/// A validated single-point look-back window, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days_back: i64,
}

/// First day of a window of `days_back` days ending on `end`.
pub fn start_from_days_back(end: NaiveDate, days_back: i64) -> NaiveDate {
    end - Duration::days(days_back - 1)
}

/// Validates a look-back query against the historical archive.
///
/// `days_back` must lie in `[MIN_DAYS_BACK, MAX_DAYS_BACK]` and the end
/// date may not be after `today`.
pub fn validate_lookback(
    end: Option<&str>,
    days_back: i64,
    today: NaiveDate,
) -> Result<LookbackWindow, QueryError> {
    let end = parse_date("end date", end)?;

    if !(MIN_DAYS_BACK..=MAX_DAYS_BACK).contains(&days_back) {
        return Err(QueryError::DaysBackOutOfRange {
            days_back,
            min: MIN_DAYS_BACK,
            max: MAX_DAYS_BACK,
        });
    }
    if end > today {
        return Err(QueryError::FutureEndDate { end, today });
    }

    Ok(LookbackWindow {
        start: start_from_days_back(end, days_back),
        end,
        days_back,
    })
}

/// Checks a hand-entered coordinate with the same bounds the registry uses.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(f64, f64), QueryError> {
    if !crate::points::latitude_in_range(latitude) {
        return Err(QueryError::CoordinateOutOfRange {
            field: "latitude",
            value: latitude,
        });
    }
    if !crate::points::longitude_in_range(longitude) {
        return Err(QueryError::CoordinateOutOfRange {
            field: "longitude",
            value: longitude,
        });
    }
    Ok((latitude, longitude))
}

/// Resolves a registry point by id.
pub fn resolve_point<'a>(points: &'a [GeoPoint], id: &str) -> Result<&'a GeoPoint, QueryError> {
    crate::points::find_point(points, id).ok_or_else(|| QueryError::UnknownPoint(id.to_string()))
}

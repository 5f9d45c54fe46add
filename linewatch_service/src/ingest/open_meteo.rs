/// Open-Meteo Daily Data API Client
///
/// Retrieves daily weather aggregates for a single coordinate from the
/// Open-Meteo forecast API (recent and upcoming days) or its historical
/// archive (arbitrary past ranges). Both return the same `daily` shape,
/// so one parser serves both.
///
/// API Documentation: https://open-meteo.com/en/docs
/// Archive: https://open-meteo.com/en/docs/historical-weather-api

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::model::{DailyObservation, FetchError, GeoPoint};
use crate::variables::daily_parameter;

// ============================================================================
// Request Types
// ============================================================================

/// Which Open-Meteo endpoint to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Forecast,
    Archive,
}

/// Parameters for one daily request.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub timezone: String,
    /// Only sent to the forecast endpoint.
    pub forecast_days: Option<u32>,
}

/// Query pairs for a daily request, in the order Open-Meteo documents them.
///
/// `forecast_days` is only sent to the forecast endpoint; the archive
/// rejects it.
pub fn daily_query(endpoint: Endpoint, request: &DailyRequest) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("latitude", request.latitude.to_string()),
        ("longitude", request.longitude.to_string()),
        ("start_date", request.start.format("%Y-%m-%d").to_string()),
        ("end_date", request.end.format("%Y-%m-%d").to_string()),
        ("daily", daily_parameter()),
        ("timezone", request.timezone.clone()),
    ];
    if endpoint == Endpoint::Forecast {
        if let Some(days) = request.forecast_days {
            query.push(("forecast_days", days.to_string()));
        }
    }
    query
}

/// Builds the GET for a daily query; reqwest handles the encoding.
///
/// # Example URL
/// `https://api.open-meteo.com/v1/forecast?latitude=-33.45&longitude=-70.66&start_date=2025-03-01&end_date=2025-03-04&daily=temperature_2m_max%2C...&timezone=auto`
pub fn build_daily_request(
    client: &reqwest::blocking::Client,
    base_url: &str,
    endpoint: Endpoint,
    request: &DailyRequest,
) -> reqwest::blocking::RequestBuilder {
    client
        .get(base_url)
        .query(&daily_query(endpoint, request))
        .header("Accept", "application/json")
}

// ============================================================================
// Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct DailyResponse {
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Option<Vec<Option<String>>>,
    /// Every other key under `daily` is a variable series.
    #[serde(flatten)]
    series: BTreeMap<String, serde_json::Value>,
}

/// Parses a daily response body into a `DailyObservation`.
///
/// Returns `FetchError::ParseError` for non-JSON bodies and
/// `FetchError::MissingDailyTime` when `daily.time` is absent. Null or
/// non-numeric series entries become gaps; unparseable dates become `None`
/// so index alignment is preserved.
pub fn parse_daily_response(body: &str) -> Result<DailyObservation, FetchError> {
    let response: DailyResponse =
        serde_json::from_str(body).map_err(|e| FetchError::ParseError(e.to_string()))?;

    let daily = response.daily.ok_or(FetchError::MissingDailyTime)?;
    let time = daily.time.ok_or(FetchError::MissingDailyTime)?;

    let dates = time
        .iter()
        .map(|t| {
            t.as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        })
        .collect();

    let series = daily
        .series
        .into_iter()
        .filter_map(|(key, value)| {
            let values = value.as_array()?;
            Some((key, values.iter().map(|v| v.as_f64()).collect()))
        })
        .collect();

    Ok(DailyObservation { dates, series })
}

// ============================================================================
// API Client
// ============================================================================

/// Anything that can produce one point's daily series.
///
/// The scan only talks to this trait, so it can run against the live API
/// or an in-memory source.
pub trait DailySource: Sync {
    fn fetch_daily(
        &self,
        point: &GeoPoint,
        start: NaiveDate,
        end: NaiveDate,
        endpoint: Endpoint,
    ) -> Result<DailyObservation, FetchError>;
}

/// Blocking Open-Meteo client.
pub struct OpenMeteoClient {
    client: reqwest::blocking::Client,
    forecast_url: String,
    archive_url: String,
    timezone: String,
    forecast_days: Option<u32>,
}

impl OpenMeteoClient {
    /// Builds a client with the configured endpoints and per-request timeout.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            forecast_url: config.forecast_url.clone(),
            archive_url: config.archive_url.clone(),
            timezone: config.timezone.clone(),
            forecast_days: config.forecast_days,
        })
    }

    fn base_url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Forecast => &self.forecast_url,
            Endpoint::Archive => &self.archive_url,
        }
    }

    /// Request for one point with the configured timezone and forecast horizon.
    pub fn daily_request(&self, point: &GeoPoint, start: NaiveDate, end: NaiveDate) -> DailyRequest {
        DailyRequest {
            latitude: point.latitude,
            longitude: point.longitude,
            start,
            end,
            timezone: self.timezone.clone(),
            forecast_days: self.forecast_days,
        }
    }

    /// Fetch daily data for an arbitrary coordinate.
    pub fn fetch(&self, endpoint: Endpoint, request: &DailyRequest) -> Result<DailyObservation, FetchError> {
        let response = build_daily_request(&self.client, self.base_url(endpoint), endpoint, request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Network(format!("request timed out: {}", e))
                } else {
                    FetchError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::HttpError(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        parse_daily_response(&body)
    }
}

impl DailySource for OpenMeteoClient {
    fn fetch_daily(
        &self,
        point: &GeoPoint,
        start: NaiveDate,
        end: NaiveDate,
        endpoint: Endpoint,
    ) -> Result<DailyObservation, FetchError> {
        self.fetch(endpoint, &self.daily_request(point, start, end))
    }
}

// ============================================================================
// Tests
// ============================================================================

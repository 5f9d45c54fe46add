/// Integration tests for the batch alert scan
///
/// These tests drive the full pipeline against an in-memory source:
/// 1. JSON body → parse → breach extraction → severity
/// 2. Chunking, pacing and progress reporting
/// 3. Per-point failures that must not abort the scan
/// 4. Filtering and stable ordering of the merged alert list
/// 5. Export of the final list
///
/// No network access is needed. Live API checks are in open_meteo_live.rs.

use linewatch_service::alert::severity::{count_by_severity, Severity};
use linewatch_service::alert::view::{filter_and_sort, AlertFilter};
use linewatch_service::export::{export_alerts, write_spreadsheet};
use linewatch_service::ingest::open_meteo::{parse_daily_response, DailySource, Endpoint};
use linewatch_service::model::{DailyObservation, FetchError, GeoPoint};
use linewatch_service::points::parse_points;
use linewatch_service::query::validate_scan_window;
use linewatch_service::scan::{CancelToken, Pacer, ScanConfig, ScanError, Scanner};

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Serves canned Open-Meteo bodies keyed by point id.
struct CannedSource {
    bodies: HashMap<String, String>,
}

impl CannedSource {
    fn new(bodies: &[(&str, String)]) -> Self {
        Self {
            bodies: bodies
                .iter()
                .map(|(id, body)| (id.to_string(), body.clone()))
                .collect(),
        }
    }
}

impl DailySource for CannedSource {
    fn fetch_daily(
        &self,
        point: &GeoPoint,
        _start: NaiveDate,
        _end: NaiveDate,
        _endpoint: Endpoint,
    ) -> Result<DailyObservation, FetchError> {
        match self.bodies.get(&point.id) {
            Some(body) => parse_daily_response(body),
            None => Err(FetchError::HttpError(404)),
        }
    }
}

/// Records pauses instead of sleeping; clones share one log.
#[derive(Default, Clone)]
struct CountingPacer(Arc<Mutex<Vec<Duration>>>);

impl CountingPacer {
    fn pauses(&self) -> Vec<Duration> {
        self.0.lock().unwrap().clone()
    }
}

impl Pacer for CountingPacer {
    fn pause(&self, delay: Duration) {
        self.0.lock().unwrap().push(delay);
    }
}

fn daily_body(dates: &[&str], series: &[(&str, &[f64])]) -> String {
    let mut daily = serde_json::Map::new();
    daily.insert("time".to_string(), serde_json::json!(dates));
    for (key, values) in series {
        daily.insert(key.to_string(), serde_json::json!(values));
    }
    serde_json::json!({ "latitude": -33.4, "longitude": -70.6, "daily": daily }).to_string()
}

fn registry(ids: &[&str]) -> Vec<GeoPoint> {
    let toml: String = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            format!(
                "[[points]]\nid = \"{}\"\nlatitude = {}\nlongitude = -70.6\n\n",
                id,
                -33.0 - i as f64 * 0.1
            )
        })
        .collect();
    parse_points(&toml).expect("test registry should parse")
}

fn scan_config(chunk_size: usize) -> ScanConfig {
    ScanConfig {
        chunk_size,
        chunk_delay: Duration::from_millis(1500),
        ..ScanConfig::default()
    }
}

const DAYS: [&str; 3] = ["2025-01-01", "2025-01-02", "2025-01-03"];

// ---------------------------------------------------------------------------
// Pipeline Tests
// ---------------------------------------------------------------------------

#[test]
fn test_wind_series_yields_baja_and_alta() {
    let points = registry(&["1"]);
    let source = CannedSource::new(&[(
        "1",
        daily_body(&DAYS, &[("windspeed_10m_max", &[45.0, 65.0, 95.0])]),
    )]);
    let request =
        validate_scan_window(Some("2025-01-01"), Some("2025-01-03"), 7, Endpoint::Forecast).unwrap();

    let scanner = Scanner::with_pacer(source, CountingPacer::default(), scan_config(30));
    let outcome = scanner
        .scan(&points, &request, &CancelToken::new(), |_| {})
        .unwrap();

    let alerts = filter_and_sort(&outcome.alerts, &AlertFilter::All);
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    assert_eq!(alerts[0].severity(), Severity::Baja);
    assert_eq!(alerts[0].point_label, "Torre 1");
    assert_eq!(alerts[0].unit, "km/h");
    assert_eq!(alerts[1].severity(), Severity::Alta);
    assert!(!outcome.all_failed());
}

#[test]
fn test_missing_daily_time_skips_only_that_point() {
    let points = registry(&["A", "B", "C"]);
    let source = CannedSource::new(&[
        ("A", daily_body(&DAYS, &[("rain_sum", &[25.0, 0.0, 0.0])])),
        (
            "B",
            r#"{"latitude": -33.1, "daily": {"rain_sum": [99.0, 99.0, 99.0]}}"#.to_string(),
        ),
        ("C", daily_body(&DAYS, &[("rain_sum", &[0.0, 0.0, 31.0])])),
    ]);
    let request =
        validate_scan_window(Some("2025-01-01"), Some("2025-01-03"), 7, Endpoint::Forecast).unwrap();

    let scanner = Scanner::with_pacer(source, CountingPacer::default(), scan_config(30));
    let outcome = scanner
        .scan(&points, &request, &CancelToken::new(), |_| {})
        .unwrap();

    let ids: Vec<_> = outcome.alerts.iter().map(|a| a.point_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "C"]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].point_id, "B");
    assert_eq!(outcome.failures[0].error, FetchError::MissingDailyTime);
    assert_eq!(outcome.points_answered(), 2);
}

#[test]
fn test_every_point_failing_is_distinguishable_from_calm() {
    let points = registry(&["X", "Y"]);
    let request =
        validate_scan_window(Some("2025-01-01"), Some("2025-01-03"), 7, Endpoint::Forecast).unwrap();

    let failing = Scanner::with_pacer(CannedSource::new(&[]), CountingPacer::default(), scan_config(30));
    let outcome = failing
        .scan(&points, &request, &CancelToken::new(), |_| {})
        .unwrap();
    assert!(outcome.alerts.is_empty());
    assert!(outcome.all_failed());

    let calm = CannedSource::new(&[
        ("X", daily_body(&DAYS, &[("windspeed_10m_max", &[10.0, 12.0, 9.0])])),
        ("Y", daily_body(&DAYS, &[("windspeed_10m_max", &[5.0, 6.0, 7.0])])),
    ]);
    let outcome = Scanner::with_pacer(calm, CountingPacer::default(), scan_config(30))
        .scan(&points, &request, &CancelToken::new(), |_| {})
        .unwrap();
    assert!(outcome.alerts.is_empty());
    assert!(!outcome.all_failed());
}

#[test]
fn test_dates_outside_window_are_ignored() {
    let points = registry(&["1"]);
    let source = CannedSource::new(&[(
        "1",
        daily_body(&DAYS, &[("temperature_2m_max", &[40.0, 41.0, 42.0])]),
    )]);
    let request =
        validate_scan_window(Some("2025-01-02"), Some("2025-01-02"), 7, Endpoint::Archive).unwrap();

    let outcome = Scanner::with_pacer(source, CountingPacer::default(), scan_config(30))
        .scan(&points, &request, &CancelToken::new(), |_| {})
        .unwrap();

    assert_eq!(outcome.alerts.len(), 1);
    assert_eq!(outcome.alerts[0].value, 41.0);
}

// ---------------------------------------------------------------------------
// Chunking & Concurrency Tests
// ---------------------------------------------------------------------------

#[test]
fn test_chunks_and_delays_for_61_points() {
    let ids: Vec<String> = (0..61).map(|i| format!("T-{:03}", i)).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let points = registry(&id_refs);
    let request =
        validate_scan_window(Some("2025-01-01"), Some("2025-01-03"), 7, Endpoint::Forecast).unwrap();

    let pacer = CountingPacer::default();
    let scanner = Scanner::with_pacer(CannedSource::new(&[]), pacer.clone(), scan_config(30));
    let mut progress = Vec::new();
    let outcome = scanner
        .scan(&points, &request, &CancelToken::new(), |p| progress.push(p.to_string()))
        .unwrap();

    assert_eq!(outcome.total_chunks, 3);
    assert_eq!(outcome.points_scanned, 61);
    assert_eq!(pacer.pauses(), vec![Duration::from_millis(1500); 2]);
    assert!(outcome.all_failed());
    assert_eq!(
        progress,
        vec![
            "Consultando bloque 1 de 3...",
            "Consultando bloque 2 de 3...",
            "Consultando bloque 3 de 3..."
        ]
    );
}

/// Every fetch in a chunk waits on a shared barrier, so the test only
/// finishes if the whole chunk is in flight at once.
struct BarrierSource(Barrier);

impl DailySource for BarrierSource {
    fn fetch_daily(
        &self,
        _point: &GeoPoint,
        _start: NaiveDate,
        _end: NaiveDate,
        _endpoint: Endpoint,
    ) -> Result<DailyObservation, FetchError> {
        self.0.wait();
        parse_daily_response(&daily_body(&DAYS, &[("windspeed_10m_max", &[70.0, 0.0, 0.0])]))
    }
}

#[test]
fn test_points_in_a_chunk_are_fetched_concurrently() {
    let points = registry(&["1", "2", "3", "4"]);
    let request =
        validate_scan_window(Some("2025-01-01"), Some("2025-01-03"), 7, Endpoint::Forecast).unwrap();

    let scanner = Scanner::with_pacer(
        BarrierSource(Barrier::new(4)),
        CountingPacer::default(),
        scan_config(4),
    );
    let outcome = scanner
        .scan(&points, &request, &CancelToken::new(), |_| {})
        .unwrap();

    let ids: Vec<_> = outcome.alerts.iter().map(|a| a.point_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
}

/// Blocks the fetch until the test releases it.
struct GateSource<'a> {
    entered: &'a Barrier,
    release: &'a Barrier,
}

impl DailySource for GateSource<'_> {
    fn fetch_daily(
        &self,
        _point: &GeoPoint,
        _start: NaiveDate,
        _end: NaiveDate,
        _endpoint: Endpoint,
    ) -> Result<DailyObservation, FetchError> {
        self.entered.wait();
        self.release.wait();
        parse_daily_response(&daily_body(&DAYS, &[]))
    }
}

#[test]
fn test_overlapping_scan_is_rejected() {
    let points = registry(&["1"]);
    let request =
        validate_scan_window(Some("2025-01-01"), Some("2025-01-03"), 7, Endpoint::Forecast).unwrap();
    let (entered, release) = (Barrier::new(2), Barrier::new(2));
    let scanner = Scanner::with_pacer(
        GateSource {
            entered: &entered,
            release: &release,
        },
        CountingPacer::default(),
        scan_config(30),
    );

    thread::scope(|s| {
        let first = s.spawn(|| scanner.scan(&points, &request, &CancelToken::new(), |_| {}));

        entered.wait();
        assert!(scanner.is_running());
        let second = scanner.scan(&points, &request, &CancelToken::new(), |_| {});
        assert!(matches!(second, Err(ScanError::AlreadyRunning)));
        release.wait();

        let first = first.join().unwrap();
        assert!(first.is_ok());
    });

    assert!(!scanner.is_running());
}

#[test]
fn test_cancel_before_first_chunk_returns_empty_outcome() {
    let points = registry(&["1", "2"]);
    let request =
        validate_scan_window(Some("2025-01-01"), Some("2025-01-03"), 7, Endpoint::Forecast).unwrap();
    let source = CannedSource::new(&[]);
    let scanner = Scanner::with_pacer(source, CountingPacer::default(), scan_config(1));

    let cancel = CancelToken::new();
    cancel.cancel();
    let outcome = scanner.scan(&points, &request, &cancel, |_| {}).unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.chunks_completed, 0);
    assert_eq!(outcome.points_scanned, 0);
}

// ---------------------------------------------------------------------------
// View & Export Tests
// ---------------------------------------------------------------------------

#[test]
fn test_same_date_alerts_keep_registry_order_after_sort() {
    let points = registry(&["A", "B"]);
    let source = CannedSource::new(&[
        (
            "A",
            daily_body(
                &DAYS,
                &[
                    ("windspeed_10m_max", &[0.0, 0.0, 61.0]),
                    ("rain_sum", &[0.0, 0.0, 21.0]),
                ],
            ),
        ),
        ("B", daily_body(&DAYS, &[("windspeed_10m_max", &[0.0, 0.0, 100.0])])),
    ]);
    let request =
        validate_scan_window(Some("2025-01-01"), Some("2025-01-03"), 7, Endpoint::Forecast).unwrap();

    let pacer = CountingPacer::default();
    let scanner = Scanner::with_pacer(source, pacer.clone(), scan_config(1));
    let outcome = scanner
        .scan(&points, &request, &CancelToken::new(), |_| {})
        .unwrap();
    assert_eq!(pacer.pauses().len(), 1);

    let all = filter_and_sort(&outcome.alerts, &AlertFilter::All);
    let order: Vec<_> = all
        .iter()
        .map(|a| (a.point_id.as_str(), a.variable_key.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![("A", "rain_sum"), ("A", "windspeed_10m_max"), ("B", "windspeed_10m_max")]
    );

    let wind: AlertFilter = "windspeed_10m_max".parse().unwrap();
    let only_wind = filter_and_sort(&outcome.alerts, &wind);
    assert!(only_wind.iter().all(|a| a.variable_key == "windspeed_10m_max"));
    assert_eq!(only_wind.len(), 2);

    let counts = count_by_severity(&all);
    assert_eq!((counts.alta, counts.media, counts.baja), (1, 0, 2));
    assert_eq!(counts.total(), 3);
}

#[test]
fn test_exports_agree_with_view() {
    let points = registry(&["1"]);
    let source = CannedSource::new(&[(
        "1",
        daily_body(&DAYS, &[("shortwave_radiation_sum", &[29.0, 34.0, 43.0])]),
    )]);
    let request =
        validate_scan_window(Some("2025-01-01"), Some("2025-01-03"), 7, Endpoint::Forecast).unwrap();
    let outcome = Scanner::with_pacer(source, CountingPacer::default(), scan_config(30))
        .scan(&points, &request, &CancelToken::new(), |_| {})
        .unwrap();
    let alerts = filter_and_sort(&outcome.alerts, &AlertFilter::All);

    let mut buf = Vec::new();
    write_spreadsheet(&mut buf, &alerts).unwrap();
    let csv_text = String::from_utf8(buf).unwrap();
    let severities: Vec<_> = csv_text
        .lines()
        .skip(1)
        .map(|row| row.rsplit(',').next().unwrap().to_string())
        .collect();
    assert_eq!(severities, vec!["Baja", "Media", "Alta"]);

    let dir = tempfile::tempdir().unwrap();
    let paths = export_alerts(dir.path(), &alerts, &AlertFilter::All).unwrap();
    let report = std::fs::read_to_string(paths.report).unwrap();
    assert!(report.contains("2025-01-03 - Torre 1: Radiación solar alta (43.0 MJ/m²) - Severidad: Alta"));
}

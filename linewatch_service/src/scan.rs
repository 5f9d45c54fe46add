/// Batch alert scan over the point registry.
///
/// Points are split into fixed-size chunks. Chunks run strictly in
/// sequence; inside a chunk every point is fetched on its own scoped
/// thread and the chunk completes only when all of them have settled.
/// A fixed pause follows every chunk except the last, which is the only
/// rate-limit protection the upstream API gets.
///
/// A failed point is logged and counted, never fatal. Each point's alerts
/// are collected by its own thread and concatenated in registry order
/// after the chunk joins, so no list is shared between threads.
///
/// # Overlapping scans
/// A `Scanner` runs one scan at a time. Calling `scan` while another call
/// is in flight returns `ScanError::AlreadyRunning`; the in-flight scan is
/// left alone. Use a `CancelToken` to stop a running scan between chunks.

use chrono::NaiveDate;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::alert::extract::extract_breaches;
use crate::alert::thresholds::{ThresholdRule, THRESHOLD_TABLE};
use crate::config::Config;
use crate::ingest::open_meteo::{DailySource, Endpoint};
use crate::logging::{self, Source};
use crate::model::{AlertRecord, DailyObservation, FetchError, GeoPoint};

// ---------------------------------------------------------------------------
// Request / configuration
// ---------------------------------------------------------------------------

/// One validated scan window. Build it through `query::validate_scan_window`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub endpoint: Endpoint,
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub chunk_size: usize,
    pub chunk_delay: Duration,
    pub rules: Vec<ThresholdRule>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chunk_size: 30,
            chunk_delay: Duration::from_millis(1500),
            rules: THRESHOLD_TABLE.to_vec(),
        }
    }
}

impl ScanConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_delay: config.chunk_delay(),
            ..Self::default()
        }
    }
}

/// Number of chunks a registry of `points` splits into.
pub fn chunk_count(points: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    points.div_ceil(chunk_size)
}

// ---------------------------------------------------------------------------
// Pacing and cancellation
// ---------------------------------------------------------------------------

/// Waits between chunks.
pub trait Pacer {
    fn pause(&self, delay: Duration);
}

/// Blocks the scanning thread for the full delay.
pub struct SleepPacer;

impl Pacer for SleepPacer {
    fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

/// Shared flag that stops a scan before its next chunk.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Reported before each chunk starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    /// 1-based.
    pub chunk: usize,
    pub total_chunks: usize,
    pub points_in_chunk: usize,
}

impl fmt::Display for ScanProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Consultando bloque {} de {}...", self.chunk, self.total_chunks)
    }
}

#[derive(Debug, PartialEq)]
pub struct PointFailure {
    pub point_id: String,
    pub error: FetchError,
}

/// Everything a scan produced. `alerts` is in discovery order, unsorted.
#[derive(Debug, Default, PartialEq)]
pub struct ScanOutcome {
    pub alerts: Vec<AlertRecord>,
    /// Points whose request was issued (all of them unless cancelled).
    pub points_scanned: usize,
    pub failures: Vec<PointFailure>,
    pub chunks_completed: usize,
    pub total_chunks: usize,
    pub cancelled: bool,
}

impl ScanOutcome {
    /// True when points were queried and none of them answered, so an
    /// empty alert list means nothing about the weather.
    pub fn all_failed(&self) -> bool {
        self.points_scanned > 0 && self.failures.len() == self.points_scanned
    }

    pub fn points_answered(&self) -> usize {
        self.points_scanned - self.failures.len()
    }
}

#[derive(Debug, PartialEq)]
pub enum ScanError {
    /// Another scan on this scanner has not finished.
    AlreadyRunning,
    InvalidChunkSize,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::AlreadyRunning => write!(f, "a scan is already running"),
            ScanError::InvalidChunkSize => write!(f, "chunk size must be at least 1"),
        }
    }
}

impl std::error::Error for ScanError {}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

pub struct Scanner<S, P = SleepPacer> {
    source: S,
    pacer: P,
    config: ScanConfig,
    active: AtomicBool,
}

/// Clears the active flag however the scan exits.
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<S: DailySource> Scanner<S, SleepPacer> {
    pub fn new(source: S, config: ScanConfig) -> Self {
        Self::with_pacer(source, SleepPacer, config)
    }
}

impl<S: DailySource, P: Pacer> Scanner<S, P> {
    pub fn with_pacer(source: S, pacer: P, config: ScanConfig) -> Self {
        Self {
            source,
            pacer,
            config,
            active: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Scans `points` for threshold breaches within the request window.
    ///
    /// `progress` is called before each chunk. The returned outcome holds
    /// every alert found, unsorted; pass it through `alert::view` for display.
    pub fn scan<F>(
        &self,
        points: &[GeoPoint],
        request: &ScanRequest,
        cancel: &CancelToken,
        mut progress: F,
    ) -> Result<ScanOutcome, ScanError>
    where
        F: FnMut(ScanProgress),
    {
        if self.config.chunk_size == 0 {
            return Err(ScanError::InvalidChunkSize);
        }
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ScanError::AlreadyRunning);
        }
        let _guard = ActiveGuard(&self.active);

        let total_chunks = chunk_count(points.len(), self.config.chunk_size);
        let mut outcome = ScanOutcome {
            total_chunks,
            ..ScanOutcome::default()
        };

        logging::info(
            Source::Scan,
            None,
            &format!(
                "Scanning {} points from {} to {} in {} chunks",
                points.len(),
                request.start,
                request.end,
                total_chunks
            ),
        );

        for (index, chunk) in points.chunks(self.config.chunk_size).enumerate() {
            if cancel.is_cancelled() {
                logging::warn(
                    Source::Scan,
                    None,
                    &format!("Scan cancelled after {} of {} chunks", index, total_chunks),
                );
                outcome.cancelled = true;
                break;
            }

            let step = ScanProgress {
                chunk: index + 1,
                total_chunks,
                points_in_chunk: chunk.len(),
            };
            logging::debug(Source::Scan, None, &step.to_string());
            progress(step);

            let results = self.fetch_chunk(chunk, request);
            outcome.points_scanned += chunk.len();

            for (point, result) in chunk.iter().zip(results) {
                match result {
                    Ok(observation) => {
                        let alerts = extract_breaches(
                            point,
                            &observation,
                            &self.config.rules,
                            request.start,
                            request.end,
                        );
                        if !alerts.is_empty() {
                            logging::debug(
                                Source::Scan,
                                Some(&point.id),
                                &format!("{} breaches", alerts.len()),
                            );
                        }
                        outcome.alerts.extend(alerts);
                    }
                    Err(error) => {
                        logging::log_point_failure(&point.id, "daily fetch", &error);
                        outcome.failures.push(PointFailure {
                            point_id: point.id.clone(),
                            error,
                        });
                    }
                }
            }

            outcome.chunks_completed += 1;
            // A cancel that arrived mid-chunk skips the pause; the loop head
            // then records the cancellation.
            if index + 1 < total_chunks && !cancel.is_cancelled() {
                self.pacer.pause(self.config.chunk_delay);
            }
        }

        logging::log_scan_summary(
            outcome.points_scanned,
            outcome.failures.len(),
            outcome.alerts.len(),
        );
        Ok(outcome)
    }

    /// Fetches every point of a chunk concurrently; results in chunk order.
    fn fetch_chunk(
        &self,
        chunk: &[GeoPoint],
        request: &ScanRequest,
    ) -> Vec<Result<DailyObservation, FetchError>> {
        let source = &self.source;
        let (start, end, endpoint) = (request.start, request.end, request.endpoint);

        thread::scope(|s| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|point| s.spawn(move || source.fetch_daily(point, start, end, endpoint)))
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(FetchError::Network("fetch worker panicked".to_string())))
                })
                .collect()
        })
    }
}

//! Severity classification for threshold breaches.
//!
//! This is the only place the 1.2 / 1.5 multipliers live. Table output,
//! the spreadsheet and the text report all go through `classify`, so the
//! displayed and exported severities cannot diverge.

use std::fmt;

use crate::model::AlertRecord;

/// Above `limit * MEDIA_FACTOR` a breach is at least `Media`.
pub const MEDIA_FACTOR: f64 = 1.2;
/// Above `limit * ALTA_FACTOR` a breach is `Alta`.
pub const ALTA_FACTOR: f64 = 1.5;

/// Breach severity, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Baja,
    Media,
    Alta,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Baja => write!(f, "Baja"),
            Severity::Media => write!(f, "Media"),
            Severity::Alta => write!(f, "Alta"),
        }
    }
}

/// Classifies `value` against `limit`.
///
/// Returns `None` when `value <= limit` (not a breach). Comparisons are
/// strict at every boundary:
///   limit < v <= 1.2*limit  →  Baja
///   1.2*limit < v <= 1.5*limit  →  Media
///   v > 1.5*limit  →  Alta
pub fn classify(value: f64, limit: f64) -> Option<Severity> {
    if !(value > limit) {
        return None;
    }
    if value > limit * ALTA_FACTOR {
        Some(Severity::Alta)
    } else if value > limit * MEDIA_FACTOR {
        Some(Severity::Media)
    } else {
        Some(Severity::Baja)
    }
}

/// Number of alerts per severity level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub alta: usize,
    pub media: usize,
    pub baja: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.alta + self.media + self.baja
    }
}

/// Tallies severities over an alert list.
pub fn count_by_severity(alerts: &[AlertRecord]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for alert in alerts {
        match alert.severity() {
            Severity::Alta => counts.alta += 1,
            Severity::Media => counts.media += 1,
            Severity::Baja => counts.baja += 1,
        }
    }
    counts
}

//! Per-variable summary statistics.

use crate::model::DailyObservation;
use crate::variables::{WeatherVariable, VARIABLE_REGISTRY};

/// Summary of one variable over a window. Gaps are excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub count: usize,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    /// Only for cumulative variables (rain, snow, radiation).
    pub total: Option<f64>,
}

/// Stats over a slice of values. Returns `None` for an empty slice.
pub fn summarize(values: &[f64]) -> Option<(f64, f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let total: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((total / values.len() as f64, min, max, total))
}

fn stats_for(variable: &'static WeatherVariable, values: &[f64]) -> Option<SeriesStats> {
    let (avg, min, max, total) = summarize(values)?;
    Some(SeriesStats {
        key: variable.key,
        label: variable.label,
        unit: variable.unit,
        count: values.len(),
        avg,
        min,
        max,
        total: variable.cumulative.then_some(total),
    })
}

/// Stats for every registry variable that has at least one numeric value,
/// in registry order.
pub fn observation_stats(observation: &DailyObservation) -> Vec<SeriesStats> {
    VARIABLE_REGISTRY
        .iter()
        .filter_map(|variable| stats_for(variable, &observation.numeric_values(variable.key)))
        .collect()
}

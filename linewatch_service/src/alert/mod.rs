/// Threshold alerting for scanned points.
///
/// Submodules:
/// - `thresholds`: static breach limits per monitored variable.
/// - `severity`: the single Baja/Media/Alta classifier.
/// - `extract`: walks one point's daily series and emits breaches.
/// - `view`: alert-type filter and stable display ordering.

pub mod extract;
pub mod severity;
pub mod thresholds;
pub mod view;

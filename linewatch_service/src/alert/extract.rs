//! Breach extraction: turns one point's daily series into alert records.

use chrono::NaiveDate;

use crate::alert::thresholds::ThresholdRule;
use crate::model::{AlertRecord, DailyObservation, GeoPoint};
use crate::variables::unit_for;

/// Emits one `AlertRecord` per (date, variable) where the value exceeds the
/// rule's limit and the date lies within `[start, end]` inclusive.
///
/// Gaps (null or non-numeric values) and unparseable dates never breach.
/// Variables present in the response but absent from `rules`, and rules
/// whose variable is absent from the response, are both ignored. Records
/// come out grouped by rule order, then by date index.
pub fn extract_breaches(
    point: &GeoPoint,
    observation: &DailyObservation,
    rules: &[ThresholdRule],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<AlertRecord> {
    let mut alerts = Vec::new();
    let label = point.label();

    for rule in rules {
        let Some(values) = observation.series.get(rule.variable_key) else {
            continue;
        };

        for (date, value) in observation.dates.iter().zip(values.iter()) {
            let (Some(date), Some(value)) = (date, value) else {
                continue;
            };
            // The upstream may return days outside the requested window.
            if *date < start || *date > end {
                continue;
            }
            if *value > rule.limit {
                alerts.push(AlertRecord {
                    point_id: point.id.clone(),
                    point_label: label.clone(),
                    date: *date,
                    variable_key: rule.variable_key.to_string(),
                    alert_label: rule.label.to_string(),
                    value: *value,
                    limit: rule.limit,
                    unit: unit_for(rule.variable_key).to_string(),
                    icon: rule.icon.to_string(),
                });
            }
        }
    }

    alerts
}

//! Static breach thresholds for the alert scan.
//!
//! A daily value strictly greater than `limit` is a breach. Severity is
//! derived from the same limit in `alert::severity`, so every consumer
//! reads limits from this table only.

use crate::variables::{RAIN_SUM, SHORTWAVE_RADIATION_SUM, TEMPERATURE_MAX, WINDSPEED_MAX};

/// One monitored variable and its breach limit.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRule {
    pub variable_key: &'static str,
    pub limit: f64,
    pub label: &'static str,
    pub icon: &'static str,
}

/// Monitored variables, in the order the filter selector lists them.
pub static THRESHOLD_TABLE: &[ThresholdRule] = &[
    ThresholdRule {
        variable_key: WINDSPEED_MAX,
        limit: 60.0,
        label: "Viento fuerte",
        icon: "🌬️",
    },
    ThresholdRule {
        variable_key: RAIN_SUM,
        limit: 20.0,
        label: "Lluvia intensa",
        icon: "🌧️",
    },
    ThresholdRule {
        variable_key: TEMPERATURE_MAX,
        limit: 35.0,
        label: "Calor extremo",
        icon: "🔥",
    },
    ThresholdRule {
        variable_key: SHORTWAVE_RADIATION_SUM,
        limit: 28.0,
        label: "Radiación solar alta",
        icon: "☀️",
    },
];

/// Looks up the rule for a variable key. Returns `None` for unmonitored keys.
pub fn find_rule(variable_key: &str) -> Option<&'static ThresholdRule> {
    THRESHOLD_TABLE.iter().find(|r| r.variable_key == variable_key)
}

/// Keys accepted by the alert-type filter, besides `all`.
pub fn monitored_keys() -> Vec<&'static str> {
    THRESHOLD_TABLE.iter().map(|r| r.variable_key).collect()
}

//! Alert-type filtering and the display/export ordering.

use std::fmt;
use std::str::FromStr;

use crate::alert::thresholds::{find_rule, monitored_keys};
use crate::model::AlertRecord;

/// Alert-type selector: every monitored variable, or one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertFilter {
    All,
    Variable(String),
}

impl AlertFilter {
    pub fn matches(&self, alert: &AlertRecord) -> bool {
        match self {
            AlertFilter::All => true,
            AlertFilter::Variable(key) => alert.variable_key == *key,
        }
    }
}

impl fmt::Display for AlertFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertFilter::All => write!(f, "all"),
            AlertFilter::Variable(key) => write!(f, "{}", key),
        }
    }
}

impl FromStr for AlertFilter {
    type Err = String;

    /// Accepts `all` or a key from the threshold table. The error names
    /// every accepted value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(AlertFilter::All);
        }
        match find_rule(s) {
            Some(rule) => Ok(AlertFilter::Variable(rule.variable_key.to_string())),
            None => Err(format!(
                "unknown alert type '{}' (expected all, {})",
                s,
                monitored_keys().join(", ")
            )),
        }
    }
}

/// Sorts alerts by (date, variable key) ascending.
///
/// The sort is stable and deliberately not tie-broken by point, so alerts
/// sharing a date and variable keep discovery (registry) order.
pub fn sort_alerts(alerts: &mut [AlertRecord]) {
    alerts.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.variable_key.cmp(&b.variable_key))
    });
}

/// Applies the filter, then the display ordering.
pub fn filter_and_sort(alerts: &[AlertRecord], filter: &AlertFilter) -> Vec<AlertRecord> {
    let mut view: Vec<AlertRecord> = alerts
        .iter()
        .filter(|a| filter.matches(a))
        .cloned()
        .collect();
    sort_alerts(&mut view);
    view
}

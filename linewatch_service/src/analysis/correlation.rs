//! Pearson correlation between two daily series.

use std::fmt;

/// How a correlation coefficient reads for two weather variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationSignal {
    /// r < -0.9: suspiciously tight inverse coupling.
    StrongInverse,
    /// r > 0.9: suspiciously tight direct coupling.
    StrongDirect,
    /// -0.9 <= r < -0.6: the usual inverse daily pattern.
    NormalInverse,
    None,
}

impl CorrelationSignal {
    pub fn is_alert(&self) -> bool {
        matches!(self, CorrelationSignal::StrongInverse | CorrelationSignal::StrongDirect)
    }
}

impl fmt::Display for CorrelationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationSignal::StrongInverse => write!(f, "ALERTA: correlación inversa muy fuerte"),
            CorrelationSignal::StrongDirect => write!(f, "ALERTA: correlación directa muy fuerte"),
            CorrelationSignal::NormalInverse => write!(f, "Alta correlación inversa, patrón normal diario"),
            CorrelationSignal::None => write!(f, "Sin correlación destacable"),
        }
    }
}

/// Pearson r over the first `min(x.len(), y.len())` pairs.
///
/// Returns 0 for empty input or when either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let avg_x = x.iter().sum::<f64>() / n as f64;
    let avg_y = y.iter().sum::<f64>() / n as f64;

    let num: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - avg_x) * (yi - avg_y))
        .sum();
    let den = (x.iter().map(|xi| (xi - avg_x).powi(2)).sum::<f64>()
        * y.iter().map(|yi| (yi - avg_y).powi(2)).sum::<f64>())
    .sqrt();

    if den == 0.0 { 0.0 } else { num / den }
}

pub fn classify_correlation(r: f64) -> CorrelationSignal {
    if r < -0.9 {
        CorrelationSignal::StrongInverse
    } else if r > 0.9 {
        CorrelationSignal::StrongDirect
    } else if r < -0.6 {
        CorrelationSignal::NormalInverse
    } else {
        CorrelationSignal::None
    }
}

/// Pairs two gappy series index-wise, keeping only days where both have a value.
pub fn paired_values(x: &[Option<f64>], y: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip()
}

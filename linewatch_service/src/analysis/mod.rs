/// Series analysis for the single-point view.
///
/// This module provides summary statistics over one point's daily series.
/// Alert detection does not depend on anything here; see `alert`.
///
/// Submodules:
/// - `stats`: avg/min/max/total per variable.
/// - `correlation`: Pearson r between two variables and its reading.

pub mod correlation;
pub mod stats;

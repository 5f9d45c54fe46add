//! Weather threshold alerts for transmission-line towers.
//!
//! Batch-queries daily weather data for every registered point, extracts
//! threshold breaches, classifies them by severity and exports the result.
//! The `linewatch` binary is a thin command-line layer over these modules.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod points;
pub mod query;
pub mod report;
pub mod scan;
pub mod variables;

//! Point registry for the power-line weather alert service.
//!
//! Loads the canonical list of monitored points (towers) from a TOML file.
//! File order is registry order, and registry order is the order in which
//! the scan discovers alerts, so it matters for tie-breaking in the view.
//!
//! ```toml
//! [[points]]
//! id = "T-001"
//! name = "Torre 001 Alto Jahuel"
//! latitude = -33.733
//! longitude = -70.694
//! route = "Alto Jahuel - Polpaico"
//! ```

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::ConfigError;
use crate::model::GeoPoint;

// ---------------------------------------------------------------------------
// TOML structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PointsFile {
    #[serde(default)]
    points: Vec<PointEntry>,
}

#[derive(Debug, Deserialize)]
struct PointEntry {
    id: String,
    latitude: f64,
    longitude: f64,
    name: Option<String>,
    route: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load and validate the registry from a TOML file.
pub fn load_points<P: AsRef<Path>>(path: P) -> Result<Vec<GeoPoint>, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
    parse_points(&content)
}

/// Parse and validate registry TOML.
///
/// Fails on the first empty or duplicate id, or out-of-range coordinate.
pub fn parse_points(content: &str) -> Result<Vec<GeoPoint>, ConfigError> {
    let file: PointsFile =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut points = Vec::with_capacity(file.points.len());

    for entry in file.points {
        let id = entry.id.trim().to_string();
        if id.is_empty() {
            return Err(ConfigError::Invalid("point with empty id".to_string()));
        }
        if !seen.insert(id.clone()) {
            return Err(ConfigError::Invalid(format!("duplicate point id '{}'", id)));
        }
        if !latitude_in_range(entry.latitude) {
            return Err(ConfigError::Invalid(format!(
                "point '{}' latitude {} out of range",
                id, entry.latitude
            )));
        }
        if !longitude_in_range(entry.longitude) {
            return Err(ConfigError::Invalid(format!(
                "point '{}' longitude {} out of range",
                id, entry.longitude
            )));
        }

        points.push(GeoPoint {
            id,
            latitude: entry.latitude,
            longitude: entry.longitude,
            name: entry.name,
            route: entry.route,
        });
    }

    Ok(points)
}

/// False for NaN as well as out-of-range values.
pub fn latitude_in_range(latitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude)
}

pub fn longitude_in_range(longitude: f64) -> bool {
    (-180.0..=180.0).contains(&longitude)
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Looks up a point by id. Returns `None` if not found.
pub fn find_point<'a>(points: &'a [GeoPoint], id: &str) -> Option<&'a GeoPoint> {
    points.iter().find(|p| p.id == id)
}

/// Points belonging to one route, in registry order.
pub fn points_on_route<'a>(points: &'a [GeoPoint], route: &str) -> Vec<&'a GeoPoint> {
    points
        .iter()
        .filter(|p| p.route.as_deref() == Some(route))
        .collect()
}

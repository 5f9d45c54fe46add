/// Upstream data clients.
///
/// Submodules:
/// - `open_meteo`: daily forecast/archive requests and response parsing.

pub mod open_meteo;

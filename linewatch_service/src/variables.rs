/// Daily weather variable registry.
///
/// Defines every daily variable requested from the weather API, with the
/// label and unit used in reports. This is the single source of truth for
/// variable keys. The threshold table and the request builder both read
/// from here rather than hardcoding names.

// ---------------------------------------------------------------------------
// Variable keys
// ---------------------------------------------------------------------------

pub const TEMPERATURE_MAX: &str = "temperature_2m_max";
pub const TEMPERATURE_MIN: &str = "temperature_2m_min";
pub const SNOWFALL_SUM: &str = "snowfall_sum";
pub const RAIN_SUM: &str = "rain_sum";
pub const WINDSPEED_MAX: &str = "windspeed_10m_max";
pub const SHORTWAVE_RADIATION_SUM: &str = "shortwave_radiation_sum";
pub const SURFACE_PRESSURE_MEAN: &str = "surface_pressure_mean";

// ---------------------------------------------------------------------------
// Variable metadata
// ---------------------------------------------------------------------------

/// Metadata for one daily variable.
#[derive(Debug)]
pub struct WeatherVariable {
    /// Key used in the API's `daily` parameter and response.
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    /// Accumulated quantities (rain, snow, radiation) also get a period total.
    pub cumulative: bool,
}

/// All daily variables, in request order.
pub static VARIABLE_REGISTRY: &[WeatherVariable] = &[
    WeatherVariable {
        key: TEMPERATURE_MAX,
        label: "Temperatura Máxima",
        unit: "°C",
        cumulative: false,
    },
    WeatherVariable {
        key: TEMPERATURE_MIN,
        label: "Temperatura Mínima",
        unit: "°C",
        cumulative: false,
    },
    WeatherVariable {
        key: SNOWFALL_SUM,
        label: "Nieve Total",
        unit: "mm",
        cumulative: true,
    },
    WeatherVariable {
        key: RAIN_SUM,
        label: "Lluvia Total",
        unit: "mm",
        cumulative: true,
    },
    WeatherVariable {
        key: WINDSPEED_MAX,
        label: "Velocidad Máx. Viento",
        unit: "km/h",
        cumulative: false,
    },
    WeatherVariable {
        key: SHORTWAVE_RADIATION_SUM,
        label: "Radiación Solar",
        unit: "MJ/m²",
        cumulative: true,
    },
    WeatherVariable {
        key: SURFACE_PRESSURE_MEAN,
        label: "Presión Superficial",
        unit: "hPa",
        cumulative: false,
    },
];

/// Looks up a variable by key. Returns `None` if not found.
pub fn find_variable(key: &str) -> Option<&'static WeatherVariable> {
    VARIABLE_REGISTRY.iter().find(|v| v.key == key)
}

/// Unit for a variable key, or the empty string for unknown keys.
pub fn unit_for(key: &str) -> &'static str {
    find_variable(key).map(|v| v.unit).unwrap_or("")
}

/// Comma-separated key list for the API's `daily` parameter.
pub fn daily_parameter() -> String {
    VARIABLE_REGISTRY
        .iter()
        .map(|v| v.key)
        .collect::<Vec<_>>()
        .join(",")
}

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// User-selected measurement system. Threaded explicitly through every
/// fetch and normalization call; never read from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    /// Lenient parse used for stored preference values; anything
    /// unrecognized falls back to metric.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "imperial" => UnitSystem::Imperial,
            _ => UnitSystem::Metric,
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    /// Wind is displayed as m/s for metric and mph for imperial.
    pub fn wind_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved query target, constructed once per fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

/// Current conditions in canonical form. Values are in the unit system
/// that was active at fetch time; `icon_ref` is an opaque reference
/// already resolved by the provider adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub place_name: String,
    pub description: String,
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed: Option<f64>,
    pub icon_ref: Option<String>,
}

/// One entry of the short-range forecast strip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub weekday: String,
    pub max_temperature: Option<f64>,
    pub icon_ref: Option<String>,
    pub description: Option<String>,
}

/// Everything one provider fetch yields. `resolved_city` is the
/// provider's canonical name for the place (used to promote the recent
/// list); `forecast_error` marks partial success where current
/// conditions arrived but the follow-up forecast call failed.
#[derive(Debug)]
pub struct WeatherReport {
    pub current: CurrentWeather,
    pub forecast: Vec<ForecastDay>,
    pub resolved_city: Option<String>,
    pub forecast_error: Option<ProviderError>,
}

/// Format a temperature for display, `--` when missing.
pub fn format_temperature(value: Option<f64>, units: UnitSystem) -> String {
    match value {
        Some(v) => format!("{}{}", v.round() as i64, units.temperature_suffix()),
        None => "--".to_string(),
    }
}

/// Format a wind speed for display, `--` when missing.
pub fn format_wind(value: Option<f64>, units: UnitSystem) -> String {
    match value {
        Some(v) => format!("{} {}", v.round() as i64, units.wind_suffix()),
        None => "--".to_string(),
    }
}

/// Format a relative-humidity percentage, `--%` when missing.
pub fn format_humidity(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}%", v.round() as i64),
        None => "--%".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_system_stored_roundtrip() {
        assert_eq!(UnitSystem::from_stored("metric"), UnitSystem::Metric);
        assert_eq!(UnitSystem::from_stored("imperial"), UnitSystem::Imperial);
        assert_eq!(UnitSystem::Metric.as_str(), "metric");
        assert_eq!(UnitSystem::Imperial.as_str(), "imperial");
    }

    #[test]
    fn unknown_stored_value_falls_back_to_metric() {
        assert_eq!(UnitSystem::from_stored("kelvin"), UnitSystem::Metric);
        assert_eq!(UnitSystem::from_stored(""), UnitSystem::Metric);
    }

    #[test]
    fn temperature_formatting_rounds_and_suffixes() {
        assert_eq!(format_temperature(Some(21.4), UnitSystem::Metric), "21°C");
        assert_eq!(format_temperature(Some(69.6), UnitSystem::Imperial), "70°F");
        assert_eq!(format_temperature(None, UnitSystem::Metric), "--");
    }

    #[test]
    fn wind_formatting() {
        assert_eq!(format_wind(Some(10.0), UnitSystem::Metric), "10 m/s");
        assert_eq!(format_wind(Some(7.5), UnitSystem::Imperial), "8 mph");
        assert_eq!(format_wind(None, UnitSystem::Imperial), "--");
    }

    #[test]
    fn humidity_formatting() {
        assert_eq!(format_humidity(Some(64.7)), "65%");
        assert_eq!(format_humidity(None), "--%");
    }
}

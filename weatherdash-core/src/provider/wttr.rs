use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::ProviderError,
    model::{CurrentWeather, ForecastDay, Location, UnitSystem, WeatherReport},
};

use super::{ProviderId, WeatherProvider};

/// Aggregator provider: one wttr.in `format=j1` call returns current
/// conditions and the multi-day forecast together, so there is never a
/// second round trip and partial success cannot occur.
#[derive(Debug, Clone)]
pub struct WttrProvider {
    base: String,
    http: Client,
}

impl WttrProvider {
    pub fn new(base: String) -> Self {
        Self { base, http: Client::new() }
    }
}

#[async_trait]
impl WeatherProvider for WttrProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Wttr
    }

    async fn fetch(
        &self,
        location: &Location,
        units: UnitSystem,
        days: usize,
    ) -> Result<WeatherReport, ProviderError> {
        let target = match location {
            Location::City(city) => urlencoding::encode(city).into_owned(),
            Location::Coordinates { lat, lon } => format!("{lat},{lon}"),
        };
        let url = format!("{}/{}", self.base, target);
        debug!(url = %url, "Requesting wttr.in endpoint");

        let res = self
            .http
            .get(&url)
            .query(&[("format", "j1".to_string()), ("num_of_days", days.to_string())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ProviderError::from_status(status, &body));
        }

        let payload: WttrPayload = serde_json::from_str(&body)
            .map_err(|err| ProviderError::Malformed(err.to_string()))?;

        Ok(WeatherReport {
            current: normalize_current(&payload, units),
            forecast: forecast_days(&payload, units, days),
            resolved_city: resolved_area_name(&payload),
            forecast_error: None,
        })
    }
}

// wttr.in wraps every scalar in `{"value": "..."}` singleton lists and
// ships numbers as strings; everything is optional here so a sparse
// payload degrades instead of failing to parse.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WttrPayload {
    #[serde(default)]
    current_condition: Vec<WttrCurrent>,
    #[serde(default)]
    nearest_area: Vec<WttrArea>,
    #[serde(default)]
    weather: Vec<WttrDay>,
}

#[derive(Debug, Default, Deserialize)]
struct WttrValue {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct WttrArea {
    #[serde(default, rename = "areaName")]
    area_name: Vec<WttrValue>,
    #[serde(default)]
    country: Vec<WttrValue>,
}

#[derive(Debug, Default, Deserialize)]
struct WttrCurrent {
    #[serde(default, rename = "temp_C")]
    temp_c: String,
    #[serde(default, rename = "temp_F")]
    temp_f: String,
    #[serde(default, rename = "FeelsLikeC")]
    feels_like_c: String,
    #[serde(default, rename = "FeelsLikeF")]
    feels_like_f: String,
    #[serde(default)]
    humidity: String,
    #[serde(default, rename = "windspeedKmph")]
    windspeed_kmph: String,
    #[serde(default, rename = "windspeedMiles")]
    windspeed_miles: String,
    #[serde(default, rename = "weatherDesc")]
    weather_desc: Vec<WttrValue>,
    #[serde(default, rename = "weatherIconUrl")]
    weather_icon_url: Vec<WttrValue>,
}

#[derive(Debug, Default, Deserialize)]
struct WttrDay {
    #[serde(default)]
    date: String,
    #[serde(default, rename = "maxtempC")]
    maxtemp_c: String,
    #[serde(default, rename = "maxtempF")]
    maxtemp_f: String,
    #[serde(default)]
    hourly: Vec<WttrHour>,
}

#[derive(Debug, Default, Deserialize)]
struct WttrHour {
    #[serde(default)]
    time: String,
    #[serde(default, rename = "weatherDesc")]
    weather_desc: Vec<WttrValue>,
    #[serde(default, rename = "weatherIconUrl")]
    weather_icon_url: Vec<WttrValue>,
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn first_value(values: &[WttrValue]) -> Option<String> {
    values.first().map(|v| v.value.clone()).filter(|s| !s.is_empty())
}

/// Map the aggregator payload's current-condition block onto the
/// canonical model. Fields are unit-selected (`temp_F` vs `temp_C`);
/// unparsable numbers are treated as missing, not as errors. Wind comes
/// in mph (read directly for imperial) or km/h (divided by 3.6 to m/s
/// for metric). The icon ref is already a full URL.
fn normalize_current(raw: &WttrPayload, units: UnitSystem) -> CurrentWeather {
    let cur = raw.current_condition.first();
    let area = raw.nearest_area.first();

    let area_name = area.and_then(|a| first_value(&a.area_name)).unwrap_or_default();
    let country = area.and_then(|a| first_value(&a.country)).unwrap_or_default();
    let joined = [area_name, country]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let place_name = if joined.is_empty() { "—".to_string() } else { joined };

    let description = cur
        .and_then(|c| first_value(&c.weather_desc))
        .unwrap_or_else(|| "—".to_string());

    let (temperature, feels_like) = match units {
        UnitSystem::Imperial => (
            cur.and_then(|c| parse_finite(&c.temp_f)),
            cur.and_then(|c| parse_finite(&c.feels_like_f)),
        ),
        UnitSystem::Metric => (
            cur.and_then(|c| parse_finite(&c.temp_c)),
            cur.and_then(|c| parse_finite(&c.feels_like_c)),
        ),
    };

    let wind_speed = match units {
        UnitSystem::Imperial => cur.and_then(|c| parse_finite(&c.windspeed_miles)),
        UnitSystem::Metric => cur.and_then(|c| parse_finite(&c.windspeed_kmph)).map(|v| v / 3.6),
    };

    CurrentWeather {
        place_name,
        description,
        temperature,
        feels_like,
        humidity_pct: cur.and_then(|c| parse_finite(&c.humidity)),
        wind_speed,
        icon_ref: cur.and_then(|c| first_value(&c.weather_icon_url)),
    }
}

/// The aggregator's forecast is already one entry per day in
/// chronological order. Max temperature is unit-selected; the icon and
/// description come from the hourly slot labeled "1200", falling back to
/// the 5th hourly entry, then the last one, then nothing.
fn forecast_days(raw: &WttrPayload, units: UnitSystem, days: usize) -> Vec<ForecastDay> {
    raw.weather
        .iter()
        .take(days)
        .map(|day| {
            let weekday = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d")
                .map(|d| d.format("%a").to_string())
                .unwrap_or_default();

            let max_temperature = match units {
                UnitSystem::Imperial => parse_finite(&day.maxtemp_f),
                UnitSystem::Metric => parse_finite(&day.maxtemp_c),
            };

            let slot = day
                .hourly
                .iter()
                .find(|h| h.time == "1200")
                .or_else(|| day.hourly.get(4.min(day.hourly.len().saturating_sub(1))));

            ForecastDay {
                weekday,
                max_temperature,
                icon_ref: slot.and_then(|h| first_value(&h.weather_icon_url)),
                description: slot.and_then(|h| first_value(&h.weather_desc)),
            }
        })
        .collect()
}

/// Canonical place name used to promote the recent-city list.
fn resolved_area_name(raw: &WttrPayload) -> Option<String> {
    raw.nearest_area.first().and_then(|a| first_value(&a.area_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> WttrPayload {
        serde_json::from_value(value).expect("payload should deserialize")
    }

    fn hour(time: &str, icon: &str, desc: &str) -> serde_json::Value {
        json!({
            "time": time,
            "weatherIconUrl": [{ "value": icon }],
            "weatherDesc": [{ "value": desc }],
        })
    }

    #[test]
    fn metric_wind_converts_kmh_to_ms() {
        let raw = payload(json!({
            "current_condition": [{ "windspeedKmph": "36" }],
        }));

        let current = normalize_current(&raw, UnitSystem::Metric);
        let wind = current.wind_speed.expect("wind should parse");
        assert!((wind - 10.0).abs() < 1e-9);
    }

    #[test]
    fn imperial_wind_reads_miles_directly() {
        let raw = payload(json!({
            "current_condition": [{ "windspeedMiles": "22", "windspeedKmph": "36" }],
        }));

        let current = normalize_current(&raw, UnitSystem::Imperial);
        assert_eq!(current.wind_speed, Some(22.0));
    }

    #[test]
    fn unit_system_selects_temperature_fields() {
        let raw = payload(json!({
            "current_condition": [{
                "temp_C": "20", "temp_F": "68",
                "FeelsLikeC": "18", "FeelsLikeF": "64",
            }],
        }));

        let metric = normalize_current(&raw, UnitSystem::Metric);
        assert_eq!(metric.temperature, Some(20.0));
        assert_eq!(metric.feels_like, Some(18.0));

        let imperial = normalize_current(&raw, UnitSystem::Imperial);
        assert_eq!(imperial.temperature, Some(68.0));
        assert_eq!(imperial.feels_like, Some(64.0));
    }

    #[test]
    fn unparsable_numbers_are_missing_not_errors() {
        let raw = payload(json!({
            "current_condition": [{ "temp_C": "n/a", "humidity": "", "windspeedKmph": "inf" }],
        }));

        let current = normalize_current(&raw, UnitSystem::Metric);
        assert_eq!(current.temperature, None);
        assert_eq!(current.humidity_pct, None);
        assert_eq!(current.wind_speed, None);
    }

    #[test]
    fn place_name_joins_area_and_country() {
        let raw = payload(json!({
            "nearest_area": [{
                "areaName": [{ "value": "Hyderabad" }],
                "country": [{ "value": "India" }],
            }],
        }));

        assert_eq!(normalize_current(&raw, UnitSystem::Metric).place_name, "Hyderabad, India");
    }

    #[test]
    fn place_name_falls_back_to_area_then_dash() {
        let only_area = payload(json!({
            "nearest_area": [{ "areaName": [{ "value": "Hyderabad" }] }],
        }));
        assert_eq!(normalize_current(&only_area, UnitSystem::Metric).place_name, "Hyderabad");

        let empty = payload(json!({}));
        let current = normalize_current(&empty, UnitSystem::Metric);
        assert_eq!(current.place_name, "—");
        assert_eq!(current.description, "—");
        assert!(current.icon_ref.is_none());
    }

    #[test]
    fn current_icon_is_taken_as_a_full_url() {
        let raw = payload(json!({
            "current_condition": [{
                "weatherDesc": [{ "value": "Sunny" }],
                "weatherIconUrl": [{ "value": "http://cdn.example/sunny.png" }],
            }],
        }));

        let current = normalize_current(&raw, UnitSystem::Metric);
        assert_eq!(current.description, "Sunny");
        assert_eq!(current.icon_ref.as_deref(), Some("http://cdn.example/sunny.png"));
    }

    #[test]
    fn forecast_prefers_the_noon_slot() {
        let raw = payload(json!({
            "weather": [{
                "date": "2021-06-01",
                "maxtempC": "25", "maxtempF": "77",
                "hourly": [
                    hour("900", "morning.png", "Mist"),
                    hour("1200", "noon.png", "Sunny"),
                    hour("1500", "afternoon.png", "Cloudy"),
                ],
            }],
        }));

        let days = forecast_days(&raw, UnitSystem::Metric, 5);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].weekday, "Tue");
        assert_eq!(days[0].max_temperature, Some(25.0));
        assert_eq!(days[0].icon_ref.as_deref(), Some("noon.png"));
        assert_eq!(days[0].description.as_deref(), Some("Sunny"));
    }

    #[test]
    fn forecast_falls_back_to_fifth_hourly_entry() {
        let raw = payload(json!({
            "weather": [{
                "date": "2021-06-01",
                "maxtempC": "25",
                "hourly": [
                    hour("0", "h0.png", "a"),
                    hour("300", "h1.png", "b"),
                    hour("600", "h2.png", "c"),
                    hour("900", "h3.png", "d"),
                    hour("1100", "h4.png", "e"),
                    hour("1400", "h5.png", "f"),
                ],
            }],
        }));

        let days = forecast_days(&raw, UnitSystem::Metric, 5);
        assert_eq!(days[0].icon_ref.as_deref(), Some("h4.png"));
    }

    #[test]
    fn forecast_falls_back_to_last_entry_when_short() {
        let raw = payload(json!({
            "weather": [{
                "date": "2021-06-01",
                "maxtempC": "25",
                "hourly": [hour("0", "h0.png", "a"), hour("300", "h1.png", "b")],
            }],
        }));

        let days = forecast_days(&raw, UnitSystem::Metric, 5);
        assert_eq!(days[0].icon_ref.as_deref(), Some("h1.png"));
    }

    #[test]
    fn forecast_without_hourly_renders_without_icon() {
        let raw = payload(json!({
            "weather": [{ "date": "2021-06-01", "maxtempC": "25", "hourly": [] }],
        }));

        let days = forecast_days(&raw, UnitSystem::Metric, 5);
        assert_eq!(days[0].max_temperature, Some(25.0));
        assert!(days[0].icon_ref.is_none());
        assert!(days[0].description.is_none());
    }

    #[test]
    fn forecast_selects_unit_specific_max_and_truncates() {
        let mut entries = Vec::new();
        for day in 1..=7 {
            entries.push(json!({
                "date": format!("2021-06-{day:02}"),
                "maxtempC": format!("{}", 20 + day),
                "maxtempF": format!("{}", 68 + day),
                "hourly": [],
            }));
        }
        let raw = payload(json!({ "weather": entries }));

        let metric = forecast_days(&raw, UnitSystem::Metric, 5);
        assert_eq!(metric.len(), 5);
        assert_eq!(metric[0].max_temperature, Some(21.0));

        let imperial = forecast_days(&raw, UnitSystem::Imperial, 5);
        assert_eq!(imperial[0].max_temperature, Some(69.0));
    }

    #[test]
    fn resolved_area_name_reads_nearest_area() {
        let raw = payload(json!({
            "nearest_area": [{ "areaName": [{ "value": "Hyderabad" }] }],
        }));
        assert_eq!(resolved_area_name(&raw).as_deref(), Some("Hyderabad"));

        assert!(resolved_area_name(&payload(json!({}))).is_none());
    }

    #[test]
    fn unparsable_date_leaves_weekday_empty() {
        let raw = payload(json!({
            "weather": [{ "date": "soon", "maxtempC": "25", "hourly": [] }],
        }));

        assert_eq!(forecast_days(&raw, UnitSystem::Metric, 5)[0].weekday, "");
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Timelike, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::collections::HashMap;
use tracing::debug;

use crate::{
    error::ProviderError,
    model::{CurrentWeather, ForecastDay, Location, UnitSystem, WeatherReport},
};

use super::{ProviderId, WeatherProvider};

/// Structured provider: the current-conditions endpoint, plus a second
/// forecast call that only ever takes coordinates. After a fetch by city
/// name the coordinates echoed in the current response are reused; when
/// the echo is absent the forecast is skipped, not an error.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base: String,
    icon_base: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base: String, icon_base: String) -> Self {
        Self { api_key, base, icon_base, http: Client::new() }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        debug!(url = %url, "Requesting OpenWeather endpoint");

        let res = self.http.get(url).query(query).send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ProviderError::from_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|err| ProviderError::Malformed(err.to_string()))
    }

    async fn fetch_current(
        &self,
        location: &Location,
        units: UnitSystem,
    ) -> Result<OwCurrentPayload, ProviderError> {
        let url = format!("{}/weather", self.base);
        let mut query = vec![
            ("appid", self.api_key.clone()),
            ("units", units.as_str().to_string()),
        ];
        match location {
            Location::City(city) => query.push(("q", city.clone())),
            Location::Coordinates { lat, lon } => {
                query.push(("lat", lat.to_string()));
                query.push(("lon", lon.to_string()));
            }
        }

        self.get_json(&url, &query).await
    }

    async fn fetch_forecast(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
    ) -> Result<OwForecastPayload, ProviderError> {
        let url = format!("{}/forecast", self.base);
        let query = vec![
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", units.as_str().to_string()),
        ];

        self.get_json(&url, &query).await
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn fetch(
        &self,
        location: &Location,
        units: UnitSystem,
        days: usize,
    ) -> Result<WeatherReport, ProviderError> {
        let payload = self.fetch_current(location, units).await?;

        // Forecast is always fetched by coordinates: the request's own
        // for coordinate queries, the echoed ones for city queries.
        let coords = match location {
            Location::Coordinates { lat, lon } => Some((*lat, *lon)),
            Location::City(_) => payload.coord.as_ref().map(|c| (c.lat, c.lon)),
        };

        let mut forecast = Vec::new();
        let mut forecast_error = None;
        if let Some((lat, lon)) = coords {
            match self.fetch_forecast(lat, lon, units).await {
                Ok(parsed) => {
                    forecast = daily_at_noon(&parsed.list, &Local, days, &self.icon_base);
                }
                Err(err) => forecast_error = Some(err),
            }
        }

        let resolved_city = (!payload.name.is_empty()).then(|| payload.name.clone());

        Ok(WeatherReport {
            current: normalize_current(&payload, &self.icon_base),
            forecast,
            resolved_city,
            forecast_error,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwCurrentPayload {
    #[serde(default)]
    name: String,
    sys: Option<OwSys>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    main: Option<OwMain>,
    wind: Option<OwWind>,
    coord: Option<OwCoord>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecastPayload {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecastEntry {
    dt: i64,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

/// Map the raw current-conditions payload onto the canonical model.
/// Values arrive already converted server-side (the request declared the
/// unit system), so no arithmetic happens here. Missing substructure
/// degrades to the defaults instead of erroring.
fn normalize_current(raw: &OwCurrentPayload, icon_base: &str) -> CurrentWeather {
    let mut parts = Vec::new();
    if !raw.name.is_empty() {
        parts.push(raw.name.clone());
    }
    if let Some(country) = raw
        .sys
        .as_ref()
        .and_then(|s| s.country.clone())
        .filter(|c| !c.is_empty())
    {
        parts.push(country);
    }

    let description = raw
        .weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "—".to_string());

    let icon_ref = raw
        .weather
        .first()
        .filter(|w| !w.icon.is_empty())
        .map(|w| format!("{icon_base}{}@2x.png", w.icon));

    CurrentWeather {
        place_name: parts.join(", "),
        description,
        temperature: raw.main.as_ref().and_then(|m| m.temp),
        feels_like: raw.main.as_ref().and_then(|m| m.feels_like),
        humidity_pct: raw.main.as_ref().and_then(|m| m.humidity),
        wind_speed: raw.wind.as_ref().and_then(|w| w.speed),
        icon_ref,
    }
}

/// Reduce the flat 3-hour sample list to one entry per calendar day in
/// the given time zone: the sample whose local hour is closest to noon,
/// with ties kept by the earlier-encountered sample. Output is ascending
/// by timestamp and truncated to `days`. Forecast icons use the plain
/// (non-`@2x`) URL form.
fn daily_at_noon<Tz: TimeZone>(
    list: &[OwForecastEntry],
    tz: &Tz,
    days: usize,
    icon_base: &str,
) -> Vec<ForecastDay> {
    let mut best: HashMap<NaiveDate, (u32, usize)> = HashMap::new();

    for (idx, entry) in list.iter().enumerate() {
        let Some(utc) = DateTime::<Utc>::from_timestamp(entry.dt, 0) else {
            continue;
        };
        let local = utc.with_timezone(tz);
        let score = local.hour().abs_diff(12);
        let day = local.date_naive();

        // Equal score keeps the earlier sample.
        let replace = match best.get(&day) {
            Some((prev, _)) => score < *prev,
            None => true,
        };
        if replace {
            best.insert(day, (score, idx));
        }
    }

    let mut selected: Vec<(NaiveDate, usize)> =
        best.into_iter().map(|(date, (_, idx))| (date, idx)).collect();
    selected.sort_by_key(|(_, idx)| list[*idx].dt);
    selected.truncate(days);

    selected
        .into_iter()
        .map(|(date, idx)| {
            let entry = &list[idx];
            ForecastDay {
                weekday: date.format("%a").to_string(),
                max_temperature: entry.main.as_ref().and_then(|m| m.temp),
                icon_ref: entry
                    .weather
                    .first()
                    .filter(|w| !w.icon.is_empty())
                    .map(|w| format!("{icon_base}{}.png", w.icon)),
                description: entry.weather.first().map(|w| w.description.clone()),
            }
        })
        .collect()
}

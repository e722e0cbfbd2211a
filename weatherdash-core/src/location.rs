use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{FetchError, LocationError},
    model::Location,
};

/// Grace period the startup geolocation attempt is given before the
/// dashboard falls back to the configured default city.
pub const STARTUP_GRACE: Duration = Duration::from_secs(4);

/// Internal deadline for a single geolocation lookup.
pub const GEO_TIMEOUT: Duration = Duration::from_secs(8);

impl Location {
    /// Build a city query from free text. Rejects empty and
    /// whitespace-only input before any network call.
    pub fn from_city_query(input: &str) -> Result<Self, FetchError> {
        let city = input.trim();
        if city.is_empty() {
            return Err(FetchError::EmptyQuery);
        }
        Ok(Location::City(city.to_string()))
    }
}

/// Platform geolocation collaborator: one position request per call.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn current_position(&self) -> Result<(f64, f64), LocationError>;
}

/// Geolocation via an IP-lookup service (ip-api.com JSON endpoint).
#[derive(Debug, Clone)]
pub struct IpGeoLocator {
    http: Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpGeoLocator {
    pub fn new() -> Result<Self, LocationError> {
        Self::with_base("http://ip-api.com".to_string())
    }

    pub fn with_base(base: String) -> Result<Self, LocationError> {
        let http = Client::builder()
            .timeout(GEO_TIMEOUT)
            .build()
            .map_err(|_| LocationError::Unsupported)?;

        Ok(Self { http, base })
    }
}

#[async_trait]
impl GeoLocator for IpGeoLocator {
    async fn current_position(&self) -> Result<(f64, f64), LocationError> {
        let url = format!("{}/json", self.base);
        debug!(url = %url, "Requesting IP geolocation");

        let res = self.http.get(&url).send().await.map_err(|err| {
            if err.is_timeout() { LocationError::Timeout } else { LocationError::Unavailable }
        })?;

        let status = res.status();
        if status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return Err(LocationError::Denied);
        }
        if !status.is_success() {
            return Err(LocationError::Unavailable);
        }

        let parsed: IpApiResponse = res.json().await.map_err(|err| {
            if err.is_timeout() { LocationError::Timeout } else { LocationError::Unavailable }
        })?;

        if parsed.status != "success" {
            return Err(LocationError::Unavailable);
        }

        match (parsed.lat, parsed.lon) {
            (Some(lat), Some(lon)) => Ok((lat, lon)),
            _ => Err(LocationError::Unavailable),
        }
    }
}

/// Stand-in for platforms with no geolocation capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeoLocator;

#[async_trait]
impl GeoLocator for NoGeoLocator {
    async fn current_position(&self) -> Result<(f64, f64), LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// First-load settle-once race: one geolocation attempt against a fixed
/// grace period. The first of {success, failure, deadline} wins and the
/// losing branch is dropped, so the fallback can fire at most once.
pub async fn startup_location(geo: &dyn GeoLocator, fallback_city: &str) -> Location {
    match tokio::time::timeout(STARTUP_GRACE, geo.current_position()).await {
        Ok(Ok((lat, lon))) => Location::Coordinates { lat, lon },
        Ok(Err(err)) => {
            debug!(error = %err, "startup geolocation failed, using default city");
            Location::City(fallback_city.to_string())
        }
        Err(_) => {
            debug!("startup geolocation did not settle in time, using default city");
            Location::City(fallback_city.to_string())
        }
    }
}

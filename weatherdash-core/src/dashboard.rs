use tracing::warn;

use crate::{
    location::{self, GeoLocator},
    model::{CurrentWeather, ForecastDay, Location, UnitSystem},
    provider::WeatherProvider,
    store::{self, PreferenceStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Rendering collaborator. Receives the canonical model and one status
/// message per operation; how any of it is displayed is its business.
pub trait Presenter: Send {
    fn show_current(&mut self, weather: &CurrentWeather, units: UnitSystem);
    fn show_forecast(&mut self, days: &[ForecastDay], units: UnitSystem);
    fn show_recent(&mut self, cities: &[String]);
    fn status(&mut self, kind: StatusKind, message: &str);
}

/// Fetch orchestration: validates input, threads the stored unit system
/// through the provider, promotes recents on success, and collapses
/// every failure into a single user-facing status. Error detail goes to
/// the log, not the status line.
pub struct Dashboard {
    provider: Box<dyn WeatherProvider>,
    store: Box<dyn PreferenceStore>,
    presenter: Box<dyn Presenter>,
    days: usize,
}

impl Dashboard {
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        store: Box<dyn PreferenceStore>,
        presenter: Box<dyn Presenter>,
        days: usize,
    ) -> Self {
        Self { provider, store, presenter, days }
    }

    pub fn recent_cities(&self) -> Vec<String> {
        store::recent_cities(&*self.store)
    }

    pub fn present_recent(&mut self) {
        let cities = store::recent_cities(&*self.store);
        self.presenter.show_recent(&cities);
    }

    /// Fetch and render weather for a typed or saved city name. The
    /// resolved place name (not necessarily the literal input) is
    /// promoted into the recent list on success.
    pub async fn search_city(&mut self, query: &str) {
        let location = match Location::from_city_query(query) {
            Ok(location) => location,
            Err(err) => {
                self.presenter.status(StatusKind::Error, &err.to_string());
                return;
            }
        };

        let typed = query.trim().to_string();
        self.fetch_and_render(
            &location,
            Some(&typed),
            "Could not fetch weather. Check the city name or try again later.",
        )
        .await;
    }

    /// Fetch and render weather for explicit coordinates. Never touches
    /// the recent list.
    pub async fn show_coordinates(&mut self, lat: f64, lon: f64) {
        self.fetch_and_render(
            &Location::Coordinates { lat, lon },
            None,
            "Could not fetch weather for your location.",
        )
        .await;
    }

    /// User-triggered geolocation: one position request, then a
    /// coordinate fetch.
    pub async fn locate(&mut self, geo: &dyn GeoLocator) {
        self.presenter.status(StatusKind::Info, "Getting your location…");
        match geo.current_position().await {
            Ok((lat, lon)) => self.show_coordinates(lat, lon).await,
            Err(err) => self.presenter.status(StatusKind::Error, &err.to_string()),
        }
    }

    /// First-load flow: geolocation races the startup grace period and
    /// the loser is discarded; the fallback city is fetched at most once.
    pub async fn startup(&mut self, geo: &dyn GeoLocator, default_city: &str) {
        match location::startup_location(geo, default_city).await {
            Location::Coordinates { lat, lon } => self.show_coordinates(lat, lon).await,
            Location::City(city) => self.search_city(&city).await,
        }
    }

    /// Persist a unit choice and re-fetch so every rendered value
    /// reflects it. Values are never relabeled in place.
    pub async fn set_units(&mut self, units: UnitSystem, geo: &dyn GeoLocator) {
        store::save_units(self.store.as_mut(), units);

        let recent = store::recent_cities(&*self.store);
        match recent.first() {
            Some(city) => {
                let city = city.clone();
                self.search_city(&city).await;
            }
            None => self.locate(geo).await,
        }
    }

    async fn fetch_and_render(
        &mut self,
        location: &Location,
        remember: Option<&str>,
        failure_text: &str,
    ) {
        let units = store::units(&*self.store);
        self.presenter.status(StatusKind::Info, "Loading weather…");

        match self.provider.fetch(location, units, self.days).await {
            Ok(report) => {
                self.presenter.show_current(&report.current, units);

                if let Some(typed) = remember {
                    let name = report
                        .resolved_city
                        .clone()
                        .unwrap_or_else(|| typed.to_string());
                    store::remember_city(self.store.as_mut(), &name);
                    self.present_recent();
                }

                match report.forecast_error {
                    Some(err) => {
                        warn!(provider = %self.provider.id(), error = %err, "forecast fetch failed");
                        self.presenter.status(StatusKind::Error, failure_text);
                    }
                    None => {
                        self.presenter.show_forecast(&report.forecast, units);
                        self.presenter.status(StatusKind::Success, "Updated.");
                    }
                }
            }
            Err(err) => {
                warn!(provider = %self.provider.id(), error = %err, "weather fetch failed");
                self.presenter.status(StatusKind::Error, failure_text);
            }
        }
    }
}

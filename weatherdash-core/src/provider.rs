use crate::{
    Config,
    error::ProviderError,
    model::{Location, UnitSystem, WeatherReport},
    provider::{openweather::OpenWeatherProvider, wttr::WttrProvider},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;
pub mod wttr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    Wttr,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::Wttr => "wttr",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weather data source: a single call fetches current conditions
/// and the short-range forecast for a location, normalized to the
/// canonical model in the requested unit system.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn fetch(
        &self,
        location: &Location,
        units: UnitSystem,
        days: usize,
    ) -> Result<WeatherReport, ProviderError>;
}

/// Constructor-time strategy switch: a configured OpenWeather credential
/// selects the structured provider, otherwise the keyless aggregator.
/// Chosen once at startup; call sites never branch on the provider.
pub fn provider_from_config(config: &Config) -> Box<dyn WeatherProvider> {
    match config.api_key() {
        Some(key) => Box::new(OpenWeatherProvider::new(
            key.to_owned(),
            config.openweather_base.clone(),
            config.openweather_icon_base.clone(),
        )),
        None => Box::new(WttrProvider::new(config.wttr_base.clone())),
    }
}

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use weatherdash_core::{
    Config, Dashboard, IpGeoLocator, UnitSystem, provider_from_config, store::FileStore,
};

use crate::output::TerminalPresenter;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Weather dashboard CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather credential and the default city.
    Configure,

    /// Show current weather and forecast for a city. Without a city,
    /// geolocation races a short grace period before the default city
    /// is used.
    Show {
        /// City name, e.g. "Hyderabad" or "New York".
        city: Option<String>,
    },

    /// Show weather for the current position (IP geolocation).
    Locate,

    /// Switch the unit system and re-fetch the last shown city.
    Units {
        /// "metric" or "imperial".
        system: String,
    },

    /// List recently searched cities, most recent first.
    Recent,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city } => {
                let (mut dashboard, config) = build_dashboard()?;
                match city {
                    Some(city) => dashboard.search_city(&city).await,
                    None => dashboard.startup(&IpGeoLocator::new()?, &config.default_city).await,
                }
                Ok(())
            }
            Command::Locate => {
                let (mut dashboard, _) = build_dashboard()?;
                dashboard.locate(&IpGeoLocator::new()?).await;
                Ok(())
            }
            Command::Units { system } => {
                let units = parse_units(&system)?;
                let (mut dashboard, _) = build_dashboard()?;
                dashboard.set_units(units, &IpGeoLocator::new()?).await;
                Ok(())
            }
            Command::Recent => {
                let (mut dashboard, _) = build_dashboard()?;
                dashboard.present_recent();
                Ok(())
            }
        }
    }
}

fn build_dashboard() -> Result<(Dashboard, Config)> {
    let config = Config::load()?;
    let provider = provider_from_config(&config);
    let store = FileStore::open()?;
    let dashboard = Dashboard::new(
        provider,
        Box::new(store),
        Box::new(TerminalPresenter::default()),
        config.forecast_days,
    );

    Ok((dashboard, config))
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let key = inquire::Text::new("OpenWeather API key (leave empty to use wttr.in):")
        .with_initial_value(config.openweather_api_key.as_deref().unwrap_or(""))
        .prompt()?;
    config.set_api_key(Some(key));

    let city = inquire::Text::new("Default city:")
        .with_initial_value(&config.default_city)
        .prompt()?;
    if !city.trim().is_empty() {
        config.default_city = city.trim().to_string();
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

fn parse_units(value: &str) -> Result<UnitSystem> {
    match value.to_lowercase().as_str() {
        "metric" => Ok(UnitSystem::Metric),
        "imperial" => Ok(UnitSystem::Imperial),
        _ => Err(anyhow!("Unknown unit system '{value}'. Supported: metric, imperial.")),
    }
}

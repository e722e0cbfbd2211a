use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Top-level configuration stored on disk.
///
/// Provider selection hangs off `openweather_api_key`: when a key is
/// present the structured OpenWeather provider is used, otherwise the
/// keyless wttr.in aggregator. The endpoint bases are overridable so
/// tests (and self-hosted mirrors) can point the providers elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenWeather credential; absence selects the aggregator provider.
    pub openweather_api_key: Option<String>,

    /// City used when startup geolocation does not settle in time.
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Number of forecast entries to keep.
    #[serde(default = "default_forecast_days")]
    pub forecast_days: usize,

    #[serde(default = "default_openweather_base")]
    pub openweather_base: String,

    #[serde(default = "default_openweather_icon_base")]
    pub openweather_icon_base: String,

    #[serde(default = "default_wttr_base")]
    pub wttr_base: String,
}

fn default_city() -> String {
    "Hyderabad".to_string()
}

const fn default_forecast_days() -> usize {
    5
}

fn default_openweather_base() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_openweather_icon_base() -> String {
    "https://openweathermap.org/img/wn/".to_string()
}

fn default_wttr_base() -> String {
    "https://wttr.in".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            default_city: default_city(),
            forecast_days: default_forecast_days(),
            openweather_base: default_openweather_base(),
            openweather_icon_base: default_openweather_icon_base(),
            wttr_base: default_wttr_base(),
        }
    }
}

impl Config {
    /// The configured credential, treating an empty string as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.openweather_api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn set_api_key(&mut self, key: Option<String>) {
        self.openweather_api_key = key.filter(|k| !k.trim().is_empty());
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherdash", "weatherdash-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

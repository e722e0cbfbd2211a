use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use std::{collections::HashMap, fs, path::PathBuf};
use tracing::warn;

use crate::model::UnitSystem;

pub const UNITS_KEY: &str = "units";
pub const RECENT_CITIES_KEY: &str = "recentCities";

/// Recent-city list is capped at this many entries.
pub const RECENT_LIMIT: usize = 6;

/// String key-value persistence for small user preferences.
pub trait PreferenceStore: Send {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str);
}

/// In-memory store, used by tests and as the no-persistence fallback.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// File-backed store: a flat JSON object persisted in the platform data
/// directory, written through on every set. A missing or corrupt file
/// starts the store empty rather than failing.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileStore {
    /// Open the store at the default platform location.
    pub fn open() -> Result<Self> {
        Ok(Self::open_at(Self::preferences_file_path()?))
    }

    pub fn open_at(path: PathBuf) -> Self {
        let values = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default();

        Self { path, values }
    }

    pub fn preferences_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherdash", "weatherdash-cli")
            .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

        Ok(dirs.data_dir().join("preferences.json"))
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&self.values)
            .context("Failed to serialize preferences to JSON")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write preferences file: {}", self.path.display()))
    }
}

impl PreferenceStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        if let Err(err) = self.persist() {
            warn!(error = %err, "could not persist preferences");
        }
    }
}

/// Stored unit system, defaulting to metric when absent or unknown.
pub fn units(store: &dyn PreferenceStore) -> UnitSystem {
    store
        .get_item(UNITS_KEY)
        .map(|v| UnitSystem::from_stored(&v))
        .unwrap_or_default()
}

pub fn save_units(store: &mut dyn PreferenceStore, units: UnitSystem) {
    store.set_item(UNITS_KEY, units.as_str());
}

/// Stored recent-city list, most recent first. Absent or corrupt JSON
/// decodes to an empty list.
pub fn recent_cities(store: &dyn PreferenceStore) -> Vec<String> {
    store
        .get_item(RECENT_CITIES_KEY)
        .and_then(|v| serde_json::from_str(&v).ok())
        .unwrap_or_default()
}

/// Promote a confirmed city name to the front of the recent list and
/// persist the result.
pub fn remember_city(store: &mut dyn PreferenceStore, city: &str) {
    if city.is_empty() {
        return;
    }
    let updated = promote(recent_cities(store), city);
    match serde_json::to_string(&updated) {
        Ok(json) => store.set_item(RECENT_CITIES_KEY, &json),
        Err(err) => warn!(error = %err, "could not encode recent cities"),
    }
}

/// Case-insensitive promote-to-front: the new spelling wins, duplicates
/// differing only by case are removed, and the list is capped.
fn promote(list: Vec<String>, city: &str) -> Vec<String> {
    let lowered = city.to_lowercase();
    let mut updated = vec![city.to_string()];
    updated.extend(list.into_iter().filter(|c| c.to_lowercase() != lowered));
    updated.truncate(RECENT_LIMIT);
    updated
}

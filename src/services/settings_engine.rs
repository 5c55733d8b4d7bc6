// Tagmark Settings Engine
// Keeps two views of the settings: what the JSON file holds, and what the
// process runs with. A data directory override (`TAGMARK_DATA_DIR`) only ever
// touches the second one, so it is never written back to disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::{Settings, StorageSettings};

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<Settings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &Settings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// JSON-file settings with an optional runtime storage relocation.
pub struct SettingsEngine {
    config_path: String,
    data_dir: Option<PathBuf>,
    /// Mirrors the file.
    stored: Settings,
    /// `stored` with the data directory override applied.
    effective: Settings,
}

impl SettingsEngine {
    /// Creates an engine for `path_override`, or `<config dir>/settings.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override.unwrap_or_else(|| {
            platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string()
        });

        Self {
            config_path,
            data_dir: None,
            stored: Settings::default(),
            effective: Settings::default(),
        }
    }

    /// Relocates storage to `dir` instead of consulting `TAGMARK_DATA_DIR`.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self.refresh_effective();
        self
    }

    /// The settings as they are (or will be) written to the file.
    pub fn stored_settings(&self) -> &Settings {
        &self.stored
    }

    fn refresh_effective(&mut self) {
        let mut effective = self.stored.clone();
        if let Some(dir) = self.data_dir.clone().or_else(platform::data_dir_override) {
            debug!(dir = %dir.display(), "storage relocated");
            effective.storage = StorageSettings::in_dir(&dir);
        }
        self.effective = effective;
    }

    fn read_file(path: &Path) -> Result<Settings, SettingsError> {
        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| SettingsError::SerializationError(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

/// Turns `fetch.timeout_secs` into the JSON pointer `/fetch/timeout_secs`.
fn key_to_pointer(key: &str) -> Result<String, SettingsError> {
    let mut pointer = String::new();
    for segment in key.split('.') {
        if segment.is_empty() {
            return Err(SettingsError::InvalidKey(format!("Malformed setting key '{}'", key)));
        }
        pointer.push('/');
        pointer.push_str(&segment.replace('~', "~0").replace('/', "~1"));
    }
    Ok(pointer)
}

impl SettingsEngineTrait for SettingsEngine {
    /// Reads the file (defaults when it does not exist) and returns the
    /// effective settings.
    fn load(&mut self) -> Result<Settings, SettingsError> {
        let path = Path::new(&self.config_path);
        self.stored = if path.exists() { Self::read_file(path)? } else { Settings::default() };
        self.refresh_effective();
        Ok(self.effective.clone())
    }

    /// Writes the stored view, creating the config directory when needed.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SettingsError::IoError(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        let json = serde_json::to_string_pretty(&self.stored)
            .map_err(|e| SettingsError::SerializationError(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// The settings the process runs with.
    fn get_settings(&self) -> &Settings {
        &self.effective
    }

    /// Replaces one value addressed by a dot path (`listing.page_size`) and
    /// saves. The key must already exist; the result must still deserialize.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        let pointer = key_to_pointer(key)?;
        let mut tree = serde_json::to_value(&self.stored)
            .map_err(|e| SettingsError::SerializationError(e.to_string()))?;

        let slot = tree
            .pointer_mut(&pointer)
            .ok_or_else(|| SettingsError::InvalidKey(format!("Unknown setting '{}'", key)))?;
        *slot = value;

        self.stored = serde_json::from_value(tree)
            .map_err(|e| SettingsError::InvalidValue(format!("Invalid value for '{}': {}", key, e)))?;
        self.refresh_effective();
        self.save()?;
        info!(key, "setting updated");
        Ok(())
    }

    /// Restores defaults on disk; a storage override stays in effect.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.stored = Settings::default();
        self.refresh_effective();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}

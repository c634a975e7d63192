//! User configuration and watched-directory resolution

use crate::error::{DesktidyError, Result};
use crate::mapping::ExtensionMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Quiet window used when neither the config file nor the CLI sets one.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Directory to watch; resolved and persisted on first run.
    pub watched_directory: Option<PathBuf>,
    /// Quiet window, in milliseconds, before a sort pass runs.
    pub debounce_ms: Option<u64>,
    /// Optional replacement for the built-in extension table.
    pub extension_mapping: Option<HashMap<String, String>>,
}

impl UserConfig {
    /// Get the config file path (~/.config/desktidy/config.json)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("desktidy").join("config.json"))
    }

    /// Load config from file, or create default if doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok_or_else(|| {
            DesktidyError::ConfigError("Could not determine config directory".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| DesktidyError::ConfigError(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| DesktidyError::ConfigError(format!("Failed to parse config file: {}", e)))
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or_else(|| {
            DesktidyError::ConfigError("Could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DesktidyError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| DesktidyError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(&path, contents)
            .map_err(|e| DesktidyError::ConfigError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Resolves the directory to watch: a CLI override wins, then the
    /// persisted setting, then the platform desktop folder. A newly derived
    /// default is written back to the config file so later runs are stable.
    ///
    /// The directory must exist; an unresolvable or missing one is a fatal
    /// configuration error.
    pub fn resolve_watched_directory(&mut self, cli_override: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = cli_override {
            return validate_directory(dir);
        }

        if let Some(dir) = &self.watched_directory {
            return validate_directory(dir.clone());
        }

        let derived = dirs::desktop_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
            .ok_or_else(|| {
                DesktidyError::ConfigError(
                    "Could not derive a default directory to watch; set one in the config file"
                        .to_string(),
                )
            })?;

        let derived = validate_directory(derived)?;
        self.watched_directory = Some(derived.clone());
        self.save()?;
        Ok(derived)
    }

    /// Effective debounce window.
    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    /// The extension map to use: config override when present, built-in
    /// table otherwise.
    pub fn extension_map(&self) -> Result<ExtensionMap> {
        match &self.extension_mapping {
            Some(entries) => ExtensionMap::new(entries.clone()),
            None => Ok(ExtensionMap::default_mapping()),
        }
    }
}

fn validate_directory(dir: PathBuf) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(DesktidyError::ConfigError(format!(
            "watched directory {} does not exist or is not a directory",
            dir.display()
        )));
    }
    Ok(dir)
}

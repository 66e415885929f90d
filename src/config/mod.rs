//! Persisted dashboard settings
//!
//! Replaces the browser's local storage: the auto-refresh interval and the
//! user-activity pause knobs survive restarts via a small TOML file under the
//! platform config directory. Everything else is session state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::error::{Result, SmsError};

/// Settings reloaded at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSettings {
    /// Auto-refresh period in seconds, 0 disables polling
    #[serde(default)]
    pub auto_refresh_interval_secs: u64,

    /// Pause polling while the user is interacting
    #[serde(default)]
    pub activity_pause_enabled: bool,

    /// How long after the last interaction polling resumes
    #[serde(default = "default_activity_delay")]
    pub activity_delay_secs: u64,
}

fn default_activity_delay() -> u64 {
    30
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            auto_refresh_interval_secs: 0,
            activity_pause_enabled: false,
            activity_delay_secs: default_activity_delay(),
        }
    }
}

/// Default settings file location
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sms-manager").join("settings.toml"))
}

impl DashboardSettings {
    /// Load settings from `path`, falling back to defaults when the file
    /// does not exist yet
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SmsError::Config(format!("Failed to read settings: {}", e)))?;
        let settings = toml::from_str(&content)?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Persist settings to `path`, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SmsError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SmsError::Config(format!("Failed to serialize settings: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| SmsError::Config(format!("Failed to write settings: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DashboardSettings::load(&dir.path().join("none.toml")).unwrap();
        assert_eq!(settings, DashboardSettings::default());
        assert_eq!(settings.activity_delay_secs, 30);
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let settings = DashboardSettings {
            auto_refresh_interval_secs: 60,
            activity_pause_enabled: true,
            activity_delay_secs: 15,
        };
        settings.save(&path).unwrap();

        let loaded = DashboardSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "auto_refresh_interval_secs = 10\n").unwrap();

        let loaded = DashboardSettings::load(&path).unwrap();
        assert_eq!(loaded.auto_refresh_interval_secs, 10);
        assert!(!loaded.activity_pause_enabled);
        assert_eq!(loaded.activity_delay_secs, 30);
    }
}

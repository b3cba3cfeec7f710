//! Runtime configuration and persisted user settings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::volume::FolderLayout;

/// Default device polling interval in milliseconds.
pub const DEFAULT_POLL_MS: u64 = 1500;

const SETTINGS_FILE: &str = "settings.json";
const PERMISSIONS_FILE: &str = "permissions.json";
const LOG_FILE: &str = "dasifa.log";

/// Errors in user-supplied configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("folder name must not be empty")]
    EmptyFolderName,

    #[error("invalid folder name: {0}")]
    InvalidFolderName(String),

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// Color theme of both front-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Label of the toggle button: the theme it switches to.
    pub fn toggle_icon(&self) -> &'static str {
        match self {
            Theme::Light => "\u{1F319}", // moon
            Theme::Dark => "\u{2600}",   // sun
        }
    }
}

/// Settings that survive restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
}

impl Settings {
    /// Load settings, falling back to defaults when the file is missing or corrupt.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "corrupt settings file, using defaults");
                Self::default()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }
}

/// Everything the app needs to know at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root whose filesystem counts as internal storage
    pub internal_root: PathBuf,
    /// Volume to select at startup, as if picked by the user
    pub initial_volume: Option<PathBuf>,
    /// Managed folder layout on the removable volume
    pub layout: FolderLayout,
    /// How often the device monitor polls
    pub poll_interval: Duration,
    /// Where settings, permissions and the TUI log live
    pub config_dir: PathBuf,
    /// Theme forced from the command line
    pub theme_override: Option<Theme>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.layout.root_name.as_str();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyFolderName);
        }
        if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
            return Err(ConfigError::InvalidFolderName(name.to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    pub fn permissions_path(&self) -> PathBuf {
        self.config_dir.join(PERMISSIONS_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.config_dir.join(LOG_FILE)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            internal_root: default_internal_root(),
            initial_volume: None,
            layout: FolderLayout::default(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_MS),
            config_dir: default_config_dir(),
            theme_override: None,
        }
    }
}

/// Get the settings directory path.
pub fn default_config_dir() -> PathBuf {
    // Try XDG config dir first, then fallback to ~/.config
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("dasifa")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config").join("dasifa")
    } else {
        PathBuf::from("/tmp").join("dasifa-config")
    }
}

/// The user's home lives on the data volume; fall back to the filesystem root.
pub fn default_internal_root() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::default(), Theme::Light);
    }

    #[test]
    fn test_settings_roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("settings.json");

        Settings { theme: Theme::Dark }.save(&path).unwrap();
        assert_eq!(Settings::load(&path).theme, Theme::Dark);
    }

    #[test]
    fn test_settings_defaults() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("settings.json");
        assert_eq!(Settings::load(&missing), Settings::default());

        fs::write(&missing, "garbage").unwrap();
        assert_eq!(Settings::load(&missing), Settings::default());

        fs::write(&missing, "{}").unwrap();
        assert_eq!(Settings::load(&missing).theme, Theme::Light);
    }

    #[test]
    fn test_validate() {
        let config = AppConfig::default();
        assert_eq!(config.validate(), Ok(()));

        let mut config = AppConfig::default();
        config.layout = FolderLayout::new("  ");
        assert_eq!(config.validate(), Err(ConfigError::EmptyFolderName));

        config.layout = FolderLayout::new("a/b");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFolderName(_))));

        config.layout = FolderLayout::new("..");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFolderName(_))));

        let mut config = AppConfig::default();
        config.poll_interval = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));
    }

    #[test]
    fn test_paths_live_in_config_dir() {
        let config = AppConfig {
            config_dir: PathBuf::from("/cfg"),
            ..AppConfig::default()
        };
        assert_eq!(config.settings_path(), PathBuf::from("/cfg/settings.json"));
        assert_eq!(config.permissions_path(), PathBuf::from("/cfg/permissions.json"));
        assert_eq!(config.log_path(), PathBuf::from("/cfg/dasifa.log"));
    }
}

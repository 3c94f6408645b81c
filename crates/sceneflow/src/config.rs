//! User configuration management
//!
//! Per-user settings that live outside the project file: window geometry and
//! the most recent project path.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// User configuration settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Last opened project path
    #[serde(default)]
    pub last_project: Option<String>,

    // === Window Geometry ===
    /// Window width in pixels
    #[serde(default)]
    pub window_width: Option<u32>,
    /// Window height in pixels
    #[serde(default)]
    pub window_height: Option<u32>,
    /// Window X position
    #[serde(default)]
    pub window_x: Option<i32>,
    /// Window Y position
    #[serde(default)]
    pub window_y: Option<i32>,
    /// Whether the window was maximized
    #[serde(default)]
    pub window_maximized: bool,
}

impl UserConfig {
    /// Path of the config file in the platform config directory.
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sceneflow")
            .join("config.toml")
    }

    /// Load the config, falling back to defaults on any error.
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load from an explicit path (used by tests).
    pub fn load_from(path: &std::path::Path) -> Self {
        match fs::read_to_string(path) {
            Ok(data) => match toml::from_str(&data) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Invalid user config {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist the config, creating the directory as needed.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::path())
    }

    /// Save to an explicit path (used by tests).
    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = UserConfig::load_from(std::path::Path::new("/nonexistent/config.toml"));
        assert_eq!(config, UserConfig::default());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("nested").join("config.toml");

        let config = UserConfig {
            last_project: Some("/tmp/project.json".to_string()),
            window_width: Some(1600),
            window_height: Some(900),
            window_x: Some(10),
            window_y: Some(20),
            window_maximized: true,
        };
        config.save_to(&path).expect("save");

        let loaded = UserConfig::load_from(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_toml_yields_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not [ toml").expect("write");

        let config = UserConfig::load_from(&path);
        assert_eq!(config, UserConfig::default());
    }
}

//! Application State definitions
//!
//! This module defines the core state structures that are persisted to disk.

use crate::{logging::LogConfig, Color, GridParams, Pose};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Viewport configuration handed to the render thread at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportSettings {
    /// Scene name used by the renderer
    pub scene_name: String,
    /// Viewport clear color
    pub background_color: Color,
    /// Scene ambient light
    pub ambient_light: Color,
    /// Initial camera pose
    pub camera_pose: Pose,
    /// Scene snapshot service name; empty disables mirroring
    #[serde(default)]
    pub scene_service: String,
    /// Pose update topic name
    #[serde(default)]
    pub pose_topic: String,
    /// Simulator endpoint address
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String {
    "127.0.0.1:9870".to_string()
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            scene_name: "scene".to_string(),
            background_color: Color::grey(0.3),
            ambient_light: Color::grey(0.3),
            // Behind and above the origin, pitched down towards it.
            camera_pose: Pose::from_position_rpy(Vec3::new(-6.0, 0.0, 6.0), 0.0, 0.5, 0.0),
            scene_service: "/scene".to_string(),
            pose_topic: "/pose".to_string(),
            endpoint: default_endpoint(),
        }
    }
}

/// Global application state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppState {
    /// Project name
    pub name: String,
    /// Project version
    pub version: String,

    /// Viewport and scene mirroring configuration
    #[serde(default)]
    pub viewport: ViewportSettings,

    /// Reference grid configuration
    #[serde(default)]
    pub grid: GridParams,

    /// Application settings
    #[serde(default)]
    pub settings: AppSettings,

    /// Dirty flag (has changes?) - Not serialized
    #[serde(skip)]
    pub dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            name: "Untitled Project".to_string(),
            version: "0.1.0".to_string(),
            viewport: ViewportSettings::default(),
            grid: GridParams::default(),
            settings: AppSettings::default(),
            dirty: false,
        }
    }
}

impl AppState {
    /// Create a new empty project state
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load a project from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Save the project to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

/// Global application settings persisted alongside the project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    /// Dark mode toggle
    pub dark_mode: bool,
    /// UI scale factor
    pub ui_scale: f32,
    /// Logging configuration
    #[serde(default)]
    pub log_config: LogConfig,
    /// Screenshot directory override; default is resolved at startup
    #[serde(default)]
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            ui_scale: 1.0,
            log_config: LogConfig::default(),
            screenshot_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_defaults() {
        let state = AppState::default();
        assert_eq!(state.name, "Untitled Project");
        assert_eq!(state.version, "0.1.0");
        assert!(!state.dirty);
        assert_eq!(state.viewport.scene_service, "/scene");
        assert_eq!(state.viewport.pose_topic, "/pose");
        assert_eq!(state.grid.cell_count, 20);
    }

    #[test]
    fn test_app_settings_defaults() {
        let settings = AppSettings::default();
        assert!(settings.dark_mode);
        assert_eq!(settings.ui_scale, 1.0);
        assert!(settings.screenshot_dir.is_none());
    }

    #[test]
    fn test_app_state_serialization_skip_dirty() {
        let mut original = AppState::new("Dirty Project");
        original.dirty = true;

        let serialized = serde_json::to_string(&original).expect("Failed to serialize");

        // "dirty" field should NOT be present in JSON
        assert!(!serialized.contains("\"dirty\""));

        let deserialized: AppState =
            serde_json::from_str(&serialized).expect("Failed to deserialize");
        assert!(!deserialized.dirty);
    }
}

//! SceneFlow Core - Domain Model and Data Structures
//!
//! This crate contains the core domain model for SceneFlow, including:
//! - Scene description messages (the snapshot payload)
//! - Pose and color math types
//! - Grid display parameters
//! - Project state and user settings
//! - Logging configuration

#![warn(missing_docs)]

pub use glam::{Mat4, Quat, Vec2, Vec3};
use thiserror::Error;

pub mod grid;
pub mod logging;
pub mod math;
pub mod scene;
pub mod state;

// --- Re-exports grouped by category ---

// Math
pub use math::{Color, Pose};

// Scene description
pub use scene::{
    Geometry, LightDescription, LightKind, LinkDescription, MaterialDescription,
    ModelDescription, PoseBatch, SceneDescription, VisualDescription,
};

// Grid display
pub use grid::GridParams;

// Logging
pub use logging::LogConfig;

// State & Project
pub use state::{AppSettings, AppState, ViewportSettings};

/// Numeric entity id assigned by the simulator.
///
/// Ids are shared between the scene snapshot and the pose stream; a pose
/// update addresses the visual or light that was created with the same id.
pub type EntityId = u64;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Project file could not be read or written
    #[error("Project io error: {0}")]
    ProjectIo(#[from] std::io::Error),

    /// Project file failed to parse
    #[error("Project parse error: {0}")]
    ProjectParse(#[from] serde_json::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

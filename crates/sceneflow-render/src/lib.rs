//! SceneFlow Render - Scene Mirror and Offscreen Renderer
//!
//! This crate provides the rendering side of SceneFlow, including:
//! - wgpu backend initialization
//! - The entity-keyed scene graph mirrored from the simulator
//! - The scene manager (snapshot request + pose stream)
//! - The offscreen scene renderer and orbit camera
//! - The render thread with the double-buffered frame handoff

use thiserror::Error;

pub mod backend;
pub mod camera;
pub mod geometry;
pub mod renderer;
pub mod scene_graph;
pub mod scene_manager;
pub mod texture;
pub mod viewport;

pub use backend::WgpuBackend;
pub use camera::OrbitCamera;
pub use renderer::SceneRenderer;
pub use scene_graph::{Material, NodeKind, SceneGraph, SceneNode, Shape};
pub use scene_manager::SceneManager;
pub use texture::{TextureHandle, TexturePool};
pub use viewport::{
    FrameSlot, GridCommand, MouseButtons, MouseEvent, MouseEventKind, PendingFrame, RenderCommand,
    RenderEvent, RenderHandle, RenderThread, ViewportConfig, VIEWPORT_FORMAT, VIEWPORT_TARGETS,
};

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Device error: {0}")]
    DeviceError(String),

    #[error("Texture creation failed: {0}")]
    TextureCreation(String),

    #[error("Frame capture failed: {0}")]
    Capture(String),

    #[error("Screenshot io error: {0}")]
    ScreenshotIo(#[from] std::io::Error),

    #[error("Screenshot encode error: {0}")]
    ScreenshotEncode(#[from] image::ImageError),
}

/// Result type for rendering operations
pub type Result<T> = std::result::Result<T, RenderError>;

/// Re-export commonly used wgpu types
pub use wgpu::{
    CommandEncoder, Device, Queue, Surface, SurfaceConfiguration, Texture, TextureFormat,
    TextureUsages, TextureView,
};

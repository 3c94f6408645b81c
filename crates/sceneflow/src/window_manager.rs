//! Window Manager
//!
//! Creation and tracking of the main application window and its wgpu
//! surface.

use anyhow::Result;
use sceneflow_render::WgpuBackend;
use std::sync::Arc;
use winit::{
    event_loop::ActiveEventLoop,
    window::{Window, WindowId},
};

/// Context for a single window, containing the `winit` window, `wgpu`
/// surface, and the surface configuration.
pub struct WindowContext {
    /// The `winit` window.
    pub window: Arc<Window>,
    /// The `wgpu` surface associated with the window.
    pub surface: wgpu::Surface<'static>,
    /// The configuration for the `wgpu` surface.
    pub surface_config: wgpu::SurfaceConfiguration,
}

impl WindowContext {
    /// Reconfigure the surface after a resize.
    pub fn resize(&mut self, backend: &WgpuBackend, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&backend.device, &self.surface_config);
    }
}

/// Manages the main application window.
pub struct WindowManager {
    main: Option<WindowContext>,
    main_window_id: Option<WindowId>,
}

impl WindowManager {
    /// Creates a new, empty `WindowManager`.
    pub fn new() -> Self {
        Self {
            main: None,
            main_window_id: None,
        }
    }

    /// Creates the main control window with optional saved geometry.
    pub fn create_main_window(
        &mut self,
        event_loop: &ActiveEventLoop,
        backend: &WgpuBackend,
        width: Option<u32>,
        height: Option<u32>,
        x: Option<i32>,
        y: Option<i32>,
        maximized: bool,
    ) -> Result<()> {
        let default_width = width.unwrap_or(1280);
        let default_height = height.unwrap_or(800);

        let mut attributes = Window::default_attributes()
            .with_title("SceneFlow")
            .with_inner_size(winit::dpi::PhysicalSize::new(default_width, default_height))
            .with_maximized(maximized);

        if let (Some(pos_x), Some(pos_y)) = (x, y) {
            attributes =
                attributes.with_position(winit::dpi::PhysicalPosition::new(pos_x, pos_y));
        }

        let window = Arc::new(event_loop.create_window(attributes)?);
        let window_id = window.id();
        let size = window.inner_size();

        let surface = backend.create_surface(window.clone())?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu::TextureFormat::Bgra8Unorm,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&backend.device, &surface_config);

        self.main = Some(WindowContext {
            window,
            surface,
            surface_config,
        });
        self.main_window_id = Some(window_id);

        Ok(())
    }

    /// The main window context, if created.
    pub fn main(&self) -> Option<&WindowContext> {
        self.main.as_ref()
    }

    /// Mutable main window context, if created.
    pub fn main_mut(&mut self) -> Option<&mut WindowContext> {
        self.main.as_mut()
    }

    /// Whether `id` refers to the main window.
    pub fn is_main(&self, id: WindowId) -> bool {
        self.main_window_id == Some(id)
    }
}

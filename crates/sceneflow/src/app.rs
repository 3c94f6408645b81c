//! Application shell: event loop handling and frame wiring.
//!
//! The shell owns the GUI side of the frame handoff: when the render thread
//! publishes a finished frame, the shell takes it before the next egui pass,
//! binds that buffer as the viewport texture, and acknowledges so the render
//! thread starts producing into the other buffer.

use crate::config::UserConfig;
use crate::window_manager::WindowManager;
use anyhow::{Context as _, Result};
use crossbeam_channel::Receiver;
use sceneflow_core::AppState;
use sceneflow_render::{
    RenderEvent, RenderHandle, RenderThread, TexturePool, ViewportConfig, WgpuBackend,
    VIEWPORT_TARGETS,
};
use sceneflow_transport::{Node, ServiceRequest};
use sceneflow_ui::{AppUI, UiAction, ViewportTexture};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoopProxy};
use winit::window::WindowId;

/// Screenshot trigger service advertised on the transport.
const SCREENSHOT_SERVICE: &str = "/gui/screenshot";

/// Events injected into the winit loop from other threads.
#[derive(Debug)]
pub enum AppEvent {
    /// The render thread published a frame
    FrameReady,
}

/// The main application state.
pub struct App {
    state: AppState,
    user_config: UserConfig,

    backend: WgpuBackend,
    window_manager: WindowManager,
    pool: Arc<TexturePool>,

    node: Option<Node>,
    screenshot_requests: Option<Receiver<ServiceRequest>>,
    proxy: EventLoopProxy<AppEvent>,

    egui_ctx: egui::Context,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,

    ui: AppUI,
    render_handle: Option<RenderHandle>,
    // (pool texture id, egui texture id) per viewport buffer; re-registered
    // whenever the pool reallocates a target.
    viewport_textures: [Option<(u64, egui::TextureId)>; 2],
    current_frame: Option<ViewportTexture>,
}

impl App {
    /// Initialize everything that does not need a live window yet.
    pub fn new(
        state: AppState,
        user_config: UserConfig,
        proxy: EventLoopProxy<AppEvent>,
    ) -> Result<Self> {
        let backend =
            pollster::block_on(WgpuBackend::new()).context("Failed to initialize GPU backend")?;
        let pool = Arc::new(TexturePool::new(backend.device.clone()));

        let node = match Node::connect(&state.viewport.endpoint) {
            Ok(node) => Some(node),
            Err(e) => {
                error!(
                    "Could not reach simulator at {}: {}. Starting with an empty scene.",
                    state.viewport.endpoint, e
                );
                None
            }
        };
        let screenshot_requests = node.as_ref().map(|node| {
            info!("Screenshot service on [{}]", SCREENSHOT_SERVICE);
            node.advertise(SCREENSHOT_SERVICE)
        });

        let screenshot_dir = state
            .settings
            .screenshot_dir
            .clone()
            .unwrap_or_else(sceneflow_ui::panels::screenshot_panel::default_directory);
        let ui = AppUI::new(state.grid, screenshot_dir);

        Ok(Self {
            state,
            user_config,
            backend,
            window_manager: WindowManager::new(),
            pool,
            node,
            screenshot_requests,
            proxy,
            egui_ctx: egui::Context::default(),
            egui_state: None,
            egui_renderer: None,
            ui,
            render_handle: None,
            viewport_textures: [None, None],
            current_frame: None,
        })
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        self.window_manager.create_main_window(
            event_loop,
            &self.backend,
            self.user_config.window_width,
            self.user_config.window_height,
            self.user_config.window_x,
            self.user_config.window_y,
            self.user_config.window_maximized,
        )?;
        let context = self
            .window_manager
            .main()
            .expect("main window just created");

        if self.state.settings.dark_mode {
            self.egui_ctx.set_visuals(egui::Visuals::dark());
        } else {
            self.egui_ctx.set_visuals(egui::Visuals::light());
        }
        self.egui_ctx
            .set_zoom_factor(self.state.settings.ui_scale.max(0.25));

        self.egui_state = Some(egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            context.window.as_ref(),
            None,
            None,
            None,
        ));
        self.egui_renderer = Some(egui_wgpu::Renderer::new(
            &self.backend.device,
            context.surface_config.format,
            egui_wgpu::RendererOptions {
                msaa_samples: 1,
                depth_stencil_format: None,
                dithering: false,
                ..Default::default()
            },
        ));

        let size = context.window.inner_size();
        let proxy = self.proxy.clone();
        let handle = RenderThread::spawn(ViewportConfig {
            settings: self.state.viewport.clone(),
            grid: self.state.grid,
            node: self.node.clone(),
            device: self.backend.device.clone(),
            queue: self.backend.queue.clone(),
            pool: self.pool.clone(),
            width: size.width.max(1),
            height: size.height.max(1),
            notifier: Arc::new(move || {
                let _ = proxy.send_event(AppEvent::FrameReady);
            }),
        });

        // Kick off frame production; afterwards every consumed frame
        // acknowledges the next one.
        handle.render_next();
        self.render_handle = Some(handle);

        context.window.request_redraw();
        Ok(())
    }

    fn drain_render_events(&mut self) {
        let Some(handle) = &self.render_handle else {
            return;
        };
        for event in handle.events().try_iter() {
            match event {
                RenderEvent::ScreenshotSaved(path) => {
                    self.ui
                        .screenshot
                        .set_status(format!("Saved {}", path.display()));
                }
                RenderEvent::ScreenshotFailed(e) => {
                    self.ui.screenshot.set_status(format!("Failed: {e}"));
                }
            }
        }
    }

    fn drain_screenshot_service(&mut self) {
        let Some(requests) = &self.screenshot_requests else {
            return;
        };
        let Some(handle) = &self.render_handle else {
            return;
        };
        for request in requests.try_iter() {
            if let Some(dir) = request.payload.as_str() {
                if !dir.is_empty() {
                    self.ui.screenshot.set_directory(PathBuf::from(dir));
                }
            }
            handle.capture(self.ui.screenshot.directory().to_path_buf());
            request.respond(true);
        }
    }

    // The PrepareNode step: take the pending frame, bind its buffer as the
    // egui texture, and acknowledge so the producer can continue.
    fn consume_pending_frame(&mut self) {
        let Some(handle) = &self.render_handle else {
            return;
        };
        let Some(frame) = handle.take_frame() else {
            return;
        };
        let Some(renderer) = self.egui_renderer.as_mut() else {
            return;
        };
        let Some(view) = self.pool.get_view(VIEWPORT_TARGETS[frame.buffer]) else {
            warn!("Pending frame references a released target");
            return;
        };

        let egui_id = match self.viewport_textures[frame.buffer] {
            Some((pool_id, egui_id)) if pool_id == frame.texture_id => egui_id,
            stale => {
                if let Some((_, old)) = stale {
                    renderer.free_texture(&old);
                }
                let egui_id = renderer.register_native_texture(
                    &self.backend.device,
                    &view,
                    wgpu::FilterMode::Linear,
                );
                self.viewport_textures[frame.buffer] = Some((frame.texture_id, egui_id));
                egui_id
            }
        };

        self.current_frame = Some(ViewportTexture {
            id: egui_id,
            width: frame.width,
            height: frame.height,
        });
        handle.render_next();
    }

    fn apply_actions(&mut self, actions: Vec<UiAction>) {
        let Some(handle) = &self.render_handle else {
            return;
        };
        for action in actions {
            match action {
                UiAction::Grid(command) => handle.grid(command),
                UiAction::ViewportResized(w, h) => handle.resize(w, h),
                UiAction::ViewportMouse { event, drag } => handle.new_mouse_event(event, drag),
                UiAction::TakeScreenshot => {
                    handle.capture(self.ui.screenshot.directory().to_path_buf());
                }
                UiAction::ChangeScreenshotDirectory(dir) => {
                    self.state.settings.screenshot_dir = Some(dir);
                    self.state.dirty = true;
                }
            }
        }
    }

    fn render_frame(&mut self) -> Result<()> {
        self.drain_render_events();
        self.drain_screenshot_service();
        self.consume_pending_frame();

        let device = self.backend.device.clone();
        let queue = self.backend.queue.clone();

        let Some(context) = self.window_manager.main() else {
            return Ok(());
        };
        let (Some(egui_state), Some(egui_renderer)) =
            (self.egui_state.as_mut(), self.egui_renderer.as_mut())
        else {
            return Ok(());
        };

        let raw_input = egui_state.take_egui_input(&context.window);
        let ui = &mut self.ui;
        let current_frame = self.current_frame;
        let mut actions = Vec::new();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            actions = ui.show(ctx, current_frame);
        });

        egui_state.handle_platform_output(&context.window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, self.egui_ctx.pixels_per_point());
        for (id, delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(&device, &queue, *id, delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                context.surface_config.width,
                context.surface_config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("UI Encoder"),
        });
        egui_renderer.update_buffers(&device, &queue, &mut encoder, &tris, &screen_descriptor);

        let surface_texture = match context.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(e) => {
                warn!("Surface frame unavailable: {}", e);
                context
                    .surface
                    .configure(&device, &context.surface_config);
                context.window.request_redraw();
                return Ok(());
            }
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        {
            let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            egui_renderer.render(&mut pass.forget_lifetime(), &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        queue.submit(Some(encoder.finish()));
        context.window.pre_present_notify();
        surface_texture.present();

        let animating = full_output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|v| v.repaint_delay.is_zero());
        if animating {
            context.window.request_redraw();
        }

        self.apply_actions(actions);
        Ok(())
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(context) = self.window_manager.main() {
            let size = context.window.inner_size();
            self.user_config.window_width = Some(size.width);
            self.user_config.window_height = Some(size.height);
            self.user_config.window_maximized = context.window.is_maximized();
            if let Ok(pos) = context.window.outer_position() {
                self.user_config.window_x = Some(pos.x);
                self.user_config.window_y = Some(pos.y);
            }
        }
        if let Err(e) = self.user_config.save() {
            warn!("Failed to save user config: {}", e);
        }

        if let Some(mut handle) = self.render_handle.take() {
            handle.shutdown();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window_manager.main().is_none() {
            if let Err(e) = self.create_window(event_loop) {
                error!("Failed to create main window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if !self.window_manager.is_main(window_id) {
            return;
        }

        // egui gets a look at everything except the lifecycle events below.
        if let (Some(egui_state), Some(context)) =
            (self.egui_state.as_mut(), self.window_manager.main())
        {
            let response = egui_state.on_window_event(&context.window, &event);
            if response.repaint {
                context.window.request_redraw();
            }
        }

        match event {
            WindowEvent::CloseRequested => self.exit(event_loop),
            WindowEvent::Resized(size) => {
                let backend = &self.backend;
                if let Some(context) = self.window_manager.main_mut() {
                    context.resize(backend, size.width, size.height);
                    context.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render_frame() {
                    error!("Frame failed: {}", e);
                }
            }
            _ => {}
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::FrameReady => {
                if let Some(context) = self.window_manager.main() {
                    context.window.request_redraw();
                }
            }
        }
    }
}

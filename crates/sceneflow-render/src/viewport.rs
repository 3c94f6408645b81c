//! Render thread and frame handoff.
//!
//! The render thread is the producer: it renders the mirrored scene into one
//! of two offscreen targets and publishes `(buffer, size)` through the
//! mutex-guarded [`FrameSlot`]. The GUI thread is the consumer: before
//! painting it takes the pending frame, binds that buffer as the viewport
//! texture, and sends `RenderNext` so the producer starts on the other
//! buffer. The cycle is throttled by the GUI's repaint rate.

use crate::camera::OrbitCamera;
use crate::renderer::SceneRenderer;
use crate::scene_graph::SceneGraph;
use crate::scene_manager::SceneManager;
use crate::texture::TexturePool;
use crate::RenderError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use glam::Vec2;
use parking_lot::Mutex;
use sceneflow_core::{Color, GridParams, Pose, ViewportSettings};
use sceneflow_transport::Node;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info};

/// Texture pool names of the two viewport color targets.
pub const VIEWPORT_TARGETS: [&str; 2] = ["viewport-front", "viewport-back"];

/// Color format of the viewport targets.
pub const VIEWPORT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// A finished frame waiting to be picked up by the GUI thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFrame {
    /// Index into [`VIEWPORT_TARGETS`]
    pub buffer: usize,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pool id of the texture, changes whenever the target is reallocated
    pub texture_id: u64,
}

/// Mutex-guarded handoff slot between the render and GUI threads.
///
/// Holds at most one pending frame; publishing replaces an untaken frame, so
/// the consumer always sees the newest one.
#[derive(Default)]
pub struct FrameSlot {
    inner: Mutex<Option<PendingFrame>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer side: make a finished frame available.
    pub fn publish(&self, frame: PendingFrame) {
        *self.inner.lock() = Some(frame);
    }

    /// Consumer side: take the pending frame, leaving the slot empty.
    pub fn take(&self) -> Option<PendingFrame> {
        self.inner.lock().take()
    }
}

/// Mouse buttons held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseButtons {
    pub left: bool,
    pub middle: bool,
    pub right: bool,
}

/// Kind of a viewport mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    Release,
    Move,
    Scroll,
}

/// Pointer event forwarded from the viewport panel, in panel pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    /// Current pointer position
    pub position: Vec2,
    /// Position where the active drag started
    pub press_position: Vec2,
    pub buttons: MouseButtons,
}

// Latest event plus accumulated drag, merged until the render thread
// consumes them once per frame.
#[derive(Default)]
struct MouseQueue {
    event: Option<MouseEvent>,
    drag: Vec2,
    dirty: bool,
}

/// Control messages consumed by the render thread.
pub enum RenderCommand {
    /// Render one frame into the free buffer
    RenderNext,
    /// The viewport panel changed size
    Resize(u32, u32),
    /// Change the reference grid
    Grid(GridCommand),
    /// Capture the next rendered frame into this directory
    Capture(PathBuf),
    /// Tear down GPU resources and exit the thread
    Shutdown,
}

/// Grid edits emitted by the grid panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridCommand {
    CellCount(u32),
    VerticalCellCount(u32),
    CellLength(f32),
    Pose(Pose),
    Color(Color),
    Visible(bool),
}

/// Results reported back to the GUI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    ScreenshotSaved(PathBuf),
    ScreenshotFailed(String),
}

/// Everything the render thread needs at startup.
pub struct ViewportConfig {
    pub settings: ViewportSettings,
    pub grid: GridParams,
    /// Transport connection; `None` leaves the scene empty
    pub node: Option<Node>,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub pool: Arc<TexturePool>,
    pub width: u32,
    pub height: u32,
    /// Called after each published frame to wake the GUI loop
    pub notifier: Arc<dyn Fn() + Send + Sync>,
}

/// GUI-side handle to the render thread.
pub struct RenderHandle {
    control: Sender<RenderCommand>,
    mouse: Arc<Mutex<MouseQueue>>,
    slot: Arc<FrameSlot>,
    events: Receiver<RenderEvent>,
    join: Option<JoinHandle<()>>,
}

impl RenderHandle {
    /// Ask for the next frame (the `TextureInUse` acknowledgement).
    pub fn render_next(&self) {
        let _ = self.control.send(RenderCommand::RenderNext);
    }

    /// Forward a viewport resize.
    pub fn resize(&self, width: u32, height: u32) {
        let _ = self.control.send(RenderCommand::Resize(width, height));
    }

    /// Forward a grid edit.
    pub fn grid(&self, command: GridCommand) {
        let _ = self.control.send(RenderCommand::Grid(command));
    }

    /// Request a screenshot of the next frame.
    pub fn capture(&self, directory: PathBuf) {
        let _ = self.control.send(RenderCommand::Capture(directory));
    }

    /// Merge a pointer event into the queue consumed on the next frame.
    pub fn new_mouse_event(&self, event: MouseEvent, drag: Vec2) {
        let mut queue = self.mouse.lock();
        queue.event = Some(event);
        queue.drag += drag;
        queue.dirty = true;
    }

    /// Consumer side of the frame handoff.
    pub fn take_frame(&self) -> Option<PendingFrame> {
        self.slot.take()
    }

    /// Screenshot results and other notifications.
    pub fn events(&self) -> &Receiver<RenderEvent> {
        &self.events
    }

    /// Stop the render thread and wait for it to tear down.
    pub fn shutdown(&mut self) {
        let _ = self.control.send(RenderCommand::Shutdown);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("Render thread panicked during shutdown");
            }
        }
    }
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The render thread itself.
pub struct RenderThread;

impl RenderThread {
    /// Spawn the render thread and hand back its control handle.
    pub fn spawn(config: ViewportConfig) -> RenderHandle {
        let (control_tx, control_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let mouse = Arc::new(Mutex::new(MouseQueue::default()));
        let slot = Arc::new(FrameSlot::new());

        let thread_mouse = mouse.clone();
        let thread_slot = slot.clone();
        let join = std::thread::Builder::new()
            .name("sceneflow-render".to_string())
            .spawn(move || run(config, control_rx, event_tx, thread_mouse, thread_slot))
            .expect("failed to spawn render thread");

        RenderHandle {
            control: control_tx,
            mouse,
            slot,
            events: event_rx,
            join: Some(join),
        }
    }
}

fn run(
    config: ViewportConfig,
    control: Receiver<RenderCommand>,
    events: Sender<RenderEvent>,
    mouse: Arc<Mutex<MouseQueue>>,
    slot: Arc<FrameSlot>,
) {
    let ViewportConfig {
        settings,
        grid,
        node,
        device,
        queue,
        pool,
        width,
        height,
        notifier,
    } = config;

    info!("Create scene [{}]", settings.scene_name);
    let mut camera = OrbitCamera::from_pose(settings.camera_pose, width, height);
    let mut graph = SceneGraph::new();
    graph.ambient = settings.ambient_light;
    graph.background = settings.background_color;

    let mut renderer = match SceneRenderer::new(device, queue, VIEWPORT_FORMAT, grid) {
        Ok(renderer) => renderer,
        Err(e) => {
            error!("Unable to initialize renderer: {}", e);
            return;
        }
    };

    let usage = wgpu::TextureUsages::RENDER_ATTACHMENT
        | wgpu::TextureUsages::TEXTURE_BINDING
        | wgpu::TextureUsages::COPY_SRC;
    let mut size = (width.max(1), height.max(1));
    for name in VIEWPORT_TARGETS {
        pool.create(name, size.0, size.1, VIEWPORT_FORMAT, usage);
    }

    // Populate the mirror before the first frame; the request blocks this
    // thread, never the GUI.
    let mut manager = SceneManager::new();
    if let (Some(node), false) = (node, settings.scene_service.is_empty()) {
        manager.load(
            settings.scene_service.as_str(),
            settings.pose_topic.as_str(),
            node,
        );
        manager.request(&mut graph);
    }

    let mut back = 0usize;
    let mut size_dirty = false;
    let mut pending_capture: Option<PathBuf> = None;

    while let Ok(command) = control.recv() {
        match command {
            RenderCommand::RenderNext => {
                if size_dirty {
                    for name in VIEWPORT_TARGETS {
                        pool.create(name, size.0, size.1, VIEWPORT_FORMAT, usage);
                    }
                    camera.set_image_size(size.0, size.1);
                    size_dirty = false;
                }

                manager.update(&mut graph);
                handle_mouse(&mouse, &mut camera, &graph);

                let Some(view) = pool.get_view(VIEWPORT_TARGETS[back]) else {
                    error!("Viewport target missing from pool");
                    break;
                };
                renderer.render(&graph, &camera, &view);

                if let Some(directory) = pending_capture.take() {
                    match save_screenshot(&renderer, &pool, back, &directory) {
                        Ok(path) => {
                            info!("Saved image to {:?}", path);
                            let _ = events.send(RenderEvent::ScreenshotSaved(path));
                        }
                        Err(e) => {
                            error!("Screenshot failed: {}", e);
                            let _ = events.send(RenderEvent::ScreenshotFailed(e.to_string()));
                        }
                    }
                }

                let texture_id = pool
                    .get(VIEWPORT_TARGETS[back])
                    .map(|handle| handle.id)
                    .unwrap_or_default();
                slot.publish(PendingFrame {
                    buffer: back,
                    width: size.0,
                    height: size.1,
                    texture_id,
                });
                notifier();

                back = 1 - back;
            }
            RenderCommand::Resize(w, h) => {
                if w > 0 && h > 0 && (w, h) != size {
                    size = (w, h);
                    size_dirty = true;
                }
            }
            RenderCommand::Grid(command) => {
                let mut params = *renderer.grid_params();
                match command {
                    GridCommand::CellCount(v) => params.cell_count = v,
                    GridCommand::VerticalCellCount(v) => params.vertical_cell_count = v,
                    GridCommand::CellLength(v) => params.cell_length = v,
                    GridCommand::Pose(v) => params.pose = v,
                    GridCommand::Color(v) => params.color = v,
                    GridCommand::Visible(v) => {
                        renderer.set_grid_visible(v);
                        continue;
                    }
                }
                renderer.set_grid_params(params);
            }
            RenderCommand::Capture(directory) => {
                pending_capture = Some(directory);
            }
            RenderCommand::Shutdown => break,
        }
    }

    for name in VIEWPORT_TARGETS {
        pool.release(name);
    }
    info!("Render thread stopped");
}

fn save_screenshot(
    renderer: &SceneRenderer,
    pool: &TexturePool,
    buffer: usize,
    directory: &std::path::Path,
) -> Result<PathBuf, RenderError> {
    let handle = pool
        .get(VIEWPORT_TARGETS[buffer])
        .ok_or_else(|| RenderError::Capture("viewport target missing".to_string()))?;
    let image = renderer.capture(&handle.texture)?;

    std::fs::create_dir_all(directory)?;
    let stamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ");
    let path = directory.join(format!("{stamp}.png"));
    image.save(&path)?;
    Ok(path)
}

// One merged pointer update per frame, matching the event semantics of the
// interactive orbit controls: scroll zooms about the point under the cursor,
// left drags pan, middle drags orbit, right drags zoom.
fn handle_mouse(mouse: &Mutex<MouseQueue>, camera: &mut OrbitCamera, graph: &SceneGraph) {
    let (event, drag) = {
        let mut queue = mouse.lock();
        if !queue.dirty {
            return;
        }
        let event = queue.event.take();
        let drag = queue.drag;
        queue.drag = Vec2::ZERO;
        queue.dirty = false;
        match event {
            Some(event) => (event, drag),
            None => return,
        }
    };
    apply_mouse_input(camera, graph, &event, drag);
}

pub(crate) fn apply_mouse_input(
    camera: &mut OrbitCamera,
    graph: &SceneGraph,
    event: &MouseEvent,
    drag: Vec2,
) {
    if event.kind == MouseEventKind::Scroll {
        let target = camera.screen_to_scene(event.position, graph);
        camera.set_target(target);
        let amount = -drag.y * camera.distance_to_target() / 5.0;
        camera.zoom(amount);
        return;
    }

    if drag == Vec2::ZERO {
        let target = camera.screen_to_scene(event.press_position, graph);
        camera.set_target(target);
    }

    if event.buttons.left {
        camera.pan(drag);
    } else if event.buttons.middle {
        camera.orbit(drag);
    } else if event.buttons.right {
        let vfov = camera.vfov();
        let amount = (-drag.y / camera.image_height() as f32)
            * camera.distance_to_target()
            * (vfov / 2.0).tan()
            * 6.0;
        camera.zoom(amount);
    }
}

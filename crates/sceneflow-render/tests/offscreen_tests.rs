//! GPU-backed tests for the offscreen renderer and the render thread.
//!
//! All tests skip gracefully when no adapter is available (headless CI).

use sceneflow_core::{
    Color, Geometry, GridParams, LinkDescription, ModelDescription, Pose, SceneDescription,
    Vec3, ViewportSettings, VisualDescription,
};
use sceneflow_render::scene_graph::SceneGraph;
use sceneflow_render::viewport::{
    RenderEvent, RenderThread, ViewportConfig, VIEWPORT_FORMAT, VIEWPORT_TARGETS,
};
use sceneflow_render::{OrbitCamera, SceneRenderer, TexturePool, WgpuBackend};
use std::sync::Arc;
use std::time::Duration;

fn setup_backend() -> Option<WgpuBackend> {
    match pollster::block_on(WgpuBackend::new()) {
        Ok(backend) => Some(backend),
        Err(e) => {
            eprintln!("SKIP: could not create wgpu backend ({e})");
            None
        }
    }
}

fn single_box_scene() -> SceneDescription {
    SceneDescription {
        name: "one-box".to_string(),
        ambient: Some(Color::grey(0.3)),
        background: Some(Color::new(1.0, 0.0, 0.0, 1.0)),
        models: vec![ModelDescription {
            id: 1,
            name: "m".to_string(),
            pose: None,
            links: vec![LinkDescription {
                id: 2,
                name: "l".to_string(),
                pose: None,
                visuals: vec![VisualDescription {
                    id: 3,
                    name: "v".to_string(),
                    pose: None,
                    geometry: Geometry::Box { size: Vec3::ONE },
                    material: None,
                    transparency: 0.0,
                }],
                lights: vec![],
            }],
            models: vec![],
        }],
        lights: vec![],
    }
}

#[test]
fn test_render_and_capture_clears_to_background() {
    let Some(backend) = setup_backend() else {
        return;
    };
    let pool = TexturePool::new(backend.device.clone());
    let handle = pool.create(
        "capture-target",
        64,
        64,
        VIEWPORT_FORMAT,
        wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
    );

    let mut renderer = SceneRenderer::new(
        backend.device.clone(),
        backend.queue.clone(),
        VIEWPORT_FORMAT,
        GridParams::default(),
    )
    .expect("renderer");

    let mut graph = SceneGraph::new();
    graph.load_scene(&single_box_scene());
    let camera = OrbitCamera::from_pose(
        Pose::from_position_rpy(Vec3::new(-6.0, 0.0, 6.0), 0.0, 0.5, 0.0),
        64,
        64,
    );

    let view = handle.create_view();
    renderer.render(&graph, &camera, &view);

    let image = renderer.capture(&handle.texture).expect("capture");
    assert_eq!(image.dimensions(), (64, 64));

    // The corner pixel is background: red-dominant after sRGB encoding.
    let corner = image.get_pixel(0, 0);
    assert!(corner[0] > 200, "expected red background, got {corner:?}");
    assert!(corner[1] < 64 && corner[2] < 64);
}

#[test]
fn test_render_thread_frame_cycle() {
    let Some(backend) = setup_backend() else {
        return;
    };
    let pool = Arc::new(TexturePool::new(backend.device.clone()));
    let (wake_tx, wake_rx) = crossbeam_channel::unbounded::<()>();

    let mut handle = RenderThread::spawn(ViewportConfig {
        settings: ViewportSettings {
            scene_service: String::new(),
            ..Default::default()
        },
        grid: GridParams::default(),
        node: None,
        device: backend.device.clone(),
        queue: backend.queue.clone(),
        pool: pool.clone(),
        width: 128,
        height: 96,
        notifier: Arc::new(move || {
            let _ = wake_tx.send(());
        }),
    });

    // First frame lands in the front buffer.
    handle.render_next();
    wake_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("first frame notification");
    let first = handle.take_frame().expect("first frame");
    assert_eq!(first.buffer, 0);
    assert_eq!((first.width, first.height), (128, 96));
    assert!(pool.has_texture(VIEWPORT_TARGETS[0]));

    // Acknowledging flips production to the other buffer.
    handle.render_next();
    wake_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("second frame notification");
    let second = handle.take_frame().expect("second frame");
    assert_eq!(second.buffer, 1);

    // A resize is applied before the next frame is produced.
    handle.resize(200, 150);
    handle.render_next();
    wake_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("resized frame notification");
    let resized = handle.take_frame().expect("resized frame");
    assert_eq!((resized.width, resized.height), (200, 150));
    assert_ne!(resized.texture_id, second.texture_id);

    handle.shutdown();
    // Targets are released on the way out.
    assert!(!pool.has_texture(VIEWPORT_TARGETS[0]));
}

#[test]
fn test_render_thread_screenshot() {
    let Some(backend) = setup_backend() else {
        return;
    };
    let pool = Arc::new(TexturePool::new(backend.device.clone()));
    let (wake_tx, wake_rx) = crossbeam_channel::unbounded::<()>();
    let shots = tempfile::tempdir().expect("tempdir");

    let mut handle = RenderThread::spawn(ViewportConfig {
        settings: ViewportSettings {
            scene_service: String::new(),
            ..Default::default()
        },
        grid: GridParams::default(),
        node: None,
        device: backend.device.clone(),
        queue: backend.queue.clone(),
        pool,
        width: 64,
        height: 64,
        notifier: Arc::new(move || {
            let _ = wake_tx.send(());
        }),
    });

    handle.capture(shots.path().to_path_buf());
    handle.render_next();
    wake_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("frame notification");

    match handle
        .events()
        .recv_timeout(Duration::from_secs(10))
        .expect("screenshot event")
    {
        RenderEvent::ScreenshotSaved(path) => {
            assert!(path.exists());
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
            let image = image::open(&path).expect("readable png");
            assert_eq!(image.width(), 64);
        }
        RenderEvent::ScreenshotFailed(e) => panic!("screenshot failed: {e}"),
    }

    handle.shutdown();
}

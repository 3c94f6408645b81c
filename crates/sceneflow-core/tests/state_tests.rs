use sceneflow_core::state::{AppSettings, AppState};
use sceneflow_core::{Color, GridParams, Pose, Vec3};

#[test]
fn test_app_state_new() {
    let state = AppState::new("Warehouse Sim");
    assert_eq!(state.name, "Warehouse Sim");
    assert_eq!(state.version, "0.1.0");
}

#[test]
fn test_app_state_serialization() {
    let mut state = AppState::default();
    state.name = "Serialization Test".to_string();
    state.viewport.pose_topic = "/world/pose".to_string();
    state.grid = GridParams {
        cell_count: 40,
        cell_length: 0.25,
        ..Default::default()
    };

    let json = serde_json::to_string(&state).expect("Failed to serialize AppState");
    let deserialized: AppState =
        serde_json::from_str(&json).expect("Failed to deserialize AppState");

    assert_eq!(state.name, deserialized.name);
    assert_eq!(state.viewport.pose_topic, deserialized.viewport.pose_topic);
    assert_eq!(state, deserialized);
}

#[test]
fn test_app_state_partial_file_fills_defaults() {
    // Old or hand-written project files may only carry a subset of fields.
    let json = r#"{ "name": "Minimal", "version": "0.1.0" }"#;
    let state: AppState = serde_json::from_str(json).expect("Failed to parse minimal project");

    assert_eq!(state.name, "Minimal");
    assert_eq!(state.viewport.scene_service, "/scene");
    assert_eq!(state.grid, GridParams::default());
    assert_eq!(state.settings, AppSettings::default());
}

#[test]
fn test_app_state_file_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("project.json");

    let mut state = AppState::new("Disk Roundtrip");
    state.viewport.camera_pose = Pose::from_translation(Vec3::new(1.0, 2.0, 3.0));
    state.grid.color = Color::new(0.1, 0.9, 0.1, 1.0);
    state.save(&path).expect("save project");

    let loaded = AppState::load(&path).expect("load project");
    assert_eq!(loaded, state);
}

#[test]
fn test_app_state_load_rejects_invalid_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, b"{ not json").expect("write file");

    assert!(AppState::load(&path).is_err());
}

//! SceneFlow - Live viewport and plugin panels for a remote 3D simulation.

#![warn(missing_docs)]

mod app;
mod config;
mod logging_setup;
mod window_manager;

use anyhow::{Context, Result};
use app::{App, AppEvent};
use config::UserConfig;
use sceneflow_core::AppState;
use tracing::{info, warn};
use winit::event_loop::EventLoop;

fn main() -> Result<()> {
    let project_path = std::env::args().nth(1);

    let mut user_config = UserConfig::load();

    let state = match project_path.as_deref() {
        Some(path) => {
            let state = AppState::load(std::path::Path::new(path))
                .with_context(|| format!("Failed to load project {path}"))?;
            user_config.last_project = Some(path.to_string());
            state
        }
        None => AppState::default(),
    };

    let _log_guard = logging_setup::init(&state.settings.log_config)?;
    info!(
        "Starting SceneFlow, project '{}', simulator endpoint {}",
        state.name, state.viewport.endpoint
    );

    let event_loop = EventLoop::<AppEvent>::with_user_event()
        .build()
        .context("Failed to create event loop")?;
    let proxy = event_loop.create_proxy();

    let mut app = App::new(state, user_config, proxy)?;
    event_loop.run_app(&mut app)?;

    warn!("Event loop ended");
    Ok(())
}

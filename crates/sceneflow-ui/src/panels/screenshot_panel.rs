//! Screenshot panel.
//!
//! A capture button plus the target directory. The actual capture runs on
//! the render thread against the next finished frame; results come back as
//! render events and are surfaced here as a status line.

use crate::UiAction;
use egui::Ui;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Resolve the screenshot directory under `base`, creating it if needed.
/// Falls back to the parent directory when creation fails.
pub fn resolve_directory(base: &Path) -> PathBuf {
    let dir = base.join("sceneflow").join("pictures");
    match std::fs::create_dir_all(&dir) {
        Ok(()) => dir,
        Err(e) => {
            let fallback = base.join("sceneflow");
            error!(
                "Unable to create directory {:?}: {}. Changing default directory to: {:?}",
                dir, e, fallback
            );
            fallback
        }
    }
}

/// Default screenshot directory in the user's pictures (or home) folder.
pub fn default_directory() -> PathBuf {
    let base = dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    resolve_directory(&base)
}

/// Panel state for the screenshot plugin.
pub struct ScreenshotPanel {
    directory: PathBuf,
    status: Option<String>,
}

impl ScreenshotPanel {
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            status: None,
        }
    }

    /// Directory screenshots are saved into.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Change the directory (also used when the service overrides it).
    pub fn set_directory(&mut self, directory: PathBuf) {
        self.directory = directory;
    }

    /// Show the result of the latest capture.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    /// Draw the panel and collect capture/directory actions.
    pub fn show(&mut self, ui: &mut Ui) -> Vec<UiAction> {
        let mut actions = Vec::new();

        ui.heading("Screenshot");

        if ui.button("\u{1f4f7} Take screenshot").clicked() {
            actions.push(UiAction::TakeScreenshot);
        }

        ui.horizontal(|ui| {
            ui.label("Folder:");
            ui.monospace(self.directory.display().to_string());
        });

        if ui.button("Change folder...").clicked() {
            match rfd::FileDialog::new()
                .set_directory(&self.directory)
                .pick_folder()
            {
                Some(dir) => {
                    self.directory = dir.clone();
                    actions.push(UiAction::ChangeScreenshotDirectory(dir));
                }
                None => warn!("Screenshot directory selection cancelled"),
            }
        }

        if let Some(status) = &self.status {
            ui.small(status);
        }

        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_directory_creates_tree() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = resolve_directory(tmp.path());
        assert!(dir.ends_with("sceneflow/pictures"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_resolve_directory_falls_back_when_blocked() {
        let tmp = tempfile::tempdir().expect("tempdir");
        // Occupy the target path with a file so create_dir_all fails.
        std::fs::create_dir_all(tmp.path().join("sceneflow")).expect("mkdir");
        std::fs::write(tmp.path().join("sceneflow").join("pictures"), b"x").expect("write");

        let dir = resolve_directory(tmp.path());
        assert!(dir.ends_with("sceneflow"));
    }

    #[test]
    fn test_status_updates() {
        let mut panel = ScreenshotPanel::new(PathBuf::from("/tmp"));
        assert!(panel.status.is_none());
        panel.set_status("Saved");
        assert_eq!(panel.status.as_deref(), Some("Saved"));
    }
}

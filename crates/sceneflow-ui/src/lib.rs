//! SceneFlow UI - Panels and Widgets
//!
//! egui panels for the application shell: the live viewport, the grid
//! property panel, and the screenshot panel, plus the collapsible widget
//! chrome they share. Panels never touch render state directly; they emit
//! [`UiAction`]s that the application routes to the render thread.

use glam::Vec2;
use sceneflow_render::{GridCommand, MouseEvent};
use std::path::PathBuf;

pub mod panels;
pub mod widgets;

pub use panels::grid_panel::GridPanel;
pub use panels::screenshot_panel::ScreenshotPanel;
pub use panels::viewport_panel::ViewportPanel;
pub use widgets::collapsible::CollapsibleSection;

/// Requests emitted by the panels, applied by the application shell.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Edit the reference grid
    Grid(GridCommand),
    /// The viewport panel rect changed
    ViewportResized(u32, u32),
    /// Pointer interaction inside the viewport
    ViewportMouse {
        event: MouseEvent,
        drag: Vec2,
    },
    /// Capture the next rendered frame
    TakeScreenshot,
    /// Save future screenshots somewhere else
    ChangeScreenshotDirectory(PathBuf),
}

/// Viewport texture as registered with egui for the current frame.
#[derive(Debug, Clone, Copy)]
pub struct ViewportTexture {
    pub id: egui::TextureId,
    pub width: u32,
    pub height: u32,
}

/// Top level UI state: one instance per application window.
pub struct AppUI {
    pub viewport: ViewportPanel,
    pub grid: GridPanel,
    pub screenshot: ScreenshotPanel,
}

impl AppUI {
    pub fn new(grid: sceneflow_core::GridParams, screenshot_dir: PathBuf) -> Self {
        Self {
            viewport: ViewportPanel::new(),
            grid: GridPanel::new(grid),
            screenshot: ScreenshotPanel::new(screenshot_dir),
        }
    }

    /// Lay out all panels and collect their actions.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        texture: Option<ViewportTexture>,
    ) -> Vec<UiAction> {
        let mut actions = Vec::new();

        egui::SidePanel::right("inspector")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    actions.extend(self.grid.show(ui));
                    ui.separator();
                    actions.extend(self.screenshot.show(ui));
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                actions.extend(self.viewport.show(ui, texture));
            });

        actions
    }
}

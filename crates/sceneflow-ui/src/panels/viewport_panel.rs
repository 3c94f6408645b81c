//! Live viewport panel.
//!
//! Displays the most recent frame from the render thread and converts
//! pointer interaction into viewport mouse events: left drag pans, middle
//! drag orbits, right drag zooms, scroll zooms about the cursor.

use crate::{UiAction, ViewportTexture};
use egui::{PointerButton, Sense, Ui};
use glam::Vec2;
use sceneflow_render::{MouseButtons, MouseEvent, MouseEventKind};

/// Panel state for the render viewport.
#[derive(Default)]
pub struct ViewportPanel {
    last_size: Option<(u32, u32)>,
    press_position: Vec2,
}

impl ViewportPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the panel and collect resize/mouse actions.
    pub fn show(&mut self, ui: &mut Ui, texture: Option<ViewportTexture>) -> Vec<UiAction> {
        let mut actions = Vec::new();

        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, Sense::click_and_drag());

        let size = (
            rect.width().round().max(1.0) as u32,
            rect.height().round().max(1.0) as u32,
        );
        if self.last_size != Some(size) {
            self.last_size = Some(size);
            actions.push(UiAction::ViewportResized(size.0, size.1));
        }

        match texture {
            Some(texture) => {
                ui.painter().image(
                    texture.id,
                    rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            None => {
                ui.painter()
                    .rect_filled(rect, 0.0, egui::Color32::from_gray(24));
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "No scene",
                    egui::FontId::proportional(14.0),
                    egui::Color32::GRAY,
                );
            }
        }

        let to_local = |pos: egui::Pos2| Vec2::new(pos.x - rect.min.x, pos.y - rect.min.y);
        let buttons = ui.input(|i| MouseButtons {
            left: i.pointer.button_down(PointerButton::Primary),
            middle: i.pointer.button_down(PointerButton::Middle),
            right: i.pointer.button_down(PointerButton::Secondary),
        });

        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.press_position = to_local(pos);
                actions.push(UiAction::ViewportMouse {
                    event: MouseEvent {
                        kind: MouseEventKind::Press,
                        position: self.press_position,
                        press_position: self.press_position,
                        buttons,
                    },
                    drag: Vec2::ZERO,
                });
            }
        }

        if response.dragged() {
            let delta = response.drag_delta();
            if delta != egui::Vec2::ZERO {
                let position = response
                    .interact_pointer_pos()
                    .map(to_local)
                    .unwrap_or(self.press_position);
                actions.push(UiAction::ViewportMouse {
                    event: MouseEvent {
                        kind: MouseEventKind::Move,
                        position,
                        press_position: self.press_position,
                        buttons,
                    },
                    drag: Vec2::new(delta.x, delta.y),
                });
            }
        }

        if response.drag_stopped() {
            let position = response
                .interact_pointer_pos()
                .map(to_local)
                .unwrap_or(self.press_position);
            actions.push(UiAction::ViewportMouse {
                event: MouseEvent {
                    kind: MouseEventKind::Release,
                    position,
                    press_position: self.press_position,
                    buttons,
                },
                drag: Vec2::ZERO,
            });
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                // Scroll up moves closer; the render side scales by distance.
                let step = if scroll > 0.0 { -1.0 } else { 1.0 };
                let position = response
                    .hover_pos()
                    .map(to_local)
                    .unwrap_or(self.press_position);
                actions.push(UiAction::ViewportMouse {
                    event: MouseEvent {
                        kind: MouseEventKind::Scroll,
                        position,
                        press_position: position,
                        buttons,
                    },
                    drag: Vec2::new(step, step),
                });
            }
        }

        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_show_reports_size() {
        let mut panel = ViewportPanel::new();
        let ctx = egui::Context::default();
        let mut actions = Vec::new();
        let _ = ctx.run(Default::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                actions = panel.show(ui, None);
            });
        });

        assert!(matches!(
            actions.first(),
            Some(UiAction::ViewportResized(w, h)) if *w > 0 && *h > 0
        ));

        // A second pass with the same rect stays quiet.
        let mut actions = Vec::new();
        let _ = ctx.run(Default::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                actions = panel.show(ui, None);
            });
        });
        assert!(actions.is_empty());
    }
}

//! Grid display panel.
//!
//! Property editors for the reference grid, wrapped in a collapsible
//! section. Every edit emits a [`GridCommand`]; the grid itself lives on the
//! render thread. Hiding the grid makes it transparent rather than removing
//! it.

use crate::widgets::{pose_edit, CollapsibleSection};
use crate::UiAction;
use egui::{DragValue, Ui};
use sceneflow_core::GridParams;
use sceneflow_render::GridCommand;

/// Panel state for the grid plugin.
pub struct GridPanel {
    params: GridParams,
    visible: bool,
    section: CollapsibleSection,
}

impl GridPanel {
    pub fn new(params: GridParams) -> Self {
        Self {
            params,
            visible: true,
            section: CollapsibleSection::new("Grid").with_index(0),
        }
    }

    /// Current (panel-side) grid parameters.
    pub fn params(&self) -> &GridParams {
        &self.params
    }

    /// Draw the panel and collect grid edits.
    pub fn show(&mut self, ui: &mut Ui) -> Vec<UiAction> {
        let mut actions = Vec::new();
        let Self {
            params,
            visible,
            section,
        } = self;

        if ui.checkbox(visible, "Show grid").changed() {
            actions.push(UiAction::Grid(GridCommand::Visible(*visible)));
        }

        section.show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label("Horizontal cell count");
                if ui.add(DragValue::new(&mut params.cell_count)).changed() {
                    actions.push(UiAction::Grid(GridCommand::CellCount(params.cell_count)));
                }
            });

            ui.horizontal(|ui| {
                ui.label("Vertical cell count");
                if ui
                    .add(DragValue::new(&mut params.vertical_cell_count))
                    .changed()
                {
                    actions.push(UiAction::Grid(GridCommand::VerticalCellCount(
                        params.vertical_cell_count,
                    )));
                }
            });

            ui.horizontal(|ui| {
                ui.label("Cell length");
                if ui
                    .add(
                        DragValue::new(&mut params.cell_length)
                            .speed(0.05)
                            .range(0.001..=f32::MAX),
                    )
                    .changed()
                {
                    actions.push(UiAction::Grid(GridCommand::CellLength(params.cell_length)));
                }
            });

            if pose_edit(ui, &mut params.pose) {
                actions.push(UiAction::Grid(GridCommand::Pose(params.pose)));
            }

            ui.horizontal(|ui| {
                ui.label("Color");
                let mut rgba = params.color.to_array();
                if ui.color_edit_button_rgba_unmultiplied(&mut rgba).changed() {
                    params.color = sceneflow_core::Color::new(rgba[0], rgba[1], rgba[2], rgba[3]);
                    actions.push(UiAction::Grid(GridCommand::Color(params.color)));
                }
            });
        });

        actions
    }
}

//! Collapsible section chrome.
//!
//! A full-width header button with a ▲/▼ state icon toggles the visibility
//! of the content below it. Sections stacked in a list pass their index so
//! the first one keeps a flush top edge.

use egui::{Align2, FontId, Pos2, Sense, Ui, Vec2};

/// Expanded/collapsed state plus chrome for one section.
pub struct CollapsibleSection {
    title: String,
    expanded: bool,
    index: Option<usize>,
    enabled: bool,
}

impl CollapsibleSection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            expanded: false,
            index: None,
            enabled: true,
        }
    }

    /// Position within a list of sections; the first suppresses its top
    /// margin when expanded.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// A section with no content renders disabled and cannot expand.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.expanded = false;
        }
    }

    /// Whether the content is currently shown.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Rename the section header.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Draw the header and, when expanded, the content.
    pub fn show(&mut self, ui: &mut Ui, add_contents: impl FnOnce(&mut Ui)) {
        if self.expanded && self.index != Some(0) {
            ui.add_space(16.0);
        }

        let sense = if self.enabled {
            Sense::click()
        } else {
            Sense::hover()
        };
        let desired_size = Vec2::new(ui.available_width(), 24.0);
        let (rect, response) = ui.allocate_at_least(desired_size, sense);

        let visuals = ui.style().interact(&response);
        let painter = ui.painter();
        painter.rect_filled(rect, 2.0, visuals.bg_fill);

        let text_color = if self.enabled {
            visuals.text_color()
        } else {
            ui.visuals().weak_text_color()
        };
        painter.text(
            Pos2::new(rect.min.x + 8.0, rect.center().y),
            Align2::LEFT_CENTER,
            &self.title,
            FontId::proportional(14.0),
            text_color,
        );
        // ▼ while expanded, ▲ while collapsed.
        let icon = if self.expanded { "\u{25bc}" } else { "\u{25b2}" };
        painter.text(
            Pos2::new(rect.max.x - 8.0, rect.center().y),
            Align2::RIGHT_CENTER,
            icon,
            FontId::proportional(12.0),
            text_color,
        );

        if self.enabled && response.clicked() {
            self.expanded = !self.expanded;
        }

        if self.expanded {
            add_contents(ui);
            ui.add_space(16.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_ui(section: &mut CollapsibleSection, ran: &mut bool) {
        let ctx = egui::Context::default();
        let _ = ctx.run(Default::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                section.show(ui, |_| {
                    *ran = true;
                });
            });
        });
    }

    #[test]
    fn test_starts_collapsed_and_hides_content() {
        let mut section = CollapsibleSection::new("grid");
        assert!(!section.is_expanded());

        let mut ran = false;
        run_ui(&mut section, &mut ran);
        assert!(!ran);
    }

    #[test]
    fn test_expanded_section_shows_content() {
        let mut section = CollapsibleSection::new("grid");
        section.expanded = true;

        let mut ran = false;
        run_ui(&mut section, &mut ran);
        assert!(ran);
    }

    #[test]
    fn test_disabling_collapses() {
        let mut section = CollapsibleSection::new("grid");
        section.expanded = true;
        section.set_enabled(false);
        assert!(!section.is_expanded());
    }
}

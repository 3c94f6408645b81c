//! Grid display parameters.

use crate::{Color, Pose};
use serde::{Deserialize, Serialize};

// Defaults shared between the panel and deserialization.
const DEFAULT_CELL_COUNT: u32 = 20;
const DEFAULT_VERTICAL_CELL_COUNT: u32 = 0;
const DEFAULT_CELL_LENGTH: f32 = 1.0;
const DEFAULT_COLOR: Color = Color::new(0.7, 0.7, 0.7, 1.0);

/// Configuration for the reference grid shown in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    /// Number of cells in the horizontal plane
    #[serde(default = "default_cell_count")]
    pub cell_count: u32,
    /// Number of cells stacked vertically
    #[serde(default)]
    pub vertical_cell_count: u32,
    /// Cell side length, horizontal and vertical
    #[serde(default = "default_cell_length")]
    pub cell_length: f32,
    /// Grid pose in the world
    #[serde(default)]
    pub pose: Pose,
    /// Grid line color
    #[serde(default = "default_color")]
    pub color: Color,
}

fn default_cell_count() -> u32 {
    DEFAULT_CELL_COUNT
}

fn default_cell_length() -> f32 {
    DEFAULT_CELL_LENGTH
}

fn default_color() -> Color {
    DEFAULT_COLOR
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            cell_count: DEFAULT_CELL_COUNT,
            vertical_cell_count: DEFAULT_VERTICAL_CELL_COUNT,
            cell_length: DEFAULT_CELL_LENGTH,
            pose: Pose::IDENTITY,
            color: DEFAULT_COLOR,
        }
    }
}

impl GridParams {
    /// Half extent of the grid in the horizontal plane
    pub fn half_extent(&self) -> f32 {
        self.cell_count as f32 * self.cell_length / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_defaults() {
        let grid = GridParams::default();
        assert_eq!(grid.cell_count, 20);
        assert_eq!(grid.vertical_cell_count, 0);
        assert_eq!(grid.cell_length, 1.0);
        assert_eq!(grid.pose, Pose::IDENTITY);
        assert_eq!(grid.color, Color::new(0.7, 0.7, 0.7, 1.0));
    }

    #[test]
    fn test_grid_partial_deserialization_fills_defaults() {
        let grid: GridParams = serde_json::from_str(r#"{ "cell_count": 8 }"#).expect("parse grid");
        assert_eq!(grid.cell_count, 8);
        assert_eq!(grid.cell_length, 1.0);
        assert_eq!(grid.color, Color::new(0.7, 0.7, 0.7, 1.0));
    }

    #[test]
    fn test_grid_half_extent() {
        let grid = GridParams {
            cell_count: 10,
            cell_length: 0.5,
            ..Default::default()
        };
        assert_eq!(grid.half_extent(), 2.5);
    }
}

//! Pose and color math shared across the workspace.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Rigid transform: a position and an orientation.
///
/// Composition follows the simulator's convention: `a * b` applies `b` in
/// `a`'s frame, so a stream pose composed with a geometry-local pose is
/// written `stream * local`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Translation component
    pub position: Vec3,
    /// Rotation component
    pub rotation: Quat,
}

impl Pose {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Create a pose from a position and a rotation
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Create a pose from a translation only
    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Create a pose from position and roll/pitch/yaw angles in radians
    pub fn from_position_rpy(position: Vec3, roll: f32, pitch: f32, yaw: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_euler(glam::EulerRot::ZYX, yaw, pitch, roll),
        }
    }

    /// Transform a point from this pose's local frame into the parent frame
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * point
    }

    /// Matrix form of this transform
    pub fn to_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        Pose {
            position: self.transform_point(rhs.position),
            rotation: (self.rotation * rhs.rotation).normalize(),
        }
    }
}

/// Linear RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel, 0.0 - 1.0
    pub r: f32,
    /// Green channel, 0.0 - 1.0
    pub g: f32,
    /// Blue channel, 0.0 - 1.0
    pub b: f32,
    /// Alpha channel, 0.0 - 1.0
    pub a: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Create a color from channel values
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque grey with the same value on all channels
    pub const fn grey(v: f32) -> Self {
        Self::new(v, v, v, 1.0)
    }

    /// Channels as an array, RGBA order
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Return this color with a replaced alpha channel
    pub fn with_alpha(&self, a: f32) -> Self {
        Self { a, ..*self }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_identity_composition() {
        let p = Pose::from_position_rpy(Vec3::new(1.0, 2.0, 3.0), 0.1, 0.2, 0.3);
        let left = Pose::IDENTITY * p;
        let right = p * Pose::IDENTITY;
        assert!(left.position.abs_diff_eq(p.position, 1e-6));
        assert!(right.position.abs_diff_eq(p.position, 1e-6));
        assert!(left.rotation.abs_diff_eq(p.rotation, 1e-6));
        assert!(right.rotation.abs_diff_eq(p.rotation, 1e-6));
    }

    #[test]
    fn test_pose_composition_applies_rhs_in_lhs_frame() {
        // Rotate 90 degrees about Z, then step one unit along local X.
        let a = Pose::from_position_rpy(Vec3::ZERO, 0.0, 0.0, std::f32::consts::FRAC_PI_2);
        let b = Pose::from_translation(Vec3::X);
        let c = a * b;
        assert!(c.position.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_transform_point_matches_matrix() {
        let pose = Pose::from_position_rpy(Vec3::new(0.5, -1.0, 2.0), 0.3, 0.0, 1.2);
        let p = Vec3::new(1.0, 2.0, -0.5);
        let direct = pose.transform_point(p);
        let via_matrix = pose.to_matrix().transform_point3(p);
        assert!(direct.abs_diff_eq(via_matrix, 1e-5));
    }

    #[test]
    fn test_color_defaults_and_alpha() {
        assert_eq!(Color::default(), Color::WHITE);
        let c = Color::grey(0.7).with_alpha(0.25);
        assert_eq!(c.to_array(), [0.7, 0.7, 0.7, 0.25]);
    }
}

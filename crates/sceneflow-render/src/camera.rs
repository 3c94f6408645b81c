//! Orbit camera for the viewport.

use crate::scene_graph::SceneGraph;
use glam::{Mat4, Vec2, Vec3};
use sceneflow_core::Pose;

// Keep look_at well-defined: never let the eye reach the vertical axis.
const MAX_ELEVATION: f32 = 1.55;

/// User camera orbiting a focus target.
///
/// The world is Z-up with X as the camera's forward axis, matching the
/// simulator's convention.
pub struct OrbitCamera {
    /// Focus target the camera orbits
    pub target: Vec3,
    azimuth: f32,
    elevation: f32,
    distance: f32,
    width: u32,
    height: u32,
    /// Horizontal field of view in radians
    pub hfov: f32,
    near: f32,
    far: f32,
}

impl OrbitCamera {
    /// Place the camera at `pose`, focusing where its forward ray crosses the
    /// ground plane (10 m ahead when it never does).
    pub fn from_pose(pose: Pose, width: u32, height: u32) -> Self {
        let eye = pose.position;
        let forward = (pose.rotation * Vec3::X).normalize_or_zero();
        let t = if forward.z < -1e-4 {
            (-eye.z / forward.z).clamp(0.1, 1000.0)
        } else {
            10.0
        };
        let target = eye + forward * t;

        let mut camera = Self {
            target,
            azimuth: 0.0,
            elevation: 0.0,
            distance: 1.0,
            width: width.max(1),
            height: height.max(1),
            hfov: std::f32::consts::FRAC_PI_2,
            near: 0.1,
            far: 1000.0,
        };
        camera.set_eye(eye);
        camera
    }

    fn set_eye(&mut self, eye: Vec3) {
        let offset = eye - self.target;
        self.distance = offset.length().max(0.1);
        self.elevation = (offset.z / self.distance)
            .clamp(-1.0, 1.0)
            .asin()
            .clamp(-MAX_ELEVATION, MAX_ELEVATION);
        self.azimuth = offset.y.atan2(offset.x);
    }

    /// Move the focus target, keeping the camera itself in place.
    pub fn set_target(&mut self, target: Vec3) {
        let eye = self.eye();
        self.target = target;
        self.set_eye(eye);
    }

    /// Camera position in world space.
    pub fn eye(&self) -> Vec3 {
        let (sin_e, cos_e) = self.elevation.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + self.distance * Vec3::new(cos_e * cos_a, cos_e * sin_a, sin_e)
    }

    /// Distance from the eye to the focus target.
    pub fn distance_to_target(&self) -> f32 {
        self.distance
    }

    /// Rendered image width in pixels.
    pub fn image_width(&self) -> u32 {
        self.width
    }

    /// Rendered image height in pixels.
    pub fn image_height(&self) -> u32 {
        self.height
    }

    /// Update the rendered image size; the aspect ratio follows.
    pub fn set_image_size(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Vertical field of view derived from the horizontal one.
    pub fn vfov(&self) -> f32 {
        2.0 * ((self.hfov / 2.0).tan() / self.aspect_ratio()).atan()
    }

    /// View matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Z)
    }

    /// Projection matrix (0..1 depth range).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.vfov(), self.aspect_ratio(), self.near, self.far)
    }

    /// Combined view-projection matrix.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Translate the focus target in the view plane (left-button drag).
    pub fn pan(&mut self, drag: Vec2) {
        let view = self.view_matrix();
        let right = Vec3::new(view.x_axis.x, view.y_axis.x, view.z_axis.x);
        let up = Vec3::new(view.x_axis.y, view.y_axis.y, view.z_axis.y);

        // World units per pixel at the target's depth.
        let units_per_pixel = 2.0 * self.distance * (self.vfov() / 2.0).tan() / self.height as f32;
        self.target -= right * drag.x * units_per_pixel;
        self.target += up * drag.y * units_per_pixel;
    }

    /// Rotate about the focus target (middle-button drag).
    pub fn orbit(&mut self, drag: Vec2) {
        self.azimuth -= drag.x * std::f32::consts::TAU / self.width as f32;
        self.elevation = (self.elevation + drag.y * std::f32::consts::PI / self.height as f32)
            .clamp(-MAX_ELEVATION, MAX_ELEVATION);
    }

    /// Move toward (positive) or away from (negative) the focus target.
    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance - amount).clamp(0.1, self.far);
    }

    /// Project a pixel position into the scene: the closest visual hit along
    /// the camera ray, or the point 10 m along the ray when nothing is hit.
    pub fn screen_to_scene(&self, pos: Vec2, graph: &SceneGraph) -> Vec3 {
        let (origin, dir) = self.pixel_ray(pos);
        graph
            .intersect_ray(origin, dir)
            .unwrap_or(origin + dir * 10.0)
    }

    /// World-space ray through a pixel.
    pub fn pixel_ray(&self, pos: Vec2) -> (Vec3, Vec3) {
        let nx = 2.0 * pos.x / self.width as f32 - 1.0;
        let ny = 1.0 - 2.0 * pos.y / self.height as f32;

        let inv = self.view_projection().inverse();
        let near = inv.project_point3(Vec3::new(nx, ny, 0.0));
        let far = inv.project_point3(Vec3::new(nx, ny, 1.0));
        let dir = (far - near).normalize_or_zero();
        (self.eye(), dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sceneflow_core::{Geometry, Pose};

    fn test_camera() -> OrbitCamera {
        let pose = Pose::from_position_rpy(Vec3::new(-6.0, 0.0, 6.0), 0.0, 0.5, 0.0);
        OrbitCamera::from_pose(pose, 800, 600)
    }

    #[test]
    fn test_from_pose_focuses_ground_plane() {
        let camera = test_camera();
        // The pitched-down camera crosses z = 0 in front of it.
        assert!(camera.target.z.abs() < 1e-3);
        assert!(camera.target.x > -6.0);
        assert!(camera.eye().abs_diff_eq(Vec3::new(-6.0, 0.0, 6.0), 1e-3));
    }

    #[test]
    fn test_matrices_are_finite() {
        let camera = test_camera();
        let vp = camera.view_projection();
        assert!(vp.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = test_camera();
        let (origin, dir) = camera.pixel_ray(Vec2::new(400.0, 300.0));
        let to_target = (camera.target - origin).normalize();
        assert!(dir.abs_diff_eq(to_target, 1e-3));
    }

    #[test]
    fn test_screen_to_scene_falls_back_to_ray_point() {
        let camera = test_camera();
        let graph = SceneGraph::new();
        let point = camera.screen_to_scene(Vec2::new(400.0, 300.0), &graph);
        assert!((point - camera.eye()).length() - 10.0 < 1e-3);
    }

    #[test]
    fn test_screen_to_scene_hits_visual() {
        let mut graph = SceneGraph::new();
        let camera = test_camera();
        // A unit sphere at the focus target must intercept the center ray.
        graph.load_scene(&sceneflow_core::SceneDescription {
            name: "t".to_string(),
            ambient: None,
            background: None,
            models: vec![sceneflow_core::ModelDescription {
                id: 1,
                name: "m".to_string(),
                pose: Some(Pose::from_translation(camera.target)),
                links: vec![sceneflow_core::LinkDescription {
                    id: 2,
                    name: "l".to_string(),
                    pose: None,
                    visuals: vec![sceneflow_core::VisualDescription {
                        id: 3,
                        name: "v".to_string(),
                        pose: None,
                        geometry: Geometry::Sphere { radius: 0.5 },
                        material: None,
                        transparency: 0.0,
                    }],
                    lights: vec![],
                }],
                models: vec![],
            }],
            lights: vec![],
        });

        let point = camera.screen_to_scene(Vec2::new(400.0, 300.0), &graph);
        let fallback = camera.eye() + (camera.target - camera.eye()).normalize() * 10.0;
        assert!(!point.abs_diff_eq(fallback, 1e-3));
        // The hit sits on the near side of the visual's bounding sphere.
        assert!((point - camera.target).length() <= 0.87);
    }

    #[test]
    fn test_pan_moves_target_orbit_keeps_distance() {
        let mut camera = test_camera();
        let before = camera.target;
        camera.pan(Vec2::new(40.0, 0.0));
        assert!(!camera.target.abs_diff_eq(before, 1e-6));

        let d = camera.distance_to_target();
        camera.orbit(Vec2::new(100.0, 25.0));
        assert!((camera.distance_to_target() - d).abs() < 1e-5);
    }

    #[test]
    fn test_zoom_clamps_at_minimum_distance() {
        let mut camera = test_camera();
        camera.zoom(1.0e6);
        assert!((camera.distance_to_target() - 0.1).abs() < 1e-6);
    }
}

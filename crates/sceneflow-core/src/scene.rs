//! Scene description messages.
//!
//! These are the payloads exchanged with the simulator: a full
//! [`SceneDescription`] snapshot answers the scene service request, and
//! [`PoseBatch`] messages stream on the pose topic afterwards. The model /
//! link / visual nesting mirrors the simulator's entity tree.

use crate::{Color, EntityId, Pose};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Full scene snapshot returned by the scene service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Scene name
    pub name: String,
    /// Scene ambient light color
    #[serde(default)]
    pub ambient: Option<Color>,
    /// Viewport clear color
    #[serde(default)]
    pub background: Option<Color>,
    /// Top level models
    #[serde(default)]
    pub models: Vec<ModelDescription>,
    /// Top level lights
    #[serde(default)]
    pub lights: Vec<LightDescription>,
}

/// A model: a named group of links and nested models.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDescription {
    /// Entity id
    pub id: EntityId,
    /// Model name
    pub name: String,
    /// Pose relative to the parent
    #[serde(default)]
    pub pose: Option<Pose>,
    /// Links belonging to this model
    #[serde(default)]
    pub links: Vec<LinkDescription>,
    /// Nested models
    #[serde(default)]
    pub models: Vec<ModelDescription>,
}

/// A link: the rigid body carrying visuals and lights.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkDescription {
    /// Entity id
    pub id: EntityId,
    /// Link name
    pub name: String,
    /// Pose relative to the parent model
    #[serde(default)]
    pub pose: Option<Pose>,
    /// Visuals attached to this link
    #[serde(default)]
    pub visuals: Vec<VisualDescription>,
    /// Lights attached to this link
    #[serde(default)]
    pub lights: Vec<LightDescription>,
}

/// A visual: renderable geometry with an optional material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualDescription {
    /// Entity id
    pub id: EntityId,
    /// Visual name
    pub name: String,
    /// Pose relative to the parent link
    #[serde(default)]
    pub pose: Option<Pose>,
    /// Geometry to render
    pub geometry: Geometry,
    /// Surface material; a shared default is used when absent
    #[serde(default)]
    pub material: Option<MaterialDescription>,
    /// Transparency, 0.0 opaque - 1.0 invisible
    #[serde(default)]
    pub transparency: f32,
}

/// Geometry shapes understood by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Axis-aligned box with full extents `size`
    Box {
        /// Full extent along each axis
        size: Vec3,
    },
    /// Cylinder along +Z
    Cylinder {
        /// Cylinder radius
        radius: f32,
        /// Cylinder length along Z
        length: f32,
    },
    /// Finite plane, by default facing +Z
    Plane {
        /// Plane extents in X and Y
        size: Vec2,
        /// Plane normal in the visual frame
        normal: Vec3,
    },
    /// Sphere
    Sphere {
        /// Sphere radius
        radius: f32,
    },
    /// External mesh resource
    Mesh {
        /// Resource location; currently an absolute file path
        uri: String,
        /// Per-axis scale applied to the mesh
        scale: Vec3,
    },
}

/// Phong-style material colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescription {
    /// Ambient reflectance
    #[serde(default)]
    pub ambient: Option<Color>,
    /// Diffuse reflectance
    #[serde(default)]
    pub diffuse: Option<Color>,
    /// Specular reflectance
    #[serde(default)]
    pub specular: Option<Color>,
    /// Emissive color
    #[serde(default)]
    pub emissive: Option<Color>,
}

/// Light source kind with kind-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    /// Omnidirectional point light
    Point,
    /// Cone-shaped spot light
    Spot {
        /// Inner cone angle in radians
        inner_angle: f32,
        /// Outer cone angle in radians
        outer_angle: f32,
        /// Falloff exponent between the cones
        falloff: f32,
    },
    /// Directional light, position-independent
    Directional {
        /// Light direction in the light frame
        direction: Vec3,
    },
}

/// A light source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightDescription {
    /// Entity id
    pub id: EntityId,
    /// Light name
    pub name: String,
    /// Light kind and kind-specific parameters
    pub kind: LightKind,
    /// Pose relative to the parent
    #[serde(default)]
    pub pose: Option<Pose>,
    /// Diffuse color
    #[serde(default)]
    pub diffuse: Option<Color>,
    /// Specular color
    #[serde(default)]
    pub specular: Option<Color>,
    /// Constant attenuation factor
    #[serde(default)]
    pub attenuation_constant: f32,
    /// Linear attenuation factor
    #[serde(default)]
    pub attenuation_linear: f32,
    /// Quadratic attenuation factor
    #[serde(default)]
    pub attenuation_quadratic: f32,
    /// Attenuation range
    #[serde(default)]
    pub range: f32,
    /// Whether this light casts shadows
    #[serde(default)]
    pub cast_shadows: bool,
}

/// Batch of pose updates streamed on the pose topic.
///
/// Each entry addresses the entity created with the same id in the snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoseBatch {
    /// Updated `(entity, pose)` pairs
    pub poses: Vec<(EntityId, Pose)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scene() -> SceneDescription {
        SceneDescription {
            name: "world".to_string(),
            ambient: Some(Color::grey(0.3)),
            background: Some(Color::grey(0.8)),
            models: vec![ModelDescription {
                id: 1,
                name: "box_model".to_string(),
                pose: Some(Pose::from_translation(Vec3::new(0.0, 0.0, 0.5))),
                links: vec![LinkDescription {
                    id: 2,
                    name: "link".to_string(),
                    pose: None,
                    visuals: vec![VisualDescription {
                        id: 3,
                        name: "visual".to_string(),
                        pose: None,
                        geometry: Geometry::Box { size: Vec3::ONE },
                        material: None,
                        transparency: 0.0,
                    }],
                    lights: vec![],
                }],
                models: vec![],
            }],
            lights: vec![LightDescription {
                id: 4,
                name: "sun".to_string(),
                kind: LightKind::Directional {
                    direction: Vec3::new(0.0, 0.0, -1.0),
                },
                pose: None,
                diffuse: Some(Color::WHITE),
                specular: None,
                attenuation_constant: 1.0,
                attenuation_linear: 0.0,
                attenuation_quadratic: 0.0,
                range: 100.0,
                cast_shadows: true,
            }],
        }
    }

    #[test]
    fn test_scene_description_roundtrip() {
        let scene = sample_scene();
        let json = serde_json::to_string(&scene).expect("serialize scene");
        let back: SceneDescription = serde_json::from_str(&json).expect("deserialize scene");

        assert_eq!(back.name, "world");
        assert_eq!(back.models.len(), 1);
        assert_eq!(back.models[0].links[0].visuals[0].id, 3);
        assert_eq!(
            back.models[0].links[0].visuals[0].geometry,
            Geometry::Box { size: Vec3::ONE }
        );
        match &back.lights[0].kind {
            LightKind::Directional { direction } => {
                assert!(direction.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
            }
            other => panic!("unexpected light kind: {:?}", other),
        }
    }

    #[test]
    fn test_missing_optional_fields_default() {
        // A minimal visual without pose/material/transparency parses.
        let json = r#"{
            "id": 7,
            "name": "bare",
            "geometry": { "Sphere": { "radius": 0.5 } }
        }"#;
        let visual: VisualDescription = serde_json::from_str(json).expect("parse visual");
        assert!(visual.pose.is_none());
        assert!(visual.material.is_none());
        assert_eq!(visual.transparency, 0.0);
    }

    #[test]
    fn test_pose_batch_roundtrip() {
        let batch = PoseBatch {
            poses: vec![
                (1, Pose::from_translation(Vec3::X)),
                (2, Pose::from_translation(Vec3::Y)),
            ],
        };
        let json = serde_json::to_string(&batch).expect("serialize batch");
        let back: PoseBatch = serde_json::from_str(&json).expect("deserialize batch");
        assert_eq!(back.poses.len(), 2);
        assert_eq!(back.poses[0].0, 1);
    }
}

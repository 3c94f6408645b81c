//! Entity-keyed scene graph mirrored from the simulator.
//!
//! The graph is populated once from the scene snapshot and then mutated by
//! pose updates addressed by entity id. Models and links become plain group
//! nodes; visuals carry realized geometry and a material; lights carry their
//! shading parameters.

use glam::{Quat, Vec3};
use sceneflow_core::{
    Color, EntityId, Geometry, LightDescription, LightKind, LinkDescription, ModelDescription,
    Pose, SceneDescription, VisualDescription,
};
use std::collections::HashMap;
use tracing::{debug, error};

/// Shading parameters for a visual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub emissive: Color,
    /// 0.0 opaque - 1.0 invisible
    pub transparency: f32,
}

impl Material {
    /// The shared grey used for visuals without a material.
    pub fn default_grey() -> Self {
        Self {
            ambient: Color::grey(0.3),
            diffuse: Color::grey(0.7),
            specular: Color::grey(0.4),
            emissive: Color::new(0.0, 0.0, 0.0, 1.0),
            transparency: 0.0,
        }
    }
}

/// Geometry realized for rendering. Unit primitives are scaled per node.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Unit cube
    Box,
    /// Unit-diameter, unit-length cylinder along +Z
    Cylinder,
    /// Unit plane facing +Z
    Plane,
    /// Unit-diameter sphere
    Sphere,
    /// External mesh resource, loaded by the renderer on first use
    Mesh {
        /// Absolute path of the mesh file
        uri: String,
    },
}

/// Renderable payload of a visual node.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualData {
    /// Realized geometry; `None` when realization failed
    pub shape: Option<Shape>,
    /// Per-axis scale applied to the unit geometry
    pub scale: Vec3,
    /// Surface material
    pub material: Material,
}

/// Shading payload of a light node.
#[derive(Debug, Clone, PartialEq)]
pub struct LightData {
    pub kind: LightKind,
    pub diffuse: Color,
    pub specular: Color,
    pub attenuation_constant: f32,
    pub attenuation_linear: f32,
    pub attenuation_quadratic: f32,
    pub range: f32,
    pub cast_shadows: bool,
}

impl From<&LightDescription> for LightData {
    fn from(desc: &LightDescription) -> Self {
        Self {
            kind: desc.kind.clone(),
            diffuse: desc.diffuse.unwrap_or(Color::WHITE),
            specular: desc.specular.unwrap_or(Color::WHITE),
            attenuation_constant: desc.attenuation_constant,
            attenuation_linear: desc.attenuation_linear,
            attenuation_quadratic: desc.attenuation_quadratic,
            range: desc.range,
            cast_shadows: desc.cast_shadows,
        }
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Models and links: pure transforms
    Group,
    /// Renderable geometry
    Visual(VisualData),
    /// Light source
    Light(LightData),
}

/// One node of the mirrored scene.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
    pub local_pose: Pose,
    pub kind: NodeKind,
}

/// A flattened draw request extracted from the graph.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub shape: Shape,
    pub world_pose: Pose,
    pub scale: Vec3,
    pub material: Material,
}

/// A light with its world pose resolved.
#[derive(Debug, Clone)]
pub struct LightInstance {
    pub world_pose: Pose,
    pub data: LightData,
}

/// The mirrored scene.
pub struct SceneGraph {
    nodes: HashMap<EntityId, SceneNode>,
    roots: Vec<EntityId>,
    // Geometry-local pose offsets (plane normals); composed under incoming
    // stream poses for the same entity.
    local_offsets: HashMap<EntityId, Pose>,
    /// Scene ambient light
    pub ambient: Color,
    /// Viewport clear color
    pub background: Color,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            local_offsets: HashMap::new(),
            ambient: Color::grey(0.3),
            background: Color::grey(0.3),
        }
    }

    /// Remove all entities, keeping ambient/background.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.local_offsets.clear();
    }

    /// Populate the graph from a scene snapshot.
    pub fn load_scene(&mut self, desc: &SceneDescription) {
        self.clear();

        if let Some(ambient) = desc.ambient {
            self.ambient = ambient;
        }
        if let Some(background) = desc.background {
            self.background = background;
        }

        for model in &desc.models {
            self.load_model(model, None);
        }
        for light in &desc.lights {
            self.load_light(light, None);
        }

        debug!(
            "Loaded scene '{}' with {} entities",
            desc.name,
            self.nodes.len()
        );
    }

    fn attach(&mut self, id: EntityId, node: SceneNode) {
        match node.parent {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent) {
                    parent_node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.nodes.insert(id, node);
    }

    fn load_model(&mut self, desc: &ModelDescription, parent: Option<EntityId>) {
        self.attach(
            desc.id,
            SceneNode {
                name: desc.name.clone(),
                parent,
                children: Vec::new(),
                local_pose: desc.pose.unwrap_or_default(),
                kind: NodeKind::Group,
            },
        );

        for link in &desc.links {
            self.load_link(link, desc.id);
        }
        for nested in &desc.models {
            self.load_model(nested, Some(desc.id));
        }
    }

    fn load_link(&mut self, desc: &LinkDescription, parent: EntityId) {
        self.attach(
            desc.id,
            SceneNode {
                name: desc.name.clone(),
                parent: Some(parent),
                children: Vec::new(),
                local_pose: desc.pose.unwrap_or_default(),
                kind: NodeKind::Group,
            },
        );

        for visual in &desc.visuals {
            self.load_visual(visual, desc.id);
        }
        for light in &desc.lights {
            self.load_light(light, Some(desc.id));
        }
    }

    fn load_visual(&mut self, desc: &VisualDescription, parent: EntityId) {
        let (shape, scale, offset) = realize_geometry(&desc.geometry);
        if shape.is_none() {
            error!("Failed to load geometry for visual: {}", desc.name);
        }

        let mut material = match &desc.material {
            Some(m) => Material {
                ambient: m.ambient.unwrap_or(Color::grey(0.3)),
                diffuse: m.diffuse.unwrap_or(Color::grey(0.7)),
                specular: m.specular.unwrap_or(Color::grey(0.4)),
                emissive: m.emissive.unwrap_or(Color::new(0.0, 0.0, 0.0, 1.0)),
                transparency: 0.0,
            },
            None => Material::default_grey(),
        };
        material.transparency = desc.transparency;

        self.local_offsets.insert(desc.id, offset);

        self.attach(
            desc.id,
            SceneNode {
                name: desc.name.clone(),
                parent: Some(parent),
                children: Vec::new(),
                local_pose: desc.pose.unwrap_or_default() * offset,
                kind: NodeKind::Visual(VisualData {
                    shape,
                    scale,
                    material,
                }),
            },
        );
    }

    fn load_light(&mut self, desc: &LightDescription, parent: Option<EntityId>) {
        self.attach(
            desc.id,
            SceneNode {
                name: desc.name.clone(),
                parent,
                children: Vec::new(),
                local_pose: desc.pose.unwrap_or_default(),
                kind: NodeKind::Light(LightData::from(desc)),
            },
        );
    }

    /// Number of entities in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no entities.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node.
    pub fn node(&self, id: EntityId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Set a node's local pose verbatim.
    pub fn set_local_pose(&mut self, id: EntityId, pose: Pose) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.local_pose = pose;
                true
            }
            None => false,
        }
    }

    /// Apply a pose from the update stream, composing the entity's stored
    /// geometry-local offset. Returns false when the id is unknown.
    pub fn apply_stream_pose(&mut self, id: EntityId, pose: Pose) -> bool {
        let composed = match self.local_offsets.get(&id) {
            Some(offset) => pose * *offset,
            None => pose,
        };
        self.set_local_pose(id, composed)
    }

    /// Compose the node's pose with its ancestors'.
    pub fn world_pose(&self, id: EntityId) -> Option<Pose> {
        let node = self.nodes.get(&id)?;
        let pose = match node.parent {
            Some(parent) => self.world_pose(parent)? * node.local_pose,
            None => node.local_pose,
        };
        Some(pose)
    }

    /// Flatten all renderable visuals with resolved world poses.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        for &root in &self.roots {
            self.collect_draws(root, Pose::IDENTITY, &mut items);
        }
        items
    }

    fn collect_draws(&self, id: EntityId, parent_pose: Pose, items: &mut Vec<DrawItem>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let world_pose = parent_pose * node.local_pose;

        if let NodeKind::Visual(visual) = &node.kind {
            if let Some(shape) = &visual.shape {
                items.push(DrawItem {
                    shape: shape.clone(),
                    world_pose,
                    scale: visual.scale,
                    material: visual.material,
                });
            }
        }

        for &child in &node.children {
            self.collect_draws(child, world_pose, items);
        }
    }

    /// All lights with resolved world poses.
    pub fn lights(&self) -> Vec<LightInstance> {
        self.nodes
            .keys()
            .filter_map(|&id| {
                let node = &self.nodes[&id];
                match &node.kind {
                    NodeKind::Light(data) => Some(LightInstance {
                        world_pose: self.world_pose(id)?,
                        data: data.clone(),
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    /// Closest intersection of a ray with the visuals' bounding spheres.
    pub fn intersect_ray(&self, origin: Vec3, dir: Vec3) -> Option<Vec3> {
        let mut closest: Option<f32> = None;
        for item in self.draw_list() {
            let center = item.world_pose.position;
            let radius = (item.scale * 0.5).length().max(1e-3);
            if let Some(t) = ray_sphere(origin, dir, center, radius) {
                if closest.map_or(true, |c| t < c) {
                    closest = Some(t);
                }
            }
        }
        closest.map(|t| origin + dir * t)
    }
}

/// Realize a geometry description into a unit shape, a scale, and a
/// geometry-local pose offset.
fn realize_geometry(geometry: &Geometry) -> (Option<Shape>, Vec3, Pose) {
    match geometry {
        Geometry::Box { size } => (Some(Shape::Box), *size, Pose::IDENTITY),
        Geometry::Cylinder { radius, length } => (
            Some(Shape::Cylinder),
            Vec3::new(radius * 2.0, radius * 2.0, *length),
            Pose::IDENTITY,
        ),
        Geometry::Plane { size, normal } => {
            // Rotate the +Z-facing plane mesh onto the requested normal.
            let offset = if normal.length_squared() > 1e-12 {
                Pose::new(Vec3::ZERO, Quat::from_rotation_arc(Vec3::Z, normal.normalize()))
            } else {
                Pose::IDENTITY
            };
            (Some(Shape::Plane), Vec3::new(size.x, size.y, 1.0), offset)
        }
        Geometry::Sphere { radius } => (Some(Shape::Sphere), Vec3::splat(radius * 2.0), Pose::IDENTITY),
        Geometry::Mesh { uri, scale } => {
            if uri.is_empty() {
                error!("Mesh geometry missing uri");
                (None, Vec3::ONE, Pose::IDENTITY)
            } else {
                (Some(Shape::Mesh { uri: uri.clone() }), *scale, Pose::IDENTITY)
            }
        }
    }
}

fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t > 0.0).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_realize_cylinder_scale() {
        let (shape, scale, _) = realize_geometry(&Geometry::Cylinder {
            radius: 0.5,
            length: 2.0,
        });
        assert_eq!(shape, Some(Shape::Cylinder));
        assert!(scale.abs_diff_eq(Vec3::new(1.0, 1.0, 2.0), 1e-6));
    }

    #[test]
    fn test_realize_plane_normal_offset() {
        let (_, _, offset) = realize_geometry(&Geometry::Plane {
            size: Vec2::new(2.0, 2.0),
            normal: Vec3::X,
        });
        // The offset must carry +Z onto +X.
        let rotated = offset.rotation * Vec3::Z;
        assert!(rotated.abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn test_ray_sphere_hit_and_miss() {
        let hit = ray_sphere(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, Vec3::ZERO, 1.0);
        assert!(hit.is_some());
        assert!((hit.unwrap() - 4.0).abs() < 1e-5);

        let miss = ray_sphere(Vec3::new(-5.0, 3.0, 0.0), Vec3::X, Vec3::ZERO, 1.0);
        assert!(miss.is_none());
    }
}

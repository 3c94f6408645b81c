//! Scene synchronization: snapshot request and pose stream.

use crate::scene_graph::SceneGraph;
use parking_lot::Mutex;
use sceneflow_core::{EntityId, Pose};
use sceneflow_transport::Node;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Requests the scene snapshot and keeps the graph in sync with the pose
/// topic afterwards.
///
/// Pose batches are folded into a mutex-guarded pending map as they arrive
/// (later poses for the same entity overwrite earlier ones); the render
/// thread drains the map once per frame via [`SceneManager::update`].
pub struct SceneManager {
    service: String,
    topic: String,
    node: Option<Node>,
    pending: Arc<Mutex<HashMap<EntityId, Pose>>>,
    listener: Option<std::thread::JoinHandle<()>>,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneManager {
    pub fn new() -> Self {
        Self {
            service: String::new(),
            topic: String::new(),
            node: None,
            pending: Arc::new(Mutex::new(HashMap::new())),
            listener: None,
        }
    }

    /// Store the endpoint configuration.
    pub fn load(&mut self, service: impl Into<String>, topic: impl Into<String>, node: Node) {
        self.service = service.into();
        self.topic = topic.into();
        self.node = Some(node);
    }

    /// Make the scene service request and populate the graph, then subscribe
    /// to the pose topic. Failures leave the graph empty and are logged.
    pub fn request(&mut self, graph: &mut SceneGraph) {
        let Some(node) = &self.node else {
            return;
        };

        match node.request_scene(&self.service, REQUEST_TIMEOUT) {
            Ok(scene) => {
                graph.load_scene(&scene);
                info!(
                    "Scene snapshot from {} loaded ({} entities)",
                    self.service,
                    graph.len()
                );
            }
            Err(e) => {
                error!("Error making service request to {}: {}", self.service, e);
                return;
            }
        }

        let rx = node.subscribe_poses(&self.topic);
        let pending = self.pending.clone();
        let topic = self.topic.clone();
        self.listener = Some(
            std::thread::Builder::new()
                .name("sceneflow-poses".to_string())
                .spawn(move || {
                    while let Ok(batch) = rx.recv() {
                        let mut pending = pending.lock();
                        for (id, pose) in batch.poses {
                            pending.insert(id, pose);
                        }
                    }
                    debug!("Pose stream on {} ended", topic);
                })
                .expect("failed to spawn pose listener thread"),
        );
    }

    /// Apply buffered pose updates to the graph.
    ///
    /// Poses addressing unknown entities are dropped with the drain; the
    /// snapshot-then-subscribe ordering keeps that window negligible.
    pub fn update(&self, graph: &mut SceneGraph) {
        let mut pending = self.pending.lock();
        for (id, pose) in pending.drain() {
            if !graph.apply_stream_pose(id, pose) {
                debug!("Dropping pose for unknown entity {}", id);
            }
        }
    }

    /// Number of buffered pose updates (test hook).
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Insert a pose as if it had arrived on the topic (test hook).
    #[doc(hidden)]
    pub fn inject_pose(&self, id: EntityId, pose: Pose) {
        self.pending.lock().insert(id, pose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use sceneflow_core::{Geometry, LinkDescription, ModelDescription, SceneDescription, VisualDescription};

    fn graph_with_visual(id: EntityId) -> SceneGraph {
        let mut graph = SceneGraph::new();
        graph.load_scene(&SceneDescription {
            name: "test".to_string(),
            ambient: None,
            background: None,
            models: vec![ModelDescription {
                id: 1,
                name: "m".to_string(),
                pose: None,
                links: vec![LinkDescription {
                    id: 2,
                    name: "l".to_string(),
                    pose: None,
                    visuals: vec![VisualDescription {
                        id,
                        name: "v".to_string(),
                        pose: None,
                        geometry: Geometry::Plane {
                            size: Vec2::ONE,
                            normal: Vec3::X,
                        },
                        material: None,
                        transparency: 0.0,
                    }],
                    lights: vec![],
                }],
                models: vec![],
            }],
            lights: vec![],
        });
        graph
    }

    #[test]
    fn test_update_applies_known_and_drops_unknown() {
        let mut graph = graph_with_visual(3);
        let manager = SceneManager::new();

        manager.inject_pose(3, Pose::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        manager.inject_pose(999, Pose::from_translation(Vec3::X));
        assert_eq!(manager.pending_len(), 2);

        manager.update(&mut graph);

        // Both entries consumed; only the known entity moved.
        assert_eq!(manager.pending_len(), 0);
        let pose = graph.world_pose(3).expect("visual exists");
        assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn test_stream_pose_composes_local_offset() {
        let mut graph = graph_with_visual(3);
        let manager = SceneManager::new();

        manager.inject_pose(3, Pose::IDENTITY);
        manager.update(&mut graph);

        // The plane's +X normal offset must survive a stream update.
        let pose = graph.world_pose(3).expect("visual exists");
        let normal = pose.rotation * Vec3::Z;
        assert!(normal.abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn test_later_pose_overwrites_earlier() {
        let mut graph = graph_with_visual(3);
        let manager = SceneManager::new();

        manager.inject_pose(3, Pose::from_translation(Vec3::X));
        manager.inject_pose(3, Pose::from_translation(Vec3::Y));
        assert_eq!(manager.pending_len(), 1);

        manager.update(&mut graph);
        let pose = graph.world_pose(3).expect("visual exists");
        assert!(pose.position.abs_diff_eq(Vec3::Y, 1e-6));
    }
}

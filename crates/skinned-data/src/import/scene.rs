//! Imported scene description
//!
//! These types mirror what a scene importer hands over: a node graph, meshes
//! with their bone references, and node-keyed animation channels with times
//! in ticks. With the `serde` feature they deserialize from JSON, where
//! matrices are 16 floats in column-major order and quaternions are
//! `[x, y, z, w]`.

use glam::{Mat4, Quat, Vec3};

use crate::animation::Keyframe;

/// A complete imported scene
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scene {
    pub root: SceneNode,
    #[cfg_attr(feature = "serde", serde(default))]
    pub meshes: Vec<SceneMesh>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub animations: Vec<SceneAnimation>,
}

/// A node of the scene graph; every node becomes a bone
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneNode {
    pub name: String,
    /// Transform relative to the parent node
    #[cfg_attr(feature = "serde", serde(default))]
    pub transform: Mat4,
    /// Indices into [`Scene::meshes`]
    #[cfg_attr(feature = "serde", serde(default))]
    pub meshes: Vec<usize>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneMesh {
    pub name: String,
    pub vertex_count: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bones: Vec<MeshBone>,
}

/// A mesh's reference to a skeleton node
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshBone {
    /// Name of the node this bone binds to
    pub name: String,
    /// Mesh bind space to bone local space
    #[cfg_attr(feature = "serde", serde(default))]
    pub offset: Mat4,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weights: Vec<VertexWeight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexWeight {
    pub vertex: usize,
    pub weight: f32,
}

/// One animation as stored in the scene, with key times in ticks
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneAnimation {
    pub name: String,
    /// Zero means unspecified
    #[cfg_attr(feature = "serde", serde(default))]
    pub ticks_per_second: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub channels: Vec<NodeChannel>,
}

/// Keyframes for one node
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeChannel {
    pub node: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub position_keys: Vec<Keyframe<Vec3>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rotation_keys: Vec<Keyframe<Quat>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scaling_keys: Vec<Keyframe<Vec3>>,
}

impl NodeChannel {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            ..Default::default()
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn test_scene_from_json() {
        let json = r#"{
            "root": {
                "name": "root",
                "meshes": [0],
                "children": [{ "name": "arm" }]
            },
            "meshes": [{
                "name": "body",
                "vertex_count": 2,
                "bones": [{ "name": "arm", "weights": [{ "vertex": 1, "weight": 1.0 }] }]
            }],
            "animations": [{
                "name": "Armature|wave",
                "ticks_per_second": 30.0,
                "channels": [{
                    "node": "arm",
                    "rotation_keys": [{ "time": 0.0, "value": [0.0, 0.0, 0.0, 1.0] }]
                }]
            }]
        }"#;

        let scene: Scene = serde_json::from_str(json).unwrap();
        assert_eq!(scene.root.transform, Mat4::IDENTITY);
        assert_eq!(scene.root.children[0].name, "arm");
        assert_eq!(scene.meshes[0].bones[0].offset, Mat4::IDENTITY);
        assert_eq!(
            scene.animations[0].channels[0].rotation_keys[0].value,
            Quat::IDENTITY
        );
    }
}

//! Skeleton and bone-weight extraction from imported scenes
//!
//! An [`ImportContext`] walks a [`Scene`] the way a model loader would:
//! every node becomes a bone, mesh bone references supply offset matrices
//! and per-vertex weights, and node animation channels become clips.
//!
//! ```rust
//! use skinned_data::import::{ImportOptions, Scene, SceneNode, import_scene};
//!
//! let scene = Scene {
//!     root: SceneNode::new("root").with_child(SceneNode::new("arm")),
//!     ..Default::default()
//! };
//! let model = import_scene(&scene, ImportOptions::default())?;
//! assert_eq!(model.skeleton.bone_index("arm"), Some(1));
//! # Ok::<(), skinned_data::SkinnedDataError>(())
//! ```

mod context;
mod scene;
mod weights;

pub use context::{
    DEFAULT_TICKS_PER_SECOND, ImportContext, ImportOptions, ImportedModel, MeshReference,
    MeshWeights, import_scene,
};
pub use scene::{MeshBone, NodeChannel, Scene, SceneAnimation, SceneMesh, SceneNode, VertexWeight};
pub use weights::{BoneWeightSet, MAX_BONES_PER_VERTEX, WeightAdd, WeightOverflowPolicy};

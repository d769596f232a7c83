use thiserror::Error;

use crate::animation::Channel;

/// Error types for skeleton construction, clip evaluation and scene import
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkinnedDataError {
    /// A clip name was looked up that the skeleton does not contain
    #[error("Clip not found: '{0}'")]
    ClipNotFound(String),

    /// A clip was built without a single animated channel
    #[error("Clip '{0}' has no keyframes on any bone")]
    EmptyClip(String),

    /// Two clips with the same name were handed to one skeleton
    #[error("Duplicate clip name: '{0}'")]
    DuplicateClip(String),

    /// Keyframe times must be sorted ascending within a channel
    #[error("{channel} keyframe {index} at t={time} is earlier than the keyframe before it")]
    UnsortedKeyframes {
        channel: Channel,
        index: usize,
        time: f32,
    },

    /// Keyframe time is NaN or infinite
    #[error("{channel} keyframe {index} has a non-finite time")]
    InvalidKeyframeTime { channel: Channel, index: usize },

    /// Playback was advanced by a NaN or infinite step
    #[error("Time step {0} is not finite")]
    InvalidTimeStep(f32),

    /// Tick rate used to convert keyframe times to seconds
    #[error("Tick rate {0} must be positive and finite")]
    InvalidTickRate(f32),

    /// A skeleton needs at least the root bone
    #[error("Skeleton has no bones")]
    EmptySkeleton,

    /// Parent index breaks the parent-before-child ordering
    #[error("Bone {bone} has invalid parent {parent:?}: only bone 0 may be a root and parents must precede their children")]
    InvalidHierarchy { bone: usize, parent: Option<usize> },

    /// A clip animates a bone the skeleton does not have
    #[error("Clip '{clip}' animates bone {bone}, but the skeleton has {bone_count} bones")]
    BoneOutOfRange {
        clip: String,
        bone: usize,
        bone_count: usize,
    },

    /// More bones than the skinning constant buffer can hold
    #[error("Skeleton has {count} bones, exceeding the limit of {limit}")]
    BoneLimitExceeded { count: usize, limit: usize },

    /// Hierarchy and offset arrays differ in length
    #[error("Hierarchy has {hierarchy} entries but {offsets} offset matrices were given")]
    OffsetCountMismatch { hierarchy: usize, offsets: usize },

    /// A bone or animation channel names a node missing from the hierarchy
    #[error("Unknown bone '{name}' referenced by {referenced_by}")]
    UnknownBone { name: String, referenced_by: String },

    /// Two hierarchy nodes share a name, so name lookups would be ambiguous
    #[error("Duplicate bone name: '{0}'")]
    DuplicateBoneName(String),

    /// A vertex has more bone influences than the vertex format stores
    #[error("Vertex {vertex} of mesh '{mesh}' has more than {limit} bone influences")]
    TooManyInfluences {
        mesh: String,
        vertex: usize,
        limit: usize,
    },

    /// A bone weight references a vertex the mesh does not have
    #[error("Mesh '{mesh}' has {vertex_count} vertices, but a weight references vertex {vertex}")]
    VertexOutOfRange {
        mesh: String,
        vertex: usize,
        vertex_count: usize,
    },

    /// A node references a mesh the scene does not have
    #[error("Node '{node}' references mesh {mesh}, but the scene has {mesh_count} meshes")]
    MeshOutOfRange {
        node: String,
        mesh: usize,
        mesh_count: usize,
    },
}

/// Result type using SkinnedDataError
pub type Result<T> = std::result::Result<T, SkinnedDataError>;

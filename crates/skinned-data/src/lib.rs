//! Skeletal animation core for skinned meshes.
//!
//! This crate turns an imported scene into a [`Skeleton`]: a flat bone
//! hierarchy plus named keyframe clips. Sampling a clip at a playback time
//! yields one final skinning matrix per bone, ready for upload to a vertex
//! shader that blends up to four bones per vertex.
//!
//! - [`animation`]: keyframes, per-bone tracks and clips
//! - [`skeleton`]: hierarchy validation and skinning matrix evaluation
//! - [`instance`]: per-object playback with a looping playhead
//! - [`import`]: scene graph to skeleton conversion and bone weights
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use glam::Quat;
//! use skinned_data::{AnimationClip, Bone, BoneAnimation, Keyframe, Skeleton, SkinnedModelInstance};
//!
//! let sway = BoneAnimation::new(
//!     vec![],
//!     vec![],
//!     vec![
//!         Keyframe::new(0.0, Quat::IDENTITY),
//!         Keyframe::new(1.0, Quat::from_rotation_z(0.5)),
//!     ],
//! )?;
//! let clip = AnimationClip::new("sway", [(1, sway)])?;
//! let bones = vec![Bone::root("base"), Bone::new("stalk", Some(0))];
//! let skeleton = Arc::new(Skeleton::new(bones, [clip])?);
//!
//! let mut instance = SkinnedModelInstance::new(skeleton, "sway")?;
//! instance.update(0.5)?;
//! assert_eq!(instance.final_transforms().len(), 2);
//! # Ok::<(), skinned_data::SkinnedDataError>(())
//! ```

#![forbid(unsafe_code)]

pub mod animation;
pub mod error;
pub mod import;
pub mod instance;
pub mod skeleton;

pub use animation::{AnimationClip, BoneAnimation, Keyframe};
pub use error::{Result, SkinnedDataError};
pub use import::{ImportOptions, ImportedModel, Scene, import_scene};
pub use instance::SkinnedModelInstance;
pub use skeleton::{Bone, MAX_SKINNING_BONES, Skeleton};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

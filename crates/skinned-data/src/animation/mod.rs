//! Keyframe animation
//!
//! This module provides the clip-side half of skeletal animation:
//! - Keyframes and per-channel sampling (linear for vectors, slerp for rotations)
//! - Per-bone tracks that evaluate to a parent-relative transform
//! - Named clips aggregating the tracks of every animated bone
//!
//! # Example
//!
//! ```rust
//! use skinned_data::animation::{AnimationClip, BoneAnimation, Keyframe};
//! use glam::Vec3;
//!
//! let walk = BoneAnimation::new(
//!     vec![
//!         Keyframe::new(0.0, Vec3::ZERO),
//!         Keyframe::new(1.0, Vec3::X),
//!     ],
//!     vec![],
//!     vec![],
//! )?;
//! let clip = AnimationClip::new("walk", [(0, walk)])?;
//! assert_eq!(clip.end_time(), 1.0);
//! # Ok::<(), skinned_data::SkinnedDataError>(())
//! ```

mod bone_animation;
mod clip;
mod keyframe;

pub use bone_animation::BoneAnimation;
pub use clip::AnimationClip;
pub use keyframe::{
    Channel, Interpolate, Keyframe, QuatKey, VectorKey, find_keyframe_index, sample,
    validate_keys,
};

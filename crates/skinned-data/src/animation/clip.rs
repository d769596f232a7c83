//! Named animation clips

use std::collections::BTreeMap;

use glam::Mat4;

use super::bone_animation::BoneAnimation;
use crate::error::{Result, SkinnedDataError};

/// A named set of per-bone animations
///
/// The map is sparse: bones without an entry are not animated by this clip
/// and keep their default transform during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    name: String,
    bone_animations: BTreeMap<usize, BoneAnimation>,
    start_time: f32,
    end_time: f32,
}

impl AnimationClip {
    /// Create a clip from `(bone index, animation)` pairs
    ///
    /// Fails with [`SkinnedDataError::EmptyClip`] when no entry carries a
    /// single keyframe, since such a clip has no meaningful duration.
    pub fn new(
        name: impl Into<String>,
        bone_animations: impl IntoIterator<Item = (usize, BoneAnimation)>,
    ) -> Result<Self> {
        let name = name.into();
        let bone_animations: BTreeMap<usize, BoneAnimation> =
            bone_animations.into_iter().collect();

        let start_time = bone_animations
            .values()
            .filter_map(BoneAnimation::start_time)
            .reduce(f32::min);
        let end_time = bone_animations
            .values()
            .filter_map(BoneAnimation::end_time)
            .reduce(f32::max);

        let (Some(start_time), Some(end_time)) = (start_time, end_time) else {
            return Err(SkinnedDataError::EmptyClip(name));
        };

        Ok(Self {
            name,
            bone_animations,
            start_time,
            end_time,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Earliest keyframe time of any bone in the clip
    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    /// Latest keyframe time of any bone in the clip
    pub fn end_time(&self) -> f32 {
        self.end_time
    }

    pub fn duration(&self) -> f32 {
        self.end_time - self.start_time
    }

    /// Number of bones with an entry in this clip
    pub fn bone_count(&self) -> usize {
        self.bone_animations.len()
    }

    pub fn bone_animation(&self, bone: usize) -> Option<&BoneAnimation> {
        self.bone_animations.get(&bone)
    }

    /// Iterate `(bone index, animation)` pairs in bone order
    pub fn animated_bones(&self) -> impl Iterator<Item = (usize, &BoneAnimation)> {
        self.bone_animations.iter().map(|(&bone, anim)| (bone, anim))
    }

    /// Highest bone index this clip refers to
    pub fn max_bone_index(&self) -> Option<usize> {
        self.bone_animations.keys().next_back().copied()
    }

    /// Write each animated bone's parent-relative transform at `t` into `out`
    ///
    /// Entries for bones without an animation, or whose animation has no
    /// keyframes, are left untouched, as are entries past the end of `out`.
    pub fn interpolate(&self, t: f32, out: &mut [Mat4]) {
        for (&bone, anim) in &self.bone_animations {
            if anim.is_empty() {
                continue;
            }
            if let Some(slot) = out.get_mut(bone) {
                *slot = anim.interpolate(t);
            }
        }
    }
}

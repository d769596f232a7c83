//! Bone hierarchy and skinning matrix evaluation
//!
//! Bones live in a flat array where every bone's parent precedes it. That
//! ordering lets [`Skeleton::to_root_transforms`] resolve the whole hierarchy
//! in one forward pass without recursion.
//!
//! Matrices follow glam's column-vector convention, so a bone's root-space
//! transform is `parent_to_root * to_parent` and its skinning matrix is
//! `to_root * offset`.

use std::collections::HashMap;

use glam::Mat4;

use crate::animation::AnimationClip;
use crate::error::{Result, SkinnedDataError};

/// Maximum bones a skeleton may have; the size of the skinning constant buffer
pub const MAX_SKINNING_BONES: usize = 600;

/// One node of the skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Node name from the source scene
    pub name: String,
    /// Parent bone index (None for the root)
    pub parent: Option<usize>,
    /// Transform from mesh bind space into this bone's local space
    pub offset: Mat4,
    /// Bind-pose transform relative to the parent, used when a clip does
    /// not animate this bone
    pub default_transform: Mat4,
}

impl Bone {
    pub fn new(name: impl Into<String>, parent: Option<usize>) -> Self {
        Self {
            name: name.into(),
            parent,
            offset: Mat4::IDENTITY,
            default_transform: Mat4::IDENTITY,
        }
    }

    pub fn root(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    pub fn with_offset(mut self, offset: Mat4) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_default_transform(mut self, transform: Mat4) -> Self {
        self.default_transform = transform;
        self
    }
}

/// Immutable bone hierarchy with its animation clips
#[derive(Debug, Clone)]
pub struct Skeleton {
    bones: Vec<Bone>,
    bone_lookup: HashMap<String, usize>,
    clips: HashMap<String, AnimationClip>,
}

impl Skeleton {
    /// Build a skeleton, checking the hierarchy and clip invariants
    ///
    /// Bone 0 must be the only root and every other bone's parent must have
    /// a lower index. Every bone a clip animates must exist.
    pub fn new(
        bones: Vec<Bone>,
        clips: impl IntoIterator<Item = AnimationClip>,
    ) -> Result<Self> {
        if bones.is_empty() {
            return Err(SkinnedDataError::EmptySkeleton);
        }
        if bones.len() > MAX_SKINNING_BONES {
            return Err(SkinnedDataError::BoneLimitExceeded {
                count: bones.len(),
                limit: MAX_SKINNING_BONES,
            });
        }

        for (index, bone) in bones.iter().enumerate() {
            let valid = match (index, bone.parent) {
                (0, None) => true,
                (0, Some(_)) | (_, None) => false,
                (_, Some(parent)) => parent < index,
            };
            if !valid {
                return Err(SkinnedDataError::InvalidHierarchy {
                    bone: index,
                    parent: bone.parent,
                });
            }
        }

        let mut clip_map = HashMap::new();
        for clip in clips {
            if let Some(bone) = clip.max_bone_index()
                && bone >= bones.len()
            {
                return Err(SkinnedDataError::BoneOutOfRange {
                    clip: clip.name().to_string(),
                    bone,
                    bone_count: bones.len(),
                });
            }
            if clip_map.contains_key(clip.name()) {
                return Err(SkinnedDataError::DuplicateClip(clip.name().to_string()));
            }
            clip_map.insert(clip.name().to_string(), clip);
        }

        // First bone wins on duplicate names
        let mut bone_lookup = HashMap::with_capacity(bones.len());
        for (index, bone) in bones.iter().enumerate() {
            bone_lookup.entry(bone.name.clone()).or_insert(index);
        }

        log::debug!(
            "Built skeleton with {} bones and {} clips",
            bones.len(),
            clip_map.len()
        );

        Ok(Self {
            bones,
            bone_lookup,
            clips: clip_map,
        })
    }

    /// Build a skeleton from a parent-index array and parallel offset array
    ///
    /// `-1` (or any negative value) marks the root. Bones are named
    /// `bone_<index>` and have identity default transforms.
    pub fn from_hierarchy(
        hierarchy: &[i32],
        offsets: Vec<Mat4>,
        clips: impl IntoIterator<Item = AnimationClip>,
    ) -> Result<Self> {
        if hierarchy.len() != offsets.len() {
            return Err(SkinnedDataError::OffsetCountMismatch {
                hierarchy: hierarchy.len(),
                offsets: offsets.len(),
            });
        }

        let bones = hierarchy
            .iter()
            .zip(offsets)
            .enumerate()
            .map(|(index, (&parent, offset))| {
                let parent = usize::try_from(parent).ok();
                Bone::new(format!("bone_{index}"), parent).with_offset(offset)
            })
            .collect();

        Self::new(bones, clips)
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Look up a bone index by node name
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bone_lookup.get(name).copied()
    }

    /// Parent index per bone, `-1` for the root
    pub fn parent_indices(&self) -> Vec<i32> {
        self.bones
            .iter()
            .map(|bone| bone.parent.map_or(-1, |parent| parent as i32))
            .collect()
    }

    /// Bind offset matrix per bone
    pub fn offsets(&self) -> Vec<Mat4> {
        self.bones.iter().map(|bone| bone.offset).collect()
    }

    /// Direct children of a bone, in index order
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(move |(_, bone)| bone.parent == Some(index))
            .map(|(child, _)| child)
    }

    pub fn clip(&self, name: &str) -> Result<&AnimationClip> {
        self.clips
            .get(name)
            .ok_or_else(|| SkinnedDataError::ClipNotFound(name.to_string()))
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    /// Clip names in sorted order
    pub fn clip_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clips.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn clip_start_time(&self, name: &str) -> Result<f32> {
        Ok(self.clip(name)?.start_time())
    }

    pub fn clip_end_time(&self, name: &str) -> Result<f32> {
        Ok(self.clip(name)?.end_time())
    }

    /// Evaluate every bone's transform relative to the root at time `t`
    ///
    /// Bones the clip does not animate use their default transform.
    pub fn to_root_transforms(&self, clip_name: &str, t: f32) -> Result<Vec<Mat4>> {
        let clip = self.clip(clip_name)?;

        let mut transforms: Vec<Mat4> = self
            .bones
            .iter()
            .map(|bone| bone.default_transform)
            .collect();
        clip.interpolate(t, &mut transforms);

        // Parents precede children, so each parent is already in root space
        for index in 1..transforms.len() {
            if let Some(parent) = self.bones[index].parent {
                transforms[index] = transforms[parent] * transforms[index];
            }
        }

        Ok(transforms)
    }

    /// Evaluate the final skinning matrix of every bone at time `t`
    ///
    /// `out` is resized to the bone count and overwritten in bone order.
    /// Nothing is cached between calls.
    pub fn final_transforms(&self, clip_name: &str, t: f32, out: &mut Vec<Mat4>) -> Result<()> {
        let to_root = self.to_root_transforms(clip_name, t)?;

        out.clear();
        out.extend(
            to_root
                .iter()
                .zip(&self.bones)
                .map(|(to_root, bone)| *to_root * bone.offset),
        );
        Ok(())
    }
}

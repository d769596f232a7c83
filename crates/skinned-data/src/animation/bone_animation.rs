//! Per-bone keyframe tracks within one clip

use glam::{Mat4, Quat, Vec3};

use super::keyframe::{Channel, QuatKey, VectorKey, sample, validate_keys};
use crate::error::Result;

/// Independent translation, scale and rotation tracks for one bone
///
/// Any channel may be empty. When all three are empty the bone is not
/// animated and [`BoneAnimation::interpolate`] returns the default transform.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneAnimation {
    translation: Vec<VectorKey>,
    scale: Vec<VectorKey>,
    rotation: Vec<QuatKey>,
    default_transform: Mat4,
}

impl BoneAnimation {
    /// Create a bone animation from keyframe lists
    ///
    /// Each list must be sorted ascending by time.
    pub fn new(
        translation: Vec<VectorKey>,
        scale: Vec<VectorKey>,
        rotation: Vec<QuatKey>,
    ) -> Result<Self> {
        validate_keys(Channel::Translation, &translation)?;
        validate_keys(Channel::Scale, &scale)?;
        validate_keys(Channel::Rotation, &rotation)?;

        Ok(Self {
            translation,
            scale,
            rotation,
            default_transform: Mat4::IDENTITY,
        })
    }

    /// A bone animation without keyframes
    pub fn empty() -> Self {
        Self {
            translation: Vec::new(),
            scale: Vec::new(),
            rotation: Vec::new(),
            default_transform: Mat4::IDENTITY,
        }
    }

    /// Set the transform used when no channel has keyframes
    pub fn with_default_transform(mut self, transform: Mat4) -> Self {
        self.default_transform = transform;
        self
    }

    pub fn translation_keys(&self) -> &[VectorKey] {
        &self.translation
    }

    pub fn scale_keys(&self) -> &[VectorKey] {
        &self.scale
    }

    pub fn rotation_keys(&self) -> &[QuatKey] {
        &self.rotation
    }

    pub fn default_transform(&self) -> Mat4 {
        self.default_transform
    }

    /// True when no channel has any keyframe
    pub fn is_empty(&self) -> bool {
        self.translation.is_empty() && self.scale.is_empty() && self.rotation.is_empty()
    }

    /// Earliest first-keyframe time across the non-empty channels
    pub fn start_time(&self) -> Option<f32> {
        [
            self.translation.first().map(|k| k.time),
            self.scale.first().map(|k| k.time),
            self.rotation.first().map(|k| k.time),
        ]
        .into_iter()
        .flatten()
        .reduce(f32::min)
    }

    /// Latest last-keyframe time across the non-empty channels
    pub fn end_time(&self) -> Option<f32> {
        [
            self.translation.last().map(|k| k.time),
            self.scale.last().map(|k| k.time),
            self.rotation.last().map(|k| k.time),
        ]
        .into_iter()
        .flatten()
        .reduce(f32::max)
    }

    /// Evaluate the bone's transform relative to its parent at time `t`
    ///
    /// Channels are sampled independently and composed as
    /// scale, then rotation, then translation about the origin.
    pub fn interpolate(&self, t: f32) -> Mat4 {
        if self.is_empty() {
            return self.default_transform;
        }

        let translation = sample(&self.translation, t).unwrap_or(Vec3::ZERO);
        let scale = sample(&self.scale, t).unwrap_or(Vec3::ONE);
        let rotation = sample(&self.rotation, t).unwrap_or(Quat::IDENTITY);

        Mat4::from_scale_rotation_translation(scale, rotation, translation)
    }
}

impl Default for BoneAnimation {
    fn default() -> Self {
        Self::empty()
    }
}

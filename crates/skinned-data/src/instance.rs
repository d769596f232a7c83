//! Per-object animation playback

use std::sync::Arc;

use glam::Mat4;

use crate::error::{Result, SkinnedDataError};
use crate::skeleton::Skeleton;

/// Playback state for one animated object
///
/// Holds a shared, read-only [`Skeleton`] and a scratch buffer of final
/// skinning matrices that is overwritten on every [`update`](Self::update).
/// The renderer must consume the buffer before the next update.
#[derive(Debug, Clone)]
pub struct SkinnedModelInstance {
    skeleton: Arc<Skeleton>,
    clip_name: String,
    time_pos: f32,
    final_transforms: Vec<Mat4>,
}

impl SkinnedModelInstance {
    /// Create an instance playing `clip_name` from time zero
    ///
    /// The pose at `t = 0` is evaluated immediately so the transform buffer
    /// is valid before the first tick.
    pub fn new(skeleton: Arc<Skeleton>, clip_name: impl Into<String>) -> Result<Self> {
        let clip_name = clip_name.into();
        let mut final_transforms = Vec::with_capacity(skeleton.bone_count());
        skeleton.final_transforms(&clip_name, 0.0, &mut final_transforms)?;

        Ok(Self {
            skeleton,
            clip_name,
            time_pos: 0.0,
            final_transforms,
        })
    }

    /// Advance the playhead by `dt` seconds and re-evaluate the pose
    ///
    /// Once the playhead passes the clip's end time it restarts at exactly
    /// zero; the overshoot is discarded rather than carried into the next
    /// loop. A NaN or infinite `dt` is rejected and leaves the playhead where
    /// it was.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        if !dt.is_finite() {
            return Err(SkinnedDataError::InvalidTimeStep(dt));
        }
        self.time_pos += dt;

        let end_time = self.skeleton.clip_end_time(&self.clip_name)?;
        if self.time_pos > end_time {
            log::trace!(
                "Clip '{}' looped at t={} (end {})",
                self.clip_name,
                self.time_pos,
                end_time
            );
            self.time_pos = 0.0;
        }

        self.skeleton
            .final_transforms(&self.clip_name, self.time_pos, &mut self.final_transforms)
    }

    /// Switch to another clip and restart playback
    ///
    /// On error the instance keeps playing its current clip.
    pub fn set_clip(&mut self, clip_name: impl Into<String>) -> Result<()> {
        let clip_name = clip_name.into();
        self.skeleton
            .final_transforms(&clip_name, 0.0, &mut self.final_transforms)?;
        self.clip_name = clip_name;
        self.time_pos = 0.0;
        Ok(())
    }

    pub fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    pub fn clip_name(&self) -> &str {
        &self.clip_name
    }

    /// Current playhead in seconds
    pub fn time_pos(&self) -> f32 {
        self.time_pos
    }

    /// Final skinning matrices, one per bone in bone order
    pub fn final_transforms(&self) -> &[Mat4] {
        &self.final_transforms
    }

    /// Final skinning matrices flattened for constant buffer upload
    ///
    /// Each bone contributes 16 floats in column-major order.
    pub fn constant_buffer_data(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(self.final_transforms.len() * 16);
        for matrix in &self.final_transforms {
            data.extend_from_slice(&matrix.to_cols_array());
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationClip, BoneAnimation, Keyframe};
    use crate::skeleton::Bone;
    use glam::Vec3;

    fn skeleton() -> Arc<Skeleton> {
        let anim = |end: f32| {
            BoneAnimation::new(
                vec![
                    Keyframe::new(0.0, Vec3::ZERO),
                    Keyframe::new(end, Vec3::new(end, 0.0, 0.0)),
                ],
                vec![],
                vec![],
            )
            .unwrap()
        };
        let clips = [
            AnimationClip::new("walk", [(0, anim(1.0))]).unwrap(),
            AnimationClip::new("run", [(1, anim(0.5))]).unwrap(),
        ];
        let bones = vec![Bone::root("hips"), Bone::new("spine", Some(0))];
        Arc::new(Skeleton::new(bones, clips).unwrap())
    }

    #[test]
    fn test_new_evaluates_initial_pose() {
        let instance = SkinnedModelInstance::new(skeleton(), "walk").unwrap();
        assert_eq!(instance.time_pos(), 0.0);
        assert_eq!(instance.final_transforms(), &[Mat4::IDENTITY; 2]);
    }

    #[test]
    fn test_new_unknown_clip() {
        let err = SkinnedModelInstance::new(skeleton(), "crawl").unwrap_err();
        assert_eq!(err, SkinnedDataError::ClipNotFound("crawl".to_string()));
    }

    #[test]
    fn test_update_advances_playhead() {
        let mut instance = SkinnedModelInstance::new(skeleton(), "walk").unwrap();
        instance.update(0.25).unwrap();
        instance.update(0.25).unwrap();

        assert!((instance.time_pos() - 0.5).abs() < 1e-6);
        let root = instance.final_transforms()[0].transform_point3(Vec3::ZERO);
        assert!(root.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_update_resets_to_zero_past_end() {
        let mut instance = SkinnedModelInstance::new(skeleton(), "walk").unwrap();
        instance.update(0.75).unwrap();

        // 1.125 > 1.0: hard reset, the 0.125 overshoot is dropped
        instance.update(0.375).unwrap();
        assert_eq!(instance.time_pos(), 0.0);
        assert_eq!(instance.final_transforms()[0], Mat4::IDENTITY);
    }

    #[test]
    fn test_update_at_exact_end_does_not_reset() {
        let mut instance = SkinnedModelInstance::new(skeleton(), "walk").unwrap();
        instance.update(0.5).unwrap();
        instance.update(0.5).unwrap();
        assert_eq!(instance.time_pos(), 1.0);
    }

    #[test]
    fn test_update_rejects_non_finite_step() {
        let mut instance = SkinnedModelInstance::new(skeleton(), "walk").unwrap();
        instance.update(0.25).unwrap();

        let err = instance.update(f32::NAN).unwrap_err();
        assert!(matches!(err, SkinnedDataError::InvalidTimeStep(dt) if dt.is_nan()));
        assert_eq!(
            instance.update(f32::INFINITY),
            Err(SkinnedDataError::InvalidTimeStep(f32::INFINITY))
        );
        assert_eq!(instance.time_pos(), 0.25);

        instance.update(0.25).unwrap();
        assert_eq!(instance.time_pos(), 0.5);
        assert!(instance.final_transforms()[0].is_finite());
    }

    #[test]
    fn test_set_clip() {
        let mut instance = SkinnedModelInstance::new(skeleton(), "walk").unwrap();
        instance.update(0.5).unwrap();

        instance.set_clip("run").unwrap();
        assert_eq!(instance.clip_name(), "run");
        assert_eq!(instance.time_pos(), 0.0);

        let err = instance.set_clip("swim").unwrap_err();
        assert_eq!(err, SkinnedDataError::ClipNotFound("swim".to_string()));
        assert_eq!(instance.clip_name(), "run");
    }

    #[test]
    fn test_constant_buffer_layout() {
        let mut instance = SkinnedModelInstance::new(skeleton(), "walk").unwrap();
        instance.update(1.0).unwrap();

        let data = instance.constant_buffer_data();
        assert_eq!(data.len(), 32);
        // Column 3 of bone 0 holds its translation
        assert_eq!(&data[12..16], &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(&data[16..32], &Mat4::from_translation(Vec3::X).to_cols_array());
    }
}

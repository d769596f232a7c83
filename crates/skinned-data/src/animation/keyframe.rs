//! Keyframes and per-channel keyframe sampling

use std::fmt;

use glam::{Quat, Vec3};

use crate::error::{Result, SkinnedDataError};

/// Which component of a bone's local transform a keyframe list drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    Translation,
    Scale,
    Rotation,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Translation => "translation",
            Self::Scale => "scale",
            Self::Rotation => "rotation",
        };
        f.write_str(name)
    }
}

/// A `(time, value)` sample; time is in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub const fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Translation or scale keyframe
pub type VectorKey = Keyframe<Vec3>;

/// Rotation keyframe (unit quaternion)
pub type QuatKey = Keyframe<Quat>;

/// Trait for keyframe values that can be blended between two samples
pub trait Interpolate: Copy {
    /// Blend from `self` towards `other` by `frac` in `[0, 1]`
    fn interpolate(&self, other: &Self, frac: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn interpolate(&self, other: &Self, frac: f32) -> Self {
        self.lerp(*other, frac)
    }
}

impl Interpolate for Quat {
    /// Shortest-path spherical interpolation. The result is always unit length.
    fn interpolate(&self, other: &Self, frac: f32) -> Self {
        // q and -q are the same rotation; flip to stay on the short arc
        let other = if self.dot(*other) < 0.0 { -*other } else { *other };
        self.slerp(other, frac).normalize()
    }
}

/// Check that keyframe times are finite and sorted ascending
pub fn validate_keys<T>(channel: Channel, keys: &[Keyframe<T>]) -> Result<()> {
    let mut previous = f32::NEG_INFINITY;
    for (index, key) in keys.iter().enumerate() {
        if !key.time.is_finite() {
            return Err(SkinnedDataError::InvalidKeyframeTime { channel, index });
        }
        if key.time < previous {
            return Err(SkinnedDataError::UnsortedKeyframes {
                channel,
                index,
                time: key.time,
            });
        }
        previous = key.time;
    }
    Ok(())
}

/// Find the index of the keyframe at or before the given time
///
/// Returns None if the list is empty. For a time before the first key this
/// returns `Some(0)`; otherwise the result is the earlier key of the
/// bracketing pair `[index]`/`[index + 1]`.
pub fn find_keyframe_index<T>(keys: &[Keyframe<T>], time: f32) -> Option<usize> {
    if keys.is_empty() {
        return None;
    }
    let after = keys.partition_point(|key| key.time <= time);
    Some(after.saturating_sub(1))
}

/// Sample a keyframe list at `time`
///
/// Clamps to the first/last value outside the key range and never
/// extrapolates. A time that hits a key exactly returns that key's value.
pub fn sample<T: Interpolate>(keys: &[Keyframe<T>], time: f32) -> Option<T> {
    let first = keys.first()?;
    let last = keys.last()?;

    if time <= first.time {
        return Some(first.value);
    }
    if time >= last.time {
        return Some(last.value);
    }

    let index = find_keyframe_index(keys, time)?;
    let from = &keys[index];
    if from.time == time {
        return Some(from.value);
    }

    // Only a NaN time can land on the last key here
    let Some(to) = keys.get(index + 1) else {
        return Some(from.value);
    };
    let frac = (time - from.time) / (to.time - from.time);
    Some(from.value.interpolate(&to.value, frac))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn vector_keys() -> Vec<VectorKey> {
        vec![
            Keyframe::new(0.0, Vec3::ZERO),
            Keyframe::new(1.0, Vec3::new(10.0, 0.0, 0.0)),
            Keyframe::new(2.0, Vec3::new(10.0, 10.0, 0.0)),
        ]
    }

    #[test]
    fn test_find_keyframe_index_empty() {
        let keys: Vec<VectorKey> = vec![];
        assert_eq!(find_keyframe_index(&keys, 0.0), None);
    }

    #[test]
    fn test_find_keyframe_index_multiple() {
        let keys = vector_keys();

        // Before first
        assert_eq!(find_keyframe_index(&keys, -1.0), Some(0));

        // Between keyframes
        assert_eq!(find_keyframe_index(&keys, 0.5), Some(0));
        assert_eq!(find_keyframe_index(&keys, 1.5), Some(1));

        // At keyframes
        assert_eq!(find_keyframe_index(&keys, 1.0), Some(1));
        assert_eq!(find_keyframe_index(&keys, 2.0), Some(2));

        // After last
        assert_eq!(find_keyframe_index(&keys, 5.0), Some(2));
    }

    #[test]
    fn test_sample_empty() {
        let keys: Vec<VectorKey> = vec![];
        assert_eq!(sample(&keys, 0.5), None);
    }

    #[test]
    fn test_sample_linear() {
        let keys = vector_keys();

        let v = sample(&keys, 0.5).unwrap();
        assert!((v.x - 5.0).abs() < 0.001);

        let v = sample(&keys, 1.25).unwrap();
        assert!((v.x - 10.0).abs() < 0.001);
        assert!((v.y - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_sample_clamps() {
        let keys = vector_keys();
        assert_eq!(sample(&keys, -3.0), Some(Vec3::ZERO));
        assert_eq!(sample(&keys, 7.0), Some(Vec3::new(10.0, 10.0, 0.0)));
    }

    #[test]
    fn test_sample_duplicate_times() {
        // A step encoded as two keys sharing a time
        let keys = vec![
            Keyframe::new(0.0, Vec3::ZERO),
            Keyframe::new(1.0, Vec3::ZERO),
            Keyframe::new(1.0, Vec3::ONE),
            Keyframe::new(2.0, Vec3::ONE),
        ];
        assert_eq!(sample(&keys, 1.0), Some(Vec3::ONE));
        assert_eq!(sample(&keys, 1.5), Some(Vec3::ONE));
    }

    #[test]
    fn test_quat_shortest_path() {
        let a = Quat::from_rotation_y(0.1);
        let b = -Quat::from_rotation_y(0.3);
        let mid = a.interpolate(&b, 0.5);
        let expected = Quat::from_rotation_y(0.2);
        assert!(mid.dot(expected).abs() > 0.9999);
    }

    #[test]
    fn test_quat_midpoint() {
        let mid = Quat::IDENTITY.interpolate(&Quat::from_rotation_y(FRAC_PI_2), 0.5);
        let expected = Quat::from_rotation_y(FRAC_PI_2 / 2.0);
        assert!(mid.abs_diff_eq(expected, 1e-5));
        assert!((mid.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_validate_keys() {
        assert!(validate_keys(Channel::Translation, &vector_keys()).is_ok());

        let unsorted = vec![
            Keyframe::new(1.0, Vec3::ZERO),
            Keyframe::new(0.5, Vec3::ONE),
        ];
        assert_eq!(
            validate_keys(Channel::Scale, &unsorted),
            Err(SkinnedDataError::UnsortedKeyframes {
                channel: Channel::Scale,
                index: 1,
                time: 0.5,
            })
        );

        let nan = vec![Keyframe::new(f32::NAN, Quat::IDENTITY)];
        assert_eq!(
            validate_keys(Channel::Rotation, &nan),
            Err(SkinnedDataError::InvalidKeyframeTime {
                channel: Channel::Rotation,
                index: 0,
            })
        );
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(Channel::Translation.to_string(), "translation");
        assert_eq!(Channel::Rotation.to_string(), "rotation");
    }
}

//! Bounded per-vertex bone influences

use std::fmt;

/// Bone influences a skinned vertex can store
pub const MAX_BONES_PER_VERTEX: usize = 4;

/// What to do when a vertex receives more than [`MAX_BONES_PER_VERTEX`] influences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum WeightOverflowPolicy {
    /// Keep the strongest influences and renormalize them to sum to one
    #[default]
    KeepStrongest,
    /// Abort the import
    Reject,
    /// Keep the first influences in discovery order and drop the rest
    KeepFirst,
}

impl fmt::Display for WeightOverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepStrongest => write!(f, "keep-strongest"),
            Self::Reject => write!(f, "reject"),
            Self::KeepFirst => write!(f, "keep-first"),
        }
    }
}

/// Outcome of [`BoneWeightSet::add`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightAdd {
    /// Written into a free slot
    Stored,
    /// Zero or negative weight, nothing stored
    Ignored,
    /// Evicted a weaker influence, which is returned
    Replaced { bone: u16, weight: f32 },
    /// The set was full and the new influence was discarded
    Dropped,
    /// The set was full and the policy forbids discarding
    Rejected,
}

/// Up to four `(bone, weight)` pairs for one vertex, in discovery order
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BoneWeightSet {
    indices: [u16; MAX_BONES_PER_VERTEX],
    weights: [f32; MAX_BONES_PER_VERTEX],
    len: usize,
    overflowed: bool,
}

impl BoneWeightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one influence, applying `policy` when all slots are taken
    pub fn add(&mut self, bone: u16, weight: f32, policy: WeightOverflowPolicy) -> WeightAdd {
        if weight <= 0.0 || !weight.is_finite() {
            return WeightAdd::Ignored;
        }

        if self.len < MAX_BONES_PER_VERTEX {
            self.indices[self.len] = bone;
            self.weights[self.len] = weight;
            self.len += 1;
            return WeightAdd::Stored;
        }

        self.overflowed = true;
        match policy {
            WeightOverflowPolicy::Reject => WeightAdd::Rejected,
            WeightOverflowPolicy::KeepFirst => WeightAdd::Dropped,
            WeightOverflowPolicy::KeepStrongest => {
                let (slot, weakest) = self
                    .weights
                    .iter()
                    .copied()
                    .enumerate()
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .unwrap_or((0, f32::INFINITY));

                if weight <= weakest {
                    return WeightAdd::Dropped;
                }

                let evicted = WeightAdd::Replaced {
                    bone: self.indices[slot],
                    weight: weakest,
                };
                self.indices[slot] = bone;
                self.weights[slot] = weight;
                evicted
            }
        }
    }

    /// Renormalize after all influences were added
    ///
    /// Only sets that overflowed under [`WeightOverflowPolicy::KeepStrongest`]
    /// are touched; every other set keeps the weights it was given.
    pub fn finalize(&mut self, policy: WeightOverflowPolicy) {
        if !self.overflowed || policy != WeightOverflowPolicy::KeepStrongest {
            return;
        }

        let total: f32 = self.weights[..self.len].iter().sum();
        if total > 0.0 {
            for weight in &mut self.weights[..self.len] {
                *weight /= total;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if more than four influences were offered
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Stored `(bone, weight)` pairs
    pub fn influences(&self) -> impl Iterator<Item = (u16, f32)> + '_ {
        self.indices[..self.len]
            .iter()
            .copied()
            .zip(self.weights[..self.len].iter().copied())
    }

    /// Bone indices, unused slots are 0
    pub fn indices(&self) -> [u16; MAX_BONES_PER_VERTEX] {
        self.indices
    }

    /// Weights, unused slots are 0.0
    pub fn weights(&self) -> [f32; MAX_BONES_PER_VERTEX] {
        self.weights
    }

    /// The three explicit weights of the skinned vertex format
    ///
    /// The shader derives the fourth as one minus their sum.
    pub fn gpu_weights(&self) -> [f32; 3] {
        [self.weights[0], self.weights[1], self.weights[2]]
    }

    pub fn weight_sum(&self) -> f32 {
        self.weights[..self.len].iter().sum()
    }
}

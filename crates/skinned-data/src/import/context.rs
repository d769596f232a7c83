//! Scene to skeleton conversion

use std::collections::HashMap;

use glam::Mat4;

use super::scene::{Scene, SceneAnimation, SceneMesh, SceneNode};
use super::weights::{BoneWeightSet, MAX_BONES_PER_VERTEX, WeightAdd, WeightOverflowPolicy};
use crate::animation::{AnimationClip, BoneAnimation, Keyframe};
use crate::error::{Result, SkinnedDataError};
use crate::skeleton::{Bone, MAX_SKINNING_BONES, Skeleton};

/// Tick rate assumed when an animation does not report one
pub const DEFAULT_TICKS_PER_SECOND: f32 = 25.0;

/// Import configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ImportOptions {
    /// Handling of vertices with more than four influences
    pub overflow_policy: WeightOverflowPolicy,
    /// Maximum node count, capped at [`MAX_SKINNING_BONES`]
    pub max_bones: usize,
    /// Used for animations whose tick rate is zero
    pub default_ticks_per_second: f32,
    /// Keep only the text after the last `|` of a clip name
    pub strip_clip_prefix: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            overflow_policy: WeightOverflowPolicy::default(),
            max_bones: MAX_SKINNING_BONES,
            default_ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            strip_clip_prefix: true,
        }
    }
}

impl ImportOptions {
    pub fn with_overflow_policy(mut self, policy: WeightOverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    pub fn with_max_bones(mut self, max_bones: usize) -> Self {
        self.max_bones = max_bones;
        self
    }

    pub fn with_default_ticks_per_second(mut self, ticks_per_second: f32) -> Self {
        self.default_ticks_per_second = ticks_per_second;
        self
    }

    pub fn with_strip_clip_prefix(mut self, strip: bool) -> Self {
        self.strip_clip_prefix = strip;
        self
    }

    fn bone_limit(&self) -> usize {
        self.max_bones.min(MAX_SKINNING_BONES)
    }
}

/// A node's reference to a scene mesh, in hierarchy order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshReference {
    pub node: String,
    pub mesh: usize,
}

/// Bone weights extracted from one mesh, indexed by vertex
#[derive(Debug, Clone, PartialEq)]
pub struct MeshWeights {
    pub name: String,
    pub weights: Vec<BoneWeightSet>,
}

impl MeshWeights {
    /// Vertices that were offered more than four influences
    pub fn overflowed_vertices(&self) -> usize {
        self.weights.iter().filter(|set| set.overflowed()).count()
    }

    /// Vertices with no influence at all
    pub fn unweighted_vertices(&self) -> usize {
        self.weights.iter().filter(|set| set.is_empty()).count()
    }
}

/// Result of [`import_scene`]
#[derive(Debug, Clone)]
pub struct ImportedModel {
    pub skeleton: Skeleton,
    pub meshes: Vec<MeshWeights>,
}

/// Accumulates bones while a scene is converted
///
/// The usual order is [`read_node_hierarchy`](Self::read_node_hierarchy),
/// then [`load_bones`](Self::load_bones) for each mesh, then
/// [`load_animations`](Self::load_animations) and finally
/// [`into_skeleton`](Self::into_skeleton). [`import_scene`] runs all of them.
#[derive(Debug, Clone, Default)]
pub struct ImportContext {
    options: ImportOptions,
    bones: Vec<Bone>,
    bone_lookup: HashMap<String, usize>,
    offset_assigned: Vec<bool>,
}

impl ImportContext {
    pub fn new(options: ImportOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bone_lookup.get(name).copied()
    }

    /// Turn every node under `root` into a bone
    ///
    /// Bones are numbered in depth-first pre-order, so each parent gets a
    /// lower index than its children. A node's transform becomes the bone's
    /// default transform. Any bones from an earlier call are discarded.
    ///
    /// Returns the mesh references met along the way, in the same order.
    pub fn read_node_hierarchy(&mut self, root: &SceneNode) -> Result<Vec<MeshReference>> {
        self.bones.clear();
        self.bone_lookup.clear();
        self.offset_assigned.clear();

        let limit = self.options.bone_limit();
        let count = count_nodes(root);
        if count > limit {
            return Err(SkinnedDataError::BoneLimitExceeded { count, limit });
        }

        let mut mesh_refs = Vec::new();
        let mut stack: Vec<(&SceneNode, Option<usize>)> = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            let index = self.bones.len();
            if self.bone_lookup.contains_key(&node.name) {
                return Err(SkinnedDataError::DuplicateBoneName(node.name.clone()));
            }

            log::debug!("Bone {index}: '{}' (parent {parent:?})", node.name);

            self.bone_lookup.insert(node.name.clone(), index);
            self.bones
                .push(Bone::new(node.name.clone(), parent).with_default_transform(node.transform));
            self.offset_assigned.push(false);

            mesh_refs.extend(node.meshes.iter().map(|&mesh| MeshReference {
                node: node.name.clone(),
                mesh,
            }));

            // Reversed so the first child is visited next
            stack.extend(node.children.iter().rev().map(|child| (child, Some(index))));
        }

        Ok(mesh_refs)
    }

    /// Extract per-vertex bone weights from a mesh
    ///
    /// A bone's offset matrix is taken from the first mesh that references
    /// it; later references only contribute weights.
    pub fn load_bones(&mut self, mesh: &SceneMesh) -> Result<Vec<BoneWeightSet>> {
        let policy = self.options.overflow_policy;
        let mut sets = vec![BoneWeightSet::new(); mesh.vertex_count];
        let mut discarded = 0usize;

        for mesh_bone in &mesh.bones {
            let index =
                self.bone_index(&mesh_bone.name)
                    .ok_or_else(|| SkinnedDataError::UnknownBone {
                        name: mesh_bone.name.clone(),
                        referenced_by: format!("mesh '{}'", mesh.name),
                    })?;

            if !self.offset_assigned[index] {
                self.bones[index].offset = mesh_bone.offset;
                self.offset_assigned[index] = true;
            }

            let bone = u16::try_from(index).map_err(|_| SkinnedDataError::BoneLimitExceeded {
                count: self.bones.len(),
                limit: MAX_SKINNING_BONES,
            })?;

            for vertex_weight in &mesh_bone.weights {
                let vertex = vertex_weight.vertex;
                let set =
                    sets.get_mut(vertex)
                        .ok_or_else(|| SkinnedDataError::VertexOutOfRange {
                            mesh: mesh.name.clone(),
                            vertex,
                            vertex_count: mesh.vertex_count,
                        })?;

                match set.add(bone, vertex_weight.weight, policy) {
                    WeightAdd::Stored | WeightAdd::Ignored => {}
                    WeightAdd::Replaced { bone: evicted, weight } => {
                        log::debug!(
                            "Mesh '{}' vertex {vertex}: bone {evicted} (weight {weight}) replaced by bone {bone}",
                            mesh.name
                        );
                        discarded += 1;
                    }
                    WeightAdd::Dropped => {
                        log::debug!(
                            "Mesh '{}' vertex {vertex}: dropped bone {bone} (weight {})",
                            mesh.name,
                            vertex_weight.weight
                        );
                        discarded += 1;
                    }
                    WeightAdd::Rejected => {
                        return Err(SkinnedDataError::TooManyInfluences {
                            mesh: mesh.name.clone(),
                            vertex,
                            limit: MAX_BONES_PER_VERTEX,
                        });
                    }
                }
            }
        }

        for set in &mut sets {
            set.finalize(policy);
        }

        if discarded > 0 {
            log::warn!(
                "Mesh '{}': discarded {discarded} bone influences beyond {MAX_BONES_PER_VERTEX} per vertex ({policy})",
                mesh.name
            );
        }

        Ok(sets)
    }

    /// Convert scene animations into clips
    ///
    /// Key times are converted from ticks to seconds. Channels must name a
    /// node read by [`read_node_hierarchy`](Self::read_node_hierarchy).
    pub fn load_animations(&self, animations: &[SceneAnimation]) -> Result<Vec<AnimationClip>> {
        let default_rate = self.options.default_ticks_per_second;
        if !is_valid_tick_rate(default_rate) {
            return Err(SkinnedDataError::InvalidTickRate(default_rate));
        }

        let mut clips = Vec::with_capacity(animations.len());

        for animation in animations {
            let ticks_per_second = if is_valid_tick_rate(animation.ticks_per_second) {
                animation.ticks_per_second
            } else {
                self.options.default_ticks_per_second
            };
            let name = self.clip_name(&animation.name);

            let mut bone_animations = Vec::with_capacity(animation.channels.len());
            for channel in &animation.channels {
                let index =
                    self.bone_index(&channel.node)
                        .ok_or_else(|| SkinnedDataError::UnknownBone {
                            name: channel.node.clone(),
                            referenced_by: format!("animation '{}'", animation.name),
                        })?;

                let bone_animation = BoneAnimation::new(
                    keys_to_seconds(&channel.position_keys, ticks_per_second),
                    keys_to_seconds(&channel.scaling_keys, ticks_per_second),
                    keys_to_seconds(&channel.rotation_keys, ticks_per_second),
                )?
                .with_default_transform(self.default_transform(index));

                bone_animations.push((index, bone_animation));
            }

            let clip = AnimationClip::new(name, bone_animations)?;
            log::debug!(
                "Clip '{}': {} bones, {}s to {}s",
                clip.name(),
                clip.bone_count(),
                clip.start_time(),
                clip.end_time()
            );
            clips.push(clip);
        }

        Ok(clips)
    }

    /// Finish the import
    pub fn into_skeleton(self, clips: impl IntoIterator<Item = AnimationClip>) -> Result<Skeleton> {
        Skeleton::new(self.bones, clips)
    }

    fn clip_name(&self, name: &str) -> String {
        if !self.options.strip_clip_prefix {
            return name.to_string();
        }
        match name.rsplit_once('|') {
            Some((_, stripped)) if !stripped.is_empty() => stripped.to_string(),
            _ => name.to_string(),
        }
    }

    fn default_transform(&self, index: usize) -> Mat4 {
        self.bones
            .get(index)
            .map_or(Mat4::IDENTITY, |bone| bone.default_transform)
    }
}

fn is_valid_tick_rate(ticks_per_second: f32) -> bool {
    ticks_per_second.is_finite() && ticks_per_second > 0.0
}

fn count_nodes(root: &SceneNode) -> usize {
    let mut count = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(&node.children);
    }
    count
}

fn keys_to_seconds<T: Copy>(keys: &[Keyframe<T>], ticks_per_second: f32) -> Vec<Keyframe<T>> {
    keys.iter()
        .map(|key| Keyframe::new(key.time / ticks_per_second, key.value))
        .collect()
}

/// Convert a scene into a skeleton with clips plus per-mesh bone weights
///
/// Meshes are processed in the order their nodes appear in the hierarchy.
pub fn import_scene(scene: &Scene, options: ImportOptions) -> Result<ImportedModel> {
    let mut context = ImportContext::new(options);
    let mesh_refs = context.read_node_hierarchy(&scene.root)?;

    let mut meshes = Vec::with_capacity(mesh_refs.len());
    for reference in mesh_refs {
        let mesh = scene
            .meshes
            .get(reference.mesh)
            .ok_or_else(|| SkinnedDataError::MeshOutOfRange {
                node: reference.node.clone(),
                mesh: reference.mesh,
                mesh_count: scene.meshes.len(),
            })?;

        let weights = context.load_bones(mesh)?;
        meshes.push(MeshWeights {
            name: mesh.name.clone(),
            weights,
        });
    }

    let clips = context.load_animations(&scene.animations)?;
    let skeleton = context.into_skeleton(clips)?;

    log::info!(
        "Imported {} bones, {} meshes, {} clips",
        skeleton.bone_count(),
        meshes.len(),
        skeleton.clip_names().len()
    );

    Ok(ImportedModel { skeleton, meshes })
}

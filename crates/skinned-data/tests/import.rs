//! Scene import from node graph to playable skeleton

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use pretty_assertions::assert_eq;
use skinned_data::animation::Keyframe;
use skinned_data::import::{
    ImportOptions, MeshBone, NodeChannel, Scene, SceneAnimation, SceneMesh, SceneNode,
    VertexWeight, WeightOverflowPolicy, import_scene,
};
use skinned_data::{SkinnedDataError, SkinnedModelInstance};

fn weights(pairs: &[(usize, f32)]) -> Vec<VertexWeight> {
    pairs
        .iter()
        .map(|&(vertex, weight)| VertexWeight { vertex, weight })
        .collect()
}

/// Armature with a torso mesh and a five-bone skirt mesh
fn character() -> Scene {
    let skirt_bones = ["skirt0", "skirt1", "skirt2", "skirt3", "skirt4"];
    let mut hips = SceneNode::new("hips").with_transform(Mat4::from_translation(Vec3::Y));
    for name in skirt_bones {
        hips = hips.with_child(SceneNode::new(name));
    }

    let root = SceneNode::new("Armature")
        .with_mesh(0)
        .with_child(
            hips.with_child(
                SceneNode::new("chest")
                    .with_transform(Mat4::from_translation(Vec3::Y))
                    .with_mesh(1),
            ),
        );

    let torso = SceneMesh {
        name: "torso".to_string(),
        vertex_count: 3,
        bones: vec![
            MeshBone {
                name: "hips".to_string(),
                offset: Mat4::from_translation(Vec3::NEG_Y),
                weights: weights(&[(0, 1.0), (1, 0.5)]),
            },
            MeshBone {
                name: "chest".to_string(),
                offset: Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)),
                weights: weights(&[(1, 0.5), (2, 1.0)]),
            },
        ],
    };

    // Vertex 0 is pulled by five bones with weights 0.1 .. 0.5
    let skirt = SceneMesh {
        name: "skirt".to_string(),
        vertex_count: 1,
        bones: skirt_bones
            .iter()
            .enumerate()
            .map(|(i, name)| MeshBone {
                name: name.to_string(),
                offset: Mat4::IDENTITY,
                weights: weights(&[(0, 0.1 * (i + 1) as f32)]),
            })
            .collect(),
    };

    let mut sway = NodeChannel::new("hips");
    sway.position_keys = vec![
        Keyframe::new(0.0, Vec3::Y),
        Keyframe::new(30.0, Vec3::new(1.0, 1.0, 0.0)),
    ];
    let mut twist = NodeChannel::new("chest");
    twist.rotation_keys = vec![
        Keyframe::new(0.0, Quat::IDENTITY),
        Keyframe::new(60.0, Quat::from_rotation_y(1.0)),
    ];

    Scene {
        root,
        meshes: vec![torso, skirt],
        animations: vec![SceneAnimation {
            name: "Armature|Dance".to_string(),
            ticks_per_second: 30.0,
            channels: vec![sway, twist],
        }],
    }
}

#[test]
fn test_import_builds_skeleton() {
    let model = import_scene(&character(), ImportOptions::default()).unwrap();
    let skeleton = &model.skeleton;

    assert_eq!(skeleton.bone_count(), 8);
    assert_eq!(skeleton.bone_index("Armature"), Some(0));
    assert_eq!(skeleton.bone_index("hips"), Some(1));
    assert_eq!(skeleton.bone_index("skirt0"), Some(2));
    assert_eq!(skeleton.bone_index("chest"), Some(7));
    assert_eq!(skeleton.parent_indices(), vec![-1, 0, 1, 1, 1, 1, 1, 1]);

    assert_eq!(skeleton.clip_names(), vec!["Dance"]);
    assert_eq!(skeleton.clip_end_time("Dance").unwrap(), 2.0);
}

#[test]
fn test_import_mesh_weights() {
    let model = import_scene(&character(), ImportOptions::default()).unwrap();
    assert_eq!(model.meshes.len(), 2);

    let torso = &model.meshes[0];
    assert_eq!(torso.name, "torso");
    assert_eq!(torso.weights[1].indices(), [1, 7, 0, 0]);
    assert_eq!(torso.weights[1].weights(), [0.5, 0.5, 0.0, 0.0]);
    assert_eq!(torso.overflowed_vertices(), 0);
    assert_eq!(torso.unweighted_vertices(), 0);

    let skirt = &model.meshes[1];
    let vertex = &skirt.weights[0];
    assert_eq!(vertex.len(), 4);
    assert!(vertex.overflowed());
    // skirt0 (weight 0.1) is the one evicted
    assert_eq!(vertex.indices(), [6, 3, 4, 5]);
    assert!((vertex.weight_sum() - 1.0).abs() < 1e-6);
}

#[test]
fn test_import_keep_first_policy() {
    let options = ImportOptions::default().with_overflow_policy(WeightOverflowPolicy::KeepFirst);
    let model = import_scene(&character(), options).unwrap();

    let vertex = &model.meshes[1].weights[0];
    assert_eq!(vertex.indices(), [2, 3, 4, 5]);
    assert!((vertex.weight_sum() - 1.0).abs() < 1e-6);
}

#[test]
fn test_import_reject_policy() {
    let options = ImportOptions::default().with_overflow_policy(WeightOverflowPolicy::Reject);
    let err = import_scene(&character(), options).unwrap_err();
    assert_eq!(
        err,
        SkinnedDataError::TooManyInfluences {
            mesh: "skirt".to_string(),
            vertex: 0,
            limit: 4,
        }
    );
}

#[test]
fn test_imported_bind_pose_skins_to_identity() {
    let mut scene = character();
    // Keep the hips and chest at their bind pose for the whole clip
    scene.animations[0].channels[0].position_keys = vec![Keyframe::new(0.0, Vec3::Y)];
    scene.animations[0].channels[1].rotation_keys = vec![Keyframe::new(0.0, Quat::IDENTITY)];
    scene.animations[0].channels[1].position_keys = vec![Keyframe::new(0.0, Vec3::Y)];

    let model = import_scene(&scene, ImportOptions::default()).unwrap();
    let mut finals = Vec::new();
    model
        .skeleton
        .final_transforms("Dance", 0.0, &mut finals)
        .unwrap();

    assert!(finals[1].abs_diff_eq(Mat4::IDENTITY, 1e-6));
    assert!(finals[7].abs_diff_eq(Mat4::IDENTITY, 1e-6));
}

#[test]
fn test_imported_clip_plays() {
    let model = import_scene(&character(), ImportOptions::default()).unwrap();
    let mut instance = SkinnedModelInstance::new(Arc::new(model.skeleton), "Dance").unwrap();

    instance.update(0.5).unwrap();
    let hips = instance.final_transforms()[1].transform_point3(Vec3::Y);
    // Bind position (0,1,0), offset brings it to the origin, animation moves it to (0.5,1,0)
    assert!(hips.abs_diff_eq(Vec3::new(0.5, 1.0, 0.0), 1e-6));

    instance.update(2.0).unwrap();
    assert_eq!(instance.time_pos(), 0.0);
}

#[test]
fn test_import_unknown_channel_aborts() {
    let mut scene = character();
    scene.animations[0].channels[1].node = "tail".to_string();

    let err = import_scene(&scene, ImportOptions::default()).unwrap_err();
    assert_eq!(
        err,
        SkinnedDataError::UnknownBone {
            name: "tail".to_string(),
            referenced_by: "animation 'Armature|Dance'".to_string(),
        }
    );
}

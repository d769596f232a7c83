//! Skeleton and animation command implementations

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use skinned_data::import::{ImportOptions, ImportedModel, Scene, WeightOverflowPolicy, import_scene};
use skinned_data::{MAX_SKINNING_BONES, SkinnedModelInstance};

use crate::utils::{
    TreeOptions, add_table_row, bone_tree, create_table, format_matrix_rows, format_ratio,
    format_seconds, format_vec3, render_tree,
};

#[derive(Subcommand)]
pub enum SkeletonCommands {
    /// Display bones, meshes and clips of a scene
    Info {
        /// Path to the scene JSON file
        file: PathBuf,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// Display the bone hierarchy as a tree
    Tree {
        /// Path to the scene JSON file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Show bone details on the same line
        #[arg(short, long)]
        compact: bool,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// Print final skinning matrices at a point in a clip
    Pose {
        /// Path to the scene JSON file
        file: PathBuf,

        /// Clip to evaluate
        #[arg(long)]
        clip: String,

        /// Playback time in seconds
        #[arg(short, long, default_value = "0")]
        time: f32,

        /// Only print this bone
        #[arg(short, long)]
        bone: Option<usize>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// Play a clip in fixed steps and print the playhead
    Play {
        /// Path to the scene JSON file
        file: PathBuf,

        /// Clip to play
        #[arg(long)]
        clip: String,

        /// Seconds per frame
        #[arg(long, default_value = "0.0333")]
        dt: f32,

        /// Number of frames to simulate
        #[arg(short, long, default_value = "30")]
        frames: usize,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// Import a scene and report whether it is usable
    Validate {
        /// Path to the scene JSON file
        file: PathBuf,

        #[command(flatten)]
        import: ImportArgs,
    },
}

/// Import settings shared by every command
#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// How to handle vertices with more than four bone influences
    #[arg(long, value_enum, env = "SKINNED_RS_OVERFLOW", default_value = "keep-strongest")]
    pub overflow: OverflowPolicy,

    /// Maximum number of bones
    #[arg(long, env = "SKINNED_RS_MAX_BONES", default_value_t = MAX_SKINNING_BONES)]
    pub max_bones: usize,

    /// Tick rate for animations that do not specify one
    #[arg(long, default_value = "25", value_parser = parse_tick_rate)]
    pub ticks_per_second: f32,

    /// Keep the "Armature|" style prefix of clip names
    #[arg(long)]
    pub keep_clip_prefix: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OverflowPolicy {
    /// Keep the four strongest influences and renormalize
    KeepStrongest,
    /// Fail the import
    Reject,
    /// Keep the first four influences
    KeepFirst,
}

impl From<OverflowPolicy> for WeightOverflowPolicy {
    fn from(policy: OverflowPolicy) -> Self {
        match policy {
            OverflowPolicy::KeepStrongest => Self::KeepStrongest,
            OverflowPolicy::Reject => Self::Reject,
            OverflowPolicy::KeepFirst => Self::KeepFirst,
        }
    }
}

fn parse_tick_rate(value: &str) -> std::result::Result<f32, String> {
    let rate: f32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(format!("tick rate must be positive, got {value}"))
    }
}

impl ImportArgs {
    pub fn options(&self) -> ImportOptions {
        ImportOptions::default()
            .with_overflow_policy(self.overflow.into())
            .with_max_bones(self.max_bones)
            .with_default_ticks_per_second(self.ticks_per_second)
            .with_strip_clip_prefix(!self.keep_clip_prefix)
    }
}

pub fn execute(cmd: SkeletonCommands) -> Result<()> {
    match cmd {
        SkeletonCommands::Info { file, import } => handle_info(&file, &import),
        SkeletonCommands::Tree {
            file,
            depth,
            no_color,
            compact,
            import,
        } => handle_tree(&file, depth, no_color, compact, &import),
        SkeletonCommands::Pose {
            file,
            clip,
            time,
            bone,
            json,
            import,
        } => handle_pose(&file, &clip, time, bone, json, &import),
        SkeletonCommands::Play {
            file,
            clip,
            dt,
            frames,
            import,
        } => handle_play(&file, &clip, dt, frames, &import),
        SkeletonCommands::Validate { file, import } => handle_validate(&file, &import),
    }
}

/// Read a scene description from a JSON file
pub fn load_scene(path: &Path) -> Result<Scene> {
    log::info!("Loading scene: {}", path.display());

    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    // Every hierarchy level nests two JSON values, so a bone chain of
    // MAX_SKINNING_BONES goes far past serde_json's default depth of 128
    let mut json = serde_json::Deserializer::from_reader(BufReader::new(file));
    json.disable_recursion_limit();
    let scene = Scene::deserialize(serde_stacker::Deserializer::new(&mut json))
        .and_then(|scene| json.end().map(|()| scene))
        .with_context(|| format!("Failed to parse scene from {}", path.display()))?;

    Ok(scene)
}

/// Load and import a scene in one step
pub fn load_model(path: &Path, import: &ImportArgs) -> Result<ImportedModel> {
    let scene = load_scene(path)?;
    import_scene(&scene, import.options())
        .with_context(|| format!("Failed to import scene from {}", path.display()))
}

fn handle_info(path: &Path, import: &ImportArgs) -> Result<()> {
    let model = load_model(path, import)?;
    let skeleton = &model.skeleton;

    println!("=== Scene: {} ===", path.display());
    println!("Bones: {}", skeleton.bone_count());
    println!("Meshes: {}", model.meshes.len());
    println!("Clips: {}", skeleton.clip_names().len());

    if !model.meshes.is_empty() {
        println!("\nMeshes:");
        let mut table = create_table(&["Mesh", "Vertices", "Unweighted", "Overflowed"]);
        for mesh in &model.meshes {
            let vertices = mesh.weights.len();
            add_table_row(
                &mut table,
                [
                    mesh.name.clone(),
                    vertices.to_string(),
                    mesh.unweighted_vertices().to_string(),
                    format!(
                        "{} ({})",
                        mesh.overflowed_vertices(),
                        format_ratio(mesh.overflowed_vertices(), vertices)
                    ),
                ],
            );
        }
        table.printstd();
    }

    let clip_names = skeleton.clip_names();
    if !clip_names.is_empty() {
        println!("\nClips:");
        let mut table = create_table(&["Clip", "Bones", "Start", "End", "Duration"]);
        for name in clip_names {
            let clip = skeleton.clip(name)?;
            add_table_row(
                &mut table,
                [
                    name.to_string(),
                    clip.bone_count().to_string(),
                    format_seconds(clip.start_time()),
                    format_seconds(clip.end_time()),
                    format_seconds(clip.duration()),
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}

fn handle_tree(
    path: &Path,
    depth: Option<usize>,
    no_color: bool,
    compact: bool,
    import: &ImportArgs,
) -> Result<()> {
    let model = load_model(path, import)?;

    let options = TreeOptions {
        max_depth: depth,
        no_color,
        show_metadata: true,
        compact,
    };
    print!("{}", render_tree(&bone_tree(&model.skeleton, 0), &options));

    Ok(())
}

#[derive(Serialize)]
struct BonePose<'a> {
    bone: usize,
    name: &'a str,
    /// Column-major
    matrix: [f32; 16],
}

fn handle_pose(
    path: &Path,
    clip: &str,
    time: f32,
    bone: Option<usize>,
    json: bool,
    import: &ImportArgs,
) -> Result<()> {
    let model = load_model(path, import)?;
    let skeleton = &model.skeleton;

    let mut finals = Vec::with_capacity(skeleton.bone_count());
    skeleton
        .final_transforms(clip, time, &mut finals)
        .with_context(|| format!("Failed to evaluate clip '{clip}' at {time}s"))?;

    let selected: Vec<usize> = match bone {
        Some(index) if index < finals.len() => vec![index],
        Some(index) => anyhow::bail!(
            "Bone {index} does not exist, the skeleton has {} bones",
            finals.len()
        ),
        None => (0..finals.len()).collect(),
    };

    let poses: Vec<BonePose> = selected
        .into_iter()
        .map(|index| BonePose {
            bone: index,
            name: skeleton.bone(index).map_or("", |b| b.name.as_str()),
            matrix: finals[index].to_cols_array(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&poses)?);
        return Ok(());
    }

    println!("Clip '{clip}' at {}", format_seconds(time));
    for pose in &poses {
        println!("\nBone {} ({})", pose.bone, pose.name);
        for row in format_matrix_rows(&Mat4::from_cols_array(&pose.matrix)) {
            println!("  {row}");
        }
    }

    Ok(())
}

fn handle_play(path: &Path, clip: &str, dt: f32, frames: usize, import: &ImportArgs) -> Result<()> {
    let model = load_model(path, import)?;
    let skeleton = Arc::new(model.skeleton);

    if !skeleton.has_clip(clip) {
        anyhow::bail!(
            "Clip not found: '{clip}' (available: {})",
            skeleton.clip_names().join(", ")
        );
    }

    let mut instance = SkinnedModelInstance::new(Arc::clone(&skeleton), clip)
        .with_context(|| format!("Failed to start clip '{clip}'"))?;

    println!(
        "Playing '{clip}' ({} to {}) with dt = {}",
        format_seconds(skeleton.clip_start_time(clip)?),
        format_seconds(skeleton.clip_end_time(clip)?),
        format_seconds(dt)
    );

    let mut table = create_table(&["Frame", "Time", "Root position"]);
    for frame in 1..=frames {
        instance.update(dt)?;
        let root = instance
            .final_transforms()
            .first()
            .map_or(Vec3::ZERO, |m| m.transform_point3(Vec3::ZERO));
        add_table_row(
            &mut table,
            [
                frame.to_string(),
                format_seconds(instance.time_pos()),
                format_vec3(root),
            ],
        );
    }
    table.printstd();

    Ok(())
}

fn handle_validate(path: &Path, import: &ImportArgs) -> Result<()> {
    let model = load_model(path, import)?;

    let overflowed: usize = model
        .meshes
        .iter()
        .map(|mesh| mesh.overflowed_vertices())
        .sum();

    println!("✓ {} is valid", path.display());
    println!(
        "  {} bones, {} meshes, {} clips",
        model.skeleton.bone_count(),
        model.meshes.len(),
        model.skeleton.clip_names().len()
    );
    if overflowed > 0 {
        println!(
            "  {overflowed} vertices had more than four influences ({})",
            import.options().overflow_policy
        );
    }

    Ok(())
}

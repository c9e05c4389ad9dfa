//! MDS skeletal model command implementations

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use console::style;
use glam::Mat3;
use prettytable::row;
use serde::Serialize;
use wolf_mds::{FrameInfo, SkeletalModel, Skeleton};

use crate::utils::{
    NodeType, TreeNode, TreeOptions, add_table_row, create_table, format_axes, format_bytes,
    format_percentage, format_vec3, render_tree,
};

#[derive(Subcommand)]
pub enum MdsCommands {
    /// Display information about an MDS model
    Info {
        /// Path to the MDS file
        file: PathBuf,

        /// Show per-frame details
        #[arg(short, long)]
        detailed: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the bone hierarchy
    Bones {
        /// Path to the MDS file
        file: PathBuf,
    },

    /// Evaluate every tag with the given name
    Tag {
        /// Path to the MDS file
        file: PathBuf,

        /// Tag name, e.g. tag_head
        name: String,

        #[command(flatten)]
        pose: PoseArgs,
    },

    /// Evaluate the whole skeleton
    Pose {
        /// Path to the MDS file
        file: PathBuf,

        #[command(flatten)]
        pose: PoseArgs,
    },

    /// Display model structure as a tree
    Tree {
        /// Path to the MDS file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,

        /// Hide shader references
        #[arg(long)]
        no_refs: bool,

        /// Disable colors
        #[arg(long)]
        no_color: bool,
    },
}

/// Frame selection shared by the posing commands
#[derive(Args, Debug, Clone)]
pub struct PoseArgs {
    /// Frame to show
    #[arg(short, long, default_value = "0")]
    frame: usize,

    /// Frame to blend from (defaults to --frame)
    #[arg(long)]
    old_frame: Option<usize>,

    /// Weight of --frame against --old-frame
    #[arg(long, default_value = "0")]
    lerp: f32,

    /// Extra torso yaw in degrees
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    torso_yaw: f32,
}

impl PoseArgs {
    fn frame_info(&self) -> FrameInfo {
        FrameInfo::blend(self.frame, self.old_frame.unwrap_or(self.frame), self.lerp)
            .with_torso_rotation(Mat3::from_rotation_z(self.torso_yaw.to_radians()))
    }
}

pub fn execute(cmd: MdsCommands) -> Result<()> {
    match cmd {
        MdsCommands::Info {
            file,
            detailed,
            json,
        } => handle_info(&file, detailed, json),
        MdsCommands::Bones { file } => handle_bones(&file),
        MdsCommands::Tag { file, name, pose } => handle_tag(&file, &name, &pose.frame_info()),
        MdsCommands::Pose { file, pose } => handle_pose(&file, &pose.frame_info()),
        MdsCommands::Tree {
            file,
            depth,
            no_refs,
            no_color,
        } => handle_tree(&file, depth, !no_refs, no_color),
    }
}

#[derive(Serialize)]
struct SkeletalSummary {
    name: String,
    file_size: u64,
    lod_scale: f32,
    lod_bias: f32,
    torso_parent: i32,
    frames: usize,
    bones: Vec<String>,
    tags: Vec<String>,
    surfaces: Vec<SurfaceSummary>,
}

#[derive(Serialize)]
struct SurfaceSummary {
    name: String,
    shader: String,
    min_lod: i32,
    vertices: usize,
    triangles: usize,
    bone_refs: Vec<usize>,
}

impl SkeletalSummary {
    fn new(model: &SkeletalModel, file_size: u64) -> Self {
        Self {
            name: model.name().to_string(),
            file_size,
            lod_scale: model.lod_scale(),
            lod_bias: model.lod_bias(),
            torso_parent: model.torso_parent(),
            frames: model.frame_count(),
            bones: model
                .bones()
                .iter()
                .map(|bone| bone.name.to_string_lossy())
                .collect(),
            tags: model.tags().iter().map(|tag| tag.name.clone()).collect(),
            surfaces: model
                .surfaces()
                .iter()
                .map(|surface| SurfaceSummary {
                    name: surface.name.clone(),
                    shader: surface.shader.clone(),
                    min_lod: surface.min_lod,
                    vertices: surface.vertex_count(),
                    triangles: surface.triangle_count(),
                    bone_refs: surface.bone_refs.clone(),
                })
                .collect(),
        }
    }
}

fn load(path: &Path) -> Result<(SkeletalModel, u64)> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let model = SkeletalModel::load(&data)
        .with_context(|| format!("Failed to parse MDS model: {}", path.display()))?;
    Ok((model, data.len() as u64))
}

fn bone_name(model: &SkeletalModel, index: usize) -> String {
    model
        .bones()
        .get(index)
        .map_or_else(|| format!("#{index}"), |bone| bone.name.to_string_lossy())
}

fn handle_info(path: &Path, detailed: bool, json: bool) -> Result<()> {
    let (model, file_size) = load(path)?;
    let summary = SkeletalSummary::new(&model, file_size);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n{}", style("MDS Model Information").bold().underlined());
    println!("File: {}", style(path.display()).cyan());
    println!("Size: {}", format_bytes(file_size));
    println!("Name: {}", style(&summary.name).yellow());
    println!("LOD: scale {} bias {}", summary.lod_scale, summary.lod_bias);
    println!(
        "Torso parent: {}",
        usize::try_from(summary.torso_parent)
            .map_or_else(|_| "none".to_string(), |index| bone_name(&model, index))
    );
    println!("Frames: {}", style(summary.frames).green());
    println!("Bones: {}", style(summary.bones.len()).green());
    println!("Tags: {}", style(summary.tags.len()).green());
    println!("Surfaces: {}", style(summary.surfaces.len()).green());

    if !summary.surfaces.is_empty() {
        println!("\n{}", style("Surfaces").bold());
        let mut table = create_table(&[
            "Name", "Shader", "Min LOD", "Vertices", "Triangles", "Bone refs",
        ]);
        for surface in &summary.surfaces {
            table.add_row(row![
                style(&surface.name).cyan(),
                surface.shader,
                surface.min_lod,
                surface.vertices,
                surface.triangles,
                surface.bone_refs.len()
            ]);
        }
        table.printstd();
    }

    if detailed {
        println!("\n{}", style("Frames").bold());
        let mut table = create_table(&["#", "Radius", "Parent offset", "Origin", "Mins", "Maxs"]);
        for (index, frame) in model.frames().iter().enumerate() {
            add_table_row(
                &mut table,
                vec![
                    index.to_string(),
                    format!("{:.2}", frame.radius),
                    format_vec3(frame.parent_offset),
                    format_vec3(frame.local_origin),
                    format_vec3(frame.mins()),
                    format_vec3(frame.maxs()),
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}

fn handle_bones(path: &Path) -> Result<()> {
    let (model, _) = load(path)?;

    let mut table = create_table(&["#", "Name", "Parent", "Distance", "Torso", "Tag"]);
    for (index, bone) in model.bones().iter().enumerate() {
        add_table_row(
            &mut table,
            vec![
                index.to_string(),
                bone.name.to_string_lossy(),
                bone.parent_index()
                    .map_or_else(|| "-".to_string(), |parent| bone_name(&model, parent)),
                format!("{:.2}", bone.parent_dist),
                format_percentage(bone.torso_weight),
                if bone.is_tag() { "yes" } else { "" }.to_string(),
            ],
        );
    }
    table.printstd();

    Ok(())
}

fn handle_tag(path: &Path, name: &str, frame_info: &FrameInfo) -> Result<()> {
    let (model, _) = load(path)?;

    let mut found = 0;
    for result in model.tags_named(name, frame_info) {
        let (index, transform) =
            result.with_context(|| format!("Failed to evaluate tag {name:?}"))?;
        let tag = &model.tags()[index];
        println!(
            "{} #{} on {}: origin {} axes {}",
            style(&tag.name).yellow(),
            index,
            bone_name(&model, tag.bone),
            format_vec3(transform.position),
            format_axes(transform.rotation)
        );
        found += 1;
    }

    if found == 0 {
        anyhow::bail!("No tag named {:?} in {}", name, path.display());
    }
    Ok(())
}

fn handle_pose(path: &Path, frame_info: &FrameInfo) -> Result<()> {
    let (model, _) = load(path)?;

    let all_bones: Vec<usize> = (0..model.bone_count()).collect();
    let skeleton = Skeleton::evaluate(&model, frame_info, &all_bones)
        .with_context(|| format!("Failed to pose {}", path.display()))?;

    println!(
        "Frame {} from {} at {}",
        frame_info.frame,
        frame_info.old_frame,
        format_percentage(frame_info.lerp)
    );
    let mut table = create_table(&["#", "Bone", "Position", "Axes"]);
    for (index, transform) in skeleton.iter() {
        add_table_row(
            &mut table,
            vec![
                index.to_string(),
                bone_name(&model, index),
                format_vec3(transform.position),
                format_axes(transform.rotation),
            ],
        );
    }
    table.printstd();

    Ok(())
}

/// Nests each bone under its parent.
fn bone_node(model: &SkeletalModel, index: usize, depth: usize) -> TreeNode {
    let bone = &model.bones()[index];
    let mut node = TreeNode::new(bone.name.to_string_lossy(), NodeType::Bone)
        .with_metadata("distance", format!("{:.2}", bone.parent_dist));
    if bone.torso_weight > 0.0 {
        node = node.with_metadata("torso", format_percentage(bone.torso_weight));
    }
    // Parents are validated acyclic at load; the bound only caps recursion.
    if depth < wolf_mds::MDS_MAX_BONES {
        for (child, _) in model
            .bones()
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent_index() == Some(index))
        {
            node = node.add_child(bone_node(model, child, depth + 1));
        }
    }
    node
}

fn handle_tree(
    path: &Path,
    depth: Option<usize>,
    show_external_refs: bool,
    no_color: bool,
) -> Result<()> {
    let (model, file_size) = load(path)?;
    let header = model.header();

    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let header_node = TreeNode::new("Header", NodeType::Header)
        .with_metadata("name", model.name())
        .with_metadata("lod", format!("{} / {}", model.lod_scale(), model.lod_bias()))
        .with_metadata("torso_parent", model.torso_parent())
        .with_metadata("ofs_end", header.ofs_end);

    let mut bones = TreeNode::new(format!("Bones ({})", model.bone_count()), NodeType::Group)
        .with_metadata("offset", header.ofs_bones);
    for (root, _) in model
        .bones()
        .iter()
        .enumerate()
        .filter(|(_, b)| b.parent_index().is_none())
    {
        bones = bones.add_child(bone_node(&model, root, 0));
    }

    let frames = TreeNode::new(format!("Frames ({})", model.frame_count()), NodeType::Group)
        .with_metadata("offset", header.ofs_frames);

    let mut tags = TreeNode::new(format!("Tags ({})", model.tags().len()), NodeType::Group)
        .with_metadata("offset", header.ofs_tags);
    for tag in model.tags() {
        tags = tags.add_child(
            TreeNode::new(tag.name.clone(), NodeType::Tag)
                .with_metadata("bone", bone_name(&model, tag.bone)),
        );
    }

    let mut surfaces = TreeNode::new(
        format!("Surfaces ({})", model.surfaces().len()),
        NodeType::Group,
    )
    .with_metadata("offset", header.ofs_surfaces)
    .with_metadata("chain_end", model.surface_chain_end());
    for surface in model.surfaces() {
        let mut node = TreeNode::new(surface.name.clone(), NodeType::Surface)
            .with_metadata("vertices", surface.vertex_count())
            .with_metadata("triangles", surface.triangle_count())
            .with_metadata("bone_refs", surface.bone_refs.len());
        if !surface.shader.is_empty() {
            node = node.with_external_ref(&surface.shader);
        }
        surfaces = surfaces.add_child(node);
    }

    let root = TreeNode::new(file_name, NodeType::Root)
        .with_size(file_size)
        .add_child(header_node)
        .add_child(bones)
        .add_child(frames)
        .add_child(tags)
        .add_child(surfaces);

    let options = TreeOptions {
        max_depth: depth,
        show_external_refs,
        no_color,
        show_metadata: true,
    };
    print!("{}", render_tree(&root, &options));

    Ok(())
}

//! MD3 and MDC model command implementations

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use console::style;
use prettytable::row;
use serde::Serialize;
use wolf_md3::RigidModel;

use crate::utils::{
    NodeType, TreeNode, TreeOptions, add_table_row, create_table, format_axes, format_bytes,
    format_vec3, render_tree,
};

#[derive(Subcommand)]
pub enum Md3Commands {
    /// Display information about an MD3 or MDC model
    Info {
        /// Path to the model file
        file: PathBuf,

        /// Show per-frame details
        #[arg(short, long)]
        detailed: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tag transforms in one frame
    Tags {
        /// Path to the model file
        file: PathBuf,

        /// Frame to read the tags from
        #[arg(short, long, default_value = "0")]
        frame: usize,
    },

    /// Display model structure as a tree
    Tree {
        /// Path to the model file
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

pub fn execute(cmd: Md3Commands) -> Result<()> {
    match cmd {
        Md3Commands::Info {
            file,
            detailed,
            json,
        } => handle_info(&file, detailed, json),
        Md3Commands::Tags { file, frame } => handle_tags(&file, frame),
        Md3Commands::Tree {
            file,
            depth,
            no_refs,
            no_color,
        } => handle_tree(&file, depth, !no_refs, no_color),
    }
}

#[derive(Serialize)]
struct RigidSummary {
    name: String,
    format: &'static str,
    file_size: u64,
    flags: i32,
    frames: usize,
    tags: Vec<String>,
    surfaces: Vec<SurfaceSummary>,
}

#[derive(Serialize)]
struct SurfaceSummary {
    name: String,
    vertices: usize,
    triangles: usize,
    shaders: Vec<String>,
}

impl RigidSummary {
    fn new(model: &RigidModel, file_size: u64) -> Self {
        Self {
            name: model.name().to_string(),
            format: model.format().name(),
            file_size,
            flags: model.header().flags,
            frames: model.frame_count(),
            tags: model.tag_names().to_vec(),
            surfaces: model
                .surfaces()
                .iter()
                .map(|surface| SurfaceSummary {
                    name: surface.name.clone(),
                    vertices: surface.vertex_count(),
                    triangles: surface.triangle_count(),
                    shaders: surface
                        .shaders
                        .iter()
                        .map(|shader| shader.name.to_string_lossy())
                        .collect(),
                })
                .collect(),
        }
    }
}

fn load(path: &Path) -> Result<(RigidModel, u64)> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let model = RigidModel::load(&data)
        .with_context(|| format!("Failed to parse rigid model: {}", path.display()))?;
    Ok((model, data.len() as u64))
}

fn handle_info(path: &Path, detailed: bool, json: bool) -> Result<()> {
    let (model, file_size) = load(path)?;
    let summary = RigidSummary::new(&model, file_size);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n{}", style(format!("{} Model Information", summary.format)).bold().underlined());
    println!("File: {}", style(path.display()).cyan());
    println!("Size: {}", format_bytes(file_size));
    println!("Name: {}", style(&summary.name).yellow());
    println!("Flags: 0x{:08X}", summary.flags);
    println!("Frames: {}", style(summary.frames).green());
    println!("Tags: {}", style(summary.tags.len()).green());
    println!("Surfaces: {}", style(summary.surfaces.len()).green());

    if !summary.surfaces.is_empty() {
        println!("\n{}", style("Surfaces").bold());
        let mut table = create_table(&["Name", "Vertices", "Triangles", "Shaders"]);
        for surface in &summary.surfaces {
            table.add_row(row![
                style(&surface.name).cyan(),
                surface.vertices,
                surface.triangles,
                surface.shaders.join(", ")
            ]);
        }
        table.printstd();
    }

    if detailed {
        println!("\n{}", style("Frames").bold());
        let mut table = create_table(&["#", "Name", "Radius", "Origin", "Mins", "Maxs"]);
        for (index, frame) in model.frames().iter().enumerate() {
            add_table_row(
                &mut table,
                vec![
                    index.to_string(),
                    frame.name.to_string_lossy(),
                    format!("{:.2}", frame.radius),
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

fn handle_tags(path: &Path, frame: usize) -> Result<()> {
    let (model, _) = load(path)?;
    if frame >= model.frame_count() {
        bail!(
            "Frame {} is out of range, {} has {} frames",
            frame,
            path.display(),
            model.frame_count()
        );
    }

    if model.tag_names().is_empty() {
        println!("{} has no tags", path.display());
        return Ok(());
    }

    println!("\n{} (frame {})", style("Tags").bold(), frame);
    let mut table = create_table(&["#", "Name", "Origin", "Axes"]);
    for (slot, name) in model.tag_names().iter().enumerate() {
        let Some(transform) = model.tag_transform(frame, slot) else {
            continue;
        };
        add_table_row(
            &mut table,
            vec![
                slot.to_string(),
                name.clone(),
                format_vec3(transform.position),
                format_axes(transform.rotation),
            ],
        );
    }
    table.printstd();

    Ok(())
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
        .with_metadata("format", model.format().name())
        .with_metadata("name", model.name())
        .with_metadata("flags", format!("0x{:08X}", header.flags))
        .with_metadata("ofs_end", header.ofs_end);

    let mut frames = TreeNode::new(format!("Frames ({})", model.frame_count()), NodeType::Group)
        .with_metadata("offset", header.ofs_frames);
    for (index, frame) in model.frames().iter().enumerate() {
        frames = frames.add_child(
            TreeNode::new(format!("#{index} {}", frame.name.to_string_lossy()), NodeType::Frame)
                .with_metadata("radius", format!("{:.2}", frame.radius)),
        );
    }

    let mut tags = TreeNode::new(format!("Tags ({})", model.tag_names().len()), NodeType::Group)
        .with_metadata("offset", header.ofs_tags);
    for name in model.tag_names() {
        tags = tags.add_child(TreeNode::new(name.clone(), NodeType::Tag));
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
            .with_metadata("triangles", surface.triangle_count());
        for shader in &surface.shaders {
            node = node.with_external_ref(&shader.name.to_string_lossy());
        }
        surfaces = surfaces.add_child(node);
    }

    let root = TreeNode::new(file_name, NodeType::Root)
        .with_size(file_size)
        .add_child(header_node)
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

//! Skin file command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use wolf_character::SkinFile;

use crate::utils::{add_table_row, create_table};

#[derive(Subcommand)]
pub enum SkinCommands {
    /// Show the tags, attachments and textures of a skin file
    Show {
        /// Path to the .skin file
        file: PathBuf,

        /// Print the skin as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(cmd: SkinCommands) -> Result<()> {
    match cmd {
        SkinCommands::Show { file, json } => handle_show(&file, json),
    }
}

fn handle_show(path: &Path, json: bool) -> Result<()> {
    let skin = SkinFile::load(path)
        .with_context(|| format!("Failed to read skin file: {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&skin)?);
        return Ok(());
    }

    println!("\n{}", style("Skin").bold().underlined());
    println!("File: {}", style(path.display()).cyan());

    if !skin.tags.is_empty() {
        println!("\n{}", style("Tags").bold());
        for tag in &skin.tags {
            println!("  {}", style(tag).yellow());
        }
    }

    if !skin.attachments.is_empty() {
        println!("\n{}", style("Attachments").bold());
        let mut table = create_table(&["Key", "Model"]);
        for (key, model) in &skin.attachments {
            add_table_row(&mut table, vec![key.clone(), model.clone()]);
        }
        table.printstd();
    }

    if !skin.textures.is_empty() {
        println!("\n{}", style("Textures").bold());
        let mut table = create_table(&["Surface", "Texture", "Exists"]);
        for (surface, texture) in &skin.textures {
            add_table_row(
                &mut table,
                vec![
                    surface.clone(),
                    texture.display().to_string(),
                    if texture.exists() { "yes" } else { "no" }.to_string(),
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}

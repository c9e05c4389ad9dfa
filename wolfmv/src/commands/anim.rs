//! Animation table command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use prettytable::row;
use wolf_character::AnimationTable;

use crate::utils::create_table;

#[derive(Subcommand)]
pub enum AnimCommands {
    /// List the animations of a table
    List {
        /// Path to the animation table
        file: PathBuf,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(cmd: AnimCommands) -> Result<()> {
    match cmd {
        AnimCommands::List { file, json } => handle_list(&file, json),
    }
}

fn handle_list(path: &Path, json: bool) -> Result<()> {
    let table = AnimationTable::load(path)
        .with_context(|| format!("Failed to read animation table: {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(table.entries())?);
        return Ok(());
    }

    println!(
        "{} animations in {}",
        style(table.len()).green(),
        style(path.display()).cyan()
    );
    let mut out = create_table(&["Name", "First", "Length", "Loop", "FPS", "Speed", "Seconds"]);
    for entry in &table {
        let seconds = if entry.fps == 0 {
            "-".to_string()
        } else {
            format!("{:.2}", entry.length as f32 / entry.fps as f32)
        };
        out.add_row(row![
            style(&entry.name).yellow(),
            entry.first_frame,
            entry.length,
            entry.looping,
            entry.fps,
            entry.move_speed,
            seconds
        ]);
    }
    out.printstd();

    Ok(())
}

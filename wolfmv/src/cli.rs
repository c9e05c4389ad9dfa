//! Root CLI structure for wolfmv

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wolfmv")]
#[command(about = "Inspect MD3, MDC and MDS models and play animated characters", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// MD3 and MDC rigid model operations
    Md3 {
        #[command(subcommand)]
        command: crate::commands::md3::Md3Commands,
    },

    /// MDS skeletal model operations
    Mds {
        #[command(subcommand)]
        command: crate::commands::mds::MdsCommands,
    },

    /// Skin file operations
    Skin {
        #[command(subcommand)]
        command: crate::commands::skin::SkinCommands,
    },

    /// Animation table operations
    Anim {
        #[command(subcommand)]
        command: crate::commands::anim::AnimCommands,
    },

    /// Load and animate a body/head character
    Character {
        #[command(subcommand)]
        command: crate::commands::character::CharacterCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

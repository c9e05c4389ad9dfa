use std::io;
use std::path::PathBuf;

use thiserror::Error;
use wolf_md3::Md3Error;
use wolf_mds::MdsError;

/// Error types for character assembly
#[derive(Error, Debug)]
pub enum CharacterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to load the head model
    #[error("Head model: {0}")]
    Md3(#[from] Md3Error),

    /// Failed to load or pose the body model
    #[error("Body model: {0}")]
    Mds(#[from] MdsError),

    /// Malformed line in a text file
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// No file found under any accepted extension
    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Animation not found: {0}")]
    AnimationNotFound(String),
}

/// Result type using CharacterError
pub type Result<T> = std::result::Result<T, CharacterError>;

use std::io;

use thiserror::Error;
use wolf_data::DataError;

/// Error types for MD3/MDC parsing and rendering
#[derive(Error, Debug)]
pub enum Md3Error {
    /// I/O error while reading the model file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic number in the file header
    #[error("Invalid magic number: expected '{expected}', got '{actual}'")]
    InvalidMagic { expected: String, actual: String },

    /// Version does not match the one expected for the magic
    #[error("Unsupported version: expected {expected}, got {actual}")]
    UnsupportedVersion { expected: i32, actual: i32 },

    /// The model declares no frames
    #[error("Model has no frames")]
    NoFrames,

    /// Offsets, counts or indices inconsistent with the file
    #[error("Corrupt model: {0}")]
    CorruptModel(String),

    /// Record read outside the buffer or with an invalid field
    #[error("Corrupt data: {0}")]
    Data(#[from] DataError),

    /// Builder input that cannot be laid out as a valid file
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested frame does not exist
    #[error("Frame {frame} out of range (model has {count} frames)")]
    FrameOutOfRange { frame: usize, count: usize },
}

/// Result type using Md3Error
pub type Result<T> = std::result::Result<T, Md3Error>;

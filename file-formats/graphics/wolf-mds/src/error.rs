use std::io;

use thiserror::Error;
use wolf_data::DataError;

/// Error types for MDS parsing and skeleton evaluation
#[derive(Error, Debug)]
pub enum MdsError {
    /// I/O error while reading the model file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic number in the file header
    #[error("Invalid magic number: expected '{expected}', got '{actual}'")]
    InvalidMagic { expected: String, actual: String },

    /// Version does not match
    #[error("Unsupported version: expected {expected}, got {actual}")]
    UnsupportedVersion { expected: i32, actual: i32 },

    /// The model declares no frames
    #[error("Model has no frames")]
    NoFrames,

    /// Offsets, counts or references inconsistent with the file
    #[error("Corrupt model: {0}")]
    CorruptModel(String),

    /// Record read outside the buffer or with an invalid field
    #[error("Corrupt data: {0}")]
    Data(#[from] DataError),

    /// A bone list references a bone the model does not have
    #[error("Bone {index} out of range (model has {count} bones)")]
    BoneOutOfRange { index: usize, count: usize },

    /// The torso parent bone is needed but does not exist
    #[error("Torso parent bone {index} out of range (model has {count} bones)")]
    TorsoParentOutOfRange { index: i32, count: usize },

    /// Requested frame does not exist
    #[error("Frame {frame} out of range (model has {count} frames)")]
    FrameOutOfRange { frame: usize, count: usize },

    /// Builder input that cannot be laid out as a valid file
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type using MdsError
pub type Result<T> = std::result::Result<T, MdsError>;

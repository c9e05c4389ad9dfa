use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unexpected end of data at offset {offset}: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Offset {offset} is outside of the {len} byte buffer")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: i64 },

    #[error("Destination for {what} has {actual} elements, expected {expected}")]
    BufferSizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, DataError>;

//! Custom error types for the I/O module.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("File size of {found} bytes exceeds the maximum allowed size of {limit} bytes.")]
    FileTooLarge { limit: u64, found: u64 },

    #[error("A single read of {requested} bytes exceeds the per-read limit of {limit} bytes.")]
    ReadTooLarge { limit: u64, requested: u64 },

    #[error("Short read at offset {offset:#x}: requested {requested} bytes, {available} available.")]
    ShortRead {
        offset: u64,
        requested: u64,
        available: u64,
    },

    #[error("An underlying I/O error occurred: {0}")]
    StdIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IoError>;

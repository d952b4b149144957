//! Decoders for the binary structures found in flash images.
//!
//! Decoders work on byte slices already read from a `ByteSource`; they never
//! perform I/O and never panic on short or malformed input.

pub mod elf32;
pub mod gpt;
pub mod mbn;
pub mod utils;

use thiserror::Error;

/// Structure decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Invalid {0} magic")]
    InvalidMagic(&'static str),

    #[error("Truncated at {offset:#x}, needed {needed} bytes")]
    Truncated { offset: usize, needed: usize },
}

pub type Result<T> = std::result::Result<T, DecodeError>;

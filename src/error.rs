//! Error types for flash image analysis.
//!
//! Only three conditions surface as errors: the image matches no analyzer,
//! reading it failed, or an extraction target does not exist. Everything the
//! analyzers can recover from is reported inside `AnalysisResult` instead.

use crate::io::error::IoError;
use thiserror::Error;

/// Main error type for flashimg operations.
#[derive(Debug, Error)]
pub enum FlashError {
    /// Platform detection was negative
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// I/O or decode fault while analyzing or extracting
    #[error("{context}: {source}")]
    Analysis {
        context: String,
        #[source]
        source: IoError,
    },

    /// Extraction target absent
    #[error("Partition '{name}' not found. Available: {}", .available.join(", "))]
    PartitionNotFound { name: String, available: Vec<String> },

    /// Sink or config file errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlashError {
    pub(crate) fn analysis(context: impl Into<String>, source: IoError) -> Self {
        FlashError::Analysis {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias for flashimg operations
pub type Result<T> = std::result::Result<T, FlashError>;

//! Core data types produced by image analysis.
//!
//! These are plain values: analyzers build them once per `analyze()` call and
//! hand them to callers, which render or serialize them with serde.

pub mod image_type;
pub mod partition;
pub mod platform;
pub mod result;

pub use image_type::ImageType;
pub use partition::{FilesystemInfo, PartitionInfo};
pub use platform::Platform;
pub use result::AnalysisResult;

//! Partition and filesystem discovery for embedded flash images.
//!
//! Given a raw Qualcomm gang image or NVIDIA Tegra flash image, flashimg
//! locates the partitions it contains, classifies each one, detects
//! filesystems inside the larger ones, and reports structural problems.
//!
//! ```no_run
//! use flashimg::{auto_select, open_image, AnalysisConfig, PlatformAnalyzer};
//!
//! let config = AnalysisConfig::default();
//! let source = open_image("gang.img", config.io.clone())?;
//! let analyzer = auto_select(&source, config)?;
//! let result = analyzer.analyze(&source)?;
//! for p in &result.partitions {
//!     println!("{}", p);
//! }
//! # Ok::<(), flashimg::FlashError>(())
//! ```

/// Analysis settings
pub mod config;
/// Core data types module
pub mod core;
pub mod error;
/// Superblock-level filesystem detection
pub mod filesystem;
/// On-disk header decoders
pub mod formats;
/// Partition checksums
pub mod hashing;
/// Bounded random-access readers
pub mod io;
pub mod logging;
/// Platform analyzers and registry
pub mod platforms;
/// Text, JSON and CSV reports
pub mod report;
/// Partition validation
pub mod validation;

pub use crate::config::AnalysisConfig;
pub use crate::core::{AnalysisResult, FilesystemInfo, ImageType, PartitionInfo, Platform};
pub use crate::error::{FlashError, Result};
pub use crate::filesystem::FilesystemDetector;
pub use crate::io::{ByteSource, IOLimits, SafeReader};
pub use crate::platforms::{
    auto_select, detect_platform, for_platform, open_image, Analyzer, NvidiaAnalyzer,
    PlatformAnalyzer, QualcommAnalyzer,
};

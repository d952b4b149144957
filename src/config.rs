//! Configuration for image analysis.
//!
//! Every knob has a default matching the standard pipeline; configurations
//! can also be loaded from JSON, where omitted fields keep their defaults.

use crate::error::{FlashError, Result};
use crate::io::IOLimits;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Master configuration for an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Skip the filesystem pass over large partitions (default: false).
    pub skip_fs_analysis: bool,
    /// Fill `PartitionInfo::crc32` for every partition (default: false).
    pub compute_checksums: bool,
    /// Report partitions not aligned to 512 bytes as validation errors (default: false).
    pub check_alignment: bool,
    /// Run the filesystem pass on the rayon thread pool (default: false).
    pub parallel_fs: bool,
    /// Use the Qualcomm analyzer when auto-detection matches nothing (default: false).
    pub fallback_to_qualcomm: bool,
    /// Limits applied when opening image files.
    pub io: IOLimits,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            skip_fs_analysis: false,
            compute_checksums: false,
            check_alignment: false,
            parallel_fs: false,
            fallback_to_qualcomm: false,
            io: IOLimits::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| FlashError::Config(e.to_string()))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

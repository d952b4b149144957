//! The aggregate produced by one `analyze()` call.

use crate::core::partition::PartitionInfo;
use crate::core::platform::Platform;
use serde::{Deserialize, Serialize};

/// Complete analysis result for a flash image.
///
/// `partitions` keeps discovery order, which is not necessarily offset order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub filename: String,
    pub file_size: u64,
    pub platform: Platform,
    pub partitions: Vec<PartitionInfo>,
    pub total_partition_size: u64,
    pub total_filesystem_used: u64,
    pub validation_errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl AnalysisResult {
    /// Assemble a result and compute its totals from `partitions`.
    pub fn new(
        filename: String,
        file_size: u64,
        platform: Platform,
        partitions: Vec<PartitionInfo>,
        validation_errors: Vec<String>,
        warnings: Vec<String>,
    ) -> Self {
        let total_partition_size = partitions
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.size));
        let total_filesystem_used = partitions
            .iter()
            .filter_map(|p| p.filesystem.as_ref())
            .fold(0u64, |acc, fs| acc.saturating_add(fs.used_size));

        Self {
            filename,
            file_size,
            platform,
            partitions,
            total_partition_size,
            total_filesystem_used,
            validation_errors,
            warnings,
        }
    }

    /// First partition whose name matches exactly.
    pub fn partition(&self, name: &str) -> Option<&PartitionInfo> {
        self.partitions.iter().find(|p| p.name == name)
    }

    pub fn partition_names(&self) -> Vec<String> {
        self.partitions.iter().map(|p| p.name.clone()).collect()
    }

    /// Partitions that carry filesystem statistics.
    pub fn filesystem_partitions(&self) -> impl Iterator<Item = &PartitionInfo> {
        self.partitions.iter().filter(|p| p.filesystem.is_some())
    }

    /// Bytes of the image not accounted for by partition sizes.
    pub fn unused_space(&self) -> u64 {
        self.file_size.saturating_sub(self.total_partition_size)
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }
}

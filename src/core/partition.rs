//! Partition and filesystem descriptors.

use crate::core::image_type::ImageType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Superblock-level statistics for a filesystem found inside a partition.
///
/// Values are best effort. Read-only compressed formats always report
/// `free_size == 0`; formats without a parsed superblock carry coarse
/// estimates derived from the region size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemInfo {
    pub fs_type: String,
    pub fs_size: u64,
    pub used_size: u64,
    pub free_size: u64,
    pub block_size: u64,
    pub total_blocks: u64,
    pub free_blocks: u64,
}

impl FilesystemInfo {
    /// Percentage of `fs_size` in use, or 0.0 for an empty filesystem.
    pub fn usage_percent(&self) -> f64 {
        if self.fs_size == 0 {
            0.0
        } else {
            self.used_size as f64 / self.fs_size as f64 * 100.0
        }
    }
}

/// A partition discovered in an image.
///
/// `offset + size` may run past the end of the source; the validator reports
/// that case rather than the constructor rejecting it. Names are not
/// guaranteed unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub name: String,
    pub offset: u64,
    pub size: u64,
    pub image_type: ImageType,
    #[serde(default)]
    pub load_addr: u64,
    #[serde(default)]
    pub entry_point: u64,
    #[serde(default)]
    pub crc32: u32,
    #[serde(default)]
    pub filesystem: Option<FilesystemInfo>,
}

impl PartitionInfo {
    pub fn new(name: impl Into<String>, offset: u64, size: u64, image_type: ImageType) -> Self {
        Self {
            name: name.into(),
            offset,
            size,
            image_type,
            load_addr: 0,
            entry_point: 0,
            crc32: 0,
            filesystem: None,
        }
    }

    pub fn with_load_addr(mut self, load_addr: u64) -> Self {
        self.load_addr = load_addr;
        self
    }

    pub fn with_entry_point(mut self, entry_point: u64) -> Self {
        self.entry_point = entry_point;
        self
    }

    /// One past the last byte, saturating at `u64::MAX`.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

impl fmt::Display for PartitionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) @ {:#x}, {} bytes",
            self.name, self.image_type, self.offset, self.size
        )
    }
}

//! Structural sanity checks over discovered partitions.
//!
//! Findings are plain strings collected into
//! `AnalysisResult::validation_errors`; nothing here fails the analysis.

use crate::core::PartitionInfo;
use crate::io::ByteSource;
use std::fmt;
use tracing::debug;

/// Alignment expected of partition offsets.
pub const SECTOR_ALIGNMENT: u64 = 512;

/// Images smaller than this are reported by [`check_image`].
pub const MIN_IMAGE_SIZE: u64 = 1024;

/// Images larger than this are reported by [`check_image`].
pub const MAX_IMAGE_SIZE: u64 = 16 * 1024 * 1024 * 1024;

/// Inclusive size range outside of which a partition is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeBounds {
    pub min: u64,
    pub max: u64,
}

impl SizeBounds {
    pub const QUALCOMM: SizeBounds = SizeBounds {
        min: 1024,
        max: 256 * 1024 * 1024,
    };

    pub const NVIDIA: SizeBounds = SizeBounds {
        min: 512,
        max: 1024 * 1024 * 1024,
    };
}

/// Per-partition bounds checks followed by [`find_overlaps`].
pub fn validate(partitions: &[PartitionInfo], file_size: u64, bounds: SizeBounds) -> Vec<String> {
    let mut errors = Vec::new();

    for p in partitions {
        if p.offset.checked_add(p.size).map_or(true, |end| end > file_size) {
            errors.push(format!("{}: extends beyond file end", p.name));
        }
        if p.size > bounds.max {
            errors.push(format!("{}: unusually large ({} bytes)", p.name, p.size));
        }
        if p.size < bounds.min {
            errors.push(format!("{}: unusually small ({} bytes)", p.name, p.size));
        }
    }

    errors.extend(find_overlaps(partitions).iter().map(Overlap::to_string));

    if !errors.is_empty() {
        debug!(count = errors.len(), "Partition validation findings");
    }
    errors
}

/// Two partitions, adjacent in offset order, whose extents intersect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub first: String,
    pub second: String,
    pub bytes: u64,
}

impl fmt::Display for Overlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} overlaps with {} by {} bytes", self.first, self.second, self.bytes)
    }
}

/// Overlaps between neighbours in a copy stable-sorted by offset.
pub fn find_overlaps<'a>(partitions: impl IntoIterator<Item = &'a PartitionInfo>) -> Vec<Overlap> {
    let mut sorted: Vec<&PartitionInfo> = partitions.into_iter().collect();
    sorted.sort_by_key(|p| p.offset);
    sorted
        .windows(2)
        .filter_map(|pair| {
            let (current, next) = (pair[0], pair[1]);
            let end = current.end();
            (end > next.offset).then(|| Overlap {
                first: current.name.clone(),
                second: next.name.clone(),
                bytes: end - next.offset,
            })
        })
        .collect()
}

/// Partitions whose offset is not a multiple of 512.
pub fn check_alignment(partitions: &[PartitionInfo]) -> Vec<String> {
    partitions
        .iter()
        .filter(|p| p.offset % SECTOR_ALIGNMENT != 0)
        .map(|p| format!("{}: not aligned to 512-byte boundary", p.name))
        .collect()
}

/// Whole-image sanity notes: tiny, oversized, or blank images.
pub fn check_image(source: &dyn ByteSource) -> Vec<String> {
    let mut notes = Vec::new();
    let size = source.size();

    if size < MIN_IMAGE_SIZE {
        notes.push(format!("File too small to be a valid gang image ({} bytes)", size));
    }
    if size > MAX_IMAGE_SIZE {
        notes.push(format!("File unusually large ({} bytes)", size));
    }

    match source.read_up_to(0, MIN_IMAGE_SIZE) {
        Ok(head) if !head.is_empty() && head.iter().all(|&b| b == 0) => {
            notes.push("File appears to be empty (all zeros)".to_string());
        }
        Ok(_) => {}
        Err(e) => notes.push(format!("Unable to read image header: {}", e)),
    }

    notes
}

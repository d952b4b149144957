//! NVIDIA Tegra flash images.
//!
//! Discovery looks for a Boot Configuration Table near the start of the
//! image, then reads the GPT. Images without a usable GPT are scanned for
//! Tegra signatures, with each partition's extent estimated from the
//! distance to the next signature.

use crate::config::AnalysisConfig;
use crate::core::{ImageType, PartitionInfo, Platform};
use crate::formats::gpt::{
    GptEntry, GptHeader, GPT_ENTRY_SIZE, GPT_HEADER_OFFSET, GPT_HEADER_SIZE, GPT_SIGNATURE,
};
use crate::io::{error::Result, ByteSource};
use crate::platforms::scan::{self, SCAN_STRIDE, WINDOW_SIZE};
use crate::platforms::{Candidate, Discovery, PlatformAnalyzer};
use crate::validation::SizeBounds;
use tracing::{debug, warn};

/// Offsets probed for a BCT, in order.
const BCT_OFFSETS: [u64; 5] = [0, 512, 1024, 2048, 4096];

/// Candidate BCT sizes, in order.
const BCT_EXTENTS: [u64; 3] = [4096, 8192, 16384];

const BCT_DEFAULT_SIZE: u64 = 16384;

const BCT_MAGICS: [&[u8; 4]; 2] = [b"BCT\0", b"NVDA"];

/// Region sniffed for signatures by `can_handle`.
const SNIFF_SIZE: u64 = 64 * 1024;

/// Furthest distance searched for the next signature.
const MAX_EXTENT_SCAN: u64 = 64 * 1024 * 1024;

/// Extent assumed when no following signature is found.
const DEFAULT_EXTENT: u64 = 16 * 1024 * 1024;

/// Image type implied by a Tegra partition name. Case-insensitive
/// substring match; the first matching rule wins.
pub fn classify_partition_name(name: &str) -> ImageType {
    const RULES: &[(&[&str], ImageType)] = &[
        (&["bct"], ImageType::Unknown),
        (&["mb1", "bootloader"], ImageType::Sbl),
        (&["mb2", "tegraboot"], ImageType::Appsbl),
        (&["cboot"], ImageType::Appsbl),
        (&["bpmp"], ImageType::Rpm),
        (&["tos", "trustzone"], ImageType::Tz),
        (&["kernel", "boot"], ImageType::Boot),
        (&["rootfs", "system", "app"], ImageType::Unknown),
        (&["recovery"], ImageType::Boot),
    ];

    let lower = name.to_lowercase();
    RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, ty)| *ty)
        .unwrap_or(ImageType::Unknown)
}

#[derive(Debug, Clone, Default)]
pub struct NvidiaAnalyzer {
    config: AnalysisConfig,
}

impl NvidiaAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    fn detect_bct(&self, source: &dyn ByteSource) -> Result<Option<PartitionInfo>> {
        for offset in BCT_OFFSETS {
            let head = source.read_up_to(offset, 4)?;
            if !BCT_MAGICS.iter().any(|m| head[..] == m[..]) {
                continue;
            }
            let size = self.estimate_bct_size(source, offset)?;
            debug!(offset, size, "BCT found");
            return Ok(Some(PartitionInfo::new("BCT", offset, size, ImageType::Unknown)));
        }
        Ok(None)
    }

    fn estimate_bct_size(&self, source: &dyn ByteSource, offset: u64) -> Result<u64> {
        for extent in BCT_EXTENTS {
            let next = source.read_up_to(offset + extent, WINDOW_SIZE)?;
            if scan::contains_boundary(&next) {
                return Ok(extent);
            }
        }
        Ok(BCT_DEFAULT_SIZE)
    }

    /// Partitions from the primary GPT. Empty when there is no GPT.
    fn parse_gpt(&self, source: &dyn ByteSource, warnings: &mut Vec<String>) -> Result<Vec<Candidate>> {
        let raw = source.read_up_to(GPT_HEADER_OFFSET, GPT_HEADER_SIZE as u64)?;
        let header = match GptHeader::parse(&raw) {
            Ok(h) => h,
            Err(e) => {
                debug!(error = %e, "No GPT header");
                return Ok(Vec::new());
            }
        };
        debug!(
            entry_lba = header.partition_entry_lba,
            entries = header.num_partition_entries,
            entry_size = header.partition_entry_size,
            "GPT header"
        );

        let entry_size = u64::from(header.partition_entry_size);
        let Some(base) = header.entries_offset() else {
            warnings.push(format!(
                "GPT partition entry LBA {} out of range",
                header.partition_entry_lba
            ));
            return Ok(Vec::new());
        };
        // Entries shorter than the standard size end the table immediately.
        if entry_size < GPT_ENTRY_SIZE as u64 {
            return Ok(Vec::new());
        }

        let mut candidates = Vec::new();
        for index in 0..u64::from(header.num_partition_entries) {
            let Some(offset) = index.checked_mul(entry_size).and_then(|d| base.checked_add(d)) else {
                break;
            };
            let raw = source.read_up_to(offset, GPT_ENTRY_SIZE as u64)?;
            if raw.len() < GPT_ENTRY_SIZE {
                break;
            }
            let entry = match GptEntry::parse(&raw) {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(_) => break,
            };
            let Some((part_offset, part_size)) = entry.byte_range() else {
                let msg = format!(
                    "GPT entry {} has invalid LBA range {}..{}, skipped",
                    index, entry.first_lba, entry.last_lba
                );
                warn!("{}", msg);
                warnings.push(msg);
                continue;
            };

            let name = if entry.name.is_empty() {
                format!("partition_{}", index)
            } else {
                entry.name
            };
            let image_type = classify_partition_name(&name);
            debug!(
                index,
                name = %name,
                offset = part_offset,
                size = part_size,
                "GPT partition"
            );
            candidates.push(Candidate::new(PartitionInfo::new(
                name,
                part_offset,
                part_size,
                image_type,
            )));
        }

        Ok(candidates)
    }

    /// Signature scan used when the GPT yields nothing.
    fn scan_signatures(&self, source: &dyn ByteSource) -> Result<Vec<Candidate>> {
        let file_size = source.size();
        let mut candidates = Vec::new();
        let mut offset = 0u64;

        while offset.saturating_add(WINDOW_SIZE) < file_size {
            let chunk = source.read_up_to(offset, WINDOW_SIZE)?;
            if (chunk.len() as u64) < WINDOW_SIZE {
                break;
            }
            let Some(pos) = scan::first_nvidia_signature(&chunk) else {
                offset = offset.saturating_add(SCAN_STRIDE);
                continue;
            };

            let hit = offset + pos as u64;
            let extent = self.estimate_extent(source, hit)?;
            debug!(offset = hit, size = extent, "Tegra signature");
            candidates.push(Candidate::new(PartitionInfo::new(
                format!("nvidia_partition_{}", candidates.len()),
                hit,
                extent,
                ImageType::Unknown,
            )));
            offset = hit + extent;
        }

        Ok(candidates)
    }

    /// Distance from `offset` to the next signature window, or a capped
    /// default when none follows.
    fn estimate_extent(&self, source: &dyn ByteSource, offset: u64) -> Result<u64> {
        let remaining = source.size().saturating_sub(offset);
        let limit = MAX_EXTENT_SCAN.min(remaining);

        let mut probe = WINDOW_SIZE;
        while probe < limit {
            let chunk = source.read_up_to(offset + probe, WINDOW_SIZE)?;
            if scan::contains_boundary(&chunk) {
                return Ok(probe);
            }
            probe += SCAN_STRIDE;
        }
        Ok(DEFAULT_EXTENT.min(remaining))
    }
}

impl PlatformAnalyzer for NvidiaAnalyzer {
    fn platform(&self) -> Platform {
        Platform::Nvidia
    }

    fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn can_handle(&self, source: &dyn ByteSource) -> bool {
        if scan::contains_nvidia_signature(&scan::window(source, 0, WINDOW_SIZE)) {
            return true;
        }
        if scan::window(source, GPT_HEADER_OFFSET, 8)[..] == GPT_SIGNATURE[..] {
            return true;
        }
        scan::contains_nvidia_signature(&scan::window(source, 0, SNIFF_SIZE))
    }

    fn discover(&self, source: &dyn ByteSource) -> Result<Discovery> {
        let mut discovery = Discovery::default();

        if let Some(bct) = self.detect_bct(source)? {
            discovery.candidates.push(Candidate::new(bct));
        }

        let gpt = self.parse_gpt(source, &mut discovery.warnings)?;
        if gpt.is_empty() {
            let msg = "GPT not found, scanning for partition signatures";
            warn!(source = %source.name(), "{}", msg);
            discovery.warnings.push(msg.to_string());
            discovery.candidates.extend(self.scan_signatures(source)?);
        } else {
            discovery.candidates.extend(gpt);
        }

        Ok(discovery)
    }

    fn size_bounds(&self) -> SizeBounds {
        SizeBounds::NVIDIA
    }
}

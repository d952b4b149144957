//! Qualcomm gang images.
//!
//! A gang image is either an ELF32 container whose loadable segments are the
//! individual images, or a raw concatenation of MBN images on 4 KiB
//! boundaries. The ELF program headers are used when they describe at least
//! one loadable segment; otherwise the image is scanned for MBN headers.

use crate::config::AnalysisConfig;
use crate::core::{ImageType, PartitionInfo, Platform};
use crate::formats::elf32::{self, ELF32_HEADER_SIZE, ELF_MAGIC, MIN_PHDR_SIZE};
use crate::formats::mbn::{MbnHeader, MBN_HEADER_SIZE};
use crate::formats::utils::align_up;
use crate::io::{error::Result, ByteSource};
use crate::platforms::scan::{self, QUALCOMM_MAGICS, SCAN_STRIDE};
use crate::platforms::{Candidate, Discovery, PlatformAnalyzer};
use crate::validation::SizeBounds;
use tracing::{debug, trace, warn};

/// Bytes past the MBN header inspected for boot markers.
const CONTENT_PROBE_SIZE: u64 = 512;

const HEADER_LEN: u64 = MBN_HEADER_SIZE as u64;

#[derive(Debug, Clone, Default)]
pub struct QualcommAnalyzer {
    config: AnalysisConfig,
}

impl QualcommAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Loadable segments from the ELF program headers, or `None` if the ELF
    /// header itself is unusable.
    fn parse_elf(&self, source: &dyn ByteSource) -> Result<Option<Vec<Candidate>>> {
        let raw = source.read_up_to(0, ELF32_HEADER_SIZE as u64)?;
        let header = match elf32::parse_header(&raw) {
            Ok(h) => h,
            Err(e) => {
                debug!(error = %e, "ELF header rejected");
                return Ok(None);
            }
        };

        let phentsize = u64::from(header.e_phentsize);
        let mut segments = Vec::new();
        for i in 0..u64::from(header.e_phnum) {
            let offset = u64::from(header.e_phoff) + i * phentsize;
            let raw = source.read_up_to(offset, phentsize)?;
            if raw.len() < MIN_PHDR_SIZE {
                trace!(index = i, offset, "Program header too short, skipped");
                continue;
            }
            let ph = match elf32::parse_program_header(&raw) {
                Ok(ph) => ph,
                Err(_) => continue,
            };
            if !ph.is_loadable() {
                continue;
            }

            debug!(
                index = i,
                offset = ph.p_offset,
                size = ph.p_filesz,
                paddr = ph.p_paddr,
                "Loadable segment"
            );
            let partition = PartitionInfo::new(
                format!("segment_{}", i),
                u64::from(ph.p_offset),
                u64::from(ph.p_filesz),
                ImageType::Unknown,
            )
            .with_load_addr(u64::from(ph.p_paddr));
            segments.push(Candidate::new(partition));
        }

        Ok(Some(segments))
    }

    /// Linear scan for MBN headers on 4 KiB boundaries.
    fn scan_mbn(&self, source: &dyn ByteSource) -> Result<Vec<Candidate>> {
        let file_size = source.size();
        let mut candidates = Vec::new();
        let mut offset = 0u64;

        while file_size.saturating_sub(offset) >= HEADER_LEN {
            let raw = source.read_at(offset, HEADER_LEN)?;
            let header = match MbnHeader::parse(&raw) {
                Ok(h) if h.is_plausible(offset, file_size) => h,
                _ => {
                    offset = offset.saturating_add(SCAN_STRIDE);
                    continue;
                }
            };

            let image_type = self.classify(source, offset, &header)?;
            let image_size = u64::from(header.image_size);
            let load_addr = u64::from(header.image_dest_ptr);
            debug!(
                offset,
                size = image_size,
                load_addr,
                image_type = %image_type,
                "MBN image accepted"
            );

            let partition = PartitionInfo::new(
                format!("{}_{}", image_type, candidates.len()),
                offset,
                image_size,
                image_type,
            )
            .with_load_addr(load_addr)
            .with_entry_point(load_addr);
            candidates.push(Candidate::new(partition).with_payload_skip(HEADER_LEN));

            offset = align_up(offset + image_size, SCAN_STRIDE);
        }

        Ok(candidates)
    }

    /// Image type from the load address, falling back to boot markers in the
    /// first bytes after the header.
    fn classify(&self, source: &dyn ByteSource, offset: u64, header: &MbnHeader) -> Result<ImageType> {
        if let Some(ty) = header.image_type_by_address() {
            return Ok(ty);
        }
        let len = CONTENT_PROBE_SIZE.min(u64::from(header.image_size).saturating_sub(HEADER_LEN));
        let content = source.read_up_to(offset + HEADER_LEN, len)?;
        Ok(if scan::contains_boot_marker(&content) {
            ImageType::Boot
        } else {
            ImageType::Unknown
        })
    }
}

impl PlatformAnalyzer for QualcommAnalyzer {
    fn platform(&self) -> Platform {
        Platform::Qualcomm
    }

    fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn can_handle(&self, source: &dyn ByteSource) -> bool {
        let magic = scan::window(source, 0, 4);
        QUALCOMM_MAGICS.iter().any(|m| magic[..] == m[..])
    }

    fn discover(&self, source: &dyn ByteSource) -> Result<Discovery> {
        let mut warnings = Vec::new();
        let magic = source.read_up_to(0, 4)?;

        if magic[..] == ELF_MAGIC[..] {
            match self.parse_elf(source)? {
                Some(segments) if !segments.is_empty() => {
                    return Ok(Discovery {
                        candidates: segments,
                        warnings,
                    });
                }
                Some(_) => warnings
                    .push("ELF has no loadable segments, scanning for MBN images".to_string()),
                None => warnings.push("ELF header truncated, scanning for MBN images".to_string()),
            }
        } else {
            warnings.push("Gang header not found, scanning for individual MBN images".to_string());
        }

        for w in &warnings {
            warn!(source = %source.name(), "{}", w);
        }
        let candidates = self.scan_mbn(source)?;
        Ok(Discovery {
            candidates,
            warnings,
        })
    }

    fn size_bounds(&self) -> SizeBounds {
        SizeBounds::QUALCOMM
    }
}

//! Superblock-level filesystem classification.
//!
//! Probes run in a fixed priority order over the first 8 KiB of a region and
//! the first match wins. Detection is best effort: any read or decode fault
//! yields `None` and is never escalated to the caller.

pub mod ext;
pub mod flash;
pub mod squashfs;

use crate::core::FilesystemInfo;
use crate::io::ByteSource;
use tracing::{debug, trace};

/// Bytes read from the start of a region for probing.
pub const PROBE_SIZE: u64 = 8 * 1024;

/// Regions with less data than this are never classified.
pub const MIN_PROBE_SIZE: usize = 1024;

/// Classifies byte regions into one of the supported filesystem kinds.
pub struct FilesystemDetector;

impl FilesystemDetector {
    /// Probe the region `[offset, offset + size)` of `source`.
    pub fn detect(source: &dyn ByteSource, offset: u64, size: u64) -> Option<FilesystemInfo> {
        let header = match source.read_up_to(offset, size.min(PROBE_SIZE)) {
            Ok(h) => h,
            Err(e) => {
                debug!(offset, size, error = %e, "Filesystem probe read failed");
                return None;
            }
        };
        let info = Self::detect_bytes(&header, size);
        if let Some(fs) = &info {
            debug!(
                offset,
                size,
                fs_type = %fs.fs_type,
                fs_size = fs.fs_size,
                "Filesystem detected"
            );
        } else {
            trace!(offset, size, "No filesystem detected");
        }
        info
    }

    /// Probe an already-read region prefix. `size` is the full region size,
    /// used for the coarse estimates of formats without a parsed superblock.
    pub fn detect_bytes(header: &[u8], size: u64) -> Option<FilesystemInfo> {
        if header.len() < MIN_PROBE_SIZE {
            return None;
        }

        ext::probe(header)
            .or_else(|| squashfs::probe(header))
            .or_else(|| flash::probe_ubifs(header, size))
            .or_else(|| flash::probe_jffs2(header, size))
            .or_else(|| flash::probe_yaffs2(header, size))
    }
}

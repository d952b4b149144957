//! Raw-flash filesystems without a parsed superblock.
//!
//! UBIFS, JFFS2 and YAFFS2 are recognised by magic or byte pattern only;
//! their statistics are coarse estimates derived from the region size.

use crate::core::FilesystemInfo;

const UBIFS_BLOCK_SIZE: u64 = 128 * 1024;
const JFFS2_BLOCK_SIZE: u64 = 64 * 1024;
const YAFFS2_BLOCK_SIZE: u64 = 128 * 1024;

const YAFFS2_SAMPLE_STRIDE: usize = 512;
const YAFFS2_SAMPLE_SPAN: usize = 2048;
const YAFFS2_WINDOW: usize = 16;
const YAFFS2_MIN_HITS: usize = 2;

pub fn probe_ubifs(header: &[u8], size: u64) -> Option<FilesystemInfo> {
    if !header.starts_with(b"UBI#") {
        return None;
    }
    let total_blocks = size / UBIFS_BLOCK_SIZE;
    Some(FilesystemInfo {
        fs_type: "ubifs".to_string(),
        fs_size: size,
        used_size: size / 2,
        free_size: size / 2,
        block_size: UBIFS_BLOCK_SIZE,
        total_blocks,
        free_blocks: total_blocks / 2,
    })
}

pub fn probe_jffs2(header: &[u8], size: u64) -> Option<FilesystemInfo> {
    if !(header.starts_with(&[0x19, 0x85]) || header.starts_with(&[0x85, 0x19])) {
        return None;
    }
    let total_blocks = size / JFFS2_BLOCK_SIZE;
    Some(FilesystemInfo {
        fs_type: "jffs2".to_string(),
        fs_size: size,
        used_size: size / 3,
        free_size: size.saturating_mul(2) / 3,
        block_size: JFFS2_BLOCK_SIZE,
        total_blocks,
        free_blocks: total_blocks * 2 / 3,
    })
}

/// Count 16-byte windows, one every 512 bytes, whose first byte looks like a
/// YAFFS2 object type (1..=5).
///
/// This heuristic matches plenty of arbitrary binary data; a hit is a guess.
fn yaffs2_pattern_hits(header: &[u8]) -> usize {
    let span = header
        .len()
        .saturating_sub(YAFFS2_WINDOW)
        .min(YAFFS2_SAMPLE_SPAN);
    (0..span)
        .step_by(YAFFS2_SAMPLE_STRIDE)
        .filter(|&i| matches!(header[i], 1..=5))
        .count()
}

pub fn probe_yaffs2(header: &[u8], size: u64) -> Option<FilesystemInfo> {
    if yaffs2_pattern_hits(header) < YAFFS2_MIN_HITS {
        return None;
    }
    let total_blocks = size / YAFFS2_BLOCK_SIZE;
    Some(FilesystemInfo {
        fs_type: "yaffs2".to_string(),
        fs_size: size,
        used_size: size / 2,
        free_size: size / 2,
        block_size: YAFFS2_BLOCK_SIZE,
        total_blocks,
        free_blocks: total_blocks / 2,
    })
}

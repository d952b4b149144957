//! SquashFS superblock.
//!
//! `hsqs` marks a little-endian image, `sqsh` a big-endian one.

use crate::core::FilesystemInfo;
use crate::formats::utils::{Endian, EndianRead};

const SUPERBLOCK_SIZE: usize = 96;

pub fn probe(header: &[u8]) -> Option<FilesystemInfo> {
    if header.len() < SUPERBLOCK_SIZE {
        return None;
    }
    let endian = match &header[0..4] {
        b"hsqs" => Endian::Little,
        b"sqsh" => Endian::Big,
        _ => return None,
    };

    let bytes_used = header.read_u64(40, endian).ok()?;
    let block_size = u64::from(header.read_u32(12, endian).ok()?);
    // A zero block size is a corrupt superblock.
    let total_blocks = bytes_used.checked_div(block_size)?;

    Some(FilesystemInfo {
        fs_type: "squashfs".to_string(),
        fs_size: bytes_used,
        used_size: bytes_used,
        free_size: 0,
        block_size,
        total_blocks,
        free_blocks: 0,
    })
}

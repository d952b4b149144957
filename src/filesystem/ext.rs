//! ext2/ext3/ext4 superblock.

use crate::core::FilesystemInfo;
use crate::formats::utils::{Endian, EndianRead};

const SUPERBLOCK_OFFSET: usize = 0x400;
const MAGIC_OFFSET: usize = 0x438;
const EXT_MAGIC: u16 = 0xEF53;

// Largest accepted log2(block_size / 1024).
const MAX_LOG_BLOCK_SIZE: u32 = 21;

pub fn probe(header: &[u8]) -> Option<FilesystemInfo> {
    if header.read_u16(MAGIC_OFFSET, Endian::Little).ok()? != EXT_MAGIC {
        return None;
    }

    let sb = header.get(SUPERBLOCK_OFFSET..)?;
    let blocks_count = u64::from(sb.read_u32(4, Endian::Little).ok()?);
    let free_blocks_count = u64::from(sb.read_u32(12, Endian::Little).ok()?);
    let log_block_size = sb.read_u32(24, Endian::Little).ok()?;
    if log_block_size > MAX_LOG_BLOCK_SIZE {
        return None;
    }

    let block_size = 1024u64 << log_block_size;
    let fs_size = blocks_count * block_size;
    let used_size = fs_size.saturating_sub(free_blocks_count * block_size);

    Some(FilesystemInfo {
        fs_type: "ext".to_string(),
        fs_size,
        used_size,
        free_size: fs_size - used_size,
        block_size,
        total_blocks: blocks_count,
        free_blocks: free_blocks_count,
    })
}

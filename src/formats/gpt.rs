//! GUID Partition Table header and entry decoding.

use crate::formats::utils::{Endian, EndianRead};
use crate::formats::{DecodeError, Result};

pub const GPT_SIGNATURE: &[u8; 8] = b"EFI PART";

/// Logical block size assumed for all LBA arithmetic.
pub const LBA_SIZE: u64 = 512;

/// Byte offset of the primary header (LBA 1).
pub const GPT_HEADER_OFFSET: u64 = 512;

/// Bytes of the header that are decoded.
pub const GPT_HEADER_SIZE: usize = 92;

/// Standard partition entry size; shorter entries end the table.
pub const GPT_ENTRY_SIZE: usize = 128;

const NAME_RANGE: std::ops::Range<usize> = 56..128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GptHeader {
    pub partition_entry_lba: u64,
    pub num_partition_entries: u32,
    pub partition_entry_size: u32,
}

impl GptHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < GPT_HEADER_SIZE {
            return Err(DecodeError::Truncated {
                offset: 0,
                needed: GPT_HEADER_SIZE,
            });
        }
        if &data[0..8] != GPT_SIGNATURE {
            return Err(DecodeError::InvalidMagic("GPT"));
        }
        Ok(Self {
            partition_entry_lba: data.read_u64(72, Endian::Little)?,
            num_partition_entries: data.read_u32(80, Endian::Little)?,
            partition_entry_size: data.read_u32(84, Endian::Little)?,
        })
    }

    /// Byte offset of the partition entry array, if it fits in 64 bits.
    pub fn entries_offset(&self) -> Option<u64> {
        self.partition_entry_lba.checked_mul(LBA_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GptEntry {
    pub type_guid: [u8; 16],
    pub first_lba: u64,
    pub last_lba: u64,
    /// Decoded name with trailing NULs removed; may be empty.
    pub name: String,
}

impl GptEntry {
    /// Decode one entry. Returns `Ok(None)` for an unused slot (all-zero type GUID).
    pub fn parse(data: &[u8]) -> Result<Option<Self>> {
        if data.len() < GPT_ENTRY_SIZE {
            return Err(DecodeError::Truncated {
                offset: 0,
                needed: GPT_ENTRY_SIZE,
            });
        }

        let mut type_guid = [0u8; 16];
        type_guid.copy_from_slice(&data[0..16]);
        if type_guid == [0u8; 16] {
            return Ok(None);
        }

        let (name, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(&data[NAME_RANGE]);
        let name = name.trim_end_matches('\0').to_string();

        Ok(Some(Self {
            type_guid,
            first_lba: data.read_u64(32, Endian::Little)?,
            last_lba: data.read_u64(40, Endian::Little)?,
            name,
        }))
    }

    /// `(offset, size)` in bytes, or `None` when the LBA range is inverted or overflows.
    pub fn byte_range(&self) -> Option<(u64, u64)> {
        if self.last_lba < self.first_lba {
            return None;
        }
        let offset = self.first_lba.checked_mul(LBA_SIZE)?;
        let size = (self.last_lba - self.first_lba)
            .checked_add(1)?
            .checked_mul(LBA_SIZE)?;
        Some((offset, size))
    }
}

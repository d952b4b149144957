//! Qualcomm MBN boot-image header.
//!
//! A 40-byte header of ten little-endian u32 words precedes the raw image.

use crate::core::ImageType;
use crate::formats::utils::{Endian, EndianRead};
use crate::formats::{DecodeError, Result};

/// Size of the MBN header in bytes.
pub const MBN_HEADER_SIZE: usize = 40;

/// Highest header version accepted during scanning.
pub const MAX_HEADER_VERSION: u32 = 10;

/// Lowest plausible load address for a Qualcomm image.
pub const MIN_DEST_PTR: u32 = 0x4000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbnHeader {
    pub image_id: u32,
    pub header_vsn_num: u32,
    pub image_src: u32,
    pub image_dest_ptr: u32,
    pub image_size: u32,
    pub code_size: u32,
    pub signature_ptr: u32,
    pub signature_size: u32,
    pub cert_chain_ptr: u32,
    pub cert_chain_size: u32,
}

impl MbnHeader {
    /// Decode the header from the first 40 bytes of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < MBN_HEADER_SIZE {
            return Err(DecodeError::Truncated {
                offset: 0,
                needed: MBN_HEADER_SIZE,
            });
        }
        let word = |i: usize| data.read_u32(i * 4, Endian::Little);
        Ok(Self {
            image_id: word(0)?,
            header_vsn_num: word(1)?,
            image_src: word(2)?,
            image_dest_ptr: word(3)?,
            image_size: word(4)?,
            code_size: word(5)?,
            signature_ptr: word(6)?,
            signature_size: word(7)?,
            cert_chain_ptr: word(8)?,
            cert_chain_size: word(9)?,
        })
    }

    /// Sanity checks for a header found at `offset` in a file of `file_size` bytes.
    pub fn is_plausible(&self, offset: u64, file_size: u64) -> bool {
        let image_size = u64::from(self.image_size);
        if image_size == 0 || image_size > file_size {
            return false;
        }
        if offset.saturating_add(image_size) > file_size {
            return false;
        }
        if self.header_vsn_num > MAX_HEADER_VERSION {
            return false;
        }
        // The upper bound of 0xFFFFFFFF is implied by the field width.
        self.image_dest_ptr >= MIN_DEST_PTR
    }

    /// Image type implied by the load address, if it falls in a known range.
    pub fn image_type_by_address(&self) -> Option<ImageType> {
        match self.image_dest_ptr {
            0x4000_0000..=0x4FFF_FFFF => Some(ImageType::Sbl),
            0x8600_0000..=0x87FF_FFFF => Some(ImageType::Tz),
            0x6000_0000..=0x6FFF_FFFF => Some(ImageType::Rpm),
            0x8F60_0000..=0x8F6F_FFFF => Some(ImageType::Appsbl),
            _ => None,
        }
    }
}

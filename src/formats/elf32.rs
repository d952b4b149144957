//! Minimal ELF32 header and program header decoding.
//!
//! Qualcomm multi-segment images wrap their payloads in a 32-bit ELF
//! container. Only the fields needed to locate loadable segments are decoded.

use crate::formats::utils::{Endian, EndianRead};
use crate::formats::{DecodeError, Result};

/// ELF magic number
pub const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// Size of an ELF32 file header.
pub const ELF32_HEADER_SIZE: usize = 52;

/// Bytes of a program header needed before an entry is decoded.
pub const MIN_PHDR_SIZE: usize = 32;

/// Loadable segment
pub const PT_LOAD: u32 = 1;

/// Program header table location from the ELF32 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32Header {
    pub e_phoff: u32,
    pub e_phentsize: u16,
    pub e_phnum: u16,
}

/// ELF32 program header (first six fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHeader {
    pub p_type: u32,
    pub p_offset: u32,
    pub p_vaddr: u32,
    pub p_paddr: u32,
    pub p_filesz: u32,
    pub p_memsz: u32,
}

impl ProgramHeader {
    pub fn is_loadable(&self) -> bool {
        self.p_type == PT_LOAD && self.p_filesz > 0
    }
}

/// Parse ELF32 header
pub fn parse_header(data: &[u8]) -> Result<Elf32Header> {
    if data.len() < ELF32_HEADER_SIZE {
        return Err(DecodeError::Truncated {
            offset: 0,
            needed: ELF32_HEADER_SIZE,
        });
    }
    if &data[0..4] != ELF_MAGIC {
        return Err(DecodeError::InvalidMagic("ELF"));
    }

    Ok(Elf32Header {
        e_phoff: data.read_u32(28, Endian::Little)?,
        e_phentsize: data.read_u16(42, Endian::Little)?,
        e_phnum: data.read_u16(44, Endian::Little)?,
    })
}

/// Parse a program header entry. Entries shorter than 32 bytes are rejected.
pub fn parse_program_header(data: &[u8]) -> Result<ProgramHeader> {
    if data.len() < MIN_PHDR_SIZE {
        return Err(DecodeError::Truncated {
            offset: 0,
            needed: MIN_PHDR_SIZE,
        });
    }

    Ok(ProgramHeader {
        p_type: data.read_u32(0, Endian::Little)?,
        p_offset: data.read_u32(4, Endian::Little)?,
        p_vaddr: data.read_u32(8, Endian::Little)?,
        p_paddr: data.read_u32(12, Endian::Little)?,
        p_filesz: data.read_u32(16, Endian::Little)?,
        p_memsz: data.read_u32(20, Endian::Little)?,
    })
}

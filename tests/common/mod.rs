//! Shared helpers for building synthetic flash images.
//!
//! Real gang and Tegra images are large and vendor-licensed, so the
//! integration tests assemble minimal images byte by byte instead.

#![allow(dead_code)]

use std::io::{Seek, SeekFrom, Write};
use tempfile::NamedTempFile;

pub const KIB: usize = 1024;
pub const MIB: usize = 1024 * 1024;

/// Little-endian 40-byte MBN header.
pub fn mbn_header(version: u32, dest_ptr: u32, image_size: u32) -> [u8; 40] {
    let mut h = [0u8; 40];
    h[4..8].copy_from_slice(&version.to_le_bytes());
    h[12..16].copy_from_slice(&dest_ptr.to_le_bytes());
    h[16..20].copy_from_slice(&image_size.to_le_bytes());
    h[20..24].copy_from_slice(&image_size.saturating_sub(40).to_le_bytes());
    h
}

/// 92-byte GPT header, meant for LBA 1.
pub fn gpt_header(entry_lba: u64, entries: u32, entry_size: u32) -> [u8; 92] {
    let mut h = [0u8; 92];
    h[0..8].copy_from_slice(b"EFI PART");
    h[72..80].copy_from_slice(&entry_lba.to_le_bytes());
    h[80..84].copy_from_slice(&entries.to_le_bytes());
    h[84..88].copy_from_slice(&entry_size.to_le_bytes());
    h
}

/// 128-byte GPT entry with a non-zero type GUID.
pub fn gpt_entry(first_lba: u64, last_lba: u64, name: &str) -> [u8; 128] {
    let mut e = [0u8; 128];
    e[0..16].copy_from_slice(&[0x11; 16]);
    e[32..40].copy_from_slice(&first_lba.to_le_bytes());
    e[40..48].copy_from_slice(&last_lba.to_le_bytes());
    for (i, unit) in name.encode_utf16().take(36).enumerate() {
        e[56 + i * 2..58 + i * 2].copy_from_slice(&unit.to_le_bytes());
    }
    e
}

/// Fluent builder over a zero-filled buffer.
pub struct ImageBuilder {
    data: Vec<u8>,
}

impl ImageBuilder {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size],
        }
    }

    pub fn put(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn mbn(self, offset: usize, dest_ptr: u32, image_size: u32) -> Self {
        self.put(offset, &mbn_header(0, dest_ptr, image_size))
    }

    /// GPT header at LBA 1.
    pub fn gpt_header(self, entry_lba: u64, entries: u32, entry_size: u32) -> Self {
        self.put(512, &gpt_header(entry_lba, entries, entry_size))
    }

    pub fn gpt_entry(self, offset: usize, first_lba: u64, last_lba: u64, name: &str) -> Self {
        self.put(offset, &gpt_entry(first_lba, last_lba, name))
    }

    /// Little-endian squashfs superblock.
    pub fn squashfs(self, offset: usize, bytes_used: u64, block_size: u32) -> Self {
        let mut sb = [0u8; 96];
        sb[0..4].copy_from_slice(b"hsqs");
        sb[12..16].copy_from_slice(&block_size.to_le_bytes());
        sb[40..48].copy_from_slice(&bytes_used.to_le_bytes());
        self.put(offset, &sb)
    }

    /// ext superblock at region offset 0x400.
    pub fn ext(self, offset: usize, blocks: u32, free_blocks: u32, log_block_size: u32) -> Self {
        let sb = offset + 0x400;
        self.put(sb + 4, &blocks.to_le_bytes())
            .put(sb + 12, &free_blocks.to_le_bytes())
            .put(sb + 24, &log_block_size.to_le_bytes())
            .put(offset + 0x438, &0xEF53u16.to_le_bytes())
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// Minimal gang image: one SBL MBN image at offset 0 in an 8 KiB buffer.
pub fn single_sbl_image() -> Vec<u8> {
    ImageBuilder::new(8 * KIB)
        .mbn(0, 0x4000_0000, 4136)
        .build()
}

/// Tegra image with a GPT describing one 1 MiB "data" partition at LBA 2048.
pub fn single_gpt_image() -> Vec<u8> {
    ImageBuilder::new(2 * MIB + 4 * KIB)
        .gpt_header(2, 1, 128)
        .gpt_entry(1024, 2048, 4095, "data")
        .build()
}

/// Write `data` to a fresh temporary file.
pub fn write_temp(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(data).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

/// Sparse temporary file of `len` bytes with `pieces` written at their offsets.
///
/// Only the written pieces occupy disk space, so multi-gigabyte layouts stay cheap.
pub fn write_sparse(len: u64, pieces: &[(u64, &[u8])]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.as_file().set_len(len).expect("size temp file");
    for (offset, bytes) in pieces {
        file.seek(SeekFrom::Start(*offset)).expect("seek temp file");
        file.write_all(bytes).expect("write temp file");
    }
    file.flush().expect("flush temp file");
    file
}

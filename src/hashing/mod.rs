//! Checksums over partition byte ranges.

use crate::core::PartitionInfo;
use crate::io::error::Result;
use crate::io::{self, ByteSource};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Supported checksum algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Crc32,
    Md5,
    Sha256,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChecksumAlgorithm::Crc32 => "crc32",
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Sha256 => "sha256",
        })
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "crc32" => Ok(ChecksumAlgorithm::Crc32),
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            other => Err(format!("Unsupported algorithm: {}", other)),
        }
    }
}

/// Computes the CRC-32 (IEEE) of the given data.
pub fn crc32_digest(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Computes the MD5 digest of the given data and returns it as a hex string.
pub fn md5_digest(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Computes the SHA-256 digest of the given data and returns it as a hex string.
pub fn sha256_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Incremental hasher for any [`ChecksumAlgorithm`].
pub enum Hasher {
    Crc32(crc32fast::Hasher),
    Md5(md5::Context),
    Sha256(Sha256),
}

impl Hasher {
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Crc32 => Hasher::Crc32(crc32fast::Hasher::new()),
            ChecksumAlgorithm::Md5 => Hasher::Md5(md5::Context::new()),
            ChecksumAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Crc32(h) => h.update(data),
            Hasher::Md5(h) => h.consume(data),
            Hasher::Sha256(h) => h.update(data),
        }
    }

    /// Lowercase hex digest; CRC-32 is formatted as 8 hex digits.
    pub fn finalize(self) -> String {
        match self {
            Hasher::Crc32(h) => format!("{:08x}", h.finalize()),
            Hasher::Md5(h) => format!("{:x}", h.compute()),
            Hasher::Sha256(h) => format!("{:x}", h.finalize()),
        }
    }
}

/// Checksum of `data` rendered as a string; CRC-32 is formatted as 8 hex digits.
pub fn digest(algorithm: ChecksumAlgorithm, data: &[u8]) -> String {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    hasher.finalize()
}

/// Checksum of the bytes `[offset, offset + size)` of `source`.
///
/// The range is hashed in bounded reads, so it may exceed the source's
/// per-read limit; it must lie fully inside the source.
pub fn checksum_range(
    source: &dyn ByteSource,
    offset: u64,
    size: u64,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut hasher = Hasher::new(algorithm);
    for chunk in io::chunks(source, offset, size)? {
        hasher.update(&chunk?);
    }
    Ok(hasher.finalize())
}

/// CRC-32 of the part of `partition` that lies inside the source.
pub fn partition_crc32(source: &dyn ByteSource, partition: &PartitionInfo) -> Result<u32> {
    let in_bounds = partition
        .size
        .min(source.size().saturating_sub(partition.offset));
    let mut hasher = crc32fast::Hasher::new();
    for chunk in io::chunks(source, partition.offset, in_bounds)? {
        hasher.update(&chunk?);
    }
    Ok(hasher.finalize())
}

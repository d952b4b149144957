//! Random-access byte sources for image analysis.
//!
//! Every analyzer reads through the [`ByteSource`] trait: an explicit
//! `(offset, length) -> bytes` primitive with no hidden cursor, so scanners
//! can run against in-memory buffers in tests and probe disjoint regions from
//! several threads at once. [`SafeReader`] is the file-backed implementation;
//! it memory-maps the image read-only and enforces [`IOLimits`].

pub mod error;

use crate::io::error::{IoError, Result};
use bytes::Bytes;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Read-only random-access view over an image.
pub trait ByteSource: Send + Sync {
    /// Total size of the source in bytes.
    fn size(&self) -> u64;

    /// Read exactly `len` bytes at `offset`.
    ///
    /// Fails with [`IoError::ShortRead`] when fewer than `len` bytes exist at
    /// `offset`. A zero-length read always succeeds.
    fn read_at(&self, offset: u64, len: u64) -> Result<Bytes>;

    /// Label used for `AnalysisResult::filename`.
    fn name(&self) -> String {
        "<memory>".to_string()
    }

    /// Read at most `max_len` bytes at `offset`, clamped to the end of the source.
    fn read_up_to(&self, offset: u64, max_len: u64) -> Result<Bytes> {
        let available = self.size().saturating_sub(offset);
        self.read_at(offset, max_len.min(available))
    }

    /// Largest single `read_at` this source serves.
    fn max_read_len(&self) -> u64 {
        u64::MAX
    }
}

/// Upper bound on one read issued by [`chunks`].
pub const CHUNK_SIZE: u64 = 1024 * 1024;

/// Iterator over `[offset, offset + len)` in reads of at most [`CHUNK_SIZE`]
/// bytes, never larger than the source's `max_read_len`.
pub struct Chunks<'a> {
    source: &'a dyn ByteSource,
    pos: u64,
    end: u64,
    step: u64,
}

impl Iterator for Chunks<'_> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let len = (self.end - self.pos).min(self.step);
        let chunk = self.source.read_at(self.pos, len);
        // Stop after a failed read rather than retrying the same range.
        self.pos = if chunk.is_ok() { self.pos + len } else { self.end };
        Some(chunk)
    }
}

/// Stream `len` bytes at `offset` in bounded reads.
///
/// The whole range is checked up front: a range running past the end of the
/// source fails with [`IoError::ShortRead`] before any bytes are produced.
pub fn chunks(source: &dyn ByteSource, offset: u64, len: u64) -> Result<Chunks<'_>> {
    let available = source.size().saturating_sub(offset);
    if available < len {
        return Err(IoError::ShortRead {
            offset,
            requested: len,
            available,
        });
    }
    Ok(Chunks {
        source,
        pos: offset,
        end: offset + len,
        step: CHUNK_SIZE.min(source.max_read_len()).max(1),
    })
}

fn slice_exact(data: &[u8], offset: u64, len: u64) -> Result<&[u8]> {
    if len == 0 {
        return Ok(&[]);
    }
    let size = data.len() as u64;
    let available = size.saturating_sub(offset);
    if available < len {
        return Err(IoError::ShortRead {
            offset,
            requested: len,
            available,
        });
    }
    // Both values are bounded by data.len() at this point.
    let start = offset as usize;
    let end = start + len as usize;
    Ok(&data[start..end])
}

impl ByteSource for Vec<u8> {
    fn size(&self) -> u64 {
        self.len() as u64
    }

    fn read_at(&self, offset: u64, len: u64) -> Result<Bytes> {
        slice_exact(self, offset, len).map(Bytes::copy_from_slice)
    }
}

impl ByteSource for Bytes {
    fn size(&self) -> u64 {
        self.len() as u64
    }

    fn read_at(&self, offset: u64, len: u64) -> Result<Bytes> {
        slice_exact(self, offset, len)?;
        if len == 0 {
            return Ok(Bytes::new());
        }
        Ok(self.slice(offset as usize..(offset + len) as usize))
    }
}

/// Defines the resource limits for I/O operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IOLimits {
    /// The absolute maximum file size that can be opened.
    pub max_file_size: u64,
    /// The largest single `read_at` the reader will serve.
    pub max_read_len: u64,
}

impl Default for IOLimits {
    fn default() -> Self {
        Self {
            max_file_size: 16 * 1024 * 1024 * 1024, // 16GB
            max_read_len: 2 * 1024 * 1024 * 1024,   // 2GB
        }
    }
}

/// A safe, bounded file reader that uses memory-mapping for efficient access.
///
/// Reads take `&self` and never move a shared cursor, so one reader can be
/// probed from several threads.
#[derive(Debug)]
pub struct SafeReader {
    path: PathBuf,
    // None when the file size is zero; memmap cannot map empty files.
    mmap: Option<Mmap>,
    limits: IOLimits,
    file_size: u64,
}

impl SafeReader {
    /// Opens a file, memory-maps it, and wraps it in a `SafeReader`.
    ///
    /// This function will fail if the file size exceeds `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: IOLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        let file_size = metadata.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limits.max_file_size = limits.max_file_size,
            "Opening image for reading"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "Image is too large"
            );
            return Err(IoError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        let mmap = if file_size == 0 {
            None
        } else {
            // Safety: read-only map of a regular file; the image is not modified while analyzed.
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            limits,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the `IOLimits` enforced by this reader.
    pub fn limits(&self) -> &IOLimits {
        &self.limits
    }
}

impl ByteSource for SafeReader {
    fn size(&self) -> u64 {
        self.file_size
    }

    fn read_at(&self, offset: u64, len: u64) -> Result<Bytes> {
        if len > self.limits.max_read_len {
            warn!(
                path = %self.path.display(),
                requested = len,
                limit = self.limits.max_read_len,
                "Read limit exceeded"
            );
            return Err(IoError::ReadTooLarge {
                limit: self.limits.max_read_len,
                requested: len,
            });
        }

        let map: &[u8] = match &self.mmap {
            Some(m) => &m[..],
            None => &[],
        };
        let out = slice_exact(map, offset, len).map(Bytes::copy_from_slice)?;

        trace!(
            path = %self.path.display(),
            offset = offset,
            len = len,
            "Performed read"
        );

        Ok(out)
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn max_read_len(&self) -> u64 {
        self.limits.max_read_len
    }
}

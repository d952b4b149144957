//! Signature tables and window probes shared by the platform scanners.

use crate::formats::gpt::GPT_SIGNATURE;
use crate::io::ByteSource;
use aho_corasick::AhoCorasick;
use memchr::memmem;
use once_cell::sync::Lazy;

/// Stride used by every linear scan.
pub const SCAN_STRIDE: u64 = 4096;

/// Size of the windows probed for platform signatures.
pub const WINDOW_SIZE: u64 = 512;

/// Leading magics that mark a Qualcomm gang image.
pub const QUALCOMM_MAGICS: [&[u8; 4]; 4] = [b"\x7fELF", b"GANG", b"QCOM", b"\0\0\0\0"];

/// NVIDIA signatures in priority order.
pub const NVIDIA_SIGNATURES: [&[u8]; 4] = [b"NVDA", b"TEGR", b"BCT\0", b"NV3P"];

/// Markers whose presence suggests a kernel or Android boot payload.
pub const BOOT_MARKERS: [&[u8]; 3] = [b"ANDROID!", b"Linux", b"vmlinuz"];

static NVIDIA_MATCHER: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new(NVIDIA_SIGNATURES).expect("valid NVIDIA signature set"));

static BOUNDARY_MATCHER: Lazy<AhoCorasick> = Lazy::new(|| {
    let mut patterns: Vec<&[u8]> = NVIDIA_SIGNATURES.to_vec();
    patterns.push(GPT_SIGNATURE);
    AhoCorasick::new(patterns).expect("valid boundary signature set")
});

static BOOT_MATCHER: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new(BOOT_MARKERS).expect("valid boot marker set"));

/// True if any NVIDIA signature occurs anywhere in `data`.
pub fn contains_nvidia_signature(data: &[u8]) -> bool {
    NVIDIA_MATCHER.is_match(data)
}

/// True if `data` contains an NVIDIA signature or the GPT signature.
pub fn contains_boundary(data: &[u8]) -> bool {
    BOUNDARY_MATCHER.is_match(data)
}

pub fn contains_boot_marker(data: &[u8]) -> bool {
    BOOT_MATCHER.is_match(data)
}

/// Position of the highest-priority NVIDIA signature present in `data`.
///
/// Priority follows [`NVIDIA_SIGNATURES`], not position: a `TEGR` earlier
/// in the window loses to an `NVDA` later in it.
pub fn first_nvidia_signature(data: &[u8]) -> Option<usize> {
    NVIDIA_SIGNATURES
        .iter()
        .find_map(|sig| memmem::find(data, sig))
}

/// Reads a probe window, treating any read fault as an empty window.
pub fn window(source: &dyn ByteSource, offset: u64, len: u64) -> bytes::Bytes {
    source.read_up_to(offset, len).unwrap_or_default()
}

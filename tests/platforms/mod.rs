//! Cross-platform properties: detection, idempotence, robustness.

mod nvidia;
mod qualcomm;

use bytes::Bytes;
use flashimg::{
    auto_select, detect_platform, for_platform, AnalysisConfig, FlashError, Platform,
    PlatformAnalyzer,
};

use crate::common::*;

fn tegr_image() -> Vec<u8> {
    ImageBuilder::new(64 * KIB).put(0, b"TEGR").build()
}

/// Buffers built to stress the decoders rather than to be realistic.
fn adversarial_inputs() -> Vec<Vec<u8>> {
    let mut inputs = vec![
        Vec::new(),
        vec![0u8; 3],
        vec![0u8; 39],
        b"\x7fELF".to_vec(),
        b"GANG".to_vec(),
    ];

    // ELF whose program headers point far past the end of the file.
    inputs.push(
        ImageBuilder::new(4 * KIB)
            .put(0, b"\x7fELF")
            .put(28, &u32::MAX.to_le_bytes())
            .put(42, &u16::MAX.to_le_bytes())
            .put(44, &u16::MAX.to_le_bytes())
            .build(),
    );

    // MBN header claiming more bytes than the file holds.
    inputs.push(ImageBuilder::new(8 * KIB).mbn(0, 0x4000_0000, u32::MAX).build());

    // GPT with an absurd entry LBA and another with an absurd entry size.
    inputs.push(ImageBuilder::new(8 * KIB).gpt_header(u64::MAX, u32::MAX, 128).build());
    inputs.push(
        ImageBuilder::new(8 * KIB)
            .gpt_header(2, u32::MAX, u32::MAX)
            .gpt_entry(1024, 0, u64::MAX, "overflow")
            .build(),
    );

    // Signature soup.
    let mut soup = Vec::with_capacity(32 * KIB);
    while soup.len() < 32 * KIB {
        soup.extend_from_slice(b"NVDATEGRBCT\0NV3PEFI PART\0\0\0\0");
    }
    inputs.push(soup);

    // Deterministic pseudo-random bytes with a zero prefix.
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    let mut noise = vec![0u8; 16 * KIB];
    for b in noise.iter_mut().skip(4) {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        *b = state as u8;
    }
    inputs.push(noise);

    inputs
}

#[test]
fn detection_order() {
    assert_eq!(detect_platform(&single_sbl_image()), Some(Platform::Qualcomm));
    assert_eq!(detect_platform(&tegr_image()), Some(Platform::Nvidia));
    assert_eq!(detect_platform(&vec![0xFFu8; 1024]), None);
}

#[test]
fn auto_select_matches_detection() {
    let analyzer = auto_select(&tegr_image(), AnalysisConfig::default()).unwrap();
    assert_eq!(analyzer.platform(), Platform::Nvidia);

    let err = auto_select(&vec![0xFFu8; 1024], AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, FlashError::UnsupportedFormat(_)));
}

#[test]
fn handled_inputs_never_unsupported() {
    for platform in Platform::PROBE_ORDER {
        let analyzer = for_platform(platform, AnalysisConfig::default());
        for (i, input) in adversarial_inputs().iter().enumerate() {
            if !analyzer.can_handle(input) {
                continue;
            }
            if let Err(e) = analyzer.analyze(input) {
                panic!("{} rejected accepted input #{}: {}", platform, i, e);
            }
        }
    }
}

#[test]
fn unhandled_inputs_are_unsupported() {
    for platform in Platform::PROBE_ORDER {
        let analyzer = for_platform(platform, AnalysisConfig::default());
        for input in adversarial_inputs() {
            if analyzer.can_handle(&input) {
                continue;
            }
            assert!(matches!(
                analyzer.analyze(&input),
                Err(FlashError::UnsupportedFormat(_))
            ));
        }
    }
}

#[test]
fn analysis_is_idempotent() {
    let images = [single_sbl_image(), single_gpt_image(), tegr_image()];
    for image in &images {
        let analyzer = auto_select(image, AnalysisConfig::default()).unwrap();
        let first = analyzer.analyze(image).unwrap();
        let second = analyzer.analyze(image).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn byte_sources_agree() {
    let data = single_gpt_image();
    let analyzer = for_platform(Platform::Nvidia, AnalysisConfig::default());
    let from_vec = analyzer.analyze(&data).unwrap();
    let from_bytes = analyzer.analyze(&Bytes::from(data.clone())).unwrap();
    assert_eq!(from_vec, from_bytes);
}

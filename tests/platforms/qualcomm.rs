//! Qualcomm gang image analysis, end to end.

use flashimg::hashing::crc32_digest;
use flashimg::{
    AnalysisConfig, FlashError, ImageType, IOLimits, PlatformAnalyzer, Platform, QualcommAnalyzer,
    SafeReader,
};

use crate::common::*;

/// ELF gang image: a small SBL segment and a 2 MiB ext segment.
fn elf_gang_image() -> Vec<u8> {
    let mut phdrs = [0u8; 64];
    for (i, (offset, size, paddr)) in [(0x1000u32, 0x1000u32, 0x4000_0000u32), (0x10_0000, 0x20_0000, 0)]
        .into_iter()
        .enumerate()
    {
        let ph = &mut phdrs[i * 32..(i + 1) * 32];
        ph[0..4].copy_from_slice(&1u32.to_le_bytes());
        ph[4..8].copy_from_slice(&offset.to_le_bytes());
        ph[12..16].copy_from_slice(&paddr.to_le_bytes());
        ph[16..20].copy_from_slice(&size.to_le_bytes());
        ph[20..24].copy_from_slice(&size.to_le_bytes());
    }

    ImageBuilder::new(4 * MIB)
        .put(0, b"\x7fELF\x01\x01\x01")
        .put(28, &52u32.to_le_bytes())
        .put(42, &32u16.to_le_bytes())
        .put(44, &2u16.to_le_bytes())
        .put(52, &phdrs)
        .ext(0x10_0000, 2048, 512, 0)
        .build()
}

/// Two MBN images, each carrying a squashfs payload after the header.
fn squashfs_gang_image() -> Vec<u8> {
    ImageBuilder::new(6 * MIB)
        .mbn(0, 0x9000_0000, 2 * MIB as u32)
        .squashfs(40, 1_500_000, 131072)
        .mbn(2 * MIB, 0x8F60_0000, 2 * MIB as u32)
        .squashfs(2 * MIB + 40, 1_000_000, 65536)
        .build()
}

#[test]
fn single_mbn_image_is_sbl() {
    let data = single_sbl_image();
    let result = QualcommAnalyzer::default().analyze(&data).unwrap();

    assert_eq!(result.platform, Platform::Qualcomm);
    assert_eq!(result.file_size, 8192);
    assert_eq!(result.partitions.len(), 1);
    let p = &result.partitions[0];
    assert_eq!(p.name, "sbl_0");
    assert_eq!(p.image_type, ImageType::Sbl);
    assert_eq!((p.offset, p.size), (0, 4136));
    assert_eq!(p.load_addr, 0x4000_0000);
    assert_eq!(p.entry_point, 0x4000_0000);
    assert!(p.filesystem.is_none());

    assert_eq!(result.total_partition_size, 4136);
    assert!(result.validation_errors.is_empty());
    assert_eq!(
        result.warnings,
        vec!["Gang header not found, scanning for individual MBN images".to_string()]
    );
}

#[test]
fn mbn_payload_filesystems_skip_header() {
    let data = squashfs_gang_image();
    let result = QualcommAnalyzer::default().analyze(&data).unwrap();

    let names: Vec<&str> = result.partitions.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["unknown_0", "appsbl_1"]);

    let fs0 = result.partitions[0].filesystem.as_ref().unwrap();
    assert_eq!(fs0.fs_type, "squashfs");
    assert_eq!(fs0.used_size, 1_500_000);
    assert_eq!(fs0.free_size, 0);
    let fs1 = result.partitions[1].filesystem.as_ref().unwrap();
    assert_eq!(fs1.block_size, 65536);

    assert_eq!(result.total_filesystem_used, 2_500_000);
}

#[test]
fn skip_fs_analysis_leaves_filesystems_empty() {
    let config = AnalysisConfig {
        skip_fs_analysis: true,
        ..AnalysisConfig::default()
    };
    let result = QualcommAnalyzer::new(config)
        .analyze(&squashfs_gang_image())
        .unwrap();
    assert_eq!(result.partitions.len(), 2);
    assert!(result.partitions.iter().all(|p| p.filesystem.is_none()));
    assert_eq!(result.total_filesystem_used, 0);
}

#[test]
fn parallel_filesystem_pass_matches_sequential() {
    let data = squashfs_gang_image();
    let sequential = QualcommAnalyzer::default().analyze(&data).unwrap();
    let parallel = QualcommAnalyzer::new(AnalysisConfig {
        parallel_fs: true,
        ..AnalysisConfig::default()
    })
    .analyze(&data)
    .unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn elf_program_headers_become_segments() {
    let data = elf_gang_image();
    let result = QualcommAnalyzer::default().analyze(&data).unwrap();

    assert!(result.warnings.is_empty());
    let layout: Vec<(&str, u64, u64, u64)> = result
        .partitions
        .iter()
        .map(|p| (p.name.as_str(), p.offset, p.size, p.load_addr))
        .collect();
    assert_eq!(
        layout,
        vec![
            ("segment_0", 0x1000, 0x1000, 0x4000_0000),
            ("segment_1", 0x10_0000, 0x20_0000, 0),
        ]
    );
    assert!(result.partitions.iter().all(|p| p.image_type == ImageType::Unknown));

    let fs = result.partitions[1].filesystem.as_ref().unwrap();
    assert_eq!(fs.fs_type, "ext");
    assert_eq!(fs.fs_size, 2 * MIB as u64);
    assert_eq!(fs.used_size, 1_572_864);
    assert_eq!(fs.free_size, 524_288);
    assert_eq!(fs.free_blocks, 512);
}

#[test]
fn truncated_elf_falls_back_with_warning() {
    let data = b"\x7fELF\x01\x01".to_vec();
    let result = QualcommAnalyzer::default().analyze(&data).unwrap();
    assert!(result.partitions.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("MBN"));
}

#[test]
fn checksums_and_alignment_are_opt_in() {
    let data = single_sbl_image();
    let plain = QualcommAnalyzer::default().analyze(&data).unwrap();
    assert_eq!(plain.partitions[0].crc32, 0);

    let config = AnalysisConfig {
        compute_checksums: true,
        check_alignment: true,
        ..AnalysisConfig::default()
    };
    let result = QualcommAnalyzer::new(config).analyze(&data).unwrap();
    assert_eq!(result.partitions[0].crc32, crc32_digest(&data[..4136]));
    // Offset 0 is aligned; the odd size does not matter.
    assert!(result.validation_errors.is_empty());
}

#[test]
fn misaligned_segment_is_reported_when_enabled() {
    let mut data = elf_gang_image();
    // Move segment_0 to 0x1010.
    data[52 + 4..52 + 8].copy_from_slice(&0x1010u32.to_le_bytes());

    let config = AnalysisConfig {
        check_alignment: true,
        ..AnalysisConfig::default()
    };
    let result = QualcommAnalyzer::new(config).analyze(&data).unwrap();
    assert_eq!(
        result.validation_errors,
        vec!["segment_0: not aligned to 512-byte boundary".to_string()]
    );
}

#[test]
fn tegra_image_is_unsupported() {
    let mut data = vec![0u8; 4096];
    data[0..4].copy_from_slice(b"NVDA");
    match QualcommAnalyzer::default().analyze(&data) {
        Err(FlashError::UnsupportedFormat(msg)) => {
            assert_eq!(msg, "Not a recognized Qualcomm gang image format")
        }
        other => panic!("expected UnsupportedFormat, got {:?}", other),
    }
}

#[test]
fn file_backed_analysis_matches_memory() {
    let data = squashfs_gang_image();
    let file = write_temp(&data);
    let reader = SafeReader::open(file.path(), IOLimits::default()).unwrap();

    let from_file = QualcommAnalyzer::default().analyze(&reader).unwrap();
    let from_memory = QualcommAnalyzer::default().analyze(&data).unwrap();

    assert_eq!(from_file.filename, file.path().display().to_string());
    assert_eq!(from_file.partitions, from_memory.partitions);
    assert_eq!(from_file.warnings, from_memory.warnings);
}

//! NVIDIA Tegra image analysis, end to end.

use flashimg::{AnalysisConfig, ImageType, NvidiaAnalyzer, Platform, PlatformAnalyzer};

use crate::common::*;

/// BCT at 0, GPT with mb1, an empty slot, a squashfs kernel and an unnamed entry.
fn tegra_image() -> Vec<u8> {
    ImageBuilder::new(3 * MIB)
        .put(0, b"BCT\0")
        .gpt_header(2, 4, 128)
        .gpt_entry(1024, 64, 127, "mb1")
        .gpt_entry(1024 + 256, 128, 4223, "kernel")
        .gpt_entry(1024 + 384, 4224, 4227, "")
        .squashfs(128 * 512, 900_000, 131072)
        .build()
}

#[test]
fn gpt_single_partition() {
    let data = single_gpt_image();
    let result = NvidiaAnalyzer::default().analyze(&data).unwrap();

    assert_eq!(result.platform, Platform::Nvidia);
    assert_eq!(result.partitions.len(), 1);
    let p = &result.partitions[0];
    assert_eq!(p.name, "data");
    assert_eq!(p.offset, 1_048_576);
    assert_eq!(p.size, 1_048_576);
    assert_eq!(p.image_type, ImageType::Unknown);
    assert!(result.warnings.is_empty());
    assert!(result.validation_errors.is_empty());
}

#[test]
fn bct_precedes_gpt_partitions() {
    let result = NvidiaAnalyzer::default().analyze(&tegra_image()).unwrap();

    let layout: Vec<(&str, u64, u64, ImageType)> = result
        .partitions
        .iter()
        .map(|p| (p.name.as_str(), p.offset, p.size, p.image_type))
        .collect();
    assert_eq!(
        layout,
        vec![
            ("BCT", 0, 16384, ImageType::Unknown),
            ("mb1", 64 * 512, 64 * 512, ImageType::Sbl),
            ("kernel", 128 * 512, 4096 * 512, ImageType::Boot),
            ("partition_3", 4224 * 512, 2048, ImageType::Unknown),
        ]
    );

    let fs = result.partitions[2].filesystem.as_ref().unwrap();
    assert_eq!(fs.fs_type, "squashfs");
    assert_eq!(result.total_filesystem_used, 900_000);
    assert!(result.warnings.is_empty());
    assert!(result.validation_errors.is_empty());
}

#[test]
fn corrupt_gpt_entry_is_skipped_with_warning() {
    let data = ImageBuilder::new(2 * MIB)
        .gpt_header(2, 2, 128)
        .gpt_entry(1024, 100, 10, "broken")
        .gpt_entry(1024 + 128, 2048, 2303, "misc")
        .build();
    let result = NvidiaAnalyzer::default().analyze(&data).unwrap();

    assert_eq!(result.partition_names(), vec!["misc"]);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("invalid LBA range"));
}

#[test]
fn signature_scan_without_gpt() {
    let data = ImageBuilder::new(64 * KIB)
        .put(8, b"TEGR")
        .put(8 + 4608 + 16, b"NV3P")
        .build();
    let result = NvidiaAnalyzer::default().analyze(&data).unwrap();

    assert_eq!(
        result.warnings,
        vec!["GPT not found, scanning for partition signatures".to_string()]
    );
    let layout: Vec<(&str, u64, u64)> = result
        .partitions
        .iter()
        .map(|p| (p.name.as_str(), p.offset, p.size))
        .collect();
    assert_eq!(
        layout,
        vec![
            ("nvidia_partition_0", 8, 4608),
            ("nvidia_partition_1", 4632, 64 * 1024 - 4632),
        ]
    );
    assert!(result.validation_errors.is_empty());
}

#[test]
fn empty_gpt_falls_back_to_scan() {
    // GPT header with no entries and nothing to scan for.
    let data = ImageBuilder::new(8 * KIB).gpt_header(2, 0, 128).build();
    let result = NvidiaAnalyzer::default().analyze(&data).unwrap();
    assert!(result.partitions.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.total_partition_size, 0);
}

#[test]
fn partition_past_end_is_reported() {
    let data = ImageBuilder::new(2 * MIB)
        .gpt_header(2, 1, 128)
        .gpt_entry(1024, 4096, 8191, "userdata")
        .build();
    let result = NvidiaAnalyzer::new(AnalysisConfig::default())
        .analyze(&data)
        .unwrap();
    assert_eq!(
        result.validation_errors,
        vec!["userdata: extends beyond file end".to_string()]
    );
    assert!(!result.is_valid());
}

#![no_main]
use flashimg::{for_platform, AnalysisConfig, FlashError, Platform, PlatformAnalyzer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let source = data.to_vec();
    let config = AnalysisConfig {
        compute_checksums: true,
        check_alignment: true,
        ..AnalysisConfig::default()
    };
    for platform in Platform::PROBE_ORDER {
        let analyzer = for_platform(platform, config.clone());
        if analyzer.can_handle(&source) {
            match analyzer.analyze(&source) {
                Ok(result) => {
                    for p in &result.partitions {
                        let _ = analyzer.extract_partition(&source, &result, &p.name);
                    }
                }
                Err(FlashError::UnsupportedFormat(msg)) => {
                    panic!("accepted input reported as unsupported: {}", msg)
                }
                Err(_) => {}
            }
        }
    }
});

#![no_main]
use flashimg::filesystem::FilesystemDetector;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = FilesystemDetector::detect_bytes(data, data.len() as u64);
    let source = data.to_vec();
    let _ = FilesystemDetector::detect(&source, 40, u64::MAX);
});

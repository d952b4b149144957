//! Platform analyzers and the pipeline they share.
//!
//! Each platform contributes a sniff (`can_handle`) and a discovery pass
//! that turns raw bytes into candidate partitions. Everything after
//! discovery is common: the filesystem pass over large partitions, optional
//! CRC-32s, validation, and assembly of the [`AnalysisResult`].

pub mod nvidia;
pub mod qualcomm;
pub mod registry;
pub mod scan;

pub use nvidia::NvidiaAnalyzer;
pub use qualcomm::QualcommAnalyzer;
pub use registry::{auto_select, detect_platform, for_platform, Analyzer};

use crate::config::AnalysisConfig;
use crate::core::{AnalysisResult, FilesystemInfo, PartitionInfo, Platform};
use crate::error::{FlashError, Result};
use crate::filesystem::FilesystemDetector;
use crate::hashing;
use crate::io::{
    self,
    error::{IoError, Result as IoResult},
    ByteSource, IOLimits, SafeReader,
};
use crate::validation::{self, SizeBounds};
use bytes::Bytes;
use rayon::prelude::*;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, info_span};

/// Partitions larger than this get a filesystem probe.
pub const FS_ANALYSIS_THRESHOLD: u64 = 1024 * 1024;

/// A partition found during discovery, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub partition: PartitionInfo,
    /// Leading bytes that belong to a container header rather than the payload.
    pub payload_skip: u64,
}

impl Candidate {
    pub fn new(partition: PartitionInfo) -> Self {
        Self {
            partition,
            payload_skip: 0,
        }
    }

    pub fn with_payload_skip(mut self, skip: u64) -> Self {
        self.payload_skip = skip;
        self
    }

    /// `(offset, size)` of the bytes handed to the filesystem detector.
    pub fn payload_region(&self) -> (u64, u64) {
        let p = &self.partition;
        (
            p.offset.saturating_add(self.payload_skip),
            p.size.saturating_sub(self.payload_skip),
        )
    }
}

/// Output of a platform's discovery pass.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub candidates: Vec<Candidate>,
    pub warnings: Vec<String>,
}

/// A platform-specific flash image analyzer.
pub trait PlatformAnalyzer: Send + Sync {
    fn platform(&self) -> Platform;

    fn config(&self) -> &AnalysisConfig;

    /// Cheap, side-effect-free sniff. Read faults count as "no".
    fn can_handle(&self, source: &dyn ByteSource) -> bool;

    /// Locate candidate partitions. Only genuine read faults are errors;
    /// malformed tables degrade into warnings and heuristic scans.
    fn discover(&self, source: &dyn ByteSource) -> IoResult<Discovery>;

    /// Size range outside of which partitions are flagged.
    fn size_bounds(&self) -> SizeBounds;

    /// Run the full analysis over `source`.
    ///
    /// Every call re-reads the source; no state is carried between calls.
    fn analyze(&self, source: &dyn ByteSource) -> Result<AnalysisResult> {
        run_pipeline(self, source)
    }

    /// Bytes of the first partition in `result` named `name`.
    ///
    /// The partition is read in one piece and so is subject to the source's
    /// per-read limit; [`extract_to`](Self::extract_to) streams instead.
    fn extract_partition(
        &self,
        source: &dyn ByteSource,
        result: &AnalysisResult,
        name: &str,
    ) -> Result<Bytes> {
        extract(source, result, name)
    }

    /// Analyze `source`, then copy partition `name` verbatim into `sink`.
    ///
    /// Returns the number of bytes written, which always equals the
    /// partition size.
    fn extract_to(&self, source: &dyn ByteSource, name: &str, sink: &mut dyn Write) -> Result<u64> {
        let result = self.analyze(source)?;
        self.write_partition(source, &result, name, sink)
    }

    /// Stream partition `name` from an existing `result` into `sink` in
    /// bounded reads. Nothing is written when the partition is unknown or
    /// runs past the end of the source.
    fn write_partition(
        &self,
        source: &dyn ByteSource,
        result: &AnalysisResult,
        name: &str,
        sink: &mut dyn Write,
    ) -> Result<u64> {
        let partition = find_partition(result, name)?;
        stream_partition(source, partition, sink)
    }
}

/// Open an image file, reporting failures as analysis errors.
pub fn open_image<P: AsRef<Path>>(path: P, limits: IOLimits) -> Result<SafeReader> {
    let path = path.as_ref();
    SafeReader::open(path, limits)
        .map_err(|e| FlashError::analysis(format!("Error opening {}", path.display()), e))
}

fn run_pipeline<A: PlatformAnalyzer + ?Sized>(
    analyzer: &A,
    source: &dyn ByteSource,
) -> Result<AnalysisResult> {
    let platform = analyzer.platform();
    let config = analyzer.config();
    let span = info_span!("analyze", platform = %platform, source = %source.name());
    let _guard = span.enter();

    if !analyzer.can_handle(source) {
        return Err(FlashError::UnsupportedFormat(format!(
            "Not a recognized {} format",
            platform.display_name()
        )));
    }

    let context = || format!("Error analyzing {}", platform.display_name());
    let Discovery {
        candidates,
        warnings,
    } = analyzer
        .discover(source)
        .map_err(|e| FlashError::analysis(context(), e))?;

    let mut partitions = attach_filesystems(source, candidates, config);

    if config.compute_checksums {
        for p in &mut partitions {
            p.crc32 = hashing::partition_crc32(source, p).map_err(|e| {
                FlashError::analysis(format!("Error computing checksum for {}", p.name), e)
            })?;
        }
    }

    let file_size = source.size();
    let mut validation_errors = validation::validate(&partitions, file_size, analyzer.size_bounds());
    if config.check_alignment {
        validation_errors.extend(validation::check_alignment(&partitions));
    }

    let result = AnalysisResult::new(
        source.name(),
        file_size,
        platform,
        partitions,
        validation_errors,
        warnings,
    );
    info!(
        partitions = result.partitions.len(),
        validation_errors = result.validation_errors.len(),
        warnings = result.warnings.len(),
        "Analysis complete"
    );
    Ok(result)
}

fn probe_candidate(source: &dyn ByteSource, candidate: &Candidate) -> Option<FilesystemInfo> {
    if candidate.partition.size <= FS_ANALYSIS_THRESHOLD {
        return None;
    }
    let (offset, size) = candidate.payload_region();
    FilesystemDetector::detect(source, offset, size)
}

/// Filesystem pass. Results are reattached in discovery order whether or not
/// the probes ran in parallel.
fn attach_filesystems(
    source: &dyn ByteSource,
    candidates: Vec<Candidate>,
    config: &AnalysisConfig,
) -> Vec<PartitionInfo> {
    if config.skip_fs_analysis {
        return candidates.into_iter().map(|c| c.partition).collect();
    }

    let found: Vec<Option<FilesystemInfo>> = if config.parallel_fs {
        candidates
            .par_iter()
            .map(|c| probe_candidate(source, c))
            .collect()
    } else {
        candidates
            .iter()
            .map(|c| probe_candidate(source, c))
            .collect()
    };

    candidates
        .into_iter()
        .zip(found)
        .map(|(c, fs)| {
            let mut p = c.partition;
            p.filesystem = fs;
            p
        })
        .collect()
}

fn find_partition<'r>(result: &'r AnalysisResult, name: &str) -> Result<&'r PartitionInfo> {
    result
        .partition(name)
        .ok_or_else(|| FlashError::PartitionNotFound {
            name: name.to_string(),
            available: result.partition_names(),
        })
}

fn extract(source: &dyn ByteSource, result: &AnalysisResult, name: &str) -> Result<Bytes> {
    let partition = find_partition(result, name)?;

    debug!(
        name,
        offset = partition.offset,
        size = partition.size,
        "Extracting partition"
    );
    source
        .read_at(partition.offset, partition.size)
        .map_err(|e| FlashError::analysis(format!("Error extracting partition {}", name), e))
}

fn stream_partition(
    source: &dyn ByteSource,
    partition: &PartitionInfo,
    sink: &mut dyn Write,
) -> Result<u64> {
    let context = || format!("Error extracting partition {}", partition.name);

    debug!(
        name = %partition.name,
        offset = partition.offset,
        size = partition.size,
        "Streaming partition"
    );
    let mut written = 0u64;
    for chunk in io::chunks(source, partition.offset, partition.size)
        .map_err(|e| FlashError::analysis(context(), e))?
    {
        let chunk = chunk.map_err(|e| FlashError::analysis(context(), e))?;
        sink.write_all(&chunk)?;
        written += chunk.len() as u64;
    }
    sink.flush()?;

    if written != partition.size {
        return Err(FlashError::analysis(
            context(),
            IoError::ShortRead {
                offset: partition.offset,
                requested: partition.size,
                available: written,
            },
        ));
    }
    Ok(written)
}

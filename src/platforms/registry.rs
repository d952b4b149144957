use crate::config::AnalysisConfig;
use crate::core::Platform;
use crate::error::{FlashError, Result};
use crate::io::{error::Result as IoResult, ByteSource};
use crate::platforms::{Discovery, NvidiaAnalyzer, PlatformAnalyzer, QualcommAnalyzer};
use crate::validation::SizeBounds;
use tracing::{debug, warn};

/// Closed set of platform analyzers.
#[derive(Debug, Clone)]
pub enum Analyzer {
    Qualcomm(QualcommAnalyzer),
    Nvidia(NvidiaAnalyzer),
}

impl PlatformAnalyzer for Analyzer {
    fn platform(&self) -> Platform {
        match self {
            Analyzer::Qualcomm(a) => a.platform(),
            Analyzer::Nvidia(a) => a.platform(),
        }
    }

    fn config(&self) -> &AnalysisConfig {
        match self {
            Analyzer::Qualcomm(a) => a.config(),
            Analyzer::Nvidia(a) => a.config(),
        }
    }

    fn can_handle(&self, source: &dyn ByteSource) -> bool {
        match self {
            Analyzer::Qualcomm(a) => a.can_handle(source),
            Analyzer::Nvidia(a) => a.can_handle(source),
        }
    }

    fn discover(&self, source: &dyn ByteSource) -> IoResult<Discovery> {
        match self {
            Analyzer::Qualcomm(a) => a.discover(source),
            Analyzer::Nvidia(a) => a.discover(source),
        }
    }

    fn size_bounds(&self) -> SizeBounds {
        match self {
            Analyzer::Qualcomm(a) => a.size_bounds(),
            Analyzer::Nvidia(a) => a.size_bounds(),
        }
    }
}

/// Analyzer for an explicitly chosen platform.
pub fn for_platform(platform: Platform, config: AnalysisConfig) -> Analyzer {
    match platform {
        Platform::Qualcomm => Analyzer::Qualcomm(QualcommAnalyzer::new(config)),
        Platform::Nvidia => Analyzer::Nvidia(NvidiaAnalyzer::new(config)),
    }
}

/// First platform, in probe order, whose sniff accepts `source`.
pub fn detect_platform(source: &dyn ByteSource) -> Option<Platform> {
    Platform::PROBE_ORDER
        .into_iter()
        .find(|&p| for_platform(p, AnalysisConfig::default()).can_handle(source))
}

/// Analyzer for whatever platform `source` looks like.
///
/// When nothing matches, the Qualcomm analyzer is returned only if
/// `config.fallback_to_qualcomm` is set. That analyzer still refuses the
/// unmatched input, so the option only changes which error the caller sees:
/// `UnsupportedFormat` from `auto_select` without it, or the same error from
/// `analyze` with it.
pub fn auto_select(source: &dyn ByteSource, config: AnalysisConfig) -> Result<Analyzer> {
    if let Some(platform) = detect_platform(source) {
        debug!(platform = %platform, source = %source.name(), "Platform detected");
        return Ok(for_platform(platform, config));
    }
    if config.fallback_to_qualcomm {
        warn!(source = %source.name(), "No platform detected, defaulting to Qualcomm");
        return Ok(for_platform(Platform::Qualcomm, config));
    }
    Err(FlashError::UnsupportedFormat(format!(
        "Could not detect platform for {}",
        source.name()
    )))
}

//! Rendering of analysis results as text, JSON or CSV.

use crate::core::{AnalysisResult, PartitionInfo, Platform};
use crate::validation::find_overlaps;
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Display options shared by all formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub verbose: bool,
    /// Only list partitions that carry filesystem statistics.
    pub fs_only: bool,
}

/// Human-readable size with one decimal, e.g. `512B`, `4.0KB`, `1.5MB`.
pub fn format_size(size: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let s = size as f64;
    if s < KB {
        format!("{}B", size)
    } else if s < MB {
        format!("{:.1}KB", s / KB)
    } else if s < GB {
        format!("{:.1}MB", s / MB)
    } else {
        format!("{:.1}GB", s / GB)
    }
}

fn shown_partitions<'a>(result: &'a AnalysisResult, opts: ReportOptions) -> Vec<&'a PartitionInfo> {
    result
        .partitions
        .iter()
        .filter(|p| !opts.fs_only || p.filesystem.is_some())
        .collect()
}

pub fn render(result: &AnalysisResult, format: OutputFormat, opts: ReportOptions) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(result, opts)),
        OutputFormat::Json => render_json(result, opts),
        OutputFormat::Csv => render_csv(result, opts),
    }
}

pub fn render_text(result: &AnalysisResult, opts: ReportOptions) -> String {
    let partitions = shown_partitions(result, opts);
    let mut out = String::new();
    let rule = |n: usize| "-".repeat(n);

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Analyzing flash image: {}", result.filename);
    let _ = writeln!(out, "Platform: {}", result.platform.display_name());
    let _ = writeln!(
        out,
        "File size: {} bytes ({})",
        result.file_size,
        format_size(result.file_size)
    );
    let _ = writeln!(out, "{}", rule(60));

    if !result.warnings.is_empty() {
        for w in &result.warnings {
            let _ = writeln!(out, "Warning: {}", w);
        }
        let _ = writeln!(out, "{}", rule(60));
    }

    let _ = writeln!(out, "\nFound {} partitions:", partitions.len());
    let _ = writeln!(out, "{}", rule(120));
    let _ = writeln!(
        out,
        "{:<15} {:<10} {:<12} {:<12} {:<12} {:<10} {:<12} {:<10}",
        "Name", "Type", "Offset", "Size", "Load Addr", "FS Type", "FS Size", "Used"
    );
    let _ = writeln!(out, "{}", rule(120));
    for p in &partitions {
        let (fs_type, fs_size, used) = match &p.filesystem {
            Some(fs) => (
                fs.fs_type.clone(),
                format_size(fs.fs_size),
                format_size(fs.used_size),
            ),
            None => ("N/A".to_string(), "N/A".to_string(), "N/A".to_string()),
        };
        let _ = writeln!(
            out,
            "{:<15} {:<10} 0x{:08x}   {:<10}   0x{:08x}   {:<10} {:<10} {:<10}",
            p.name,
            p.image_type.as_str(),
            p.offset,
            format_size(p.size),
            p.load_addr,
            fs_type,
            fs_size,
            used
        );
        if opts.verbose {
            let _ = writeln!(
                out,
                "    entry 0x{:08x}  end 0x{:08x}  crc32 {:08x}",
                p.entry_point,
                p.end(),
                p.crc32
            );
        }
    }
    let _ = writeln!(out, "{}", rule(120));
    let _ = writeln!(
        out,
        "Total partition size: {}",
        format_size(result.total_partition_size)
    );
    let _ = writeln!(
        out,
        "Total filesystem used: {}",
        format_size(result.total_filesystem_used)
    );
    let _ = writeln!(out, "File size: {}", format_size(result.file_size));
    if result.total_partition_size < result.file_size {
        let _ = writeln!(out, "Unused space: {}", format_size(result.unused_space()));
    }

    let with_fs: Vec<&PartitionInfo> = partitions
        .iter()
        .copied()
        .filter(|p| p.filesystem.is_some())
        .collect();
    if !with_fs.is_empty() {
        let _ = writeln!(out, "\nFilesystem Details:");
        let _ = writeln!(out, "{}", rule(100));
        let _ = writeln!(
            out,
            "{:<15} {:<10} {:<12} {:<12} {:<12} {:<8} {:<10}",
            "Partition", "FS Type", "Total", "Used", "Free", "Usage%", "Block Size"
        );
        let _ = writeln!(out, "{}", rule(100));
        for p in with_fs {
            if let Some(fs) = &p.filesystem {
                let _ = writeln!(
                    out,
                    "{:<15} {:<10} {:<10} {:<10} {:<10} {:>6.1}%   {:<10}",
                    p.name,
                    fs.fs_type,
                    format_size(fs.fs_size),
                    format_size(fs.used_size),
                    format_size(fs.free_size),
                    fs.usage_percent(),
                    format_size(fs.block_size)
                );
            }
        }
        let _ = writeln!(out, "{}", rule(100));
    }

    let _ = writeln!(out, "\nOverlap Analysis:");
    let _ = writeln!(out, "{}", rule(40));
    let overlaps = find_overlaps(partitions.iter().copied());
    if overlaps.is_empty() {
        let _ = writeln!(out, "No overlaps detected");
    } else {
        let _ = writeln!(out, "Overlaps detected:");
        for o in &overlaps {
            let _ = writeln!(out, "  {}", o);
        }
    }

    let _ = writeln!(out, "\nPartition Validation:");
    let _ = writeln!(out, "{}", rule(40));
    if result.validation_errors.is_empty() {
        let _ = write!(out, "All partitions validated successfully");
    } else {
        let _ = write!(out, "Validation errors:");
        for e in &result.validation_errors {
            let _ = write!(out, "\n  {}", e);
        }
    }

    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    filename: &'a str,
    file_size: u64,
    platform: Platform,
    partitions: Vec<&'a PartitionInfo>,
    total_partition_size: u64,
    total_filesystem_used: u64,
    validation_errors: &'a [String],
    warnings: &'a [String],
}

pub fn render_json(result: &AnalysisResult, opts: ReportOptions) -> Result<String> {
    let report = JsonReport {
        filename: &result.filename,
        file_size: result.file_size,
        platform: result.platform,
        partitions: shown_partitions(result, opts),
        total_partition_size: result.total_partition_size,
        total_filesystem_used: result.total_filesystem_used,
        validation_errors: &result.validation_errors,
        warnings: &result.warnings,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub const CSV_HEADER: [&str; 8] = [
    "Name", "Type", "Offset", "Size", "Load_Addr", "FS_Type", "FS_Size", "Used_Size",
];

pub fn render_csv(result: &AnalysisResult, opts: ReportOptions) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for p in shown_partitions(result, opts) {
        let (fs_type, fs_size, used) = match &p.filesystem {
            Some(fs) => (
                fs.fs_type.clone(),
                fs.fs_size.to_string(),
                fs.used_size.to_string(),
            ),
            None => ("N/A".to_string(), "N/A".to_string(), "N/A".to_string()),
        };
        writer.write_record([
            p.name.clone(),
            p.image_type.to_string(),
            format!("0x{:08x}", p.offset),
            p.size.to_string(),
            format!("0x{:08x}", p.load_addr),
            fs_type,
            fs_size,
            used,
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).trim_end().to_string())
}

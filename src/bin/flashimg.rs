//! Command-line front end: analyze a flash image, print a report, or
//! extract one partition.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use flashimg::config::AnalysisConfig;
use flashimg::core::Platform;
use flashimg::error::FlashError;
use flashimg::hashing::{self, ChecksumAlgorithm};
use flashimg::logging;
use flashimg::platforms::{self, PlatformAnalyzer};
use flashimg::report::{self, OutputFormat, ReportOptions};
use flashimg::validation;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

/// Analyze embedded system flash images
#[derive(Parser, Debug)]
#[command(name = "flashimg", version)]
#[command(about = "Discover partitions and filesystems in flash images", long_about = None)]
struct Cli {
    /// Flash image file to analyze
    image: PathBuf,

    /// Force a platform analyzer
    #[arg(long, default_value = "auto", value_parser = ["auto", "qualcomm", "nvidia"])]
    platform: String,

    /// Output format for results (text, json, csv)
    #[arg(long, default_value = "text")]
    output_format: OutputFormat,

    /// Show only partitions with filesystems
    #[arg(long)]
    fs_only: bool,

    /// Skip filesystem analysis for faster processing
    #[arg(long)]
    no_fs_analysis: bool,

    /// Compute a CRC-32 for every partition
    #[arg(long)]
    checksums: bool,

    /// Flag partitions not aligned to 512 bytes
    #[arg(long)]
    check_alignment: bool,

    /// Run whole-image sanity checks before analysis
    #[arg(long)]
    check: bool,

    /// Probe filesystems on all cores
    #[arg(long)]
    parallel: bool,

    /// Print a digest of every partition instead of the report (crc32, md5, sha256)
    #[arg(long, value_name = "ALGORITHM")]
    digest: Option<ChecksumAlgorithm>,

    /// Extract a partition (format: partition_name:output_file)
    #[arg(long, value_name = "NAME:FILE")]
    extract: Option<String>,

    /// JSON file with analysis settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output and debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    config.skip_fs_analysis |= cli.no_fs_analysis;
    config.compute_checksums |= cli.checksums;
    config.check_alignment |= cli.check_alignment;
    config.parallel_fs |= cli.parallel;
    Ok(config)
}

fn run(cli: &Cli) -> Result<bool> {
    let config = build_config(cli)?;
    let source = platforms::open_image(&cli.image, config.io.clone())?;

    let mut clean = true;
    if cli.check {
        for note in validation::check_image(&source) {
            eprintln!("Check: {}", note);
            clean = false;
        }
    }

    let analyzer = match cli.platform.as_str() {
        "auto" => platforms::auto_select(&source, config)?,
        name => {
            let platform: Platform = name.parse().map_err(|e: String| anyhow!(e))?;
            platforms::for_platform(platform, config)
        }
    };

    let result = analyzer.analyze(&source)?;

    if let Some(target) = &cli.extract {
        let (name, output) = target
            .split_once(':')
            .ok_or_else(|| anyhow!("Extract format should be partition_name:output_file"))?;
        if result.partition(name).is_none() {
            return Err(FlashError::PartitionNotFound {
                name: name.to_string(),
                available: result.partition_names(),
            })
            .with_context(|| format!("extracting {}", name));
        }

        let file = File::create(output).with_context(|| format!("creating {}", output))?;
        let mut sink = BufWriter::new(file);
        let written = match analyzer.write_partition(&source, &result, name, &mut sink) {
            Ok(n) => n,
            Err(e) => {
                drop(sink);
                let _ = fs::remove_file(output);
                return Err(e).with_context(|| format!("extracting {}", name));
            }
        };
        println!("Extracted {} to {} ({} bytes)", name, output, written);
        return Ok(clean);
    }

    if let Some(algorithm) = cli.digest {
        for p in &result.partitions {
            match hashing::checksum_range(&source, p.offset, p.size, algorithm) {
                Ok(digest) => println!("{}  {}", digest, p.name),
                Err(e) => {
                    eprintln!("{}: {}", p.name, e);
                    clean = false;
                }
            }
        }
        return Ok(clean && result.is_valid());
    }

    let opts = ReportOptions {
        verbose: cli.verbose,
        fs_only: cli.fs_only,
    };
    println!("{}", report::render(&result, cli.output_format, opts)?);

    Ok(clean && result.is_valid())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.json_logs {
        logging::init_tracing_json();
    } else {
        logging::init_tracing_with_level(if cli.verbose { "debug" } else { "warn" });
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

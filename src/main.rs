//! coretrim - Alignment consensus-core trimmer
//!
//! ## Usage
//!
//! ```bash
//! coretrim aln.fasta                         # writes aln.core.fasta
//! coretrim --gap-threshold 0.3 --trim-flanking *.sto -o trimmed/
//! coretrim -c coretrim.toml --report json data/*.phy
//! ```
//!
//! ## Supported Formats
//!
//! - FASTA (.fa, .fasta)
//! - CLUSTAL (.clustal, .clu)
//! - PHYLIP (.phy, .phylip)
//! - Stockholm (.sto, .stockholm)

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use coretrim::{
    BatchSummary, Engine, FileConfig, FileFormat, FileReport, FileResult, FileStatus, InputFile,
    TrimOptions,
};

/// File format specification for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// FASTA format
    Fasta,
    /// CLUSTAL format
    Clustal,
    /// PHYLIP format
    Phylip,
    /// Stockholm format
    Stockholm,
    /// Auto-detect from extension and content
    Auto,
}

impl From<FormatArg> for Option<FileFormat> {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Fasta => Some(FileFormat::Fasta),
            FormatArg::Clustal => Some(FileFormat::Clustal),
            FormatArg::Phylip => Some(FileFormat::Phylip),
            FormatArg::Stockholm => Some(FileFormat::Stockholm),
            FormatArg::Auto => None,
        }
    }
}

/// Report style printed after processing
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportArg {
    Text,
    Json,
}

/// coretrim - Trim multiple sequence alignments to their consensus core
///
/// Removes gap-dominated columns and, optionally, high-gap flanking regions.
/// Each input is written next to it (or into --out-dir) as NAME.core.EXT,
/// in the same format it was read from.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Alignment files (FASTA, CLUSTAL, PHYLIP or Stockholm)
    #[arg(required_unless_present = "print_config")]
    files: Vec<PathBuf>,

    /// TOML configuration file (command-line flags take precedence)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Keep a column only if its gap proportion is <= this value (0-1, default: 0.45)
    #[arg(long = "gap-threshold")]
    gap_threshold: Option<f64>,

    /// Drop columns that are gaps in every sequence, whatever the threshold
    #[arg(long = "remove-full-gap-columns", overrides_with = "keep_full_gap_columns")]
    remove_full_gap_columns: bool,

    /// Keep full-gap columns unless the threshold drops them (overrides the config file)
    #[arg(long = "keep-full-gap-columns", overrides_with = "remove_full_gap_columns")]
    keep_full_gap_columns: bool,

    /// Trim leading and trailing high-gap columns
    #[arg(long = "trim-flanking", overrides_with = "no_trim_flanking")]
    trim_flanking: bool,

    /// Disable flank trimming (overrides the config file)
    #[arg(long = "no-trim-flanking", overrides_with = "trim_flanking")]
    no_trim_flanking: bool,

    /// Edge columns with a gap proportion above this value are trimmed (0-1, default: 0.45)
    #[arg(long = "flank-threshold")]
    flank_threshold: Option<f64>,

    /// Force a specific file format (overrides auto-detection)
    #[arg(short = 'f', long = "format", value_enum, default_value = "auto")]
    format: FormatArg,

    /// Directory for trimmed files (default: next to each input)
    #[arg(short = 'o', long = "out-dir")]
    out_dir: Option<PathBuf>,

    /// Worker threads (default: one per core)
    #[arg(short = 't', long = "threads")]
    threads: Option<usize>,

    /// Report style
    #[arg(long = "report", value_enum, default_value = "text")]
    report: ReportArg,

    /// Print a sample configuration file and exit
    #[arg(long = "print-config")]
    print_config: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

impl Args {
    /// Merges the configuration file (if any) with command-line overrides.
    fn resolve(&self) -> Result<(TrimOptions, Option<usize>)> {
        let file_config = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };

        let mut options = file_config.options;
        if let Some(threshold) = self.gap_threshold {
            options.gap_threshold = threshold;
        }
        if let Some(threshold) = self.flank_threshold {
            options.flank_threshold = threshold;
        }
        if let Some(remove) = switch(self.remove_full_gap_columns, self.keep_full_gap_columns) {
            options.remove_full_gap_columns = remove;
        }
        if let Some(trim) = switch(self.trim_flanking, self.no_trim_flanking) {
            options.trim_flanking = trim;
        }
        options.validate()?;

        Ok((options, self.threads.or(file_config.threads)))
    }
}

/// Value set by an on/off flag pair; `None` leaves the config value alone.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Where the trimmed copy of `input` is written.
fn output_path(input: &Path, output_name: &str, out_dir: Option<&Path>) -> PathBuf {
    let file_name = Path::new(output_name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(output_name));
    match out_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}

fn print_text_report(reports: &[FileReport], summary: &BatchSummary) {
    for report in reports {
        match report.status {
            FileStatus::Error => {
                println!(
                    "FAIL  {}: {}",
                    report.filename,
                    report.message.as_deref().unwrap_or("unknown error")
                );
            }
            FileStatus::Ok | FileStatus::Warning => {
                let tag = if report.status == FileStatus::Ok { "ok  " } else { "warn" };
                println!(
                    "{}  {} -> {} (core {}, dropped {} of {} columns){}",
                    tag,
                    report.filename,
                    report.output_name.as_deref().unwrap_or("-"),
                    report.core_region.map(|r| r.to_string()).unwrap_or_default(),
                    report.dropped_columns.unwrap_or(0),
                    report.original_columns.unwrap_or(0),
                    report
                        .message
                        .as_deref()
                        .map(|m| format!(": {m}"))
                        .unwrap_or_default()
                );
            }
        }
    }
    println!(
        "{} file(s): {} trimmed, {} with warnings, {} failed",
        summary.total, summary.succeeded, summary.warnings, summary.failed
    );
}

/// Reads, trims and writes every input; returns the per-file reports.
fn run(args: &Args, engine: &Engine) -> Result<Vec<FileReport>> {
    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    // I/O failures are reported per file, outside the engine
    let mut inputs = Vec::with_capacity(args.files.len());
    let mut read_errors = Vec::with_capacity(args.files.len());
    for path in &args.files {
        match fs::read(path) {
            Ok(content) => {
                inputs.push(InputFile::new(path.to_string_lossy(), content));
                read_errors.push(None);
            }
            Err(e) => read_errors.push(Some(e)),
        }
    }

    let mut results: std::vec::IntoIter<FileResult> = engine.process_batch(&inputs).into_iter();
    let mut reports = Vec::with_capacity(args.files.len());

    for (path, read_error) in args.files.iter().zip(read_errors) {
        let name = path.to_string_lossy();
        if let Some(e) = read_error {
            reports.push(FileReport::failure(&name, "IoError", e.to_string()));
            continue;
        }
        let Some(result) = results.next() else {
            break;
        };

        let mut report = result.report();
        if let Ok(trimmed) = &result.outcome {
            let out = output_path(path, &trimmed.output_name, args.out_dir.as_deref());
            match fs::write(&out, &trimmed.output) {
                Ok(()) => {
                    debug!(path = %out.display(), bytes = trimmed.output.len(), "wrote trimmed alignment");
                    report.output_name = Some(out.to_string_lossy().into_owned());
                }
                Err(e) => {
                    report = FileReport::failure(
                        &name,
                        "IoError",
                        format!("Failed to write {}: {}", out.display(), e),
                    );
                }
            }
        }
        reports.push(report);
    }

    Ok(reports)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging based on verbosity flag
    let filter = if args.verbose {
        EnvFilter::new("coretrim=debug,info")
    } else {
        EnvFilter::new("coretrim=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    if args.print_config {
        print!("{}", TrimOptions::sample_toml());
        return Ok(());
    }

    let (options, threads) = args.resolve()?;
    info!(?options, ?threads, files = args.files.len(), "starting");

    let mut engine = Engine::new(options);
    if let Some(format) = Option::<FileFormat>::from(args.format) {
        engine = engine.with_format(format);
    }
    if let Some(threads) = threads {
        engine = engine.with_threads(threads);
    }

    let reports = run(&args, &engine)?;
    let summary = BatchSummary::from_reports(&reports);

    match args.report {
        ReportArg::Text => print_text_report(&reports, &summary),
        ReportArg::Json => {
            let json = serde_json::json!({ "files": reports, "summary": summary });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    if summary.failed > 0 {
        anyhow::bail!("{} of {} file(s) failed", summary.failed, summary.total);
    }

    Ok(())
}

//! Per-file trimming pipeline and batch orchestration.
//!
//! Each file runs detect → parse → stats → filter → (optional) flank trim →
//! serialize on its own byte buffer. Files share nothing, so a batch is run
//! on a rayon pool and results come back in input order. A failure in one
//! file never affects the others.

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::config::TrimOptions;
use crate::formats::{self, DetectionError, FileFormat, ParseError};
use crate::model::{Alignment, CoreRegion};
use crate::stats::compute_stats;
use crate::trim::{filter_columns, trim_flanks};

/// A named input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl InputFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Per-file failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl EngineError {
    /// Short, stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Detection(e) => e.kind(),
            EngineError::Parse(e) => e.kind(),
        }
    }
}

/// Non-fatal: the output alignment is empty but still written.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmptyResultWarning {
    #[error("no sequences remain")]
    NoRecords,

    #[error("no columns remain after filtering and trimming")]
    NoColumns,
}

impl EmptyResultWarning {
    fn check(alignment: &Alignment) -> Option<Self> {
        if alignment.sequence_count() == 0 {
            Some(EmptyResultWarning::NoRecords)
        } else if alignment.alignment_length() == 0 {
            Some(EmptyResultWarning::NoColumns)
        } else {
            None
        }
    }
}

/// A successfully trimmed file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimmedFile {
    pub format: FileFormat,
    /// Suggested output name (`name.core.ext`)
    pub output_name: String,
    /// Serialized trimmed alignment, same format as the input
    pub output: Vec<u8>,
    /// Kept range over the filtered alignment
    pub core_region: CoreRegion,
    pub original_columns: usize,
    pub dropped_columns: usize,
    pub sequence_count: usize,
    pub warning: Option<EmptyResultWarning>,
}

/// Outcome of one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileResult {
    pub filename: String,
    pub outcome: Result<TrimmedFile, EngineError>,
}

impl FileResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn warning(&self) -> Option<EmptyResultWarning> {
        self.outcome.as_ref().ok().and_then(|t| t.warning)
    }

    pub fn error(&self) -> Option<&EngineError> {
        self.outcome.as_ref().err()
    }

    /// A serializable summary without the output bytes.
    pub fn report(&self) -> FileReport {
        match &self.outcome {
            Ok(trimmed) => FileReport {
                filename: self.filename.clone(),
                status: if trimmed.warning.is_some() {
                    FileStatus::Warning
                } else {
                    FileStatus::Ok
                },
                format: Some(trimmed.format.to_string()),
                output_name: Some(trimmed.output_name.clone()),
                core_region: Some(trimmed.core_region),
                original_columns: Some(trimmed.original_columns),
                dropped_columns: Some(trimmed.dropped_columns),
                sequence_count: Some(trimmed.sequence_count),
                message: trimmed.warning.map(|w| w.to_string()),
                error_kind: None,
            },
            Err(e) => FileReport::failure(&self.filename, e.kind(), e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Warning,
    Error,
}

/// Per-file line of a run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub filename: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_region: Option<CoreRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_columns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropped_columns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FileReport {
    /// A failed file; also used by callers for errors raised before the engine (I/O).
    pub fn failure(filename: &str, kind: &str, message: String) -> Self {
        Self {
            filename: filename.to_string(),
            status: FileStatus::Error,
            format: None,
            output_name: None,
            core_region: None,
            original_columns: None,
            dropped_columns: None,
            sequence_count: None,
            error_kind: Some(kind.to_string()),
            message: Some(message),
        }
    }
}

/// Counts over a batch of reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub warnings: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut summary = BatchSummary {
            total: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match report.status {
                FileStatus::Ok => summary.succeeded += 1,
                FileStatus::Warning => {
                    summary.succeeded += 1;
                    summary.warnings += 1;
                }
                FileStatus::Error => summary.failed += 1,
            }
        }
        summary
    }

    pub fn from_results(results: &[FileResult]) -> Self {
        let reports: Vec<FileReport> = results.iter().map(FileResult::report).collect();
        Self::from_reports(&reports)
    }
}

/// Inserts `.core` before the extension: `x.fasta` → `x.core.fasta`.
pub fn core_output_name(filename: &str) -> String {
    let path = Path::new(filename);
    let stem = path.file_stem().and_then(|s| s.to_str());
    let ext = path.extension().and_then(|s| s.to_str());
    let name = match (stem, ext) {
        (Some(stem), Some(ext)) => format!("{stem}.core.{ext}"),
        (Some(stem), None) => format!("{stem}.core"),
        _ => return format!("{filename}.core"),
    };
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.join(name).to_string_lossy().into_owned(),
        None => name,
    }
}

/// The trimming engine: options plus run-wide settings.
///
/// Holds no mutable state; the same engine may process any number of
/// files concurrently.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: TrimOptions,
    format: Option<FileFormat>,
    cancel: CancellationToken,
    threads: Option<usize>,
}

impl Engine {
    pub fn new(options: TrimOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Bypasses detection and parses every file as `format`.
    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Size of the batch worker pool (rayon's default when unset).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    pub fn options(&self) -> &TrimOptions {
        &self.options
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runs the full pipeline on one file.
    pub fn process(&self, filename: &str, bytes: &[u8]) -> FileResult {
        let outcome = self.run_pipeline(filename, bytes);
        match &outcome {
            Ok(trimmed) => {
                if let Some(warning) = trimmed.warning {
                    warn!(filename, "{warning}");
                }
            }
            Err(e) => warn!(filename, kind = e.kind(), "{e}"),
        }
        FileResult {
            filename: filename.to_string(),
            outcome,
        }
    }

    fn run_pipeline(&self, filename: &str, bytes: &[u8]) -> Result<TrimmedFile, EngineError> {
        // A cancelled batch starts no new pipelines
        formats::checkpoint(&self.cancel)?;

        let format = match self.format {
            Some(format) => format,
            None => formats::detect(filename, bytes)?,
        };
        let alignment = formats::parse(bytes, format, &self.cancel)?;
        debug!(
            filename,
            %format,
            sequences = alignment.sequence_count(),
            columns = alignment.alignment_length(),
            "parsed alignment"
        );

        let gaps = format.gap_symbols();
        let stats = compute_stats(&alignment, gaps);
        let filtered = filter_columns(&alignment, &stats, &self.options);
        formats::checkpoint(&self.cancel)?;

        let (core, core_region) = if self.options.trim_flanking {
            trim_flanks(&filtered, &self.options, gaps)
        } else {
            let region = CoreRegion::full(filtered.alignment_length());
            (filtered, region)
        };

        let original_columns = alignment.alignment_length();
        let dropped_columns = original_columns - core.alignment_length();
        debug!(filename, %core_region, dropped_columns, "trimmed alignment");

        Ok(TrimmedFile {
            format,
            output_name: core_output_name(filename),
            output: formats::serialize(&core, format),
            core_region,
            original_columns,
            dropped_columns,
            sequence_count: core.sequence_count(),
            warning: EmptyResultWarning::check(&core),
        })
    }

    /// Processes every file independently, returning results in input order.
    pub fn process_batch(&self, files: &[InputFile]) -> Vec<FileResult> {
        let run = || -> Vec<FileResult> {
            files
                .par_iter()
                .map(|file| self.process(&file.filename, &file.content))
                .collect()
        };

        let results = match self.threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    warn!("Failed to build a {threads}-thread pool ({e}); using the global pool");
                    run()
                }
            },
            None => run(),
        };

        let summary = BatchSummary::from_results(&results);
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            warnings = summary.warnings,
            failed = summary.failed,
            "batch complete"
        );
        results
    }
}

/// Processes one file with the given options.
pub fn process(filename: &str, bytes: &[u8], options: TrimOptions) -> FileResult {
    Engine::new(options).process(filename, bytes)
}

/// Processes a batch of files with the given options.
pub fn process_batch(files: &[InputFile], options: TrimOptions) -> Vec<FileResult> {
    Engine::new(options).process_batch(files)
}

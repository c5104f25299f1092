//! # coretrim - Alignment consensus-core trimmer
//!
//! Reduces multiple sequence alignments to their gap-depleted core:
//! gap-dominated columns are removed and, optionally, high-gap flanks are
//! trimmed from both edges. The result is written back in the input format.
//!
//! ## Architecture
//!
//! - `model`: Records, alignments and core regions
//! - `formats`: FASTA, CLUSTAL, PHYLIP and Stockholm readers/writers, format detection
//! - `stats`: Per-column gap statistics
//! - `trim`: Gap column filter and flank trimmer
//! - `engine`: Per-file pipeline and parallel batch processing
//! - `config`: Trimming options and TOML configuration
//! - `cancel`: Cooperative cancellation
//!
//! ## Example
//!
//! ```
//! use coretrim::{process, TrimOptions};
//!
//! let fasta = b">s1\nAC-GT\n>s2\nACGGT\n>s3\nA--GT\n";
//! let result = process("example.fa", fasta, TrimOptions::default().with_gap_threshold(0.5));
//! let trimmed = result.outcome.unwrap();
//! assert_eq!(trimmed.dropped_columns, 1);
//! ```

pub mod cancel;
pub mod config;
pub mod engine;
pub mod formats;
pub mod model;
pub mod stats;
pub mod trim;

pub use cancel::CancellationToken;
pub use config::{ConfigError, FileConfig, TrimOptions};
pub use engine::{
    core_output_name, process, process_batch, BatchSummary, EmptyResultWarning, Engine, EngineError,
    FileReport, FileResult, FileStatus, InputFile, TrimmedFile,
};
pub use formats::{DetectionError, FileFormat, ParseError};
pub use model::{Alignment, CoreRegion, GapSymbols, Record};

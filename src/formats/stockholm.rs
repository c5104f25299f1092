//! Stockholm reader and writer.
//!
//! ## Stockholm Format
//!
//! ```text
//! # STOCKHOLM 1.0
//! #=GF ID example
//!
//! seq1 ACDEFGHIK.LMN
//! seq2 ACDEF..IKQLMN
//! #=GC SS_cons ....HHHH.....
//! //
//! ```
//!
//! Markup lines (`#`) are skipped and not written back. Everything after
//! the `//` terminator is ignored.

use super::blocks::BlockAccumulator;
use super::{checkpoint, ParseError, ParseResult, LINE_WIDTH};
use crate::cancel::CancellationToken;
use crate::model::Alignment;

/// Banner written at the top of every Stockholm file.
pub const BANNER: &str = "# STOCKHOLM 1.0";

/// Record terminator.
pub const TERMINATOR: &str = "//";

/// Returns true if `line` is a Stockholm banner.
pub fn is_banner(line: &str) -> bool {
    line.trim_start().to_uppercase().starts_with("# STOCKHOLM")
}

/// Parses the first Stockholm record in `content`.
pub fn parse_stockholm(content: &str, cancel: &CancellationToken) -> ParseResult<Alignment> {
    checkpoint(cancel)?;

    let mut blocks = BlockAccumulator::new();
    let mut terminated = false;

    for (idx, raw) in content.lines().enumerate() {
        checkpoint(cancel)?;
        let line = raw.trim();

        if line.is_empty() {
            blocks.end_block();
            continue;
        }
        if line == TERMINATOR {
            terminated = true;
            break;
        }
        if line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(id) = tokens.next() else {
            continue;
        };
        let chunks: Vec<&str> = tokens.collect();
        blocks.push(id, &chunks, idx + 1)?;
    }

    if !terminated {
        return Err(ParseError::MissingTerminator);
    }

    blocks.finish()
}

/// Writes an alignment as a single Stockholm record with blocks of up to 60 columns.
pub fn write_stockholm(alignment: &Alignment) -> String {
    let width = alignment.max_id_length() + 1;
    let mut out = String::with_capacity(
        alignment.sequence_count() * (alignment.alignment_length() / LINE_WIDTH + 1) * (width + LINE_WIDTH + 1)
            + BANNER.len()
            + 8,
    );
    out.push_str(BANNER);
    out.push('\n');

    if alignment.sequence_count() > 0 {
        for start in (0..alignment.alignment_length()).step_by(LINE_WIDTH) {
            let end = (start + LINE_WIDTH).min(alignment.alignment_length());
            out.push('\n');
            for record in alignment.records() {
                let chunk = String::from_utf8_lossy(&record.as_bytes()[start..end]);
                out.push_str(&format!("{:<width$}{}\n", record.id, chunk, width = width));
            }
        }
    }

    out.push_str(TERMINATOR);
    out.push('\n');
    out
}

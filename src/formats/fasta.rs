//! FASTA reader and writer.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence_identifier optional description
//! ACGTACGTACGT...
//! >another_sequence
//! TGCATGCATGCA...
//! ```
//!
//! The whole header line (after `>`) is kept as the record id, so
//! descriptions survive a read/write cycle. Sequence lines are
//! concatenated with whitespace removed.

use super::{checkpoint, push_residues, ParseError, ParseResult, LINE_WIDTH};
use crate::cancel::CancellationToken;
use crate::model::{Alignment, Record};

/// Parses FASTA content into an alignment.
///
/// Fails with `MalformedHeader` when sequence data precedes the first `>`
/// or a header is empty, and with `RaggedAlignment` when records differ
/// in length.
pub fn parse_fasta(content: &str, cancel: &CancellationToken) -> ParseResult<Alignment> {
    checkpoint(cancel)?;

    let mut records: Vec<Record> = Vec::new();
    let mut current: Option<Record> = None;
    // Capacity guess for the next record: rows of an alignment share a length
    let mut prev_len: usize = 0;

    for (idx, line) in content.lines().enumerate() {
        checkpoint(cancel)?;
        let line_number = idx + 1;
        let line = line.trim();

        // Skip empty lines
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            if let Some(record) = current.take() {
                prev_len = record.len();
                records.push(record);
            }

            let id = header.trim();
            if id.is_empty() {
                return Err(ParseError::MalformedHeader {
                    line: line_number,
                    message: "empty sequence identifier".to_string(),
                });
            }
            current = Some(Record::from_bytes(id, Vec::with_capacity(prev_len)));
        } else {
            let Some(record) = current.as_mut() else {
                return Err(ParseError::MalformedHeader {
                    line: line_number,
                    message: "sequence data before the first '>' header".to_string(),
                });
            };
            push_residues(&mut record.residues, line, &record.id, line_number)?;
        }
    }

    // Don't forget the last sequence
    if let Some(record) = current {
        records.push(record);
    }

    if records.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    Alignment::new(records)
}

/// Writes an alignment as FASTA, wrapping residues at 60 characters per line.
pub fn write_fasta(alignment: &Alignment) -> String {
    let mut out = String::with_capacity(
        alignment.sequence_count() * (alignment.alignment_length() + alignment.max_id_length() + 8),
    );
    for record in alignment.records() {
        out.push('>');
        out.push_str(&record.id);
        out.push('\n');
        for chunk in record.as_bytes().chunks(LINE_WIDTH) {
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push('\n');
        }
    }
    out
}

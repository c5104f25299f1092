//! CLUSTAL reader and writer.
//!
//! ## CLUSTAL Format
//!
//! ```text
//! CLUSTAL W (1.83) multiple sequence alignment
//!
//!
//! seq1      ACGTACGTAC-GTACG 16
//! seq2      ACGTAC--ACTGTACG 14
//!           ******  ** *****
//!
//! seq1      TTGACA
//! seq2      TTGAGA
//! ```
//!
//! Conservation lines (indented, or made only of `*`, `:` and `.`) and
//! trailing residue counts are discarded on read and never written back.

use super::blocks::BlockAccumulator;
use super::{checkpoint, ParseError, ParseResult, LINE_WIDTH};
use crate::cancel::CancellationToken;
use crate::model::Alignment;

/// Banner written at the top of every CLUSTAL file.
pub const BANNER: &str = "CLUSTAL multiple sequence alignment";

/// Programs whose CLUSTAL-formatted output starts with their own name.
const BANNER_TOKENS: [&str; 3] = ["CLUSTAL", "MUSCLE", "PROBCONS"];

/// Spaces between the longest id and the residue column.
const ID_GAP: usize = 6;

/// Returns true if `line` is a CLUSTAL banner.
pub fn is_banner(line: &str) -> bool {
    let upper = line.trim_start().to_uppercase();
    BANNER_TOKENS.iter().any(|token| upper.starts_with(token))
}

fn is_conservation_line(line: &str) -> bool {
    line.chars().all(|c| matches!(c, '*' | ':' | '.' | ' '))
}

/// Parses CLUSTAL content into an alignment.
pub fn parse_clustal(content: &str, cancel: &CancellationToken) -> ParseResult<Alignment> {
    checkpoint(cancel)?;

    let mut lines = content.lines().enumerate();
    let (banner_idx, banner) = lines
        .by_ref()
        .find(|(_, line)| !line.trim().is_empty())
        .ok_or(ParseError::EmptyInput)?;

    if !is_banner(banner) {
        return Err(ParseError::MalformedHeader {
            line: banner_idx + 1,
            message: format!("expected a CLUSTAL banner, found '{}'", banner.trim()),
        });
    }

    let mut blocks = BlockAccumulator::new();
    for (idx, raw) in lines {
        checkpoint(cancel)?;
        let line_number = idx + 1;

        if raw.trim().is_empty() {
            blocks.end_block();
            continue;
        }

        // Conservation lines have no id column
        if raw.starts_with(char::is_whitespace) || is_conservation_line(raw.trim_end()) {
            continue;
        }

        let mut tokens = raw.split_whitespace();
        let Some(id) = tokens.next() else {
            continue;
        };
        let mut chunks: Vec<&str> = tokens.collect();

        // Optional trailing cumulative residue count
        if chunks.len() > 1
            && chunks
                .last()
                .is_some_and(|t| t.bytes().all(|b| b.is_ascii_digit()))
        {
            chunks.pop();
        }

        blocks.push(id, &chunks, line_number)?;
    }

    blocks.finish()
}

/// Writes an alignment as CLUSTAL blocks of up to 60 columns.
pub fn write_clustal(alignment: &Alignment) -> String {
    let width = alignment.max_id_length() + ID_GAP;
    let mut out = String::with_capacity(
        alignment.sequence_count() * (alignment.alignment_length() / LINE_WIDTH + 1) * (width + LINE_WIDTH + 1)
            + BANNER.len()
            + 2,
    );
    out.push_str(BANNER);
    out.push_str("\n\n");

    if alignment.sequence_count() == 0 {
        return out;
    }

    for start in (0..alignment.alignment_length()).step_by(LINE_WIDTH) {
        let end = (start + LINE_WIDTH).min(alignment.alignment_length());
        out.push('\n');
        for record in alignment.records() {
            let chunk = String::from_utf8_lossy(&record.as_bytes()[start..end]);
            out.push_str(&format!("{:<width$}{}\n", record.id, chunk, width = width));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{parse_str, FileFormat};
    use crate::model::Record;

    fn parse(content: &str) -> ParseResult<Alignment> {
        parse_str(content, FileFormat::Clustal)
    }

    #[test]
    fn test_parse_blocks_with_conservation() {
        let content = "CLUSTAL W (1.83) multiple sequence alignment

seq1      ACGTACGTAC-GTACG 16
seq2      ACGTAC--ACTGTACG 14
          ******  ** *****

seq1      TTGACA 22
seq2      TTGAGA 20
          **** *
";
        let alignment = parse(content).unwrap();
        assert_eq!(alignment.sequence_count(), 2);
        assert_eq!(alignment.alignment_length(), 22);
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACGTACGTAC-GTACGTTGACA");
        assert_eq!(alignment.get(1).unwrap().as_str(), "ACGTAC--ACTGTACGTTGAGA");
    }

    #[test]
    fn test_unindented_conservation_line_is_ignored() {
        let content = "CLUSTAL\n\na ACGT\nb ACGA\n*** \n";
        let alignment = parse(content).unwrap();
        assert_eq!(alignment.sequence_count(), 2);
    }

    #[test]
    fn test_muscle_banner() {
        let content = "MUSCLE (3.8) multiple sequence alignment\n\na AC\nb AG\n";
        assert_eq!(parse(content).unwrap().alignment_length(), 2);
    }

    #[test]
    fn test_missing_banner() {
        let result = parse("\nseq1 ACGT\nseq2 ACGT\n");
        assert!(matches!(result, Err(ParseError::MalformedHeader { line: 2, .. })));
    }

    #[test]
    fn test_unknown_id_in_later_block() {
        let content = "CLUSTAL W\n\nseq1 ACGT\nseq2 ACGT\n\nseq1 AA\nseq3 AA\n";
        let result = parse(content);
        assert_eq!(
            result,
            Err(ParseError::UnknownSequenceId {
                id: "seq3".to_string(),
                line: 7
            })
        );
    }

    #[test]
    fn test_ragged_blocks() {
        let content = "CLUSTAL W\n\nseq1 ACGT\nseq2 ACGT\n\nseq1 AA\n";
        let result = parse(content);
        assert!(matches!(result, Err(ParseError::RaggedAlignment { ref id, .. }) if id == "seq2"));
    }

    #[test]
    fn test_banner_only_is_empty_alignment() {
        let alignment = parse("CLUSTAL W\n\n").unwrap();
        assert_eq!(alignment.sequence_count(), 0);
        assert_eq!(alignment.alignment_length(), 0);
    }

    #[test]
    fn test_write_blocks() {
        let alignment = Alignment::new(vec![
            Record::new("a", "A".repeat(70)),
            Record::new("bbb", "C".repeat(70)),
        ])
        .unwrap();
        let text = write_clustal(&alignment);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], BANNER);
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], format!("a        {}", "A".repeat(60)));
        assert_eq!(lines[4], format!("bbb      {}", "C".repeat(60)));
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], format!("a        {}", "A".repeat(10)));
        assert_eq!(lines.len(), 8);

        // Re-reading gives back the same matrix
        assert_eq!(parse(&text).unwrap(), alignment);
    }

    #[test]
    fn test_write_zero_length_is_banner_only() {
        let alignment = Alignment::new(vec![Record::new("a", "")]).unwrap();
        let text = write_clustal(&alignment);
        assert_eq!(text, format!("{}\n\n", BANNER));
        assert!(parse(&text).is_ok());
    }
}

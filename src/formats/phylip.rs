//! PHYLIP reader and writer.
//!
//! Supports both sequential and interleaved PHYLIP formats.
//!
//! ## PHYLIP Format
//!
//! The first line contains the number of sequences and the sequence length:
//! ```text
//!  3 10
//! ```
//!
//! ### Sequential Format
//! Each sequence name (10 chars, padded) followed by all its data,
//! possibly wrapped over residue-only continuation lines:
//! ```text
//!  3 10
//! Seq1      ACGTACGTAC
//! Seq2      TGCATGCATG
//! Seq3      AAAACCCCGG
//! ```
//!
//! ### Interleaved Format
//! Names on first block, then data continues in subsequent blocks,
//! matched to sequences by line order:
//! ```text
//!  3 20
//! Seq1      ACGTACGTAC
//! Seq2      TGCATGCATG
//! Seq3      AAAACCCCGG
//!
//! GTGTGTGTGT
//! CACACACACA
//! TTTTTTTTTT
//! ```
//!
//! ## Relaxed Parsing
//!
//! This parser is lenient about:
//! - Name length (not strictly 10 characters)
//! - Whitespace formatting
//! - Extra tokens after the two header integers

use tracing::debug;

use super::{checkpoint, push_residues, ParseError, ParseResult};
use crate::cancel::CancellationToken;
use crate::model::{Alignment, Record};

/// Width of the name field in strict PHYLIP.
const STRICT_NAME_WIDTH: usize = 10;

/// How sequence data is laid out after the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Sequential,
    Interleaved,
}

/// Parses PHYLIP content into an alignment.
///
/// Fails with `HeaderCountMismatch` when the number of sequences or any
/// sequence length disagrees with the header.
pub fn parse_phylip(content: &str, cancel: &CancellationToken) -> ParseResult<Alignment> {
    checkpoint(cancel)?;

    let mut lines = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (header_line, header) = lines.next().ok_or(ParseError::EmptyInput)?;
    let (ntax, nchar) = parse_header(header, header_line)?;

    // Blank lines carry no information once blocks are matched by line order
    let data: Vec<(usize, &str)> = lines.collect();

    if ntax == 0 {
        if !data.is_empty() {
            return Err(ParseError::HeaderCountMismatch {
                subject: "sequences".to_string(),
                expected: 0,
                found: data.len(),
            });
        }
        return Alignment::with_length(Vec::new(), nchar);
    }

    let (layout, records) = read_records(&data, ntax, nchar, cancel)?;
    debug!(?layout, ntax, nchar, "PHYLIP layout");

    if records.len() != ntax {
        return Err(ParseError::HeaderCountMismatch {
            subject: "sequences".to_string(),
            expected: ntax,
            found: records.len(),
        });
    }
    if let Some(bad) = records.iter().find(|r| r.len() != nchar) {
        return Err(ParseError::HeaderCountMismatch {
            subject: format!("columns for sequence '{}'", bad.id),
            expected: nchar,
            found: bad.len(),
        });
    }

    Alignment::with_length(records, nchar)
}

/// Parses the `ntax nchar` header line.
fn parse_header(header: &str, line: usize) -> ParseResult<(usize, usize)> {
    let parts: Vec<&str> = header.split_whitespace().collect();
    let malformed = |message: String| ParseError::MalformedHeader { line, message };

    if parts.len() < 2 {
        return Err(malformed(format!(
            "expected 'ntax nchar' (two integers), got '{}'",
            header
        )));
    }
    let ntax = parts[0]
        .parse::<usize>()
        .map_err(|_| malformed(format!("'{}' is not a valid sequence count", parts[0])))?;
    let nchar = parts[1]
        .parse::<usize>()
        .map_err(|_| malformed(format!("'{}' is not a valid sequence length", parts[1])))?;
    Ok((ntax, nchar))
}

/// Checks if a character is a valid sequence character.
fn is_sequence_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '-' || c == '.' || c == '*' || c == '?'
}

/// A line holding only residues (and spacing), never a name.
fn is_continuation(line: &str) -> bool {
    line.chars().all(|c| c.is_whitespace() || is_sequence_char(c))
}

/// Splits a line into name and sequence parts.
///
/// Handles both relaxed (whitespace-delimited) and strict (10-char) names.
/// The strict split is only tried when residues are expected, so that long
/// names on zero-column rows stay whole.
fn split_name_and_sequence(line: &str, expect_residues: bool) -> (&str, &str) {
    if let Some(space_idx) = line.find(char::is_whitespace) {
        let name = &line[..space_idx];
        let rest = line[space_idx..].trim_start();
        if !rest.is_empty() {
            return (name, rest);
        }
    }

    // Strict format: name is exactly the first 10 chars, sequence follows directly
    if expect_residues && line.len() > STRICT_NAME_WIDTH && line.is_char_boundary(STRICT_NAME_WIDTH) {
        let (name, rest) = line.split_at(STRICT_NAME_WIDTH);
        if is_continuation(rest) {
            return (name.trim_end(), rest);
        }
    }

    (line, "")
}

fn residue_count(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Reads the data lines with whichever layout accounts for them.
///
/// A first line already holding `nchar` residues means sequential. Otherwise
/// the interleaved reading is tried first: the first `ntax` lines name the
/// sequences and every later line is assigned round-robin. It is kept only
/// when it yields exactly `ntax` sequences of `nchar` residues; anything
/// else is read as sequential with wrapped continuation lines. Names are
/// never told apart from residue lines by their characters alone, since a
/// name such as `Mouse` is made of valid residues.
fn read_records(
    data: &[(usize, &str)],
    ntax: usize,
    nchar: usize,
    cancel: &CancellationToken,
) -> ParseResult<(Layout, Vec<Record>)> {
    let Some(&(_, first)) = data.first() else {
        return Ok((Layout::Sequential, Vec::new()));
    };
    let (_, residues) = split_name_and_sequence(first, nchar > 0);

    if residue_count(residues) < nchar {
        match read_interleaved(data, ntax, cancel) {
            Ok(records) if records.len() == ntax && records.iter().all(|r| r.len() == nchar) => {
                return Ok((Layout::Interleaved, records));
            }
            Err(ParseError::Cancelled) => return Err(ParseError::Cancelled),
            _ => {}
        }
    }

    Ok((Layout::Sequential, read_sequential(data, nchar, cancel)?))
}

/// Decides how the data lines after the header are laid out.
pub fn detect_layout(data: &[(usize, &str)], ntax: usize, nchar: usize) -> Layout {
    match read_records(data, ntax, nchar, &CancellationToken::new()) {
        Ok((layout, _)) => layout,
        Err(_) => Layout::Sequential,
    }
}

fn read_sequential(
    data: &[(usize, &str)],
    nchar: usize,
    cancel: &CancellationToken,
) -> ParseResult<Vec<Record>> {
    let mut records = Vec::new();
    let mut lines = data.iter().peekable();

    while let Some(&(line_number, line)) = lines.next() {
        checkpoint(cancel)?;
        let (name, residues) = split_name_and_sequence(line, nchar > 0);
        let mut seq = Vec::with_capacity(nchar);
        push_residues(&mut seq, residues, name, line_number)?;

        // Continuation lines of a wrapped sequence
        while seq.len() < nchar {
            match lines.peek() {
                Some(&&(next_number, next)) if is_continuation(next) => {
                    checkpoint(cancel)?;
                    push_residues(&mut seq, next, name, next_number)?;
                    lines.next();
                }
                _ => break,
            }
        }

        records.push(Record::from_bytes(name, seq));
    }

    Ok(records)
}

fn read_interleaved(
    data: &[(usize, &str)],
    ntax: usize,
    cancel: &CancellationToken,
) -> ParseResult<Vec<Record>> {
    let (first_block, rest) = data.split_at(ntax.min(data.len()));

    let mut records = Vec::with_capacity(ntax);
    for &(line_number, line) in first_block {
        checkpoint(cancel)?;
        let (name, residues) = split_name_and_sequence(line, true);
        let mut seq = Vec::new();
        push_residues(&mut seq, residues, name, line_number)?;
        records.push(Record::from_bytes(name, seq));
    }

    if records.len() < ntax {
        return Ok(records);
    }

    for (i, &(line_number, line)) in rest.iter().enumerate() {
        checkpoint(cancel)?;
        let record = &mut records[i % ntax];
        push_residues(&mut record.residues, line, &record.id, line_number)?;
    }

    Ok(records)
}

/// Writes an alignment as sequential PHYLIP, one line per sequence.
///
/// Names are padded to the strict 10-character field, or to the longest
/// name plus one space when any name does not fit.
pub fn write_phylip(alignment: &Alignment) -> String {
    let width = (alignment.max_id_length() + 1).max(STRICT_NAME_WIDTH);
    let mut out = String::with_capacity(
        alignment.sequence_count() * (width + alignment.alignment_length() + 1) + 16,
    );
    out.push_str(&format!(
        "{} {}\n",
        alignment.sequence_count(),
        alignment.alignment_length()
    ));
    for record in alignment.records() {
        if record.is_empty() {
            out.push_str(&record.id);
        } else {
            out.push_str(&format!("{:<width$}{}", record.id, record.as_str(), width = width));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{parse_str, FileFormat};

    fn parse(content: &str) -> ParseResult<Alignment> {
        parse_str(content, FileFormat::Phylip)
    }

    #[test]
    fn test_parse_sequential_simple() {
        let content = " 3 10
Seq1      ACGTACGTAC
Seq2      TGCATGCATG
Seq3      AAAACCCCGG
";
        let alignment = parse(content).unwrap();
        assert_eq!(alignment.sequence_count(), 3);
        assert_eq!(alignment.get(0).unwrap().id, "Seq1");
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACGTACGTAC");
        assert_eq!(alignment.get(1).unwrap().id, "Seq2");
        assert_eq!(alignment.get(2).unwrap().id, "Seq3");
    }

    #[test]
    fn test_parse_sequential_multiline() {
        let content = " 2 20
Seq1      ACGTACGTAC
GGGGG GGGGG
Seq2      TGCATGCATG
CCCCCCCCCC
";
        let alignment = parse(content).unwrap();
        assert_eq!(alignment.sequence_count(), 2);
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACGTACGTACGGGGGGGGGG");
        assert_eq!(alignment.get(1).unwrap().as_str(), "TGCATGCATGCCCCCCCCCC");
    }

    #[test]
    fn test_parse_interleaved() {
        let content = " 3 20
Seq1      ACGTACGTAC
Seq2      TGCATGCATG
Seq3      AAAACCCCGG

GGGGGGGGGG
CCCCCCCCCC
TTTTTTTTTT
";
        let alignment = parse(content).unwrap();
        assert_eq!(alignment.sequence_count(), 3);
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACGTACGTACGGGGGGGGGG");
        assert_eq!(alignment.get(1).unwrap().as_str(), "TGCATGCATGCCCCCCCCCC");
        assert_eq!(alignment.get(2).unwrap().as_str(), "AAAACCCCGGTTTTTTTTTT");
    }

    #[test]
    fn test_layout_detection() {
        let sequential = [(2, "s1 ACGT"), (3, "AC"), (4, "s2 ACGTAC")];
        assert_eq!(detect_layout(&sequential, 2, 6), Layout::Sequential);

        let interleaved = [(2, "s1 ACG"), (3, "s2 ACG"), (4, "TAC"), (5, "TAC")];
        assert_eq!(detect_layout(&interleaved, 2, 6), Layout::Interleaved);

        // The second name line would complete the first sequence if read as residues
        let letter_names = [(2, "AA ACGT"), (3, "BB ACGT"), (5, "ACGTAC"), (6, "ACGTAC")];
        assert_eq!(detect_layout(&letter_names, 2, 10), Layout::Interleaved);
    }

    #[test]
    fn test_parse_interleaved_with_letter_only_names() {
        let alignment = parse("2 10\nAA ACGT\nBB ACGT\n\nACGTAC\nACGTAC\n").unwrap();
        assert_eq!(alignment.get(0).unwrap().id, "AA");
        assert_eq!(alignment.get(1).unwrap().id, "BB");
        assert_eq!(alignment.get(1).unwrap().as_str(), "ACGTACGTAC");

        let content = " 3 25
Human     ACGTACGTAC
Mouse     ACGTACGTAC
Rat       ACGTACGTAC

GGGGGCCCCCTTTTT
GGGGGCCCCCTTTTT
GGGGGCCCCCTTTTA
";
        let alignment = parse(content).unwrap();
        let ids: Vec<&str> = alignment.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["Human", "Mouse", "Rat"]);
        assert_eq!(alignment.get(2).unwrap().as_str(), "ACGTACGTACGGGGGCCCCCTTTTA");
    }

    #[test]
    fn test_parse_relaxed_names() {
        // Names shorter than 10 chars, using whitespace as delimiter
        let content = "3 10
seq1 ACGTACGTAC
seq2 TGCATGCATG
seq3 AAAACCCCGG
";
        let alignment = parse(content).unwrap();
        assert_eq!(alignment.sequence_count(), 3);
        assert_eq!(alignment.get(0).unwrap().id, "seq1");
    }

    #[test]
    fn test_parse_strict_name_without_space() {
        let content = "2 4\nSequence01ACGT\nSequence02AC-T\n";
        let alignment = parse(content).unwrap();
        assert_eq!(alignment.get(0).unwrap().id, "Sequence01");
        assert_eq!(alignment.get(1).unwrap().as_str(), "AC-T");
    }

    #[test]
    fn test_parse_with_gaps() {
        let content = " 2 10
Seq1      ACGT--GTAC
Seq2      TG..TGCATG
";
        let alignment = parse(content).unwrap();
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACGT--GTAC");
        assert_eq!(alignment.get(1).unwrap().as_str(), "TG..TGCATG");
    }

    #[test]
    fn test_invalid_header() {
        let result = parse("not a valid header\nSeq1 ACGT\n");
        assert!(matches!(result, Err(ParseError::MalformedHeader { line: 1, .. })));

        let result = parse("\ninvalid\nSeq1 ACGT\n");
        assert!(matches!(result, Err(ParseError::MalformedHeader { line: 2, .. })));
    }

    #[test]
    fn test_too_few_sequences() {
        let content = " 3 10
Seq1      ACGTACGTAC
Seq2      TGCATGCATG
";
        assert_eq!(
            parse(content),
            Err(ParseError::HeaderCountMismatch {
                subject: "sequences".to_string(),
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_short_sequence() {
        let content = "3 6\ns1 ACGTAC\ns2 ACGTA\ns3 ACGTAC\n";
        assert_eq!(
            parse(content),
            Err(ParseError::HeaderCountMismatch {
                subject: "columns for sequence 's2'".to_string(),
                expected: 6,
                found: 5
            })
        );
    }

    #[test]
    fn test_zero_sequences() {
        let alignment = parse("0 5\n").unwrap();
        assert_eq!(alignment.sequence_count(), 0);
        assert_eq!(alignment.alignment_length(), 5);

        assert!(matches!(
            parse("0 5\ns1 ACGTA\n"),
            Err(ParseError::HeaderCountMismatch { expected: 0, found: 1, .. })
        ));
    }

    #[test]
    fn test_write_sequential() {
        let alignment = Alignment::new(vec![Record::new("Seq1", "ACGT"), Record::new("Seq2", "TG-A")]).unwrap();
        assert_eq!(write_phylip(&alignment), "2 4\nSeq1      ACGT\nSeq2      TG-A\n");
    }

    #[test]
    fn test_write_long_names() {
        let alignment = Alignment::new(vec![
            Record::new("a_very_long_name", "AC"),
            Record::new("b", "GT"),
        ])
        .unwrap();
        let text = write_phylip(&alignment);
        assert_eq!(text, "2 2\na_very_long_name AC\nb                GT\n");
        assert_eq!(parse(&text).unwrap(), alignment);
    }

    #[test]
    fn test_zero_length_round_trip() {
        let alignment = Alignment::new(vec![
            Record::new("a_very_long_name", ""),
            Record::new("b", ""),
        ])
        .unwrap();
        let text = write_phylip(&alignment);
        assert_eq!(text, "2 0\na_very_long_name\nb\n");
        assert_eq!(parse(&text).unwrap(), alignment);
    }
}

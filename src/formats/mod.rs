//! Multi-format alignment reader and writer.
//!
//! Supports automatic format detection for:
//! - FASTA (.fa, .fasta)
//! - CLUSTAL (.clustal, .clu)
//! - PHYLIP (.phy, .phylip) - sequential and interleaved
//! - Stockholm (.sto, .stockholm)
//!
//! Format detection priority:
//! 1. Explicit format (engine override)
//! 2. File extension
//! 3. Content-based detection
//!
//! `parse` and `serialize` are the single dispatch points over `FileFormat`.

mod blocks;
pub mod clustal;
pub mod fasta;
pub mod phylip;
pub mod stockholm;

use std::ffi::OsStr;
use std::path::Path;

use thiserror::Error;

use crate::cancel::CancellationToken;
use crate::model::{Alignment, GapSymbols};

/// Residues per output line (FASTA) or per block (CLUSTAL, Stockholm).
pub const LINE_WIDTH: usize = 60;

/// Supported alignment formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Fasta,
    Clustal,
    Phylip,
    Stockholm,
}

impl FileFormat {
    /// All formats, in content-sniffing order.
    pub const ALL: [FileFormat; 4] = [
        FileFormat::Fasta,
        FileFormat::Clustal,
        FileFormat::Phylip,
        FileFormat::Stockholm,
    ];

    /// File extensions recognized for this format (lowercase, without dot).
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileFormat::Fasta => &["fa", "fasta"],
            FileFormat::Clustal => &["clustal", "clu"],
            FileFormat::Phylip => &["phy", "phylip"],
            FileFormat::Stockholm => &["sto", "stockholm"],
        }
    }

    /// Gap characters of this format: `.` counts only for Stockholm and PHYLIP.
    pub fn gap_symbols(&self) -> GapSymbols {
        match self {
            FileFormat::Fasta | FileFormat::Clustal => GapSymbols::DASH,
            FileFormat::Phylip | FileFormat::Stockholm => GapSymbols::DASH_AND_DOT,
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Fasta => write!(f, "FASTA"),
            FileFormat::Clustal => write!(f, "CLUSTAL"),
            FileFormat::Phylip => write!(f, "PHYLIP"),
            FileFormat::Stockholm => write!(f, "Stockholm"),
        }
    }
}

/// Errors raised while choosing a parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    #[error("Could not determine the alignment format of '{filename}'.\n\
             Hint: use a .fa/.fasta, .clustal/.clu, .phy/.phylip or .sto/.stockholm extension")]
    Unrecognized { filename: String },
}

impl DetectionError {
    /// Short, stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DetectionError::Unrecognized { .. } => "Unrecognized",
        }
    }
}

/// Errors that can occur while parsing an alignment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Line {line}: malformed header: {message}")]
    MalformedHeader { line: usize, message: String },

    #[error("Sequence '{id}' has length {found}, expected {expected}")]
    RaggedAlignment {
        id: String,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: sequence '{id}' does not appear in the first block")]
    UnknownSequenceId { id: String, line: usize },

    #[error("Header declares {expected} {subject} but found {found}")]
    HeaderCountMismatch {
        subject: String,
        expected: usize,
        found: usize,
    },

    #[error("Missing '//' terminator line")]
    MissingTerminator,

    #[error("Parsing cancelled")]
    Cancelled,

    #[error("Empty input")]
    EmptyInput,

    #[error("Input is not UTF-8 text (invalid byte at offset {offset})")]
    NotText { offset: usize },

    #[error("Line {line}: invalid residue {character:?} in sequence '{id}'")]
    InvalidResidue {
        id: String,
        line: usize,
        character: char,
    },
}

impl ParseError {
    /// Short, stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::MalformedHeader { .. } => "MalformedHeader",
            ParseError::RaggedAlignment { .. } => "RaggedAlignment",
            ParseError::UnknownSequenceId { .. } => "UnknownSequenceId",
            ParseError::HeaderCountMismatch { .. } => "HeaderCountMismatch",
            ParseError::MissingTerminator => "MissingTerminator",
            ParseError::Cancelled => "Cancelled",
            ParseError::EmptyInput => "EmptyInput",
            ParseError::NotText { .. } => "NotText",
            ParseError::InvalidResidue { .. } => "InvalidResidue",
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Detects format from file extension.
pub fn detect_format_from_extension<P: AsRef<Path>>(path: P) -> Option<FileFormat> {
    let ext = path.as_ref().extension().and_then(OsStr::to_str)?.to_lowercase();
    FileFormat::ALL
        .into_iter()
        .find(|format| format.extensions().contains(&ext.as_str()))
}

/// Detects the file format by examining the content.
pub fn detect_format_from_content(content: &str) -> Option<FileFormat> {
    let first = content.lines().map(str::trim).find(|line| !line.is_empty())?;

    // FASTA: starts with > - very clear indicator
    if first.starts_with('>') {
        return Some(FileFormat::Fasta);
    }

    if clustal::is_banner(first) {
        return Some(FileFormat::Clustal);
    }

    // PHYLIP: first line is "ntax nchar" (two integers)
    let parts: Vec<&str> = first.split_whitespace().collect();
    if parts.len() >= 2 && parts[0].parse::<usize>().is_ok() && parts[1].parse::<usize>().is_ok() {
        return Some(FileFormat::Phylip);
    }

    // Stockholm is the fallback, but only for content carrying its banner or terminator
    if stockholm::is_banner(first) || content.lines().any(|line| line.trim() == "//") {
        return Some(FileFormat::Stockholm);
    }

    None
}

/// Chooses a format from the file name, falling back to content sniffing.
pub fn detect(filename: &str, bytes: &[u8]) -> Result<FileFormat, DetectionError> {
    if let Some(format) = detect_format_from_extension(filename) {
        return Ok(format);
    }
    let content = String::from_utf8_lossy(bytes);
    let content = strip_bom(&content);
    detect_format_from_content(content).ok_or_else(|| DetectionError::Unrecognized {
        filename: filename.to_string(),
    })
}

/// Parses raw bytes as the given format.
pub fn parse(bytes: &[u8], format: FileFormat, cancel: &CancellationToken) -> ParseResult<Alignment> {
    let content = std::str::from_utf8(bytes).map_err(|e| ParseError::NotText {
        offset: e.valid_up_to(),
    })?;
    parse_content(strip_bom(content), format, cancel)
}

fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// Parses text as the given format.
pub fn parse_content(
    content: &str,
    format: FileFormat,
    cancel: &CancellationToken,
) -> ParseResult<Alignment> {
    if content.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }
    match format {
        FileFormat::Fasta => fasta::parse_fasta(content, cancel),
        FileFormat::Clustal => clustal::parse_clustal(content, cancel),
        FileFormat::Phylip => phylip::parse_phylip(content, cancel),
        FileFormat::Stockholm => stockholm::parse_stockholm(content, cancel),
    }
}

/// Parses text without a cancellation signal.
pub fn parse_str(content: &str, format: FileFormat) -> ParseResult<Alignment> {
    parse_content(content, format, &CancellationToken::new())
}

/// Renders an alignment in the given format.
pub fn serialize(alignment: &Alignment, format: FileFormat) -> Vec<u8> {
    let text = match format {
        FileFormat::Fasta => fasta::write_fasta(alignment),
        FileFormat::Clustal => clustal::write_clustal(alignment),
        FileFormat::Phylip => phylip::write_phylip(alignment),
        FileFormat::Stockholm => stockholm::write_stockholm(alignment),
    };
    text.into_bytes()
}

/// Fails with `ParseError::Cancelled` once the token fires.
#[inline]
pub(crate) fn checkpoint(cancel: &CancellationToken) -> ParseResult<()> {
    if cancel.is_cancelled() {
        Err(ParseError::Cancelled)
    } else {
        Ok(())
    }
}

/// Appends the non-whitespace characters of `text` to `dst`.
///
/// Residues must be printable ASCII so that one byte is one column.
pub(crate) fn push_residues(dst: &mut Vec<u8>, text: &str, id: &str, line: usize) -> ParseResult<()> {
    // Fast append: most lines are plain ASCII without internal whitespace
    if text.bytes().all(|b| b.is_ascii_graphic()) {
        dst.extend_from_slice(text.as_bytes());
        return Ok(());
    }
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        if !c.is_ascii_graphic() {
            return Err(ParseError::InvalidResidue {
                id: id.to_string(),
                line,
                character: c,
            });
        }
        dst.push(c as u8);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_fasta() {
        let content = ">seq1\nACGT\n";
        assert_eq!(detect_format_from_content(content), Some(FileFormat::Fasta));
    }

    #[test]
    fn test_detect_clustal() {
        let content = "CLUSTAL W (1.83) multiple sequence alignment\n\nseq1 ACGT\n";
        assert_eq!(detect_format_from_content(content), Some(FileFormat::Clustal));
        let content = "MUSCLE (3.8) multiple sequence alignment\n";
        assert_eq!(detect_format_from_content(content), Some(FileFormat::Clustal));
    }

    #[test]
    fn test_detect_phylip() {
        let content = "  3   10\nseq1      ACGTACGTAC\n";
        assert_eq!(detect_format_from_content(content), Some(FileFormat::Phylip));
    }

    #[test]
    fn test_detect_stockholm() {
        let content = "# STOCKHOLM 1.0\nseq1 ACGT\n//\n";
        assert_eq!(detect_format_from_content(content), Some(FileFormat::Stockholm));
        // No banner, but terminated like a Stockholm record
        let content = "seq1 ACGT\nseq2 AC-T\n//\n";
        assert_eq!(detect_format_from_content(content), Some(FileFormat::Stockholm));
    }

    #[test]
    fn test_detect_unknown() {
        let content = "This is not a valid sequence file\n";
        assert_eq!(detect_format_from_content(content), None);
        assert_eq!(detect_format_from_content("  \n\n"), None);
    }

    #[test]
    fn test_detect_with_leading_empty_lines() {
        let content = "\n\n  \n>seq1\nACGT\n";
        assert_eq!(detect_format_from_content(content), Some(FileFormat::Fasta));
    }

    #[test]
    fn test_detect_from_extension() {
        assert_eq!(detect_format_from_extension("test.fa"), Some(FileFormat::Fasta));
        assert_eq!(detect_format_from_extension("test.FASTA"), Some(FileFormat::Fasta));
        assert_eq!(detect_format_from_extension("test.clustal"), Some(FileFormat::Clustal));
        assert_eq!(detect_format_from_extension("test.clu"), Some(FileFormat::Clustal));
        assert_eq!(detect_format_from_extension("test.phy"), Some(FileFormat::Phylip));
        assert_eq!(detect_format_from_extension("test.phylip"), Some(FileFormat::Phylip));
        assert_eq!(detect_format_from_extension("test.sto"), Some(FileFormat::Stockholm));
        assert_eq!(detect_format_from_extension("test.stockholm"), Some(FileFormat::Stockholm));
        assert_eq!(detect_format_from_extension("test.txt"), None);
        assert_eq!(detect_format_from_extension("test"), None);
    }

    #[test]
    fn test_detect_prefers_extension_over_content() {
        // Content looks like FASTA but the extension wins
        assert_eq!(detect("a.sto", b">x\nAC\n"), Ok(FileFormat::Stockholm));
        assert_eq!(detect("a.aln", b">x\nAC\n"), Ok(FileFormat::Fasta));
        assert_eq!(
            detect("notes.txt", b"hello world\n"),
            Err(DetectionError::Unrecognized {
                filename: "notes.txt".to_string()
            })
        );
    }

    #[test]
    fn test_detect_content_after_byte_order_mark() {
        assert_eq!(detect("aln", "\u{feff}>s1\nACGT\n".as_bytes()), Ok(FileFormat::Fasta));
        assert_eq!(
            detect("aln", "\u{feff}CLUSTAL W\n\ns1 ACGT\n".as_bytes()),
            Ok(FileFormat::Clustal)
        );
        assert_eq!(detect("aln", "\u{feff}1 4\ns1 ACGT\n".as_bytes()), Ok(FileFormat::Phylip));
    }

    #[test]
    fn test_gap_symbols_per_format() {
        assert!(!FileFormat::Fasta.gap_symbols().contains(b'.'));
        assert!(!FileFormat::Clustal.gap_symbols().contains(b'.'));
        assert!(FileFormat::Phylip.gap_symbols().contains(b'.'));
        assert!(FileFormat::Stockholm.gap_symbols().contains(b'.'));
        for format in FileFormat::ALL {
            assert!(format.gap_symbols().contains(b'-'), "{format}");
        }
    }

    #[test]
    fn test_parse_rejects_binary() {
        let result = parse(&[b'>', b'a', b'\n', 0xff, 0xfe], FileFormat::Fasta, &CancellationToken::new());
        assert_eq!(result, Err(ParseError::NotText { offset: 3 }));
    }

    #[test]
    fn test_parse_strips_byte_order_mark() {
        let bytes = "\u{feff}>seq1\nACGT\n".as_bytes();
        let alignment = parse(bytes, FileFormat::Fasta, &CancellationToken::new()).unwrap();
        assert_eq!(alignment.get(0).unwrap().id, "seq1");
    }

    #[test]
    fn test_parse_empty_input() {
        for format in FileFormat::ALL {
            assert_eq!(parse_str(" \n\t\n", format), Err(ParseError::EmptyInput));
        }
    }

    #[test]
    fn test_cancelled_parse() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        for format in FileFormat::ALL {
            let result = parse_content(">s\nAC\n", format, &cancel);
            assert_eq!(result, Err(ParseError::Cancelled), "{format}");
        }
    }

    #[test]
    fn test_push_residues_rejects_non_ascii() {
        let mut dst = Vec::new();
        push_residues(&mut dst, "AC GT", "s", 1).unwrap();
        assert_eq!(dst, b"ACGT");
        let result = push_residues(&mut dst, "AÇ", "s", 2);
        assert!(matches!(result, Err(ParseError::InvalidResidue { character: 'Ç', line: 2, .. })));
    }
}

//! Data model for alignments.
//!
//! This module contains the in-memory representation shared by every
//! parser, the trimming stages and the writers:
//! - `Record`: one named row of an alignment
//! - `Alignment`: an ordered, rectangular set of records
//! - `CoreRegion`: the column range kept by flank trimming
//!
//! An `Alignment` can only be built through constructors that check the
//! rectangular invariant, so every stage downstream of parsing may index
//! columns without re-validating row lengths.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::formats::ParseError;

/// The characters counted as aligned gaps.
///
/// `-` is always a gap. `.` is a gap only where the format uses it as one
/// (Stockholm, PHYLIP); elsewhere it is an ordinary residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GapSymbols {
    dot: bool,
}

impl GapSymbols {
    /// `-` only.
    pub const DASH: GapSymbols = GapSymbols { dot: false };
    /// `-` and `.`.
    pub const DASH_AND_DOT: GapSymbols = GapSymbols { dot: true };

    #[inline]
    pub fn contains(&self, residue: u8) -> bool {
        residue == b'-' || (self.dot && residue == b'.')
    }
}

/// A single alignment row: its display name and its residues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The sequence identifier (may contain spaces for FASTA headers)
    pub id: String,
    /// Residue and gap characters, one byte per column
    pub residues: Vec<u8>,
}

impl Record {
    /// Creates a new record from text.
    pub fn new(id: impl Into<String>, residues: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            residues: residues.into().into_bytes(),
        }
    }

    /// Creates a record from already-collected residue bytes.
    pub fn from_bytes(id: impl Into<String>, residues: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            residues,
        }
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Returns the residues as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.residues
    }

    /// Returns the residues as text.
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.residues)
    }
}

/// An ordered set of records that all have the same length.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Alignment {
    records: Vec<Record>,
    length: usize,
}

impl Alignment {
    /// Builds an alignment whose length is taken from the first record.
    ///
    /// Fails with `ParseError::RaggedAlignment` naming the first record whose
    /// length differs.
    pub fn new(records: Vec<Record>) -> Result<Self, ParseError> {
        let length = records.first().map_or(0, Record::len);
        Self::with_length(records, length)
    }

    /// Builds an alignment with an explicitly declared column count.
    ///
    /// The declared length matters when there are no records (PHYLIP
    /// `0 N` headers); otherwise every record must match it.
    pub fn with_length(records: Vec<Record>, length: usize) -> Result<Self, ParseError> {
        if let Some(bad) = records.iter().find(|r| r.len() != length) {
            return Err(ParseError::RaggedAlignment {
                id: bad.id.clone(),
                expected: length,
                found: bad.len(),
            });
        }
        Ok(Self { records, length })
    }

    /// Returns the records in declared order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the number of sequences.
    pub fn sequence_count(&self) -> usize {
        self.records.len()
    }

    /// Returns the number of columns.
    pub fn alignment_length(&self) -> usize {
        self.length
    }

    /// Returns the maximum identifier length (for padded layouts).
    pub fn max_id_length(&self) -> usize {
        self.records.iter().map(|r| r.id.len()).max().unwrap_or(0)
    }

    /// Gets a record by index.
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Returns true if there are no records or no columns.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() || self.length == 0
    }

    /// Returns a new alignment holding only the given columns, in the given order.
    ///
    /// Indices must be strictly increasing and below `alignment_length()`.
    pub fn select_columns(&self, columns: &[usize]) -> Alignment {
        debug_assert!(columns.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(columns.last().map_or(true, |&c| c < self.length));

        let records = self
            .records
            .iter()
            .map(|r| {
                let residues = columns.iter().map(|&c| r.residues[c]).collect();
                Record::from_bytes(r.id.clone(), residues)
            })
            .collect();
        Alignment {
            records,
            length: columns.len(),
        }
    }

    /// Returns a new alignment restricted to a contiguous column range.
    pub fn slice_columns(&self, range: Range<usize>) -> Alignment {
        let start = range.start.min(self.length);
        let end = range.end.clamp(start, self.length);
        let records = self
            .records
            .iter()
            .map(|r| Record::from_bytes(r.id.clone(), r.residues[start..end].to_vec()))
            .collect();
        Alignment {
            records,
            length: end - start,
        }
    }
}

/// Half-open column range `[start, end)` left after flank trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CoreRegion {
    pub start: usize,
    pub end: usize,
}

impl CoreRegion {
    /// Creates a region; an inverted range collapses to `[0, 0)`.
    pub fn new(start: usize, end: usize) -> Self {
        if start >= end {
            Self::empty()
        } else {
            Self { start, end }
        }
    }

    /// The region covering every column of an alignment of `length` columns.
    pub fn full(length: usize) -> Self {
        Self::new(0, length)
    }

    /// The empty region `[0, 0)`.
    pub fn empty() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for CoreRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

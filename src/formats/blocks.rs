//! Id-keyed block accumulation shared by the CLUSTAL and Stockholm readers.
//!
//! Both formats spread each sequence over repeated blocks of
//! `<id> <chunk>` lines. The first block fixes the set and order of ids;
//! later blocks append to the record with the same id.
//!
//! A block ends at a blank line, or when an id already present in the
//! current block shows up again (files written without blank separators).

use std::collections::{HashMap, HashSet};

use super::{push_residues, ParseError, ParseResult};
use crate::model::{Alignment, Record};

#[derive(Debug, Default)]
pub(crate) struct BlockAccumulator {
    records: Vec<Record>,
    index: HashMap<String, usize>,
    current_block: HashSet<usize>,
    first_block_closed: bool,
}

impl BlockAccumulator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Closes the current block, if it holds any line.
    pub(crate) fn end_block(&mut self) {
        if !self.current_block.is_empty() {
            self.first_block_closed = true;
            self.current_block.clear();
        }
    }

    /// Appends the chunks of one `<id> <chunk>...` line.
    pub(crate) fn push(&mut self, id: &str, chunks: &[&str], line: usize) -> ParseResult<()> {
        let slot = match self.index.get(id) {
            Some(&slot) => {
                if self.current_block.contains(&slot) {
                    self.end_block();
                }
                slot
            }
            None if self.first_block_closed => {
                return Err(ParseError::UnknownSequenceId {
                    id: id.to_string(),
                    line,
                });
            }
            None => {
                self.records.push(Record::from_bytes(id, Vec::new()));
                self.index.insert(id.to_string(), self.records.len() - 1);
                self.records.len() - 1
            }
        };

        let record = &mut self.records[slot];
        for chunk in chunks {
            push_residues(&mut record.residues, chunk, &record.id, line)?;
        }
        self.current_block.insert(slot);
        Ok(())
    }

    /// Returns the collected records as an alignment, checking row lengths.
    pub(crate) fn finish(self) -> ParseResult<Alignment> {
        Alignment::new(self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_concatenate_in_order() {
        let mut blocks = BlockAccumulator::new();
        blocks.push("a", &["AC"], 1).unwrap();
        blocks.push("b", &["GT"], 2).unwrap();
        blocks.end_block();
        blocks.push("b", &["TT"], 4).unwrap();
        blocks.push("a", &["CC"], 5).unwrap();

        let alignment = blocks.finish().unwrap();
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACCC");
        assert_eq!(alignment.get(1).unwrap().as_str(), "GTTT");
    }

    #[test]
    fn test_repeated_id_starts_new_block() {
        let mut blocks = BlockAccumulator::new();
        blocks.push("a", &["AC"], 1).unwrap();
        blocks.push("b", &["GT"], 2).unwrap();
        blocks.push("a", &["AA"], 3).unwrap();
        let result = blocks.push("c", &["GG"], 4);
        assert_eq!(
            result,
            Err(ParseError::UnknownSequenceId {
                id: "c".to_string(),
                line: 4
            })
        );
    }

    #[test]
    fn test_leading_blank_lines_do_not_close_first_block() {
        let mut blocks = BlockAccumulator::new();
        blocks.end_block();
        blocks.push("a", &["AC"], 2).unwrap();
        blocks.end_block();
        blocks.end_block();
        blocks.push("a", &["GT"], 5).unwrap();
        assert_eq!(blocks.finish().unwrap().get(0).unwrap().as_str(), "ACGT");
    }
}

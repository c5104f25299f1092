//! Per-column gap statistics.

use serde::Serialize;

use crate::model::{Alignment, GapSymbols};

/// Gap count and proportion for one alignment column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStats {
    pub index: usize,
    pub gap_count: usize,
    /// `gap_count / sequence_count`, or 1.0 when there are no sequences
    pub gap_proportion: f64,
}

impl ColumnStats {
    /// Returns true if every sequence has a gap in this column.
    pub fn is_full_gap(&self) -> bool {
        self.gap_proportion >= 1.0
    }
}

/// Computes one `ColumnStats` per column, in column order.
///
/// Only characters in `gaps` are counted; case plays no role.
pub fn compute_stats(alignment: &Alignment, gaps: GapSymbols) -> Vec<ColumnStats> {
    let mut counts = vec![0usize; alignment.alignment_length()];

    // Row-major walk: each record's residues are contiguous
    for record in alignment.records() {
        for (count, &residue) in counts.iter_mut().zip(record.as_bytes()) {
            if gaps.contains(residue) {
                *count += 1;
            }
        }
    }

    let rows = alignment.sequence_count();
    counts
        .into_iter()
        .enumerate()
        .map(|(index, gap_count)| ColumnStats {
            index,
            gap_count,
            gap_proportion: if rows == 0 {
                1.0
            } else {
                gap_count as f64 / rows as f64
            },
        })
        .collect()
}

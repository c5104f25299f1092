//! Column filtering and flank trimming.
//!
//! Filtering drops individual columns anywhere in the alignment; flank
//! trimming then cuts a single contiguous range from each edge, using gap
//! proportions recomputed on the filtered alignment.

use tracing::debug;

use crate::config::TrimOptions;
use crate::model::{Alignment, CoreRegion, GapSymbols};
use crate::stats::{compute_stats, ColumnStats};

/// Returns true if a column passes both filtering rules.
pub fn keeps_column(stats: &ColumnStats, options: &TrimOptions) -> bool {
    let not_full_gap = !options.remove_full_gap_columns || !stats.is_full_gap();
    not_full_gap && stats.gap_proportion <= options.gap_threshold
}

/// Removes columns that fail the full-gap or gap-threshold rule.
///
/// `stats` must have been computed on `alignment`. Kept columns stay in
/// their original order; the result may have no columns.
pub fn filter_columns(alignment: &Alignment, stats: &[ColumnStats], options: &TrimOptions) -> Alignment {
    debug_assert_eq!(stats.len(), alignment.alignment_length());

    let keep: Vec<usize> = stats
        .iter()
        .filter(|s| keeps_column(s, options))
        .map(|s| s.index)
        .collect();

    debug!(
        kept = keep.len(),
        dropped = stats.len() - keep.len(),
        "filtered gap columns"
    );
    alignment.select_columns(&keep)
}

/// Finds the core region: the first and last columns at or below `flank_threshold`.
///
/// Returns `[0, 0)` when no column qualifies.
pub fn find_core_region(stats: &[ColumnStats], flank_threshold: f64) -> CoreRegion {
    let qualifies = |s: &ColumnStats| s.gap_proportion <= flank_threshold;
    let start = stats.iter().position(qualifies).unwrap_or(stats.len());
    let end = stats.iter().rposition(qualifies).map_or(0, |i| i + 1);
    CoreRegion::new(start, end)
}

/// Trims high-gap columns inward from both edges.
///
/// Interior columns are never inspected beyond the first qualifying column
/// from each side; a single pass is made.
pub fn trim_flanks(alignment: &Alignment, options: &TrimOptions, gaps: GapSymbols) -> (Alignment, CoreRegion) {
    let stats = compute_stats(alignment, gaps);
    let region = find_core_region(&stats, options.flank_threshold);
    debug!(%region, columns = alignment.alignment_length(), "trimmed flanks");
    (alignment.slice_columns(region.range()), region)
}

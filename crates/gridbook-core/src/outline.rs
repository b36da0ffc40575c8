//! Row grouping and outline state
//!
//! Group spans are the source of truth. Per-row outline state (level,
//! collapsed, hidden) is recomputed from the span list by a pure function
//! instead of being mutated incrementally: collapse propagation is
//! order-sensitive, and a single deterministic evaluation order is much
//! easier to hold correct than flag surgery.

use std::collections::BTreeMap;

/// Deepest outline level the file format allows.
pub const MAX_OUTLINE_LEVEL: u8 = 7;

/// One row group: the rows `start..=end` sit one level deeper than the
/// surrounding outline. The summary row adjacent to the span (below when
/// `sums_below`, above otherwise) is not part of the span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSpan {
    pub start: u32,
    pub end: u32,
    pub collapsed: bool,
}

impl GroupSpan {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
            collapsed: false,
        }
    }

    pub fn contains(&self, row: u32) -> bool {
        row >= self.start && row <= self.end
    }

    /// The summary row for this span under the given direction.
    pub fn summary_row(&self, sums_below: bool) -> Option<u32> {
        if sums_below {
            Some(self.end + 1)
        } else {
            self.start.checked_sub(1)
        }
    }
}

/// Outline state of a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowOutline {
    /// Number of groups enclosing the row (capped at [`MAX_OUTLINE_LEVEL`])
    pub level: u8,
    /// Set on a summary row whose group is collapsed
    pub collapsed: bool,
    /// Whether the row is hidden by any enclosing collapsed group
    pub hidden: bool,
}

/// Recompute every row's outline state from the span list.
///
/// - a row's level is the count of spans containing it;
/// - a row is hidden iff ANY containing span is collapsed — expanding an
///   inner group cannot reveal rows an outer collapsed group still hides;
/// - each span stamps its summary row's `collapsed` flag with its own
///   state. Spans are evaluated outermost-first (wider spans first), so
///   when summary rows coincide the innermost span wins.
pub fn recompute_row_outlines(spans: &[GroupSpan], sums_below: bool) -> BTreeMap<u32, RowOutline> {
    let mut out: BTreeMap<u32, RowOutline> = BTreeMap::new();

    for span in spans {
        for row in span.start..=span.end {
            let entry = out.entry(row).or_default();
            entry.level = (entry.level + 1).min(MAX_OUTLINE_LEVEL);
            entry.hidden |= span.collapsed;
        }
    }

    let mut ordered: Vec<&GroupSpan> = spans.iter().collect();
    ordered.sort_by_key(|s| std::cmp::Reverse(s.end - s.start));
    for span in ordered {
        if let Some(summary) = span.summary_row(sums_below) {
            out.entry(summary).or_default().collapsed = span.collapsed;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline(map: &BTreeMap<u32, RowOutline>, row: u32) -> RowOutline {
        map.get(&row).copied().unwrap_or_default()
    }

    #[test]
    fn single_collapsed_group() {
        let spans = [GroupSpan {
            start: 7,
            end: 9,
            collapsed: true,
        }];
        let map = recompute_row_outlines(&spans, true);

        for row in 7..=9 {
            let o = outline(&map, row);
            assert_eq!(o.level, 1);
            assert!(o.hidden, "row {row} should be hidden");
        }
        // Summary row: collapsed flag set, not hidden
        let summary = outline(&map, 10);
        assert!(summary.collapsed);
        assert!(!summary.hidden);
        assert_eq!(summary.level, 0);
    }

    #[test]
    fn nested_levels_count_enclosing_groups() {
        let spans = [GroupSpan::new(0, 9), GroupSpan::new(2, 5), GroupSpan::new(3, 4)];
        let map = recompute_row_outlines(&spans, true);
        assert_eq!(outline(&map, 0).level, 1);
        assert_eq!(outline(&map, 2).level, 2);
        assert_eq!(outline(&map, 3).level, 3);
        assert_eq!(outline(&map, 6).level, 1);
    }

    #[test]
    fn expanding_inner_keeps_outer_hidden_rows() {
        // Outer 0..=9 collapsed, inner 2..=5 expanded: every row of the
        // outer span stays hidden, including the inner span's rows.
        let spans = [
            GroupSpan {
                start: 0,
                end: 9,
                collapsed: true,
            },
            GroupSpan {
                start: 2,
                end: 5,
                collapsed: false,
            },
        ];
        let map = recompute_row_outlines(&spans, true);
        for row in 0..=9 {
            assert!(outline(&map, row).hidden, "row {row}");
        }
        // Inner summary row (6) is inside the outer span: hidden, and its
        // collapsed flag reflects the inner (expanded) group.
        assert!(outline(&map, 6).hidden);
        assert!(!outline(&map, 6).collapsed);
        // Outer summary row is visible and flagged
        assert!(outline(&map, 10).collapsed);
        assert!(!outline(&map, 10).hidden);
    }

    #[test]
    fn coinciding_summary_rows_innermost_wins() {
        // Both groups end at row 9, so both summaries land on row 10. The
        // inner span is evaluated last; its state wins.
        let spans = [
            GroupSpan {
                start: 0,
                end: 9,
                collapsed: true,
            },
            GroupSpan {
                start: 5,
                end: 9,
                collapsed: false,
            },
        ];
        let map = recompute_row_outlines(&spans, true);
        assert!(!outline(&map, 10).collapsed);

        // Flip which one is collapsed: still the inner span's value.
        let spans = [
            GroupSpan {
                start: 0,
                end: 9,
                collapsed: false,
            },
            GroupSpan {
                start: 5,
                end: 9,
                collapsed: true,
            },
        ];
        let map = recompute_row_outlines(&spans, true);
        assert!(outline(&map, 10).collapsed);
    }

    #[test]
    fn sums_above_puts_summary_before_span() {
        let spans = [GroupSpan {
            start: 3,
            end: 5,
            collapsed: true,
        }];
        let map = recompute_row_outlines(&spans, false);
        assert!(outline(&map, 2).collapsed);
        assert!(!outline(&map, 2).hidden);
        assert!(outline(&map, 3).hidden);

        // A span starting at row 0 has no summary row above it
        let spans = [GroupSpan {
            start: 0,
            end: 2,
            collapsed: true,
        }];
        let map = recompute_row_outlines(&spans, false);
        assert!(!outline(&map, 0).collapsed);
    }

    #[test]
    fn level_caps_at_seven() {
        let spans: Vec<GroupSpan> = (0..10).map(|i| GroupSpan::new(i, 20)).collect();
        let map = recompute_row_outlines(&spans, true);
        assert_eq!(outline(&map, 15).level, MAX_OUTLINE_LEVEL);
    }
}

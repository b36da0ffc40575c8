//! Column records
//!
//! Columns have no cell storage of their own; a `ColumnRecord` covers a
//! contiguous index range and carries width, style, visibility and outline
//! state for it. Records never overlap. An operation touching part of an
//! existing record splits it, and every fragment keeps the full set of
//! inherited properties — a column that had an explicit width before being
//! grouped still has it afterwards.

use crate::outline::MAX_OUTLINE_LEVEL;

/// Properties for a contiguous run of columns `first..=last`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRecord {
    pub first: u16,
    pub last: u16,
    /// Width in character units; `None` for the sheet default
    pub width: Option<f64>,
    /// Style index applied to the whole columns, `None` for default
    pub style: Option<u32>,
    pub hidden: bool,
    pub outline_level: u8,
    pub collapsed: bool,
}

impl ColumnRecord {
    fn span(first: u16, last: u16) -> Self {
        Self {
            first,
            last,
            width: None,
            style: None,
            hidden: false,
            outline_level: 0,
            collapsed: false,
        }
    }

    /// True when the record carries nothing beyond the defaults and can be
    /// dropped from the list.
    fn is_default(&self) -> bool {
        self.width.is_none()
            && self.style.is_none()
            && !self.hidden
            && self.outline_level == 0
            && !self.collapsed
    }

    fn with_span(&self, first: u16, last: u16) -> Self {
        let mut copy = self.clone();
        copy.first = first;
        copy.last = last;
        copy
    }
}

/// Ordered, non-overlapping column records for one worksheet.
#[derive(Debug, Clone, Default)]
pub struct ColumnRecords {
    records: Vec<ColumnRecord>,
}

impl ColumnRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// The record covering `col`, if one exists.
    pub fn get(&self, col: u16) -> Option<&ColumnRecord> {
        self.records
            .iter()
            .find(|r| col >= r.first && col <= r.last)
    }

    /// Iterate records in column order.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnRecord> {
        self.records.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn set_width(&mut self, first: u16, last: u16, width: Option<f64>) {
        self.apply(first, last, |r| r.width = width);
    }

    pub fn set_style(&mut self, first: u16, last: u16, style: Option<u32>) {
        self.apply(first, last, |r| r.style = style);
    }

    pub fn set_hidden(&mut self, first: u16, last: u16, hidden: bool) {
        self.apply(first, last, |r| r.hidden = hidden);
    }

    /// Deepen the outline level of `first..=last` by one.
    pub fn group(&mut self, first: u16, last: u16) {
        self.apply(first, last, |r| {
            r.outline_level = (r.outline_level + 1).min(MAX_OUTLINE_LEVEL);
        });
    }

    /// Shallow the outline level of `first..=last` by one; records that
    /// reach level zero lose their collapsed flag.
    pub fn ungroup(&mut self, first: u16, last: u16) {
        self.apply(first, last, |r| {
            r.outline_level = r.outline_level.saturating_sub(1);
            if r.outline_level == 0 {
                r.collapsed = false;
            }
        });
    }

    /// Collapse or expand the grouped columns in `first..=last`: grouped
    /// columns are hidden, and the column after the range carries the
    /// collapsed marker.
    pub fn set_collapsed(&mut self, first: u16, last: u16, collapsed: bool) {
        self.apply(first, last, |r| {
            if r.outline_level > 0 {
                r.hidden = collapsed;
            }
        });
        if let Some(marker) = last.checked_add(1) {
            self.apply(marker, marker, |r| r.collapsed = collapsed);
        }
    }

    /// Replace the raw record list. Used by the reader; ranges are assumed
    /// ordered and disjoint as the part declares them.
    pub fn set_records(&mut self, records: Vec<ColumnRecord>) {
        self.records = records;
    }

    /// Apply `f` to every column in `first..=last`, splitting overlapping
    /// records so columns outside the range are untouched.
    fn apply<F: Fn(&mut ColumnRecord)>(&mut self, first: u16, last: u16, f: F) {
        let (first, last) = (first.min(last), first.max(last));
        let mut next: Vec<ColumnRecord> = Vec::with_capacity(self.records.len() + 2);
        let mut cursor = first;
        let mut done = false;

        for rec in self.records.drain(..) {
            if rec.last < first || rec.first > last {
                if rec.first > last && !done {
                    // Fill the remaining gap before this record
                    if cursor <= last {
                        let mut fresh = ColumnRecord::span(cursor, last);
                        f(&mut fresh);
                        if !fresh.is_default() {
                            next.push(fresh);
                        }
                    }
                    done = true;
                }
                next.push(rec);
                continue;
            }

            // Gap between the cursor and this record, inside the range
            if cursor < rec.first {
                let mut fresh = ColumnRecord::span(cursor, rec.first - 1);
                f(&mut fresh);
                if !fresh.is_default() {
                    next.push(fresh);
                }
            }

            // Prefix outside the range keeps the record's properties
            if rec.first < first {
                next.push(rec.with_span(rec.first, first - 1));
            }

            // Overlap gets the mutation, inheriting everything else
            let ov_first = rec.first.max(first);
            let ov_last = rec.last.min(last);
            let mut overlap = rec.with_span(ov_first, ov_last);
            f(&mut overlap);
            if !overlap.is_default() {
                next.push(overlap);
            }

            // Suffix outside the range keeps the record's properties
            if rec.last > last {
                next.push(rec.with_span(last + 1, rec.last));
            }

            cursor = ov_last.saturating_add(1);
            if rec.last >= last {
                done = true;
            }
        }

        if !done && cursor <= last {
            let mut fresh = ColumnRecord::span(cursor, last);
            f(&mut fresh);
            if !fresh.is_default() {
                next.push(fresh);
            }
        }

        next.sort_by_key(|r| r.first);
        self.records = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_applies_to_fresh_records() {
        let mut cols = ColumnRecords::new();
        cols.set_width(2, 4, Some(18.0));
        assert_eq!(cols.get(1), None);
        assert_eq!(cols.get(3).unwrap().width, Some(18.0));
        assert_eq!(cols.get(5), None);
    }

    #[test]
    fn grouping_splits_styled_records_preserving_width() {
        let mut cols = ColumnRecords::new();
        cols.set_width(0, 9, Some(25.0));
        cols.group(3, 5);

        // Three fragments, all still carrying the explicit width
        let spans: Vec<(u16, u16, u8)> = cols
            .iter()
            .map(|r| (r.first, r.last, r.outline_level))
            .collect();
        assert_eq!(spans, [(0, 2, 0), (3, 5, 1), (6, 9, 0)]);
        for rec in cols.iter() {
            assert_eq!(rec.width, Some(25.0));
        }
    }

    #[test]
    fn grouping_across_record_boundaries_fills_gaps() {
        let mut cols = ColumnRecords::new();
        cols.set_width(0, 1, Some(10.0));
        cols.set_width(6, 8, Some(12.0));
        cols.group(1, 7);

        assert_eq!(cols.get(0).unwrap().outline_level, 0);
        assert_eq!(cols.get(1).unwrap().outline_level, 1);
        assert_eq!(cols.get(1).unwrap().width, Some(10.0));
        // Gap columns get level-1 records with no width
        let gap = cols.get(4).unwrap();
        assert_eq!(gap.outline_level, 1);
        assert_eq!(gap.width, None);
        assert_eq!(cols.get(7).unwrap().width, Some(12.0));
        assert_eq!(cols.get(8).unwrap().outline_level, 0);
    }

    #[test]
    fn collapse_hides_grouped_columns_and_marks_the_next() {
        let mut cols = ColumnRecords::new();
        cols.group(2, 4);
        cols.set_collapsed(2, 4, true);

        for col in 2..=4 {
            assert!(cols.get(col).unwrap().hidden, "col {col}");
        }
        assert!(cols.get(5).unwrap().collapsed);

        cols.set_collapsed(2, 4, false);
        for col in 2..=4 {
            assert!(!cols.get(col).unwrap().hidden, "col {col}");
        }
        assert!(!cols
            .get(5)
            .map(|r| r.collapsed)
            .unwrap_or(false));
    }

    #[test]
    fn ungroup_to_zero_clears_collapsed_and_drops_default_records() {
        let mut cols = ColumnRecords::new();
        cols.group(1, 3);
        cols.set_collapsed(1, 3, true);
        cols.set_collapsed(1, 3, false);
        cols.ungroup(1, 3);
        // Level fell to zero and nothing else distinguishes the records
        assert_eq!(cols.get(2), None);
    }

    #[test]
    fn records_stay_ordered_and_disjoint() {
        let mut cols = ColumnRecords::new();
        cols.set_width(5, 9, Some(8.0));
        cols.set_width(0, 6, Some(9.0));
        cols.set_hidden(3, 12, true);

        let mut prev_last: Option<u16> = None;
        for rec in cols.iter() {
            if let Some(p) = prev_last {
                assert!(rec.first > p, "overlap at {}", rec.first);
            }
            assert!(rec.first <= rec.last);
            prev_last = Some(rec.last);
        }
        // Later width set wins on the overlap
        assert_eq!(cols.get(5).unwrap().width, Some(9.0));
        assert_eq!(cols.get(8).unwrap().width, Some(8.0));
        assert!(cols.get(10).unwrap().hidden);
    }
}

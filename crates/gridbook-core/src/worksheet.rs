//! Worksheet type

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::addr::{CellAddress, CellRange};
use crate::cell::Cell;
use crate::column::{ColumnRecord, ColumnRecords};
use crate::comment::Comment;
use crate::drawing::Drawing;
use crate::error::{Error, Result};
use crate::hyperlink::Hyperlink;
use crate::outline::{recompute_row_outlines, GroupSpan, RowOutline};
use crate::pivot::{PivotSource, PivotTable};
use crate::row::Row;
use crate::table::Table;
use crate::validation::DataValidation;
use crate::value::CellValue;
use crate::{MAX_COLS, MAX_ROWS};

/// A single sheet in a workbook.
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    rows: BTreeMap<u32, Row>,
    /// Indexed access must stay O(1); a timing-bounded consumer iterates
    /// tens of thousands of regions by index
    merged_regions: Vec<CellRange>,
    row_groups: Vec<GroupSpan>,
    row_outlines: BTreeMap<u32, RowOutline>,
    row_sums_below: bool,
    columns: ColumnRecords,
    drawing: Option<Drawing>,
    comments: AHashMap<(u32, u16), Comment>,
    hyperlinks: Vec<Hyperlink>,
    tables: Vec<Table>,
    pivot_tables: Vec<PivotTable>,
    data_validations: Vec<DataValidation>,
    visible: bool,
    selected: bool,
}

impl Worksheet {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            merged_regions: Vec::new(),
            row_groups: Vec::new(),
            row_outlines: BTreeMap::new(),
            row_sums_below: true,
            columns: ColumnRecords::new(),
            drawing: None,
            comments: AHashMap::new(),
            hyperlinks: Vec::new(),
            tables: Vec::new(),
            pivot_tables: Vec::new(),
            data_validations: Vec::new(),
            visible: true,
            selected: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    // === Rows and cells ===

    /// Create a blank row at `index`, replacing any existing row there.
    pub fn create_row(&mut self, index: u32) -> Result<&mut Row> {
        validate_position(index, 0)?;
        self.rows.insert(index, Row::new());
        Ok(self.rows.get_mut(&index).expect("just inserted"))
    }

    /// The row at `index`, creating it if absent.
    pub fn row_or_create(&mut self, index: u32) -> Result<&mut Row> {
        validate_position(index, 0)?;
        Ok(self.rows.entry(index).or_default())
    }

    pub fn row(&self, index: u32) -> Option<&Row> {
        self.rows.get(&index)
    }

    pub fn row_mut(&mut self, index: u32) -> Option<&mut Row> {
        self.rows.get_mut(&index)
    }

    pub fn remove_row(&mut self, index: u32) -> Option<Row> {
        self.rows.remove(&index)
    }

    /// Iterate (row index, row) in ascending order.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.rows.iter().map(|(&i, r)| (i, r))
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = (u32, &mut Row)> {
        self.rows.iter_mut().map(|(&i, r)| (i, r))
    }

    pub fn first_row_index(&self) -> Option<u32> {
        self.rows.keys().next().copied()
    }

    pub fn last_row_index(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    pub fn physical_row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell_at(&self, row: u32, col: u16) -> Option<&Cell> {
        self.rows.get(&row).and_then(|r| r.cell(col))
    }

    pub fn cell_at_mut(&mut self, row: u32, col: u16) -> Option<&mut Cell> {
        self.rows.get_mut(&row).and_then(|r| r.cell_mut(col))
    }

    /// The cell at (row, col), creating row and cell as needed.
    pub fn cell_or_create(&mut self, row: u32, col: u16) -> Result<&mut Cell> {
        validate_position(row, col)?;
        Ok(self.rows.entry(row).or_default().cell_or_create(col))
    }

    /// Set a value by address string, e.g. `"B3"`.
    pub fn set_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_value_at(addr.row, addr.col, value)
    }

    pub fn set_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) -> Result<()> {
        self.cell_or_create(row, col)?.set_value(value);
        Ok(())
    }

    pub fn set_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.cell_or_create(addr.row, addr.col)?
            .set_formula(Some(formula));
        Ok(())
    }

    /// Value at an address, blank for missing cells.
    pub fn value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self
            .cell_at(addr.row, addr.col)
            .map(|c| c.value().clone())
            .unwrap_or(CellValue::Blank))
    }

    /// Canonical reference for a grid position, independent of anything a
    /// part file stored. `cell_reference(0, 0) == "A1"`.
    pub fn cell_reference(row: u32, col: u16) -> String {
        CellAddress::new(row, col).to_string()
    }

    // === Merged regions ===

    /// Add a merged region, rejecting overlap with any existing region.
    /// Returns the region's index.
    pub fn add_merged_region(&mut self, range: CellRange) -> Result<usize> {
        validate_position(range.last.row, range.last.col)?;
        if let Some(existing) = self.merged_regions.iter().find(|r| r.overlaps(&range)) {
            return Err(Error::MergedRegionOverlap(format!(
                "{range} overlaps existing region {existing}"
            )));
        }
        self.merged_regions.push(range);
        Ok(self.merged_regions.len() - 1)
    }

    /// The merged region at `index`. O(1).
    pub fn merged_region(&self, index: usize) -> Option<&CellRange> {
        self.merged_regions.get(index)
    }

    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    pub fn merged_region_count(&self) -> usize {
        self.merged_regions.len()
    }

    pub fn remove_merged_region(&mut self, index: usize) -> Option<CellRange> {
        (index < self.merged_regions.len()).then(|| self.merged_regions.remove(index))
    }

    // === Row grouping ===

    pub fn row_sums_below(&self) -> bool {
        self.row_sums_below
    }

    pub fn set_row_sums_below(&mut self, sums_below: bool) {
        self.row_sums_below = sums_below;
        self.refresh_row_outlines();
    }

    /// Group rows `from..=to` one level deeper.
    pub fn group_rows(&mut self, from: u32, to: u32) -> Result<()> {
        validate_position(from.max(to), 0)?;
        self.row_groups.push(GroupSpan::new(from, to));
        self.refresh_row_outlines();
        Ok(())
    }

    /// Remove the innermost group exactly matching `from..=to`.
    pub fn ungroup_rows(&mut self, from: u32, to: u32) -> Result<()> {
        let (from, to) = (from.min(to), from.max(to));
        let pos = self
            .row_groups
            .iter()
            .rposition(|s| s.start == from && s.end == to)
            .ok_or_else(|| {
                Error::MissingData(format!("no row group spans rows {from}..={to}"))
            })?;
        self.row_groups.remove(pos);
        self.refresh_row_outlines();
        Ok(())
    }

    /// Collapse or expand the innermost group containing `anchor_row`.
    /// A row with no enclosing group is left untouched.
    pub fn set_row_group_collapsed(&mut self, anchor_row: u32, collapse: bool) {
        let innermost = self
            .row_groups
            .iter_mut()
            .filter(|s| s.contains(anchor_row))
            .min_by_key(|s| s.end - s.start);
        if let Some(span) = innermost {
            span.collapsed = collapse;
            self.refresh_row_outlines();
        }
    }

    /// Outline state of a row; ungrouped rows report the default.
    pub fn row_outline(&self, row: u32) -> RowOutline {
        self.row_outlines.get(&row).copied().unwrap_or_default()
    }

    /// Whether the row is hidden, either explicitly or by a collapsed
    /// enclosing group.
    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.row_outline(row).hidden
            || self.rows.get(&row).map(Row::is_hidden).unwrap_or(false)
    }

    pub fn row_groups(&self) -> &[GroupSpan] {
        &self.row_groups
    }

    /// Restore group spans read from a part file.
    pub fn set_row_groups(&mut self, groups: Vec<GroupSpan>) {
        self.row_groups = groups;
        self.refresh_row_outlines();
    }

    fn refresh_row_outlines(&mut self) {
        self.row_outlines = recompute_row_outlines(&self.row_groups, self.row_sums_below);
    }

    // === Columns ===

    pub fn columns(&self) -> &ColumnRecords {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut ColumnRecords {
        &mut self.columns
    }

    pub fn set_column_width(&mut self, from: u16, to: u16, width: f64) -> Result<()> {
        validate_position(0, from.max(to))?;
        self.columns.set_width(from, to, Some(width));
        Ok(())
    }

    pub fn column_width(&self, col: u16) -> Option<f64> {
        self.columns.get(col).and_then(|r| r.width)
    }

    pub fn set_column_hidden(&mut self, from: u16, to: u16, hidden: bool) -> Result<()> {
        validate_position(0, from.max(to))?;
        self.columns.set_hidden(from, to, hidden);
        Ok(())
    }

    pub fn group_columns(&mut self, from: u16, to: u16) -> Result<()> {
        validate_position(0, from.max(to))?;
        self.columns.group(from, to);
        Ok(())
    }

    pub fn ungroup_columns(&mut self, from: u16, to: u16) -> Result<()> {
        validate_position(0, from.max(to))?;
        self.columns.ungroup(from, to);
        Ok(())
    }

    /// Collapse or expand the grouped run of columns around `col`.
    pub fn set_column_group_collapsed(&mut self, col: u16, collapse: bool) {
        let Some(record) = self.columns.get(col) else {
            return;
        };
        if record.outline_level == 0 {
            return;
        }
        // Extend to the maximal contiguous grouped run around the column
        let mut first = record.first;
        let mut last = record.last;
        while let Some(prev) = first.checked_sub(1).and_then(|c| self.columns.get(c)) {
            if prev.outline_level == 0 {
                break;
            }
            first = prev.first;
        }
        while let Some(next) = last.checked_add(1).and_then(|c| self.columns.get(c)) {
            if next.outline_level == 0 {
                break;
            }
            last = next.last;
        }
        self.columns.set_collapsed(first, last, collapse);
    }

    /// Restore column records read from a part file.
    pub fn set_column_records(&mut self, records: Vec<ColumnRecord>) {
        self.columns.set_records(records);
    }

    // === Array formulas ===

    /// Install an array formula over `range`.
    ///
    /// Every cell of the range is created if absent and tagged with the
    /// range; only the top-left cell carries the formula text. Returns the
    /// range for chaining.
    pub fn set_array_formula(&mut self, formula: &str, range: CellRange) -> Result<CellRange> {
        validate_position(range.last.row, range.last.col)?;
        let top_left = range.top_left();
        for addr in range.cells() {
            let cell = self.cell_or_create(addr.row, addr.col)?;
            if addr == top_left {
                cell.set_formula(Some(formula));
            } else {
                cell.set_formula(None);
            }
            cell.set_array_range(Some(range));
        }
        Ok(range)
    }

    /// Resolve any member cell of an array formula to the owning top-left
    /// cell address.
    pub fn first_cell_in_array_formula(&self, row: u32, col: u16) -> Option<CellAddress> {
        self.cell_at(row, col)
            .and_then(Cell::array_range)
            .map(|r| r.top_left())
    }

    /// Remove the array formula whose region contains (row, col), clearing
    /// the formula text and region tags from every member cell.
    pub fn remove_array_formula(&mut self, row: u32, col: u16) -> Result<()> {
        let range = self
            .cell_at(row, col)
            .and_then(Cell::array_range)
            .ok_or_else(|| {
                Error::invalid(format!(
                    "cell {} is not part of an array formula",
                    Self::cell_reference(row, col)
                ))
            })?;
        for addr in range.cells() {
            if let Some(cell) = self.cell_at_mut(addr.row, addr.col) {
                cell.set_formula(None);
                cell.set_array_range(None);
            }
        }
        Ok(())
    }

    // === Validations, hyperlinks, comments ===

    pub fn add_data_validation(&mut self, validation: DataValidation) {
        self.data_validations.push(validation);
    }

    pub fn data_validations(&self) -> &[DataValidation] {
        &self.data_validations
    }

    pub fn add_hyperlink(&mut self, hyperlink: Hyperlink) {
        self.hyperlinks.push(hyperlink);
    }

    pub fn hyperlinks(&self) -> &[Hyperlink] {
        &self.hyperlinks
    }

    /// Attach a comment at (row, col). A second comment at an occupied
    /// anchor is rejected and the existing comment is untouched.
    pub fn add_comment(&mut self, row: u32, col: u16, comment: Comment) -> Result<()> {
        validate_position(row, col)?;
        let anchor = (row, col);
        if self.comments.contains_key(&anchor) {
            return Err(Error::DuplicateResource(format!(
                "cell {} already has a comment",
                Self::cell_reference(row, col)
            )));
        }
        self.comments.insert(anchor, comment);
        Ok(())
    }

    pub fn comment_at(&self, row: u32, col: u16) -> Option<&Comment> {
        self.comments.get(&(row, col))
    }

    pub fn remove_comment(&mut self, row: u32, col: u16) -> Option<Comment> {
        self.comments.remove(&(row, col))
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Comments sorted by anchor, row-major. The map itself is unordered;
    /// serialization needs a stable order.
    pub fn comments_sorted(&self) -> Vec<((u32, u16), &Comment)> {
        let mut out: Vec<_> = self.comments.iter().map(|(&k, v)| (k, v)).collect();
        out.sort_by_key(|(k, _)| *k);
        out
    }

    // === Tables and pivot tables ===

    /// Create a table over `range`. The id is unique within this sheet.
    pub fn create_table(&mut self, name: impl Into<String>, range: CellRange) -> Result<&mut Table> {
        validate_position(range.last.row, range.last.col)?;
        let name = name.into();
        if self
            .tables
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(&name))
        {
            return Err(Error::DuplicateResource(format!(
                "table '{name}' already exists on sheet '{}'",
                self.name
            )));
        }
        let id = self.tables.len() as u32 + 1;
        self.tables.push(Table::new(name, id, range));
        Ok(self.tables.last_mut().expect("just pushed"))
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.iter_mut()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn add_table(&mut self, table: Table) {
        self.tables.push(table);
    }

    /// Create a pivot table anchored at `location` over `source`.
    pub fn create_pivot_table(
        &mut self,
        source: PivotSource,
        location: CellAddress,
    ) -> Result<&mut PivotTable> {
        validate_position(location.row, location.col)?;
        validate_position(source.range.last.row, source.range.last.col)?;
        let id = self.pivot_tables.len() as u32 + 1;
        let name = format!("PivotTable{id}");
        self.pivot_tables
            .push(PivotTable::new(name, id, source, location));
        Ok(self.pivot_tables.last_mut().expect("just pushed"))
    }

    pub fn pivot_tables(&self) -> &[PivotTable] {
        &self.pivot_tables
    }

    pub fn add_pivot_table(&mut self, pivot: PivotTable) {
        self.pivot_tables.push(pivot);
    }

    // === Drawing ===

    /// The sheet's drawing, creating it on first call. Subsequent calls
    /// return the same drawing, never a fresh one.
    pub fn create_drawing_patriarch(&mut self) -> &mut Drawing {
        self.drawing.get_or_insert_with(Drawing::new)
    }

    pub fn drawing(&self) -> Option<&Drawing> {
        self.drawing.as_ref()
    }

    pub fn drawing_mut(&mut self) -> Option<&mut Drawing> {
        self.drawing.as_mut()
    }

    pub fn set_drawing(&mut self, drawing: Option<Drawing>) {
        self.drawing = drawing;
    }

    /// Independent copy of this sheet under a new name. The drawing is
    /// deep-cloned with fresh shape ids so the copy never aliases ours.
    pub fn clone_as(&self, name: impl Into<String>) -> Worksheet {
        let mut copy = self.clone();
        copy.name = name.into();
        copy.selected = false;
        copy.drawing = self.drawing.as_ref().map(Drawing::deep_clone);
        copy
    }
}

fn validate_position(row: u32, col: u16) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(Error::out_of_range("row", row as i64, MAX_ROWS as i64 - 1));
    }
    if col >= MAX_COLS {
        return Err(Error::out_of_range(
            "column",
            col as i64,
            MAX_COLS as i64 - 1,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellType;

    #[test]
    fn merged_regions_reject_overlap_and_keep_indices_stable() {
        let mut sheet = Worksheet::new("Sheet1");
        let a = sheet
            .add_merged_region(CellRange::parse("A1:B2").unwrap())
            .unwrap();
        let b = sheet
            .add_merged_region(CellRange::parse("C1:D2").unwrap())
            .unwrap();
        assert_eq!((a, b), (0, 1));

        let err = sheet
            .add_merged_region(CellRange::parse("B2:C3").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::MergedRegionOverlap(_)));
        // Failed add leaves the list unchanged
        assert_eq!(sheet.merged_region_count(), 2);
        assert_eq!(
            sheet.merged_region(1),
            Some(&CellRange::parse("C1:D2").unwrap())
        );
    }

    #[test]
    fn merged_region_access_stays_cheap_at_scale() {
        let mut sheet = Worksheet::new("Sheet1");
        // Bulk-load past the overlap scan; the validating path is covered above.
        for row in 0..50_000u32 {
            sheet
                .merged_regions
                .push(CellRange::from_indices(row, 0, row, 1));
        }
        assert_eq!(sheet.merged_region_count(), 50_000);

        // Indexed access and iteration borrow the list, no per-call copies.
        assert_eq!(
            sheet.merged_region(49_999),
            Some(&CellRange::from_indices(49_999, 0, 49_999, 1))
        );
        let mut rows = 0u64;
        for region in sheet.merged_regions() {
            rows += u64::from(region.first.row);
        }
        assert_eq!(rows, 49_999 * 50_000 / 2);
    }

    #[test]
    fn array_formula_single_cell() {
        let mut sheet = Worksheet::new("Sheet1");
        let range = CellRange::parse("C3:C3").unwrap();
        sheet.set_array_formula("123", range).unwrap();

        assert_eq!(sheet.physical_row_count(), 1);
        let cell = sheet.cell_at(2, 2).unwrap();
        assert_eq!(cell.formula_text(), Some("123"));
        assert_eq!(cell.array_range(), Some(range));
    }

    #[test]
    fn array_formula_region_only_top_left_has_text() {
        let mut sheet = Worksheet::new("Sheet1");
        let range = CellRange::parse("C4:C6").unwrap();
        sheet.set_array_formula("456", range).unwrap();

        assert_eq!(sheet.cell_at(3, 2).unwrap().formula_text(), Some("456"));
        for row in 4..=5 {
            let cell = sheet.cell_at(row, 2).unwrap();
            assert_eq!(cell.formula_text(), None, "row {row}");
            assert_eq!(cell.array_range(), Some(range));
        }
        // Any member resolves to the owner
        assert_eq!(
            sheet.first_cell_in_array_formula(5, 2),
            Some(CellAddress::parse("C4").unwrap())
        );
    }

    #[test]
    fn remove_array_formula_clears_the_whole_region() {
        let mut sheet = Worksheet::new("Sheet1");
        let range = CellRange::parse("A1:B2").unwrap();
        sheet.set_array_formula("ROW()", range).unwrap();
        sheet.remove_array_formula(1, 1).unwrap();

        for addr in range.cells() {
            let cell = sheet.cell_at(addr.row, addr.col).unwrap();
            assert_eq!(cell.formula_text(), None);
            assert_eq!(cell.array_range(), None);
        }
        assert!(sheet.remove_array_formula(0, 0).is_err());
    }

    #[test]
    fn second_comment_at_same_anchor_is_rejected() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.add_comment(0, 0, Comment::new("A", "first")).unwrap();
        let err = sheet
            .add_comment(0, 0, Comment::new("B", "second"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateResource(_)));
        // The original survives
        assert_eq!(sheet.comment_at(0, 0).unwrap().author, "A");
        // A different anchor is fine
        sheet.add_comment(0, 1, Comment::new("B", "second")).unwrap();
        assert_eq!(sheet.comment_count(), 2);
    }

    #[test]
    fn drawing_patriarch_is_idempotent() {
        let mut sheet = Worksheet::new("Sheet1");
        let id = sheet
            .create_drawing_patriarch()
            .create_shape(
                crate::drawing::ShapeType::Rect,
                crate::drawing::ClientAnchor::cells(0, 0, 2, 2),
            )
            .id;
        // Second call returns the same drawing with the shape still there
        let drawing = sheet.create_drawing_patriarch();
        assert_eq!(drawing.shape_count(), 1);
        assert_eq!(drawing.shapes()[0].id, id);
    }

    #[test]
    fn collapse_hides_grouped_rows_and_marks_summary() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.group_rows(7, 9).unwrap();
        sheet.set_row_group_collapsed(8, true);

        for row in 7..=9 {
            assert!(sheet.is_row_hidden(row), "row {row}");
        }
        assert!(sheet.row_outline(10).collapsed);
        assert!(!sheet.is_row_hidden(10));

        sheet.set_row_group_collapsed(8, false);
        for row in 7..=9 {
            assert!(!sheet.is_row_hidden(row), "row {row}");
        }
        assert!(!sheet.row_outline(10).collapsed);
    }

    #[test]
    fn nested_collapse_inner_does_not_reveal_outer() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.group_rows(0, 9).unwrap();
        sheet.group_rows(2, 5).unwrap();
        sheet.set_row_group_collapsed(0, true); // outer (innermost at row 0)
        sheet.set_row_group_collapsed(3, false); // expand inner

        for row in 0..=9 {
            assert!(sheet.is_row_hidden(row), "row {row}");
        }
        assert_eq!(sheet.row_outline(3).level, 2);
    }

    #[test]
    fn ungrouping_unknown_span_is_missing_data() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.group_rows(1, 3).unwrap();
        assert!(matches!(
            sheet.ungroup_rows(2, 3),
            Err(Error::MissingData(_))
        ));
        sheet.ungroup_rows(1, 3).unwrap();
        assert_eq!(sheet.row_outline(2).level, 0);
    }

    #[test]
    fn grouped_columns_never_lose_widths() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_column_width(4, 4, 13.0).unwrap();
        sheet.set_column_width(5, 5, 14.5).unwrap();
        sheet.group_columns(4, 7).unwrap();
        sheet.group_columns(9, 12).unwrap();

        assert_eq!(sheet.column_width(4), Some(13.0));
        assert_eq!(sheet.column_width(5), Some(14.5));
        for col in [4u16, 5, 6, 7, 9, 12] {
            assert!(sheet.columns().get(col).is_some(), "col {col}");
        }
        assert_eq!(sheet.columns().get(6).unwrap().outline_level, 1);
        assert_eq!(sheet.columns().get(8), None);
    }

    #[test]
    fn column_collapse_covers_the_grouped_run() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_column_width(3, 3, 9.0).unwrap();
        sheet.group_columns(2, 5).unwrap();
        sheet.set_column_group_collapsed(3, true);

        for col in 2..=5 {
            assert!(sheet.columns().get(col).unwrap().hidden, "col {col}");
        }
        assert!(sheet.columns().get(6).unwrap().collapsed);

        sheet.set_column_group_collapsed(3, false);
        for col in 2..=5 {
            assert!(!sheet.columns().get(col).unwrap().hidden, "col {col}");
        }
    }

    #[test]
    fn clone_as_deep_clones_the_drawing() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_value("A1", "original").unwrap();
        sheet
            .create_drawing_patriarch()
            .create_shape(
                crate::drawing::ShapeType::Ellipse,
                crate::drawing::ClientAnchor::cells(0, 0, 3, 3),
            );

        let mut copy = sheet.clone_as("Sheet2");
        assert_eq!(copy.name(), "Sheet2");
        assert_eq!(
            copy.value("A1").unwrap().as_string().as_deref(),
            Some("original")
        );
        // Mutating the copy's drawing leaves the original alone
        copy.drawing_mut().unwrap().create_shape(
            crate::drawing::ShapeType::Rect,
            crate::drawing::ClientAnchor::default(),
        );
        assert_eq!(copy.drawing().unwrap().shape_count(), 2);
        assert_eq!(sheet.drawing().unwrap().shape_count(), 1);
    }

    #[test]
    fn out_of_bounds_positions_are_rejected() {
        let mut sheet = Worksheet::new("Sheet1");
        assert!(sheet.create_row(MAX_ROWS).is_err());
        assert!(sheet.set_value_at(0, MAX_COLS, 1.0).is_err());
        assert!(sheet.set_value_at(MAX_ROWS - 1, MAX_COLS - 1, 1.0).is_ok());
    }

    #[test]
    fn copied_row_leaves_observer_formulas_alone() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_value("A1", "hello").unwrap();
        sheet.set_formula("B1", "A1").unwrap();
        // Observer row referencing row 1
        sheet.set_formula("A3", "A2").unwrap();

        let source = sheet.row(0).unwrap().clone();
        sheet.row_or_create(1).unwrap().copy_from(&source);

        assert_eq!(
            sheet.cell_at(1, 0).unwrap().value().as_string().as_deref(),
            Some("hello")
        );
        assert_eq!(sheet.cell_at(1, 1).unwrap().formula_text(), Some("A1"));
        assert_eq!(sheet.cell_at(2, 0).unwrap().formula_text(), Some("A2"));
        assert_eq!(
            sheet.cell_at(1, 1).unwrap().cell_type(),
            CellType::Formula
        );
    }
}

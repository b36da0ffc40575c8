//! Rows: sparse, ordered cell containers

use std::collections::BTreeMap;

use crate::cell::Cell;
use crate::value::CellValue;

/// One row of a worksheet.
///
/// Cells are stored sparsely in column order. Column indices are unique by
/// construction; `first_cell_index`/`last_cell_index` and
/// `physical_cell_count` are derived from the map so they stay consistent
/// across every insert and remove.
#[derive(Debug, Clone, Default)]
pub struct Row {
    cells: BTreeMap<u16, Cell>,
    /// Custom height in points, `None` for the sheet default
    height: Option<f64>,
    hidden: bool,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a blank cell at `col`, replacing any existing cell there.
    pub fn create_cell(&mut self, col: u16) -> &mut Cell {
        self.cells.insert(col, Cell::new());
        self.cells.get_mut(&col).expect("just inserted")
    }

    /// The cell at `col`, creating it blank if absent.
    pub fn cell_or_create(&mut self, col: u16) -> &mut Cell {
        self.cells.entry(col).or_default()
    }

    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(&col)
    }

    pub fn cell_mut(&mut self, col: u16) -> Option<&mut Cell> {
        self.cells.get_mut(&col)
    }

    pub fn remove_cell(&mut self, col: u16) -> Option<Cell> {
        self.cells.remove(&col)
    }

    /// Column index of the first cell, if the row has any.
    pub fn first_cell_index(&self) -> Option<u16> {
        self.cells.keys().next().copied()
    }

    /// One past the column index of the last cell (POI convention), or
    /// `None` for an empty row.
    pub fn last_cell_index(&self) -> Option<u16> {
        self.cells.keys().next_back().map(|&c| c + 1)
    }

    /// Number of cells physically present, regardless of blankness.
    pub fn physical_cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate (column, cell) in ascending column order.
    pub fn cells(&self) -> impl Iterator<Item = (u16, &Cell)> {
        self.cells.iter().map(|(&c, cell)| (c, cell))
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = (u16, &mut Cell)> {
        self.cells.iter_mut().map(|(&c, cell)| (c, cell))
    }

    pub fn height(&self) -> Option<f64> {
        self.height
    }

    pub fn set_height(&mut self, height: Option<f64>) {
        self.height = height;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Replace this row's cells with clones of `source`'s cells.
    ///
    /// Formula text is copied verbatim — relative references are not
    /// offset. Height and hidden state follow along; array-formula region
    /// tags do not, since a clone outside the region would corrupt it.
    pub fn copy_from(&mut self, source: &Row) {
        self.cells.clear();
        for (col, cell) in source.cells() {
            let mut copy = cell.clone();
            copy.set_array_range(None);
            self.cells.insert(col, copy);
        }
        self.height = source.height;
        self.hidden = source.hidden;
    }

    /// Convenience: set a plain value at `col`, creating the cell if needed.
    pub fn set_value<V: Into<CellValue>>(&mut self, col: u16, value: V) {
        self.cell_or_create(col).set_value(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellType;

    #[test]
    fn cell_bookkeeping_stays_consistent() {
        let mut row = Row::new();
        assert_eq!(row.physical_cell_count(), 0);
        assert_eq!(row.first_cell_index(), None);
        assert_eq!(row.last_cell_index(), None);

        row.create_cell(2);
        row.create_cell(7);
        row.create_cell(4);
        assert_eq!(row.physical_cell_count(), 3);
        assert_eq!(row.first_cell_index(), Some(2));
        assert_eq!(row.last_cell_index(), Some(8));

        row.remove_cell(7);
        assert_eq!(row.physical_cell_count(), 2);
        assert_eq!(row.last_cell_index(), Some(5));

        // Re-creating an occupied column does not grow the count
        row.create_cell(2);
        assert_eq!(row.physical_cell_count(), 2);
    }

    #[test]
    fn iteration_is_column_ordered() {
        let mut row = Row::new();
        for col in [9u16, 1, 5] {
            row.set_value(col, col as f64);
        }
        let cols: Vec<u16> = row.cells().map(|(c, _)| c).collect();
        assert_eq!(cols, [1, 5, 9]);
    }

    #[test]
    fn copy_preserves_formula_text_verbatim() {
        let mut src = Row::new();
        src.set_value(0, "hello");
        src.cell_or_create(1).set_formula(Some("A1"));

        let mut dst = Row::new();
        dst.set_value(0, "stale");
        dst.copy_from(&src);

        assert_eq!(dst.physical_cell_count(), 2);
        assert_eq!(
            dst.cell(0).unwrap().value().as_string().as_deref(),
            Some("hello")
        );
        assert_eq!(dst.cell(1).unwrap().formula_text(), Some("A1"));
        assert_eq!(dst.cell(1).unwrap().cell_type(), CellType::Formula);
    }
}

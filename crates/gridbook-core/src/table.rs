//! Worksheet tables

use crate::addr::CellRange;
use crate::error::{Error, Result};

/// A named table over a rectangular sheet range.
///
/// `name` and `display_name` are independent attributes; Excel keeps them
/// equal for tables it creates but the format does not require it. Column
/// lookup by name is case-insensitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Internal table name
    pub name: String,
    /// Name shown in the UI and used in structured references
    pub display_name: String,
    /// Numeric table id, unique per workbook
    pub id: u32,
    pub range: CellRange,
    columns: Vec<TableColumn>,
    /// Number of header rows (0 or 1)
    pub header_row_count: u8,
    /// Number of totals rows (0 or 1)
    pub totals_row_count: u8,
    pub style_info: Option<TableStyleInfo>,
}

/// One table column.
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub id: u32,
    pub name: String,
}

/// Reference to a built-in or custom table style.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStyleInfo {
    /// Style name, e.g. `TableStyleMedium2`
    pub name: String,
    pub show_first_column: bool,
    pub show_last_column: bool,
    pub show_row_stripes: bool,
    pub show_column_stripes: bool,
}

impl Default for TableStyleInfo {
    fn default() -> Self {
        Self {
            name: "TableStyleMedium2".to_string(),
            show_first_column: false,
            show_last_column: false,
            show_row_stripes: true,
            show_column_stripes: false,
        }
    }
}

impl Table {
    /// New table over `range` with one auto-named column per spanned
    /// sheet column (`Column1`, `Column2`, ...).
    pub fn new(name: impl Into<String>, id: u32, range: CellRange) -> Self {
        let name = name.into();
        let columns = (0..range.width())
            .map(|i| TableColumn {
                id: i as u32 + 1,
                name: format!("Column{}", i + 1),
            })
            .collect();
        Self {
            display_name: name.clone(),
            name,
            id,
            range,
            columns,
            header_row_count: 1,
            totals_row_count: 0,
            style_info: None,
        }
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = display_name.into();
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    /// Rename the column at `index`.
    pub fn set_column_name(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        let max = self.columns.len() as i64 - 1;
        let col = self
            .columns
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range("table column", index as i64, max))?;
        col.name = name.into();
        Ok(())
    }

    /// Replace the whole column list. The count must match the range width.
    pub fn set_columns(&mut self, names: &[&str]) -> Result<()> {
        if names.len() != self.range.width() as usize {
            return Err(Error::invalid(format!(
                "table '{}' spans {} columns but {} names were given",
                self.name,
                self.range.width(),
                names.len()
            )));
        }
        self.columns = names
            .iter()
            .enumerate()
            .map(|(i, n)| TableColumn {
                id: i as u32 + 1,
                name: (*n).to_string(),
            })
            .collect();
        Ok(())
    }

    /// Case-insensitive lookup of a column's position within the table.
    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Sheet-absolute column index for a named table column.
    pub fn sheet_column(&self, name: &str) -> Option<u16> {
        self.find_column_index(name)
            .map(|i| self.range.first.col + i as u16)
    }

    /// Rows holding data: the range minus header and totals rows.
    pub fn data_row_range(&self) -> Option<(u32, u32)> {
        let first = self.range.first.row + self.header_row_count as u32;
        let last = self
            .range
            .last
            .row
            .checked_sub(self.totals_row_count as u32)?;
        (first <= last).then_some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new("Sales", 1, CellRange::parse("B2:D8").unwrap())
    }

    #[test]
    fn auto_columns_match_range_width() {
        let t = table();
        assert_eq!(t.columns().len(), 3);
        assert_eq!(t.columns()[0].name, "Column1");
        assert_eq!(t.columns()[2].id, 3);
    }

    #[test]
    fn column_lookup_is_case_insensitive() {
        let mut t = table();
        t.set_columns(&["Region", "Product", "Total"]).unwrap();
        assert_eq!(t.find_column_index("product"), Some(1));
        assert_eq!(t.find_column_index("TOTAL"), Some(2));
        assert_eq!(t.find_column_index("missing"), None);
        // Sheet-absolute: table starts at column B (index 1)
        assert_eq!(t.sheet_column("Region"), Some(1));
        assert_eq!(t.sheet_column("Total"), Some(3));
    }

    #[test]
    fn column_count_must_match_width() {
        let mut t = table();
        assert!(t.set_columns(&["only", "two"]).is_err());
        assert!(t.set_column_name(9, "nope").is_err());
    }

    #[test]
    fn display_name_is_independent() {
        let mut t = table();
        t.set_display_name("Sales 2024");
        assert_eq!(t.name, "Sales");
        assert_eq!(t.display_name, "Sales 2024");
    }

    #[test]
    fn data_rows_exclude_header_and_totals() {
        let mut t = table();
        assert_eq!(t.data_row_range(), Some((2, 7)));
        t.totals_row_count = 1;
        assert_eq!(t.data_row_range(), Some((2, 6)));
        t.header_row_count = 0;
        assert_eq!(t.data_row_range(), Some((1, 6)));
    }
}

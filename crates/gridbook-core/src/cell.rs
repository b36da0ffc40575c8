//! The cell and its type-transition rules

use crate::addr::CellRange;
use crate::value::{CellType, CellValue};

/// One cell of a row.
///
/// The value is a tagged variant ([`CellValue`]); the transition methods
/// below are the only way types change, so a cell can never hold e.g. a
/// number and a string at once. The style index is `None` for "default
/// style" — distinct from an explicit index 0. The cell's reference is not
/// stored here: it is derived from the row/column position it occupies, so
/// it stays correct whether or not the on-disk part carried an explicit `r`
/// attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    value: CellValue,
    style: Option<u32>,
    /// Set when this cell belongs to an array-formula region; all member
    /// cells of a region share the same range.
    array_range: Option<CellRange>,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    pub fn cell_type(&self) -> CellType {
        self.value.cell_type()
    }

    /// The type of a formula's cached result, if any.
    pub fn cached_result_type(&self) -> Option<CellType> {
        match &self.value {
            CellValue::Formula {
                cached: Some(v), ..
            } => Some(v.cell_type()),
            _ => None,
        }
    }

    /// Set the cell's value.
    ///
    /// - a blank value always degrades the cell to blank, discarding any
    ///   formula and cached result;
    /// - a non-blank value on a formula cell overwrites the cached result
    ///   and keeps the formula;
    /// - otherwise the value replaces the old one outright.
    pub fn set_value<V: Into<CellValue>>(&mut self, value: V) {
        let value = value.into();
        if value.is_blank() {
            self.value = CellValue::Blank;
            return;
        }
        match &mut self.value {
            CellValue::Formula { cached, .. } => *cached = Some(Box::new(value)),
            _ => self.value = value,
        }
    }

    /// Set or clear the formula.
    ///
    /// Setting a formula on a cell with a plain value keeps that value as
    /// the cached result (preserving its type marker) until a new value
    /// overwrites it. Clearing the formula degrades the cell to whatever
    /// cached type remains — a formula whose cached result was a string
    /// becomes a string cell.
    pub fn set_formula(&mut self, formula: Option<&str>) {
        match formula {
            Some(text) => {
                let text = text.strip_prefix('=').unwrap_or(text).to_string();
                if text.is_empty() {
                    self.set_formula(None);
                    return;
                }
                let cached = match std::mem::take(&mut self.value) {
                    CellValue::Blank => None,
                    CellValue::Formula { cached, .. } => cached,
                    plain => Some(Box::new(plain)),
                };
                self.value = CellValue::Formula { text, cached };
            }
            None => {
                if let CellValue::Formula { cached, .. } = std::mem::take(&mut self.value) {
                    self.value = cached.map(|v| *v).unwrap_or(CellValue::Blank);
                }
                // Non-formula cells are unaffected
            }
        }
    }

    pub fn formula_text(&self) -> Option<&str> {
        self.value.formula_text()
    }

    /// Style index into the workbook's xf pool; `None` means default style.
    pub fn style(&self) -> Option<u32> {
        self.style
    }

    pub fn set_style(&mut self, style: Option<u32>) {
        self.style = style;
    }

    /// The array-formula region this cell belongs to, if any.
    pub fn array_range(&self) -> Option<CellRange> {
        self.array_range
    }

    pub fn set_array_range(&mut self, range: Option<CellRange>) {
        self.array_range = range;
    }

    /// Replace the value wholesale. Used by the reader, which materializes
    /// cached formula results directly.
    pub fn set_raw_value(&mut self, value: CellValue) {
        self.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellError;

    #[test]
    fn blank_value_discards_formula_and_cache() {
        let mut cell = Cell::new();
        cell.set_formula(Some("SUM(A1:A3)"));
        cell.set_value(6.0);
        assert_eq!(cell.cell_type(), CellType::Formula);

        cell.set_value(CellValue::Blank);
        assert_eq!(cell.cell_type(), CellType::Blank);
        assert_eq!(cell.formula_text(), None);
    }

    #[test]
    fn formula_preserves_prior_value_as_cached_result() {
        let mut cell = Cell::new();
        cell.set_value("hello");
        cell.set_formula(Some("A1"));

        assert_eq!(cell.cell_type(), CellType::Formula);
        assert_eq!(cell.cached_result_type(), Some(CellType::String));
        assert_eq!(cell.value().as_string().as_deref(), Some("hello"));

        // A new value overwrites the cached result, formula stays
        cell.set_value(3.5);
        assert_eq!(cell.cached_result_type(), Some(CellType::Numeric));
        assert_eq!(cell.formula_text(), Some("A1"));
    }

    #[test]
    fn clearing_formula_degrades_to_cached_type() {
        let mut cell = Cell::new();
        cell.set_value("cached text");
        cell.set_formula(Some("B2"));
        cell.set_formula(None);
        assert_eq!(cell.cell_type(), CellType::String);
        assert_eq!(cell.value().as_string().as_deref(), Some("cached text"));

        // Without a cached result the cell degrades to blank
        let mut cell = Cell::new();
        cell.set_formula(Some("B2"));
        cell.set_formula(None);
        assert_eq!(cell.cell_type(), CellType::Blank);

        // An empty formula string counts as clearing
        let mut cell = Cell::new();
        cell.set_value(true);
        cell.set_formula(Some("B2"));
        cell.set_formula(Some(""));
        assert_eq!(cell.cell_type(), CellType::Boolean);
    }

    #[test]
    fn replacing_a_formula_keeps_the_cached_result() {
        let mut cell = Cell::new();
        cell.set_value(CellError::Na);
        cell.set_formula(Some("X1"));
        cell.set_formula(Some("Y1"));
        assert_eq!(cell.formula_text(), Some("Y1"));
        assert_eq!(cell.cached_result_type(), Some(CellType::Error));
    }

    #[test]
    fn style_none_is_default_not_zero() {
        let mut cell = Cell::new();
        assert_eq!(cell.style(), None);
        cell.set_style(Some(0));
        assert_eq!(cell.style(), Some(0));
    }
}

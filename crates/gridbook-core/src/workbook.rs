//! Workbook type

use crate::addr::CellRange;
use crate::error::{Error, Result};
use crate::pivot::PivotSource;
use crate::shared_strings::SharedStringTable;
use crate::style::StyleRegistry;
use crate::worksheet::Worksheet;

/// Characters Excel refuses in sheet names.
const FORBIDDEN_NAME_CHARS: &[char] = &['\\', '/', '?', '*', '[', ']', ':'];

/// Longest sheet name Excel accepts.
const MAX_SHEET_NAME_LEN: usize = 31;

/// A named range: a sheet-qualified rectangular range addressable by name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRange {
    pub name: String,
    pub sheet_name: String,
    pub range: CellRange,
}

/// A workbook: the owning root of sheets, shared strings and styles.
///
/// The registries are owned here, never process-wide, so several workbooks
/// can coexist (and copy content between each other) in one process.
#[derive(Debug, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    shared_strings: SharedStringTable,
    styles: StyleRegistry,
    named_ranges: Vec<NamedRange>,
    active_sheet: usize,
    /// Use the 1904 date system instead of 1900
    date_1904: bool,
    /// Save strings inline in sheet XML instead of through the
    /// shared-string table
    inline_strings: bool,
    /// Ask the consuming application to recalculate formulas on open
    calc_on_open: bool,
}

impl Workbook {
    /// A workbook with a single empty sheet named `Sheet1`.
    pub fn new() -> Self {
        let mut wb = Self::empty();
        wb.create_sheet("Sheet1").expect("default name is valid");
        wb
    }

    /// A workbook with no sheets at all. At least one sheet must be added
    /// before saving.
    pub fn empty() -> Self {
        Self::default()
    }

    // === Sheets ===

    /// Append a new empty sheet. The name must be non-empty, at most 31
    /// characters, free of `\ / ? * [ ] :`, and unique in the workbook
    /// (case-insensitive).
    pub fn create_sheet(&mut self, name: &str) -> Result<&mut Worksheet> {
        self.validate_new_sheet_name(name)?;
        self.sheets.push(Worksheet::new(name));
        Ok(self.sheets.last_mut().expect("just pushed"))
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet_at(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    pub fn sheet_at_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheets
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    pub fn sheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// Iterate sheets in workbook order.
    pub fn sheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.sheets.iter()
    }

    pub fn sheets_mut(&mut self) -> impl Iterator<Item = &mut Worksheet> {
        self.sheets.iter_mut()
    }

    pub fn remove_sheet(&mut self, index: usize) -> Result<Worksheet> {
        if index >= self.sheets.len() {
            return Err(Error::out_of_range(
                "sheet",
                index as i64,
                self.sheets.len() as i64 - 1,
            ));
        }
        let removed = self.sheets.remove(index);
        if self.active_sheet >= self.sheets.len() && self.active_sheet > 0 {
            self.active_sheet = self.sheets.len() - 1;
        }
        Ok(removed)
    }

    /// Rename the sheet at `index`, subject to the usual name rules.
    pub fn rename_sheet(&mut self, index: usize, name: &str) -> Result<()> {
        if index >= self.sheets.len() {
            return Err(Error::out_of_range(
                "sheet",
                index as i64,
                self.sheets.len() as i64 - 1,
            ));
        }
        if !self.sheets[index].name().eq_ignore_ascii_case(name) {
            self.validate_new_sheet_name(name)?;
        }
        self.sheets[index].set_name(name);
        Ok(())
    }

    /// Deep-copy the sheet at `index` under a derived unique name
    /// (`Name (2)`, `Name (3)`, ...). Returns the new sheet's index.
    ///
    /// The copy is fully independent: its drawing is cloned with fresh
    /// shape ids, never shared with the source.
    pub fn clone_sheet(&mut self, index: usize) -> Result<usize> {
        let source = self.sheet_at(index).ok_or_else(|| {
            Error::out_of_range("sheet", index as i64, self.sheets.len() as i64 - 1)
        })?;
        let base = source.name().to_string();
        let mut n = 2;
        let name = loop {
            let candidate = format!("{base} ({n})");
            if self.sheet_by_name(&candidate).is_none() && candidate.len() <= MAX_SHEET_NAME_LEN {
                break candidate;
            }
            if candidate.len() > MAX_SHEET_NAME_LEN {
                return Err(Error::invalid(format!(
                    "cannot derive a unique name for a clone of '{base}'"
                )));
            }
            n += 1;
        };
        let copy = self.sheets[index].clone_as(name);
        self.sheets.push(copy);
        Ok(self.sheets.len() - 1)
    }

    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        if index >= self.sheets.len() {
            return Err(Error::out_of_range(
                "sheet",
                index as i64,
                self.sheets.len() as i64 - 1,
            ));
        }
        self.active_sheet = index;
        Ok(())
    }

    fn validate_new_sheet_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid("sheet name must not be empty"));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::invalid(format!(
                "sheet name '{name}' exceeds {MAX_SHEET_NAME_LEN} characters"
            )));
        }
        if let Some(bad) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
            return Err(Error::invalid(format!(
                "sheet name '{name}' contains forbidden character '{bad}'"
            )));
        }
        if self.sheet_by_name(name).is_some() {
            return Err(Error::DuplicateResource(format!(
                "sheet '{name}' already exists"
            )));
        }
        Ok(())
    }

    // === Registries ===

    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.shared_strings
    }

    pub fn shared_strings_mut(&mut self) -> &mut SharedStringTable {
        &mut self.shared_strings
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleRegistry {
        &mut self.styles
    }

    pub fn is_date_1904(&self) -> bool {
        self.date_1904
    }

    pub fn set_date_1904(&mut self, date_1904: bool) {
        self.date_1904 = date_1904;
    }

    /// Whether saving writes strings inline rather than shared. The storage
    /// strategy never changes a cell's logical type.
    pub fn uses_inline_strings(&self) -> bool {
        self.inline_strings
    }

    pub fn set_inline_strings(&mut self, inline: bool) {
        self.inline_strings = inline;
    }

    pub fn calc_on_open(&self) -> bool {
        self.calc_on_open
    }

    pub fn set_calc_on_open(&mut self, calc: bool) {
        self.calc_on_open = calc;
    }

    // === Named ranges ===

    pub fn add_named_range(
        &mut self,
        name: impl Into<String>,
        sheet_name: impl Into<String>,
        range: CellRange,
    ) -> Result<()> {
        let name = name.into();
        let sheet_name = sheet_name.into();
        if self.sheet_by_name(&sheet_name).is_none() {
            return Err(Error::SheetNotFound(sheet_name));
        }
        if self
            .named_ranges
            .iter()
            .any(|nr| nr.name.eq_ignore_ascii_case(&name))
        {
            return Err(Error::DuplicateResource(format!(
                "named range '{name}' already exists"
            )));
        }
        self.named_ranges.push(NamedRange {
            name,
            sheet_name,
            range,
        });
        Ok(())
    }

    pub fn named_range(&self, name: &str) -> Option<&NamedRange> {
        self.named_ranges
            .iter()
            .find(|nr| nr.name.eq_ignore_ascii_case(name))
    }

    pub fn named_ranges(&self) -> &[NamedRange] {
        &self.named_ranges
    }

    /// Pivot source over an explicit range on a sheet.
    pub fn pivot_source(&self, sheet_name: &str, range: CellRange) -> Result<PivotSource> {
        if self.sheet_by_name(sheet_name).is_none() {
            return Err(Error::SheetNotFound(sheet_name.to_string()));
        }
        Ok(PivotSource {
            range,
            sheet_name: sheet_name.to_string(),
            named_range: None,
        })
    }

    /// Pivot source resolved through a named range. The resolved range is
    /// captured at this point; later edits to the named range do not move
    /// the pivot source.
    pub fn pivot_source_from_name(&self, name: &str) -> Result<PivotSource> {
        let nr = self
            .named_range(name)
            .ok_or_else(|| Error::MissingData(format!("named range '{name}' does not exist")))?;
        Ok(PivotSource {
            range: nr.range,
            sheet_name: nr.sheet_name.clone(),
            named_range: Some(nr.name.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::CellAddress;
    use crate::drawing::{ClientAnchor, ShapeType};

    #[test]
    fn sheet_names_are_validated() {
        let mut wb = Workbook::new();
        assert!(wb.create_sheet("Data").is_ok());
        assert!(matches!(
            wb.create_sheet("data"),
            Err(Error::DuplicateResource(_))
        ));
        assert!(wb.create_sheet("").is_err());
        assert!(wb.create_sheet("bad/name").is_err());
        assert!(wb.create_sheet(&"x".repeat(32)).is_err());
        assert!(wb.create_sheet(&"x".repeat(31)).is_ok());
    }

    #[test]
    fn rename_allows_case_change_of_same_sheet() {
        let mut wb = Workbook::new();
        wb.rename_sheet(0, "SHEET1").unwrap();
        assert_eq!(wb.sheet_at(0).unwrap().name(), "SHEET1");
        wb.create_sheet("Other").unwrap();
        assert!(wb.rename_sheet(1, "sheet1").is_err());
    }

    #[test]
    fn clone_sheet_derives_a_unique_name_and_copies_content() {
        let mut wb = Workbook::new();
        wb.sheet_at_mut(0).unwrap().set_value("A1", 42.0).unwrap();
        let idx = wb.clone_sheet(0).unwrap();
        assert_eq!(wb.sheet_at(idx).unwrap().name(), "Sheet1 (2)");
        assert_eq!(
            wb.sheet_at(idx).unwrap().value("A1").unwrap().as_number(),
            Some(42.0)
        );

        let idx2 = wb.clone_sheet(0).unwrap();
        assert_eq!(wb.sheet_at(idx2).unwrap().name(), "Sheet1 (3)");
    }

    #[test]
    fn clone_sheet_never_aliases_the_drawing() {
        let mut wb = Workbook::new();
        wb.sheet_at_mut(0)
            .unwrap()
            .create_drawing_patriarch()
            .create_shape(ShapeType::Rect, ClientAnchor::cells(0, 0, 2, 2));
        let idx = wb.clone_sheet(0).unwrap();

        // Shape-level equality, object-level independence
        let orig = wb.sheet_at(0).unwrap().drawing().unwrap();
        let copy = wb.sheet_at(idx).unwrap().drawing().unwrap();
        assert_eq!(orig.shape_count(), copy.shape_count());
        assert_eq!(orig.shapes()[0].kind, copy.shapes()[0].kind);

        wb.sheet_at_mut(idx)
            .unwrap()
            .drawing_mut()
            .unwrap()
            .create_shape(ShapeType::Ellipse, ClientAnchor::default());
        assert_eq!(wb.sheet_at(0).unwrap().drawing().unwrap().shape_count(), 1);
        assert_eq!(
            wb.sheet_at(idx).unwrap().drawing().unwrap().shape_count(),
            2
        );
    }

    #[test]
    fn named_range_resolution_for_pivot_sources() {
        let mut wb = Workbook::new();
        let range = CellRange::parse("A1:C2").unwrap();
        wb.add_named_range("SourceData", "Sheet1", range).unwrap();
        assert!(matches!(
            wb.add_named_range("sourcedata", "Sheet1", range),
            Err(Error::DuplicateResource(_))
        ));
        assert!(wb.add_named_range("Orphan", "Nope", range).is_err());

        let source = wb.pivot_source_from_name("SourceData").unwrap();
        assert_eq!(source.range, range);
        assert_eq!(source.named_range.as_deref(), Some("SourceData"));
        assert!(wb.pivot_source_from_name("Missing").is_err());
    }

    #[test]
    fn pivot_over_named_range_validates_like_a_plain_range() {
        let mut wb = Workbook::new();
        let range = CellRange::parse("A1:C2").unwrap();
        wb.add_named_range("Src", "Sheet1", range).unwrap();
        let source = wb.pivot_source_from_name("Src").unwrap();

        let sheet = wb.sheet_at_mut(0).unwrap();
        let pivot = sheet
            .create_pivot_table(source, CellAddress::parse("H5").unwrap())
            .unwrap();
        pivot.add_row_label(2).unwrap();
        assert!(pivot.add_row_label(3).is_err());
    }

    #[test]
    fn removing_the_active_sheet_clamps_the_index() {
        let mut wb = Workbook::new();
        wb.create_sheet("Two").unwrap();
        wb.set_active_sheet(1).unwrap();
        wb.remove_sheet(1).unwrap();
        assert_eq!(wb.active_sheet(), 0);
        assert!(wb.set_active_sheet(5).is_err());
    }
}

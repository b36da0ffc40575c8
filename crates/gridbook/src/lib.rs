//! # gridbook
//!
//! A Rust library for reading, writing, and manipulating XLSX spreadsheet
//! documents.
//!
//! ## Features
//!
//! - Read and write XLSX files (Office Open XML)
//! - Typed cell values with cached formula results and array formulas
//! - Shared-string and style deduplication through workbook registries
//! - Row/column grouping with collapse state, merged regions, data
//!   validation, hyperlinks, comments, tables, drawings, and pivot tables
//!
//! ## Example
//!
//! ```rust
//! use gridbook::prelude::*;
//!
//! // Create a new workbook (one empty sheet)
//! let mut workbook = Workbook::new();
//!
//! // Get the first worksheet
//! let sheet = workbook.sheet_at_mut(0).unwrap();
//!
//! // Set cell values
//! sheet.set_value("A1", "Hello").unwrap();
//! sheet.set_value("B1", 42.0).unwrap();
//! sheet.set_value("C1", true).unwrap();
//!
//! // Set a formula
//! sheet.set_formula("D1", "B1*2").unwrap();
//!
//! // Save to file
//! // workbook.save("output.xlsx").unwrap();
//! ```

pub mod prelude;

// Re-export core types
pub use gridbook_core::{
    CellAddress,
    CellError,
    CellRange,
    // Cell types
    CellType,
    CellValue,
    ClientAnchor,
    ColumnRecord,
    // Comments
    Comment,
    // Pivot types
    DataField,
    DataFunction,
    // Data validation types
    DataValidation,
    // Drawing types
    Drawing,
    // Error types
    Error,
    FieldRole,
    // Grouping types
    GroupSpan,
    // Hyperlinks
    Hyperlink,
    HyperlinkKind,
    NamedRange,
    PivotSource,
    PivotTable,
    Result,
    RichText,
    RowOutline,
    Shape,
    ShapeKind,
    ShapeType,
    SharedStringTable,
    // Tables
    Table,
    TableStyleInfo,
    TextRun,
    ValidationConstraint,
    ValidationErrorStyle,
    ValidationOperator,
    VmlAnchor,
    // Main types
    Workbook,
    Worksheet,

    // Constants
    DATA_FIELDS_AS_COLUMNS,
    MAX_COLS,
    MAX_OUTLINE_LEVEL,
    MAX_ROWS,
};

// Re-export style types
pub use gridbook_core::{
    Alignment, Border, BorderEdge, BorderLineStyle, CellXf, Color, Fill, Font,
    HorizontalAlignment, PatternType, StyleRegistry, Underline, VerticalAlignment,
};

// Re-export I/O types
pub use gridbook_xlsx::{XlsxError, XlsxReader, XlsxResult, XlsxWriter};

use std::path::Path;

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt {
    /// Open a workbook from an `.xlsx` file
    fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook>;

    /// Save the workbook to an `.xlsx` file
    fn save<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let path = path.as_ref();
        match extension_of(path).as_deref() {
            Some("xlsx") | Some("xlsm") => XlsxReader::read_file(path),
            _ => Err(XlsxError::InvalidFormat(format!(
                "unsupported file format: {}",
                path.display()
            ))),
        }
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()> {
        let path = path.as_ref();
        match extension_of(path).as_deref() {
            Some("xlsx") => XlsxWriter::write_file(self, path),
            _ => Err(XlsxError::InvalidFormat(format!(
                "unsupported file format: {}",
                path.display()
            ))),
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

//! # gridbook-core
//!
//! In-memory spreadsheet document model: workbooks, worksheets, rows and
//! typed cells, plus the workbook-owned shared-string and style registries
//! that XLSX serialization consults.
//!
//! ## Example
//!
//! ```rust
//! use gridbook_core::{CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.sheet_at_mut(0).unwrap();
//!
//! // Using string addresses
//! sheet.set_value("A1", "Hello").unwrap();
//! sheet.set_value("B1", 42.0).unwrap();
//!
//! // Or using row/column indices (0-based)
//! sheet.set_value_at(1, 0, CellValue::string("World")).unwrap();
//! sheet.set_formula("B2", "B1*2").unwrap();
//! ```

pub mod addr;
pub mod cell;
pub mod column;
pub mod comment;
pub mod drawing;
pub mod error;
pub mod hyperlink;
pub mod outline;
pub mod pivot;
pub mod rich_text;
pub mod row;
pub mod shared_strings;
pub mod style;
pub mod table;
pub mod validation;
pub mod value;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use addr::{CellAddress, CellRange};
pub use cell::Cell;
pub use column::{ColumnRecord, ColumnRecords};
pub use comment::{Comment, VmlAnchor};
pub use drawing::{ClientAnchor, Drawing, Shape, ShapeKind, ShapeType};
pub use error::{Error, Result};
pub use hyperlink::{Hyperlink, HyperlinkKind};
pub use outline::{GroupSpan, RowOutline, MAX_OUTLINE_LEVEL};
pub use pivot::{
    DataField, DataFunction, FieldRole, PivotSource, PivotTable, DATA_FIELDS_AS_COLUMNS,
};
pub use rich_text::{RichText, TextRun};
pub use row::Row;
pub use shared_strings::SharedStringTable;
pub use table::{Table, TableColumn, TableStyleInfo};
pub use validation::{
    DataValidation, ValidationConstraint, ValidationErrorStyle, ValidationOperator,
};
pub use value::{CellError, CellType, CellValue};
pub use workbook::{NamedRange, Workbook};
pub use worksheet::Worksheet;

// Re-export all style types for convenience
pub use style::{
    Alignment, Border, BorderEdge, BorderLineStyle, CellXf, Color, Fill, Font, FontScheme,
    HorizontalAlignment, NumberFormats, PatternType, StyleRegistry, Underline,
    VerticalAlignment,
};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

//! Prelude module - common imports for gridbook users
//!
//! ```rust
//! use gridbook::prelude::*;
//! ```

pub use crate::{
    CellAddress,
    CellError,
    CellRange,
    // Cell types
    CellValue,
    // Comments
    Comment,
    DataFunction,
    // Data validation types
    DataValidation,
    // Error types
    Error,
    // Grouping types
    GroupSpan,
    // Hyperlinks
    Hyperlink,
    // Pivot types
    PivotTable,
    Result,
    RichText,
    // Tables
    Table,
    ValidationErrorStyle,
    ValidationOperator,
    // Main types
    Workbook,
    // Extension traits
    WorkbookExt,
    Worksheet,
    // I/O types
    XlsxReader,
    XlsxWriter,
};

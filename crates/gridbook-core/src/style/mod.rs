//! Style types: fonts, fills, borders, number formats, and the
//! workbook-owned registry that deduplicates them.

mod alignment;
mod border;
mod color;
mod fill;
mod font;
mod number_format;
mod registry;

pub use alignment::{Alignment, HorizontalAlignment, VerticalAlignment};
pub use border::{Border, BorderEdge, BorderLineStyle};
pub use color::Color;
pub use fill::{Fill, PatternType};
pub use font::{Font, FontScheme, Underline, MAX_FONT_SIZE, MIN_FONT_SIZE};
pub use number_format::{builtin_format_code, NumberFormats, FIRST_USER_DEFINED_ID};
pub use registry::{CellXf, StyleRegistry};

//! # gridbook-xlsx
//!
//! XLSX (Office Open XML) reader and writer for gridbook.

pub mod error;
pub mod reader;
pub mod writer;

mod comments;
mod drawing;
mod package;
mod pivot;
mod sst;
mod styles;
mod table;
mod xml;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;

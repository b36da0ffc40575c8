//! File-based save/open through the `WorkbookExt` extension trait.

use gridbook::prelude::*;
use gridbook::XlsxError;

#[test]
fn test_save_and_open_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");

    let mut wb = Workbook::new();
    let sheet = wb.sheet_at_mut(0).unwrap();
    sheet.set_value("A1", "Hello").unwrap();
    sheet.set_value("B1", 42.0).unwrap();
    sheet.set_formula("C1", "B1*2").unwrap();

    wb.save(&path).unwrap();

    let wb2 = Workbook::open(&path).unwrap();
    let sheet2 = wb2.sheet_at(0).unwrap();
    assert_eq!(
        sheet2.value("A1").unwrap().as_string(),
        Some("Hello".to_string())
    );
    assert_eq!(sheet2.value("B1").unwrap().as_number(), Some(42.0));
    assert_eq!(sheet2.value("C1").unwrap().formula_text(), Some("B1*2"));
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.ods");

    let wb = Workbook::new();
    assert!(matches!(
        wb.save(&path),
        Err(XlsxError::InvalidFormat(_))
    ));
    assert!(matches!(
        Workbook::open(&path),
        Err(XlsxError::InvalidFormat(_))
    ));
}

#[test]
fn test_open_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.xlsx");

    assert!(matches!(
        Workbook::open(&path),
        Err(XlsxError::Io(_))
    ));
}

//! Roundtrip tests for sheet-level features: grouping, array formulas,
//! validations, hyperlinks, comments, tables, drawings, and pivot tables.

use gridbook::prelude::*;
use gridbook::{CellAddress, ClientAnchor, HyperlinkKind, ShapeType, ValidationConstraint};
use std::io::Cursor;

fn roundtrip(wb: &Workbook) -> Workbook {
    let mut buf = Vec::new();
    XlsxWriter::write(wb, Cursor::new(&mut buf)).unwrap();
    XlsxReader::read(Cursor::new(&buf)).unwrap()
}

#[test]
fn test_roundtrip_row_grouping() {
    let mut wb = Workbook::new();
    let sheet = wb.sheet_at_mut(0).unwrap();

    for row in 0..8 {
        sheet.set_value_at(row, 0, row as f64).unwrap();
    }
    sheet.group_rows(1, 6).unwrap();
    sheet.group_rows(2, 4).unwrap();
    sheet.set_row_group_collapsed(2, true);

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.sheet_at(0).unwrap();

    assert_eq!(
        sheet2.row_groups(),
        &[
            GroupSpan {
                start: 1,
                end: 6,
                collapsed: false
            },
            GroupSpan {
                start: 2,
                end: 4,
                collapsed: true
            },
        ]
    );
    assert!(sheet2.is_row_hidden(3), "inside the collapsed inner group");
    assert!(!sheet2.is_row_hidden(1), "outer group stays expanded");
    assert_eq!(sheet2.row_outline(3).level, 2);
}

#[test]
fn test_roundtrip_grouping_summary_above() {
    let mut wb = Workbook::new();
    let sheet = wb.sheet_at_mut(0).unwrap();

    sheet.set_row_sums_below(false);
    sheet.set_value_at(2, 0, "Total").unwrap();
    sheet.group_rows(3, 5).unwrap();
    sheet.set_row_group_collapsed(3, true);

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.sheet_at(0).unwrap();

    assert!(!sheet2.row_sums_below());
    assert_eq!(
        sheet2.row_groups(),
        &[GroupSpan {
            start: 3,
            end: 5,
            collapsed: true
        }]
    );
    assert!(sheet2.is_row_hidden(4));
}

#[test]
fn test_roundtrip_column_grouping() {
    let mut wb = Workbook::new();
    let sheet = wb.sheet_at_mut(0).unwrap();

    sheet.set_value("A1", 1.0).unwrap();
    sheet.group_columns(1, 3).unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.sheet_at(0).unwrap();

    for col in 1..=3u16 {
        assert_eq!(
            sheet2.columns().get(col).map(|r| r.outline_level),
            Some(1),
            "column {col} keeps its outline level"
        );
    }
    assert!(sheet2.columns().get(0).is_none());
}

#[test]
fn test_grouped_columns_serialize_with_widths() {
    let mut wb = Workbook::new();
    let sheet = wb.sheet_at_mut(0).unwrap();

    sheet.set_column_width(4, 5, 20.0).unwrap();
    sheet.group_columns(4, 7).unwrap();
    sheet.group_columns(9, 12).unwrap();

    let mut buf = Vec::new();
    XlsxWriter::write(&wb, Cursor::new(&mut buf)).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(&buf)).unwrap();
    let mut sheet_xml = String::new();
    std::io::Read::read_to_string(
        &mut archive.by_name("xl/worksheets/sheet1.xml").unwrap(),
        &mut sheet_xml,
    )
    .unwrap();

    // Every emitted <col> element must carry an explicit width, including
    // the records grouping created over columns that never had one set.
    for element in sheet_xml.split("<col ").skip(1) {
        let attrs = element.split("/>").next().unwrap();
        assert!(attrs.contains(" width=\""), "<col {attrs}");
    }

    // And the filler width must not masquerade as a user-set one
    let wb2 = XlsxReader::read(Cursor::new(&buf)).unwrap();
    let sheet2 = wb2.sheet_at(0).unwrap();
    assert_eq!(sheet2.column_width(4), Some(20.0));
    assert_eq!(sheet2.column_width(6), None);
    assert_eq!(sheet2.columns().get(10).map(|r| r.outline_level), Some(1));
}

#[test]
fn test_roundtrip_array_formula() {
    let mut wb = Workbook::new();
    let sheet = wb.sheet_at_mut(0).unwrap();

    sheet.set_value("A1", 1.0).unwrap();
    sheet.set_value("B1", 2.0).unwrap();
    let range = CellRange::parse("D1:E1").unwrap();
    sheet.set_array_formula("A1:B1*2", range).unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.sheet_at(0).unwrap();

    assert_eq!(
        sheet2.cell_at(0, 3).unwrap().value().formula_text(),
        Some("A1:B1*2")
    );
    assert_eq!(sheet2.cell_at(0, 3).unwrap().array_range(), Some(range));
    assert_eq!(sheet2.cell_at(0, 4).unwrap().array_range(), Some(range));
    assert_eq!(
        sheet2.first_cell_in_array_formula(0, 4),
        Some(CellAddress::new(0, 3))
    );
    // Only the top-left cell carries the formula text
    assert!(sheet2.cell_at(0, 4).unwrap().value().formula_text().is_none());
}

#[test]
fn test_roundtrip_data_validations() {
    let mut wb = Workbook::new();
    let sheet = wb.sheet_at_mut(0).unwrap();

    let mut list = DataValidation::explicit_list(&["Yes", "No", "Maybe"]);
    list.ranges = vec![CellRange::parse("A1:A10").unwrap()];
    list.input_title = Some("Answer".to_string());
    list.input_message = Some("Pick one".to_string());
    list.show_input_message = true;
    sheet.add_data_validation(list);

    let mut whole = DataValidation::new();
    whole.constraint = ValidationConstraint::Whole {
        operator: ValidationOperator::Between,
        value1: "1".to_string(),
        value2: Some("100".to_string()),
    };
    whole.ranges = vec![CellRange::parse("B1:B5").unwrap()];
    whole.error_style = ValidationErrorStyle::Warning;
    whole.error_title = Some("Out of range".to_string());
    whole.error_message = Some("Use 1-100".to_string());
    sheet.add_data_validation(whole);

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.sheet_at(0).unwrap();
    let validations = sheet2.data_validations();

    assert_eq!(validations.len(), 2);
    assert_eq!(
        validations[0].explicit_list_values(),
        Some(vec![
            "Yes".to_string(),
            "No".to_string(),
            "Maybe".to_string()
        ])
    );
    assert_eq!(
        validations[0].ranges,
        vec![CellRange::parse("A1:A10").unwrap()]
    );
    assert!(validations[0].show_dropdown);
    assert!(validations[0].show_input_message);
    assert_eq!(validations[0].input_title.as_deref(), Some("Answer"));

    assert_eq!(validations[1].error_style, ValidationErrorStyle::Warning);
    assert_eq!(validations[1].error_title.as_deref(), Some("Out of range"));
    match &validations[1].constraint {
        ValidationConstraint::Whole {
            operator,
            value1,
            value2,
        } => {
            assert_eq!(*operator, ValidationOperator::Between);
            assert_eq!(value1, "1");
            assert_eq!(value2.as_deref(), Some("100"));
        }
        other => panic!("unexpected constraint {other:?}"),
    }
}

#[test]
fn test_roundtrip_hyperlinks() {
    let mut wb = Workbook::empty();
    wb.create_sheet("Links").unwrap();
    wb.create_sheet("Target").unwrap();
    let sheet = wb.sheet_at_mut(0).unwrap();

    sheet.set_value("A1", "website").unwrap();
    sheet.add_hyperlink(
        Hyperlink::url(
            CellRange::parse("A1").unwrap(),
            "https://example.com/report",
        )
        .with_tooltip("Open the report"),
    );
    sheet.add_hyperlink(Hyperlink::email(
        CellRange::parse("A2").unwrap(),
        "team@example.com",
    ));
    sheet.add_hyperlink(Hyperlink::document(
        CellRange::parse("A3").unwrap(),
        "Target!B2",
    ));

    let wb2 = roundtrip(&wb);
    let links = wb2.sheet_at(0).unwrap().hyperlinks();

    assert_eq!(links.len(), 3);
    assert_eq!(links[0].kind, HyperlinkKind::Url);
    assert_eq!(links[0].target, "https://example.com/report");
    assert_eq!(links[0].tooltip.as_deref(), Some("Open the report"));
    assert_eq!(links[1].kind, HyperlinkKind::Email);
    assert_eq!(links[1].target, "mailto:team@example.com");
    assert_eq!(links[2].kind, HyperlinkKind::Document);
    assert_eq!(links[2].target, "Target!B2");
}

#[test]
fn test_roundtrip_comments() {
    let mut wb = Workbook::new();
    let sheet = wb.sheet_at_mut(0).unwrap();

    sheet.set_value("B2", 99.0).unwrap();
    sheet
        .add_comment(1, 1, Comment::new("Ann", "Check this figure"))
        .unwrap();
    sheet
        .add_comment(4, 0, Comment::text_only("no author").with_visible(true))
        .unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.sheet_at(0).unwrap();

    assert_eq!(sheet2.comment_count(), 2);
    let first = sheet2.comment_at(1, 1).unwrap();
    assert_eq!(first.author, "Ann");
    assert_eq!(first.text.text(), "Check this figure");
    assert!(!first.visible);
    let second = sheet2.comment_at(4, 0).unwrap();
    assert!(!second.has_author());
    assert!(second.visible);
}

#[test]
fn test_roundtrip_tables() {
    let mut wb = Workbook::new();
    let sheet = wb.sheet_at_mut(0).unwrap();

    sheet.set_value("A1", "Region").unwrap();
    sheet.set_value("B1", "Total").unwrap();
    let table = sheet
        .create_table("Sales", CellRange::parse("A1:B4").unwrap())
        .unwrap();
    table.set_columns(&["Region", "Total"]).unwrap();
    table.totals_row_count = 1;

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.sheet_at(0).unwrap();

    let table2 = sheet2.table("Sales").unwrap();
    assert_eq!(table2.range, CellRange::parse("A1:B4").unwrap());
    assert_eq!(table2.totals_row_count, 1);
    let names: Vec<&str> = table2.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Region", "Total"]);
}

#[test]
fn test_roundtrip_drawing_shapes() {
    let mut wb = Workbook::new();
    let sheet = wb.sheet_at_mut(0).unwrap();

    let drawing = sheet.create_drawing_patriarch();
    drawing.create_shape(ShapeType::Ellipse, ClientAnchor::cells(1, 1, 4, 3));
    drawing.create_text_box(ClientAnchor::cells(6, 0, 8, 2), RichText::plain("Note"));

    let wb2 = roundtrip(&wb);
    let drawing2 = wb2.sheet_at(0).unwrap().drawing().unwrap();

    assert_eq!(drawing2.shape_count(), 2);
    assert_eq!(drawing2.shapes()[1].text().map(|t| t.text()), Some("Note".to_string()));
}

#[test]
fn test_roundtrip_pivot_table() {
    let mut wb = Workbook::empty();
    wb.create_sheet("Data").unwrap();
    wb.create_sheet("Report").unwrap();

    let data = wb.sheet_at_mut(0).unwrap();
    data.set_value("A1", "Region").unwrap();
    data.set_value("B1", "Sales").unwrap();
    data.set_value("A2", "North").unwrap();
    data.set_value("B2", 100.0).unwrap();
    data.set_value("A3", "South").unwrap();
    data.set_value("B3", 250.0).unwrap();

    let source = wb
        .pivot_source("Data", CellRange::parse("A1:B3").unwrap())
        .unwrap();
    let report = wb.sheet_at_mut(1).unwrap();
    let pivot = report
        .create_pivot_table(source, CellAddress::new(0, 0))
        .unwrap();
    pivot.add_row_label(0).unwrap();
    pivot.add_column_label(DataFunction::Sum, 1, None).unwrap();

    let wb2 = roundtrip(&wb);
    let pivots = wb2.sheet_at(1).unwrap().pivot_tables();

    assert_eq!(pivots.len(), 1);
    let pivot2 = &pivots[0];
    assert_eq!(pivot2.source.sheet_name, "Data");
    assert_eq!(pivot2.source.range, CellRange::parse("A1:B3").unwrap());
    assert_eq!(pivot2.row_label_columns(), vec![0]);
    assert_eq!(pivot2.data_fields().len(), 1);
    assert_eq!(pivot2.data_fields()[0].function, DataFunction::Sum);
    assert_eq!(pivot2.data_fields()[0].source_column, 1);
}

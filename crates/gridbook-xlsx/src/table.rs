//! tableN.xml mapping

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use gridbook_core::{CellRange, Table, TableStyleInfo};

use crate::error::{XlsxError, XlsxResult};
use crate::xml::escape_attr;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Serialize a table part.
pub fn write_table_xml(table: &Table) -> String {
    let mut attrs = format!(
        "id=\"{}\" name=\"{}\" displayName=\"{}\" ref=\"{}\"",
        table.id,
        escape_attr(&table.name),
        escape_attr(&table.display_name),
        table.range
    );
    if table.header_row_count != 1 {
        attrs.push_str(&format!(" headerRowCount=\"{}\"", table.header_row_count));
    }
    if table.totals_row_count != 0 {
        attrs.push_str(&format!(" totalsRowCount=\"{}\"", table.totals_row_count));
    }

    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<table xmlns=\"{MAIN_NS}\" {attrs}>"
    );
    if table.header_row_count == 1 {
        xml.push_str(&format!("\n    <autoFilter ref=\"{}\"/>", table.range));
    }
    xml.push_str(&format!(
        "\n    <tableColumns count=\"{}\">",
        table.columns().len()
    ));
    for column in table.columns() {
        xml.push_str(&format!(
            "\n        <tableColumn id=\"{}\" name=\"{}\"/>",
            column.id,
            escape_attr(&column.name)
        ));
    }
    xml.push_str("\n    </tableColumns>");
    if let Some(style) = &table.style_info {
        xml.push_str(&format!(
            "\n    <tableStyleInfo name=\"{}\" showFirstColumn=\"{}\" showLastColumn=\"{}\" showRowStripes=\"{}\" showColumnStripes=\"{}\"/>",
            escape_attr(&style.name),
            style.show_first_column as u8,
            style.show_last_column as u8,
            style.show_row_stripes as u8,
            style.show_column_stripes as u8
        ));
    }
    xml.push_str("\n</table>");
    xml
}

/// Parse a table part.
pub fn parse_table_xml(xml: &str) -> XlsxResult<Table> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut id = 0u32;
    let mut name = String::new();
    let mut display_name = None;
    let mut range = None;
    let mut header_row_count = 1u8;
    let mut totals_row_count = 0u8;
    let mut column_names: Vec<String> = Vec::new();
    let mut style_info = None;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"table" => {
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                        match attr.key.as_ref() {
                            b"id" => id = value.parse().unwrap_or(0),
                            b"name" => name = value,
                            b"displayName" => display_name = Some(value),
                            b"ref" => range = CellRange::parse(&value).ok(),
                            b"headerRowCount" => header_row_count = value.parse().unwrap_or(1),
                            b"totalsRowCount" => totals_row_count = value.parse().unwrap_or(0),
                            _ => {}
                        }
                    }
                }
                b"tableColumn" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"name" {
                            column_names.push(
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned(),
                            );
                        }
                    }
                }
                b"tableStyleInfo" => {
                    let mut style = TableStyleInfo::default();
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                        match attr.key.as_ref() {
                            b"name" => style.name = value,
                            b"showFirstColumn" => style.show_first_column = value == "1",
                            b"showLastColumn" => style.show_last_column = value == "1",
                            b"showRowStripes" => style.show_row_stripes = value == "1",
                            b"showColumnStripes" => style.show_column_stripes = value == "1",
                            _ => {}
                        }
                    }
                    style_info = Some(style);
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }

    let range =
        range.ok_or_else(|| XlsxError::Parse(format!("table '{name}' missing ref attribute")))?;
    let mut table = Table::new(name, id, range);
    if let Some(display_name) = display_name {
        table.set_display_name(display_name);
    }
    table.header_row_count = header_row_count;
    table.totals_row_count = totals_row_count;
    table.style_info = style_info;
    if !column_names.is_empty() {
        let names: Vec<&str> = column_names.iter().map(String::as_str).collect();
        table.set_columns(&names).map_err(XlsxError::Core)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_round_trip() {
        let mut table = Table::new("Sales", 3, CellRange::parse("B2:D8").unwrap());
        table.set_display_name("Sales 2024");
        table
            .set_columns(&["Region", "Product", "Total"])
            .unwrap();
        table.totals_row_count = 1;
        table.style_info = Some(TableStyleInfo::default());

        let xml = write_table_xml(&table);
        assert!(xml.contains("totalsRowCount=\"1\""));
        assert!(xml.contains("<autoFilter ref=\"B2:D8\"/>"));
        assert!(xml.contains("showRowStripes=\"1\""));

        let parsed = parse_table_xml(&xml).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn headerless_table_writes_no_autofilter() {
        let mut table = Table::new("Raw", 1, CellRange::parse("A1:B3").unwrap());
        table.header_row_count = 0;

        let xml = write_table_xml(&table);
        assert!(xml.contains("headerRowCount=\"0\""));
        assert!(!xml.contains("autoFilter"));

        let parsed = parse_table_xml(&xml).unwrap();
        assert_eq!(parsed.header_row_count, 0);
        assert_eq!(parsed.columns().len(), 2);
    }

    #[test]
    fn column_count_mismatch_is_a_core_error() {
        let xml = r#"<?xml version="1.0"?>
<table xmlns="x" id="1" name="T" displayName="T" ref="A1:C3">
    <tableColumns count="2">
        <tableColumn id="1" name="only"/>
        <tableColumn id="2" name="two"/>
    </tableColumns>
</table>"#;
        assert!(matches!(
            parse_table_xml(xml),
            Err(XlsxError::Core(_))
        ));
    }
}

//! pivotCacheDefinitionN.xml and pivotTableN.xml mapping
//!
//! The cache definition carries the source binding and one cacheField per
//! source column, named after the source header row. The table definition
//! carries the field layout; its `cacheId` ties it to the cache through the
//! workbook's pivotCaches list.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use gridbook_core::{
    CellAddress, CellRange, DataFunction, FieldRole, PivotSource, PivotTable,
    DATA_FIELDS_AS_COLUMNS,
};

use crate::error::{XlsxError, XlsxResult};
use crate::xml::escape_attr;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Serialize a pivot cache definition. `field_names` is the source header
/// row; missing entries fall back to positional names.
pub fn write_pivot_cache_xml(pivot: &PivotTable, field_names: &[String]) -> String {
    let width = pivot.source.width() as usize;
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<pivotCacheDefinition xmlns=\"{MAIN_NS}\" xmlns:r=\"{R_NS}\" refreshOnLoad=\"1\" recordCount=\"0\">"
    );
    xml.push_str("\n    <cacheSource type=\"worksheet\">");
    let mut source_attrs = format!(
        "ref=\"{}\" sheet=\"{}\"",
        pivot.source.range,
        escape_attr(&pivot.source.sheet_name)
    );
    if let Some(name) = &pivot.source.named_range {
        source_attrs.push_str(&format!(" name=\"{}\"", escape_attr(name)));
    }
    xml.push_str(&format!("\n        <worksheetSource {source_attrs}/>"));
    xml.push_str("\n    </cacheSource>");
    xml.push_str(&format!("\n    <cacheFields count=\"{width}\">"));
    for i in 0..width {
        let name = field_names
            .get(i)
            .cloned()
            .unwrap_or_else(|| format!("Field{}", i + 1));
        xml.push_str(&format!(
            "\n        <cacheField name=\"{}\" numFmtId=\"0\"><sharedItems/></cacheField>",
            escape_attr(&name)
        ));
    }
    xml.push_str("\n    </cacheFields>");
    xml.push_str("\n</pivotCacheDefinition>");
    xml
}

/// Parse a pivot cache definition into its source binding and field names.
pub fn parse_pivot_cache_xml(xml: &str) -> XlsxResult<(PivotSource, Vec<String>)> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut range = None;
    let mut sheet_name = String::new();
    let mut named_range = None;
    let mut field_names = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"worksheetSource" => {
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                        match attr.key.as_ref() {
                            b"ref" => range = CellRange::parse(&value).ok(),
                            b"sheet" => sheet_name = value,
                            b"name" => named_range = Some(value),
                            _ => {}
                        }
                    }
                }
                b"cacheField" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"name" {
                            field_names.push(
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned(),
                            );
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }

    let range = range.ok_or_else(|| {
        XlsxError::Parse("pivot cache worksheetSource missing ref".to_string())
    })?;
    Ok((
        PivotSource {
            range,
            sheet_name,
            named_range,
        },
        field_names,
    ))
}

/// Serialize a pivot table definition. `cache_id` is the workbook-level
/// pivotCache id the table binds to.
pub fn write_pivot_table_xml(
    pivot: &PivotTable,
    cache_id: u32,
    field_names: &[String],
) -> String {
    let width = pivot.source.width() as usize;
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<pivotTableDefinition xmlns=\"{MAIN_NS}\" name=\"{}\" cacheId=\"{cache_id}\" dataCaption=\"Values\">",
        escape_attr(&pivot.name)
    );
    xml.push_str(&format!(
        "\n    <location ref=\"{}\" firstHeaderRow=\"1\" firstDataRow=\"2\" firstDataCol=\"1\"/>",
        pivot.location
    ));

    // One pivotField per source column; the first configured role wins.
    xml.push_str(&format!("\n    <pivotFields count=\"{width}\">"));
    for col in 0..width as u16 {
        let role = pivot
            .fields()
            .iter()
            .find(|f| f.source_column == col)
            .map(|f| f.role);
        let has_data_field = pivot.data_fields().iter().any(|d| d.source_column == col);
        let attrs = match role {
            Some(FieldRole::RowLabel) => " axis=\"axisRow\"",
            Some(FieldRole::ReportFilter) => " axis=\"axisPage\"",
            Some(FieldRole::ColumnLabel) | Some(FieldRole::DataColumn) if has_data_field => {
                " dataField=\"1\""
            }
            _ => "",
        };
        xml.push_str(&format!("\n        <pivotField{attrs} showAll=\"0\"/>"));
    }
    xml.push_str("\n    </pivotFields>");

    let row_fields = pivot.row_label_columns();
    if !row_fields.is_empty() {
        xml.push_str(&format!("\n    <rowFields count=\"{}\">", row_fields.len()));
        for col in &row_fields {
            xml.push_str(&format!("<field x=\"{col}\"/>"));
        }
        xml.push_str("</rowFields>");
    }

    let col_fields = pivot.col_field_values();
    if !col_fields.is_empty() {
        xml.push_str(&format!("\n    <colFields count=\"{}\">", col_fields.len()));
        for x in &col_fields {
            xml.push_str(&format!("<field x=\"{x}\"/>"));
        }
        xml.push_str("</colFields>");
    }

    let page_fields = pivot.report_filter_columns();
    if !page_fields.is_empty() {
        xml.push_str(&format!(
            "\n    <pageFields count=\"{}\">",
            page_fields.len()
        ));
        for col in &page_fields {
            xml.push_str(&format!("<pageField fld=\"{col}\" hier=\"-1\"/>"));
        }
        xml.push_str("</pageFields>");
    }

    if !pivot.data_fields().is_empty() {
        xml.push_str(&format!(
            "\n    <dataFields count=\"{}\">",
            pivot.data_fields().len()
        ));
        for df in pivot.data_fields() {
            let field_name = field_names
                .get(df.source_column as usize)
                .cloned()
                .unwrap_or_else(|| format!("Field{}", df.source_column + 1));
            let caption = df
                .name
                .clone()
                .unwrap_or_else(|| format!("{} {field_name}", df.function.caption_prefix()));
            let mut attrs = format!(
                "name=\"{}\" fld=\"{}\"",
                escape_attr(&caption),
                df.source_column
            );
            if df.function != DataFunction::Sum {
                attrs.push_str(&format!(" subtotal=\"{}\"", df.function.as_str()));
            }
            xml.push_str(&format!(
                "\n        <dataField {attrs} baseField=\"0\" baseItem=\"0\"/>"
            ));
        }
        xml.push_str("\n    </dataFields>");
    }

    xml.push_str("\n</pivotTableDefinition>");
    xml
}

fn parse_function(s: &str) -> Option<DataFunction> {
    Some(match s {
        "sum" => DataFunction::Sum,
        "count" => DataFunction::Count,
        "average" => DataFunction::Average,
        "max" => DataFunction::Max,
        "min" => DataFunction::Min,
        "product" => DataFunction::Product,
        "countNums" => DataFunction::CountNums,
        "stdDev" => DataFunction::StdDev,
        "stdDevp" => DataFunction::StdDevP,
        "var" => DataFunction::Var,
        "varp" => DataFunction::VarP,
        _ => return None,
    })
}

/// Parse a pivot table definition against its cache's source binding.
///
/// Data fields are rebuilt as column labels; the distinction between a
/// column label and a data column that carried its own data field does not
/// survive in the part, and both forms reserialize identically.
pub fn parse_pivot_table_xml(
    xml: &str,
    source: PivotSource,
    pivot_id: u32,
) -> XlsxResult<PivotTable> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut name = String::new();
    let mut location = None;
    let mut row_fields: Vec<u16> = Vec::new();
    let mut page_fields: Vec<u16> = Vec::new();
    let mut saw_data_sentinel = false;
    let mut data_fields: Vec<(DataFunction, u16, Option<String>)> = Vec::new();
    let mut in_row_fields = false;
    let mut in_col_fields = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"pivotTableDefinition" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"name" {
                            name = attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                        }
                    }
                }
                b"location" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"ref" {
                            let value =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                            let anchor = value.split(':').next().unwrap_or(&value);
                            location = CellAddress::parse(anchor).ok();
                        }
                    }
                }
                b"rowFields" => in_row_fields = true,
                b"colFields" => in_col_fields = true,
                b"field" => {
                    let mut x: Option<i32> = None;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"x" {
                            x = attr
                                .unescape_value()
                                .map_err(XlsxError::Xml)?
                                .parse::<i32>()
                                .ok();
                        }
                    }
                    match x {
                        Some(x) if in_row_fields && x >= 0 => row_fields.push(x as u16),
                        Some(DATA_FIELDS_AS_COLUMNS) if in_col_fields => {
                            saw_data_sentinel = true
                        }
                        _ => {}
                    }
                }
                b"pageField" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"fld" {
                            if let Ok(fld) = attr
                                .unescape_value()
                                .map_err(XlsxError::Xml)?
                                .parse::<u16>()
                            {
                                page_fields.push(fld);
                            }
                        }
                    }
                }
                b"dataField" => {
                    let mut fld = None;
                    let mut function = DataFunction::Sum;
                    let mut caption = None;
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                        match attr.key.as_ref() {
                            b"fld" => fld = value.parse::<u16>().ok(),
                            b"subtotal" => {
                                function = parse_function(&value).ok_or_else(|| {
                                    XlsxError::Parse(format!("unknown pivot subtotal '{value}'"))
                                })?;
                            }
                            b"name" => caption = Some(value),
                            _ => {}
                        }
                    }
                    if let Some(fld) = fld {
                        data_fields.push((function, fld, caption));
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"rowFields" => in_row_fields = false,
                b"colFields" => in_col_fields = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }

    let location = location
        .ok_or_else(|| XlsxError::Parse("pivot table missing location ref".to_string()))?;
    let mut pivot = PivotTable::new(name, pivot_id, source, location);
    for col in row_fields {
        pivot.add_row_label(col).map_err(XlsxError::Core)?;
    }
    for col in page_fields {
        pivot.add_report_filter(col).map_err(XlsxError::Core)?;
    }
    for (function, fld, caption) in data_fields {
        pivot
            .add_column_label(function, fld, caption.as_deref())
            .map_err(XlsxError::Core)?;
    }
    // The sentinel is derived state; a parsed table with one data field and
    // a -2 col field would disagree, which only a hand-edited part can do.
    let _ = saw_data_sentinel;
    Ok(pivot)
}

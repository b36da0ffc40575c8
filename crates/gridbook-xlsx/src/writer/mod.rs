//! XLSX writer
//!
//! Saving assembles a fresh [`PartGraph`] every time: part names, content
//! types and relationship ids are recomputed from the workbook, never
//! persisted across load/save. Part bodies are buffered as strings and
//! streamed into the zip at the end, because relationship ids referenced
//! early (sheet order in workbook.xml) are only final once every part has
//! been visited.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;

use gridbook_core::{
    Cell, CellAddress, CellRange, CellValue, PivotSource, SharedStringTable, Workbook, Worksheet,
};

use crate::comments::{write_comments_xml, write_vml_comments};
use crate::drawing::write_drawing_xml;
use crate::error::{XlsxError, XlsxResult};
use crate::package::{content_type, rel_type, PartGraph};
use crate::pivot::{write_pivot_cache_xml, write_pivot_table_xml};
use crate::sst::{rich_text_xml, write_shared_strings};
use crate::styles::write_styles_xml;
use crate::table::write_table_xml;
use crate::xml::{escape_attr, escape_text};

/// XLSX file writer
pub struct XlsxWriter;

/// Width written for `<col>` records that never had one set. Excel refuses
/// a `<col>` element with no `width` attribute, so grouping-only records
/// get the sheet default (8.43 characters in Calibri 11) without the
/// `customWidth` marker, and the reader drops it again on load.
const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// Sequential part numbers, shared across sheets so names never collide.
#[derive(Debug, Default)]
struct PartCounters {
    drawing: u32,
    comment: u32,
    table: u32,
    pivot: u32,
    cache: u32,
}

impl XlsxWriter {
    /// Write a workbook to a file path.
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Write a workbook to a writer.
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        if workbook.sheet_count() == 0 {
            return Err(XlsxError::InvalidFormat(
                "workbook has no sheets to save".into(),
            ));
        }

        let mut graph = PartGraph::new();
        let mut sst = SharedStringTable::new();
        let mut counters = PartCounters::default();
        // (part name, body), streamed into the zip in push order
        let mut parts: Vec<(String, String)> = Vec::new();
        // (cacheId, workbook rId) per pivot cache definition
        let mut pivot_caches: Vec<(u32, String)> = Vec::new();

        graph.add_relationship("", rel_type::OFFICE_DOCUMENT, "xl/workbook.xml", false);
        graph.add_part("xl/workbook.xml", content_type::WORKBOOK);
        graph.add_part("xl/styles.xml", content_type::STYLES);

        // Sheet relationships first, so rId order matches sheet order.
        let sheet_rids: Vec<String> = (0..workbook.sheet_count())
            .map(|i| {
                graph.add_part(
                    format!("xl/worksheets/sheet{}.xml", i + 1),
                    content_type::WORKSHEET,
                );
                graph.add_relationship(
                    "xl/workbook.xml",
                    rel_type::WORKSHEET,
                    format!("worksheets/sheet{}.xml", i + 1),
                    false,
                )
            })
            .collect();

        for (i, sheet) in workbook.sheets().enumerate() {
            let part_name = format!("xl/worksheets/sheet{}.xml", i + 1);
            let xml = Self::sheet_xml(
                workbook,
                sheet,
                &part_name,
                &mut graph,
                &mut sst,
                &mut counters,
                &mut parts,
                &mut pivot_caches,
            );
            parts.push((part_name, xml));
        }

        graph.add_relationship("xl/workbook.xml", rel_type::STYLES, "styles.xml", false);
        if !sst.is_empty() {
            graph.add_part("xl/sharedStrings.xml", content_type::SHARED_STRINGS);
            graph.add_relationship(
                "xl/workbook.xml",
                rel_type::SHARED_STRINGS,
                "sharedStrings.xml",
                false,
            );
        }

        let mut zip = zip::ZipWriter::new(writer);
        let options = SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(graph.content_types_xml().as_bytes())?;

        // A .rels part for every source that accumulated relationships.
        let mut rel_sources = vec![String::new(), "xl/workbook.xml".to_string()];
        rel_sources.extend(parts.iter().map(|(name, _)| name.clone()));
        for source in rel_sources {
            if graph.relationships(&source).is_empty() {
                continue;
            }
            zip.start_file(PartGraph::rels_part_name(&source), options)?;
            zip.write_all(graph.rels_xml(&source).as_bytes())?;
        }

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(Self::workbook_xml(workbook, &sheet_rids, &pivot_caches).as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(write_styles_xml(workbook.styles()).as_bytes())?;

        if !sst.is_empty() {
            zip.start_file("xl/sharedStrings.xml", options)?;
            zip.write_all(write_shared_strings(&sst).as_bytes())?;
        }

        for (name, body) in &parts {
            zip.start_file(name, options)?;
            zip.write_all(body.as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    fn workbook_xml(
        workbook: &Workbook,
        sheet_rids: &[String],
        pivot_caches: &[(u32, String)],
    ) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );

        if workbook.is_date_1904() {
            xml.push_str("\n    <workbookPr date1904=\"1\"/>");
        }
        if workbook.active_sheet() != 0 {
            xml.push_str(&format!(
                "\n    <bookViews><workbookView activeTab=\"{}\"/></bookViews>",
                workbook.active_sheet()
            ));
        }

        xml.push_str("\n    <sheets>");
        for (i, sheet) in workbook.sheets().enumerate() {
            let state = if sheet.is_visible() {
                ""
            } else {
                " state=\"hidden\""
            };
            xml.push_str(&format!(
                "\n        <sheet name=\"{}\" sheetId=\"{}\"{} r:id=\"{}\"/>",
                escape_attr(sheet.name()),
                i + 1,
                state,
                sheet_rids[i]
            ));
        }
        xml.push_str("\n    </sheets>");

        if !workbook.named_ranges().is_empty() {
            xml.push_str("\n    <definedNames>");
            for nr in workbook.named_ranges() {
                xml.push_str(&format!(
                    "\n        <definedName name=\"{}\">{}!{}</definedName>",
                    escape_attr(&nr.name),
                    quote_sheet_name(&nr.sheet_name),
                    absolute_range(&nr.range)
                ));
            }
            xml.push_str("\n    </definedNames>");
        }

        if workbook.calc_on_open() {
            xml.push_str("\n    <calcPr fullCalcOnLoad=\"1\"/>");
        }

        if !pivot_caches.is_empty() {
            xml.push_str("\n    <pivotCaches>");
            for (cache_id, rid) in pivot_caches {
                xml.push_str(&format!(
                    "\n        <pivotCache cacheId=\"{cache_id}\" r:id=\"{rid}\"/>"
                ));
            }
            xml.push_str("\n    </pivotCaches>");
        }

        xml.push_str("\n</workbook>");
        xml
    }

    #[allow(clippy::too_many_arguments)]
    fn sheet_xml(
        workbook: &Workbook,
        sheet: &Worksheet,
        part_name: &str,
        graph: &mut PartGraph,
        sst: &mut SharedStringTable,
        counters: &mut PartCounters,
        parts: &mut Vec<(String, String)>,
        pivot_caches: &mut Vec<(u32, String)>,
    ) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );

        if !sheet.row_sums_below() {
            xml.push_str("\n    <sheetPr><outlinePr summaryBelow=\"0\"/></sheetPr>");
        }
        if sheet.is_selected() {
            xml.push_str(
                "\n    <sheetViews><sheetView workbookViewId=\"0\" tabSelected=\"1\"/></sheetViews>",
            );
        }

        let max_row_level = Self::max_row_outline_level(sheet);
        let max_col_level = sheet
            .columns()
            .iter()
            .map(|r| r.outline_level)
            .max()
            .unwrap_or(0);
        xml.push_str("\n    <sheetFormatPr defaultRowHeight=\"15\"");
        if max_row_level > 0 {
            xml.push_str(&format!(" outlineLevelRow=\"{max_row_level}\""));
        }
        if max_col_level > 0 {
            xml.push_str(&format!(" outlineLevelCol=\"{max_col_level}\""));
        }
        xml.push_str("/>");

        if !sheet.columns().is_empty() {
            xml.push_str("\n    <cols>");
            for rec in sheet.columns().iter() {
                xml.push_str(&format!(
                    "\n        <col min=\"{}\" max=\"{}\"",
                    rec.first + 1,
                    rec.last + 1
                ));
                match rec.width {
                    Some(width) => {
                        xml.push_str(&format!(" width=\"{width}\" customWidth=\"1\""))
                    }
                    None => xml.push_str(&format!(" width=\"{DEFAULT_COLUMN_WIDTH}\"")),
                }
                if let Some(style) = rec.style {
                    xml.push_str(&format!(" style=\"{style}\""));
                }
                if rec.hidden {
                    xml.push_str(" hidden=\"1\"");
                }
                if rec.outline_level > 0 {
                    xml.push_str(&format!(" outlineLevel=\"{}\"", rec.outline_level));
                }
                if rec.collapsed {
                    xml.push_str(" collapsed=\"1\"");
                }
                xml.push_str("/>");
            }
            xml.push_str("\n    </cols>");
        }

        xml.push_str("\n    <sheetData>");
        // Rows carrying only outline state (no cells) still need a <row>
        // element, or the grouping would not survive a reload.
        let mut row_indices: BTreeSet<u32> = sheet.rows().map(|(i, _)| i).collect();
        for span in sheet.row_groups() {
            row_indices.extend(span.start..=span.end);
            if let Some(summary) = span.summary_row(sheet.row_sums_below()) {
                row_indices.insert(summary);
            }
        }
        for index in row_indices {
            let row = sheet.row(index);
            let outline = sheet.row_outline(index);

            let mut attrs = format!(" r=\"{}\"", index + 1);
            if let Some(height) = row.and_then(|r| r.height()) {
                attrs.push_str(&format!(" ht=\"{height}\" customHeight=\"1\""));
            }
            if row.map_or(false, |r| r.is_hidden()) || outline.hidden {
                attrs.push_str(" hidden=\"1\"");
            }
            if outline.level > 0 {
                attrs.push_str(&format!(" outlineLevel=\"{}\"", outline.level));
            }
            if outline.collapsed {
                attrs.push_str(" collapsed=\"1\"");
            }

            let mut cells = String::new();
            if let Some(row) = row {
                for (col, cell) in row.cells() {
                    if let Some(cell_xml) =
                        Self::cell_xml(index, col, cell, sst, workbook.uses_inline_strings())
                    {
                        cells.push_str("\n            ");
                        cells.push_str(&cell_xml);
                    }
                }
            }

            if cells.is_empty() {
                xml.push_str(&format!("\n        <row{attrs}/>"));
            } else {
                xml.push_str(&format!("\n        <row{attrs}>{cells}\n        </row>"));
            }
        }
        xml.push_str("\n    </sheetData>");

        if !sheet.merged_regions().is_empty() {
            xml.push_str(&format!(
                "\n    <mergeCells count=\"{}\">",
                sheet.merged_regions().len()
            ));
            for range in sheet.merged_regions() {
                xml.push_str(&format!("\n        <mergeCell ref=\"{range}\"/>"));
            }
            xml.push_str("\n    </mergeCells>");
        }

        Self::write_data_validations(&mut xml, sheet);
        Self::write_hyperlinks(&mut xml, sheet, part_name, graph);

        if let Some(drawing) = sheet.drawing().filter(|d| !d.shapes().is_empty()) {
            counters.drawing += 1;
            let n = counters.drawing;
            let drawing_part = format!("xl/drawings/drawing{n}.xml");
            let (drawing_xml, picture_targets) = write_drawing_xml(drawing);
            graph.add_part(drawing_part.clone(), content_type::DRAWING);
            for target in picture_targets {
                graph.add_relationship(&drawing_part, rel_type::IMAGE, target, false);
            }
            parts.push((drawing_part, drawing_xml));
            let rid = graph.add_relationship(
                part_name,
                rel_type::DRAWING,
                format!("../drawings/drawing{n}.xml"),
                false,
            );
            xml.push_str(&format!("\n    <drawing r:id=\"{rid}\"/>"));
        }

        if sheet.comment_count() > 0 {
            counters.comment += 1;
            let n = counters.comment;
            let comments = sheet.comments_sorted();
            let comments_part = format!("xl/comments{n}.xml");
            graph.add_part(comments_part.clone(), content_type::COMMENTS);
            graph.add_relationship(
                part_name,
                rel_type::COMMENTS,
                format!("../comments{n}.xml"),
                false,
            );
            parts.push((comments_part, write_comments_xml(&comments)));
            let vml_part = format!("xl/drawings/vmlDrawing{n}.vml");
            let rid = graph.add_relationship(
                part_name,
                rel_type::VML_DRAWING,
                format!("../drawings/vmlDrawing{n}.vml"),
                false,
            );
            parts.push((vml_part, write_vml_comments(&comments)));
            xml.push_str(&format!("\n    <legacyDrawing r:id=\"{rid}\"/>"));
        }

        if !sheet.tables().is_empty() {
            let mut rids = Vec::new();
            for table in sheet.tables() {
                counters.table += 1;
                let n = counters.table;
                let table_part = format!("xl/tables/table{n}.xml");
                graph.add_part(table_part.clone(), content_type::TABLE);
                parts.push((table_part, write_table_xml(table)));
                rids.push(graph.add_relationship(
                    part_name,
                    rel_type::TABLE,
                    format!("../tables/table{n}.xml"),
                    false,
                ));
            }
            xml.push_str(&format!("\n    <tableParts count=\"{}\">", rids.len()));
            for rid in rids {
                xml.push_str(&format!("<tablePart r:id=\"{rid}\"/>"));
            }
            xml.push_str("</tableParts>");
        }

        for pivot in sheet.pivot_tables() {
            let field_names = pivot_field_names(workbook, &pivot.source);

            counters.cache += 1;
            let cache_no = counters.cache;
            let cache_part = format!("xl/pivotCache/pivotCacheDefinition{cache_no}.xml");
            graph.add_part(cache_part.clone(), content_type::PIVOT_CACHE);
            parts.push((cache_part.clone(), write_pivot_cache_xml(pivot, &field_names)));
            let cache_rid = graph.add_relationship(
                "xl/workbook.xml",
                rel_type::PIVOT_CACHE,
                format!("pivotCache/pivotCacheDefinition{cache_no}.xml"),
                false,
            );
            pivot_caches.push((cache_no, cache_rid));

            counters.pivot += 1;
            let pivot_no = counters.pivot;
            let pivot_part = format!("xl/pivotTables/pivotTable{pivot_no}.xml");
            graph.add_part(pivot_part.clone(), content_type::PIVOT_TABLE);
            graph.add_relationship(
                &pivot_part,
                rel_type::PIVOT_CACHE,
                format!("../pivotCache/pivotCacheDefinition{cache_no}.xml"),
                false,
            );
            parts.push((
                pivot_part,
                write_pivot_table_xml(pivot, cache_no, &field_names),
            ));
            graph.add_relationship(
                part_name,
                rel_type::PIVOT_TABLE,
                format!("../pivotTables/pivotTable{pivot_no}.xml"),
                false,
            );
        }

        xml.push_str("\n</worksheet>");
        xml
    }

    /// One `<c>` element, or `None` for a blank cell with nothing to keep.
    fn cell_xml(
        row: u32,
        col: u16,
        cell: &Cell,
        sst: &mut SharedStringTable,
        inline_strings: bool,
    ) -> Option<String> {
        let cell_ref = CellAddress::new(row, col);
        let style_attr = cell
            .style()
            .map(|s| format!(" s=\"{s}\""))
            .unwrap_or_default();

        let body = match cell.value() {
            CellValue::Blank => {
                if cell.style().is_none() && cell.array_range().is_none() {
                    return None;
                }
                String::new()
            }
            CellValue::Number(n) => format!("><v>{n}</v></c"),
            CellValue::Boolean(b) => format!(" t=\"b\"><v>{}</v></c", *b as u8),
            CellValue::String(text) => {
                if inline_strings {
                    format!(" t=\"inlineStr\"><is>{}</is></c", rich_text_xml(text))
                } else {
                    let index = sst.get_or_create(text.clone());
                    format!(" t=\"s\"><v>{index}</v></c")
                }
            }
            CellValue::Error(e) => format!(" t=\"e\"><v>{}</v></c", e.as_str()),
            CellValue::Formula { text, cached } => {
                let f = match cell.array_range() {
                    Some(range) if range.first.row == row && range.first.col == col => {
                        format!(
                            "<f t=\"array\" ref=\"{range}\">{}</f>",
                            escape_text(text)
                        )
                    }
                    _ => format!("<f>{}</f>", escape_text(text)),
                };
                match cached.as_deref() {
                    Some(CellValue::Number(n)) => format!(">{f}<v>{n}</v></c"),
                    Some(CellValue::Boolean(b)) => {
                        format!(" t=\"b\">{f}<v>{}</v></c", *b as u8)
                    }
                    Some(CellValue::String(rt)) => {
                        format!(" t=\"str\">{f}<v>{}</v></c", escape_text(&rt.text()))
                    }
                    Some(CellValue::Error(e)) => format!(" t=\"e\">{f}<v>{}</v></c", e.as_str()),
                    _ => format!(">{f}</c"),
                }
            }
        };

        if body.is_empty() {
            Some(format!("<c r=\"{cell_ref}\"{style_attr}/>"))
        } else {
            Some(format!("<c r=\"{cell_ref}\"{style_attr}{body}>"))
        }
    }

    fn write_data_validations(xml: &mut String, sheet: &Worksheet) {
        let validations = sheet.data_validations();
        if validations.is_empty() {
            return;
        }
        xml.push_str(&format!(
            "\n    <dataValidations count=\"{}\">",
            validations.len()
        ));
        for v in validations {
            if v.ranges.is_empty() {
                continue;
            }
            let sqref: String = v
                .ranges
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(" ");

            let mut attrs = format!(" type=\"{}\"", v.constraint.xlsx_type());
            if let Some(op) = v.constraint.operator() {
                attrs.push_str(&format!(" operator=\"{}\"", op.xlsx_operator()));
            }
            if v.allow_blank {
                attrs.push_str(" allowBlank=\"1\"");
            }
            // The attribute suppresses the dropdown, despite its name.
            if !v.show_dropdown {
                attrs.push_str(" showDropDown=\"1\"");
            }
            if v.show_input_message {
                attrs.push_str(" showInputMessage=\"1\"");
            }
            if v.show_error_alert {
                attrs.push_str(" showErrorMessage=\"1\"");
            }
            if v.error_style != gridbook_core::ValidationErrorStyle::Stop {
                attrs.push_str(&format!(" errorStyle=\"{}\"", v.error_style.xlsx_style()));
            }
            if let Some(title) = &v.error_title {
                attrs.push_str(&format!(" errorTitle=\"{}\"", escape_attr(title)));
            }
            if let Some(msg) = &v.error_message {
                attrs.push_str(&format!(" error=\"{}\"", escape_attr(msg)));
            }
            if let Some(title) = &v.input_title {
                attrs.push_str(&format!(" promptTitle=\"{}\"", escape_attr(title)));
            }
            if let Some(msg) = &v.input_message {
                attrs.push_str(&format!(" prompt=\"{}\"", escape_attr(msg)));
            }

            xml.push_str(&format!(
                "\n        <dataValidation{attrs} sqref=\"{sqref}\">"
            ));
            let (f1, f2) = v.constraint.formulas();
            if let Some(f1) = f1 {
                xml.push_str(&format!("<formula1>{}</formula1>", escape_text(f1)));
            }
            if let Some(f2) = f2 {
                xml.push_str(&format!("<formula2>{}</formula2>", escape_text(f2)));
            }
            xml.push_str("</dataValidation>");
        }
        xml.push_str("\n    </dataValidations>");
    }

    fn write_hyperlinks(
        xml: &mut String,
        sheet: &Worksheet,
        part_name: &str,
        graph: &mut PartGraph,
    ) {
        if sheet.hyperlinks().is_empty() {
            return;
        }
        xml.push_str("\n    <hyperlinks>");
        for link in sheet.hyperlinks() {
            let tooltip = link
                .tooltip
                .as_ref()
                .map(|t| format!(" tooltip=\"{}\"", escape_attr(t)))
                .unwrap_or_default();
            if link.is_external() {
                let rid =
                    graph.add_relationship(part_name, rel_type::HYPERLINK, link.target.clone(), true);
                xml.push_str(&format!(
                    "\n        <hyperlink ref=\"{}\" r:id=\"{rid}\"{tooltip}/>",
                    link.range
                ));
            } else {
                xml.push_str(&format!(
                    "\n        <hyperlink ref=\"{}\" location=\"{}\"{tooltip}/>",
                    link.range,
                    escape_attr(&link.target)
                ));
            }
        }
        xml.push_str("\n    </hyperlinks>");
    }

    fn max_row_outline_level(sheet: &Worksheet) -> u8 {
        sheet
            .row_groups()
            .iter()
            .flat_map(|span| [span.start, span.end])
            .map(|row| sheet.row_outline(row).level)
            .max()
            .unwrap_or(0)
    }
}

/// Field names for a pivot source: the header row's cell text, column by
/// column, with positional fallbacks for blanks.
pub(crate) fn pivot_field_names(workbook: &Workbook, source: &PivotSource) -> Vec<String> {
    let sheet = workbook.sheet_by_name(&source.sheet_name);
    let header_row = source.range.first.row;
    (source.range.first.col..=source.range.last.col)
        .map(|col| {
            sheet
                .and_then(|s| s.cell_at(header_row, col))
                .and_then(|c| c.value().as_string())
                .unwrap_or_else(|| format!("Field{}", col - source.range.first.col + 1))
        })
        .collect()
}

fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.chars().next().map_or(false, |c| c.is_ascii_digit());
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

fn absolute_range(range: &CellRange) -> String {
    CellRange {
        first: CellAddress::absolute(range.first.row, range.first.col),
        last: CellAddress::absolute(range.last.row, range.last.col),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn save(workbook: &Workbook) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        XlsxWriter::write(workbook, &mut cursor).unwrap();
        cursor.into_inner()
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut body = String::new();
        file.read_to_string(&mut body).unwrap();
        body
    }

    #[test]
    fn empty_workbook_is_rejected() {
        let wb = Workbook::empty();
        assert!(matches!(
            XlsxWriter::write(&wb, Cursor::new(Vec::new())),
            Err(XlsxError::InvalidFormat(_))
        ));
    }

    #[test]
    fn basic_package_layout() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_at_mut(0).unwrap();
        sheet.set_value("A1", "hello").unwrap();
        sheet.set_value("B1", 42.5).unwrap();
        sheet.set_value("C1", true).unwrap();

        let bytes = save(&wb);

        let types = part(&bytes, "[Content_Types].xml");
        assert!(types.contains("/xl/workbook.xml"));
        assert!(types.contains("/xl/worksheets/sheet1.xml"));
        assert!(types.contains("/xl/sharedStrings.xml"));

        let sheet_xml = part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet_xml.contains("<c r=\"A1\" t=\"s\"><v>0</v></c>"));
        assert!(sheet_xml.contains("<c r=\"B1\"><v>42.5</v></c>"));
        assert!(sheet_xml.contains("<c r=\"C1\" t=\"b\"><v>1</v></c>"));

        let sst = part(&bytes, "xl/sharedStrings.xml");
        assert!(sst.contains("<t>hello</t>"));

        let wb_xml = part(&bytes, "xl/workbook.xml");
        assert!(wb_xml.contains("name=\"Sheet1\""));
    }

    #[test]
    fn formulas_carry_cached_results_and_array_refs() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_at_mut(0).unwrap();
        sheet.set_value("A1", 2.0).unwrap();
        sheet.set_value("A2", 10.0).unwrap();
        sheet.set_formula("A2", "=A1*5").unwrap();
        sheet
            .set_array_formula("A1:B1*2", CellRange::parse("D1:E1").unwrap())
            .unwrap();

        let bytes = save(&wb);
        let sheet_xml = part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet_xml.contains("<c r=\"A2\"><f>A1*5</f><v>10</v></c>"));
        assert!(sheet_xml.contains("<f t=\"array\" ref=\"D1:E1\">A1:B1*2</f>"));
        // Member cells of the array get no formula of their own
        assert!(!sheet_xml.contains("<c r=\"E1\"><f>"));
    }

    #[test]
    fn grouped_rows_and_summary_direction() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_at_mut(0).unwrap();
        sheet.set_row_sums_below(false);
        sheet.group_rows(3, 5).unwrap();
        sheet.set_row_group_collapsed(3, true);

        let bytes = save(&wb);
        let sheet_xml = part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet_xml.contains("<outlinePr summaryBelow=\"0\"/>"));
        assert!(sheet_xml.contains("outlineLevelRow=\"1\""));
        // Grouped rows are written even though they hold no cells
        assert!(sheet_xml.contains("<row r=\"4\" hidden=\"1\" outlineLevel=\"1\"/>"));
        // Summary row above the span carries the collapse marker
        assert!(sheet_xml.contains("<row r=\"3\" collapsed=\"1\"/>"));
    }

    #[test]
    fn every_col_record_carries_a_width() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_at_mut(0).unwrap();
        sheet.set_column_width(4, 5, 20.0).unwrap();
        sheet.group_columns(4, 7).unwrap();
        sheet.group_columns(9, 12).unwrap();

        let bytes = save(&wb);
        let sheet_xml = part(&bytes, "xl/worksheets/sheet1.xml");
        for element in sheet_xml.split("<col ").skip(1) {
            let attrs = element.split("/>").next().unwrap();
            assert!(attrs.contains(" width=\""), "<col {attrs}");
        }
        // Explicit widths keep customWidth, default-width fills do not
        assert!(sheet_xml.contains("width=\"20\" customWidth=\"1\""));
        assert!(sheet_xml
            .contains("<col min=\"7\" max=\"8\" width=\"8.43\" outlineLevel=\"1\"/>"));
    }

    #[test]
    fn sheet_aux_parts_get_relationships() {
        let mut wb = Workbook::new();
        let range = CellRange::parse("A1:B3").unwrap();
        let sheet = wb.sheet_at_mut(0).unwrap();
        sheet.set_value("A1", "Name").unwrap();
        sheet.set_value("B1", "Total").unwrap();
        sheet.create_table("Data", range).unwrap();
        sheet
            .add_hyperlink(gridbook_core::Hyperlink::url(
                CellRange::parse("C1").unwrap(),
                "https://example.com",
            ));
        sheet
            .add_comment(0, 0, gridbook_core::Comment::new("reviewer", "check this"))
            .unwrap();

        let bytes = save(&wb);
        let sheet_xml = part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet_xml.contains("<tableParts count=\"1\">"));
        assert!(sheet_xml.contains("<legacyDrawing r:id="));
        assert!(sheet_xml.contains("<hyperlink ref=\"C1\" r:id="));

        let rels = part(&bytes, "xl/worksheets/_rels/sheet1.xml.rels");
        assert!(rels.contains("Target=\"../tables/table1.xml\""));
        assert!(rels.contains("Target=\"../comments1.xml\""));
        assert!(rels.contains("Target=\"https://example.com\" TargetMode=\"External\""));

        let table_xml = part(&bytes, "xl/tables/table1.xml");
        assert!(table_xml.contains("name=\"Data\""));
    }

    #[test]
    fn pivot_parts_bind_through_the_workbook_cache() {
        let mut wb = Workbook::new();
        {
            let sheet = wb.sheet_at_mut(0).unwrap();
            sheet.set_value("A1", "Region").unwrap();
            sheet.set_value("B1", "Sales").unwrap();
            sheet.set_value("A2", "North").unwrap();
            sheet.set_value_at(1, 1, 100.0).unwrap();
        }
        let source = wb
            .pivot_source("Sheet1", CellRange::parse("A1:B2").unwrap())
            .unwrap();
        {
            let sheet = wb.sheet_at_mut(0).unwrap();
            let pivot = sheet
                .create_pivot_table(source, CellAddress::parse("D1").unwrap())
                .unwrap();
            pivot.add_row_label(0).unwrap();
            pivot
                .add_column_label(gridbook_core::DataFunction::Sum, 1, None)
                .unwrap();
        }

        let bytes = save(&wb);
        let wb_xml = part(&bytes, "xl/workbook.xml");
        assert!(wb_xml.contains("<pivotCache cacheId=\"1\""));

        let cache = part(&bytes, "xl/pivotCache/pivotCacheDefinition1.xml");
        assert!(cache.contains("Region"));

        let pivot = part(&bytes, "xl/pivotTables/pivotTable1.xml");
        assert!(pivot.contains("cacheId=\"1\""));
        assert!(pivot.contains("Sum of Sales"));
        assert!(pivot.contains("fld=\"1\""));

        let pivot_rels = part(&bytes, "xl/pivotTables/_rels/pivotTable1.xml.rels");
        assert!(pivot_rels.contains("pivotCacheDefinition1.xml"));
    }

    #[test]
    fn defined_names_are_sheet_qualified_and_absolute() {
        let mut wb = Workbook::new();
        wb.create_sheet("My Data").unwrap();
        wb.add_named_range("Src", "My Data", CellRange::parse("A1:C2").unwrap())
            .unwrap();

        let bytes = save(&wb);
        let wb_xml = part(&bytes, "xl/workbook.xml");
        assert!(wb_xml.contains("<definedName name=\"Src\">'My Data'!$A$1:$C$2</definedName>"));
    }
}

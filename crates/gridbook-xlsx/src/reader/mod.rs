//! XLSX reader
//!
//! Loading walks the package relationship graph instead of assuming file
//! names: `[Content_Types].xml` and the `.rels` parts locate the workbook,
//! its registries and every sheet-level part. Missing `r`/`ref` attributes
//! in sheet data are reconstructed purely from position, so a file written
//! without them still loads into the same model.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use ahash::AHashMap;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use gridbook_core::{
    CellAddress, CellError, CellRange, CellValue, ColumnRecord, DataValidation, Font, GroupSpan,
    Hyperlink, HyperlinkKind, RichText, TextRun, ValidationConstraint, ValidationErrorStyle,
    ValidationOperator, Workbook, Worksheet,
};

use crate::comments::{parse_comments_xml, parse_vml_comments, VmlCommentShape};
use crate::drawing::parse_drawing_xml;
use crate::error::{XlsxError, XlsxResult};
use crate::package::{rel_type, PartGraph, Relationship};
use crate::pivot::{parse_pivot_cache_xml, parse_pivot_table_xml};
use crate::sst::parse_shared_strings;
use crate::styles::{parse_styles_xml, FontBuilder};
use crate::table::parse_table_xml;
use crate::xml::decode_excel_escapes;

/// XLSX file reader
pub struct XlsxReader;

#[derive(Debug, Default)]
struct SheetEntry {
    name: String,
    visible: bool,
    rid: String,
}

#[derive(Debug, Default)]
struct WorkbookMeta {
    sheets: Vec<SheetEntry>,
    named_ranges: Vec<(String, String, CellRange)>,
    active_tab: usize,
    date_1904: bool,
    calc_on_open: bool,
}

/// Per-row attributes collected while walking sheetData, used afterwards to
/// rebuild group spans and physical row properties.
#[derive(Debug, Default, Clone, Copy)]
struct RowMeta {
    height: Option<f64>,
    hidden: bool,
    level: u8,
    collapsed: bool,
}

impl XlsxReader {
    /// Read a workbook from a file path.
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader.
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut graph = PartGraph::new();

        graph.parse_content_types(&read_part(&mut archive, "[Content_Types].xml")?)?;
        graph.parse_rels("", &read_part(&mut archive, "_rels/.rels")?)?;

        let workbook_part = graph
            .relationship_of_type("", rel_type::OFFICE_DOCUMENT)
            .map(|r| PartGraph::resolve_target("", &r.target))
            .ok_or_else(|| XlsxError::MissingPart("workbook".to_string()))?;

        let wb_rels_name = PartGraph::rels_part_name(&workbook_part);
        if let Some(xml) = try_read_part(&mut archive, &wb_rels_name)? {
            graph.parse_rels(&workbook_part, &xml)?;
        }

        let mut wb = Workbook::empty();

        let sst_entries = match graph.relationship_of_type(&workbook_part, rel_type::SHARED_STRINGS)
        {
            Some(rel) => {
                let part = PartGraph::resolve_target(&workbook_part, &rel.target);
                parse_shared_strings(&read_part(&mut archive, &part)?)?
            }
            None => Vec::new(),
        };

        // Styles are re-interned: the xf at each on-disk index maps to a
        // registry-local index, deduplicated against the seeded defaults.
        let style_map: Vec<Option<u32>> =
            match graph.relationship_of_type(&workbook_part, rel_type::STYLES) {
                Some(rel) => {
                    let part = PartGraph::resolve_target(&workbook_part, &rel.target);
                    let parsed = parse_styles_xml(&read_part(&mut archive, &part)?)?;
                    parsed.install_formats(wb.styles_mut());
                    (0..parsed.xfs.len())
                        .map(|i| parsed.intern_xf(wb.styles_mut(), i as u32))
                        .collect()
                }
                None => Vec::new(),
            };

        let meta = parse_workbook_xml(&read_part(&mut archive, &workbook_part)?)?;
        wb.set_date_1904(meta.date_1904);
        wb.set_calc_on_open(meta.calc_on_open);

        let mut pivot_counter = 0u32;

        for entry in &meta.sheets {
            let sheet_part = graph
                .relationship_target(&workbook_part, &entry.rid)
                .map(|t| PartGraph::resolve_target(&workbook_part, t))
                .ok_or_else(|| {
                    XlsxError::Parse(format!(
                        "sheet '{}' references unknown relationship '{}'",
                        entry.name, entry.rid
                    ))
                })?;

            let rels_name = PartGraph::rels_part_name(&sheet_part);
            if let Some(xml) = try_read_part(&mut archive, &rels_name)? {
                graph.parse_rels(&sheet_part, &xml)?;
            }
            let rels: Vec<Relationship> = graph.relationships(&sheet_part).to_vec();

            let sheet_xml = read_part(&mut archive, &sheet_part)?;
            let sheet = wb.create_sheet(&entry.name).map_err(XlsxError::Core)?;
            if !entry.visible {
                sheet.set_visible(false);
            }
            parse_sheet_xml(&sheet_xml, sheet, &sst_entries, &style_map, &rels)?;

            // Sheet-level parts hang off the sheet's relationships.
            if let Some(rel) = rels.iter().find(|r| r.rel_type == rel_type::DRAWING) {
                let drawing_part = PartGraph::resolve_target(&sheet_part, &rel.target);
                let drawing_rels_name = PartGraph::rels_part_name(&drawing_part);
                if let Some(xml) = try_read_part(&mut archive, &drawing_rels_name)? {
                    graph.parse_rels(&drawing_part, &xml)?;
                }
                let drawing = parse_drawing_xml(
                    &read_part(&mut archive, &drawing_part)?,
                    graph.relationships(&drawing_part),
                )?;
                sheet.set_drawing(Some(drawing));
            }

            if let Some(rel) = rels.iter().find(|r| r.rel_type == rel_type::COMMENTS) {
                let comments_part = PartGraph::resolve_target(&sheet_part, &rel.target);
                let comments = parse_comments_xml(&read_part(&mut archive, &comments_part)?)?;
                let shapes: AHashMap<(u32, u16), VmlCommentShape> = match rels
                    .iter()
                    .find(|r| r.rel_type == rel_type::VML_DRAWING)
                {
                    Some(vml_rel) => {
                        let vml_part = PartGraph::resolve_target(&sheet_part, &vml_rel.target);
                        parse_vml_comments(&read_part(&mut archive, &vml_part)?)?
                            .into_iter()
                            .map(|s| ((s.row, s.col), s))
                            .collect()
                    }
                    None => AHashMap::new(),
                };
                for ((row, col), comment) in comments {
                    let comment = match shapes.get(&(row, col)) {
                        Some(shape) => comment
                            .with_visible(shape.visible)
                            .with_shape_anchor(shape.anchor),
                        None => comment,
                    };
                    sheet
                        .add_comment(row, col, comment)
                        .map_err(XlsxError::Core)?;
                }
            }

            for rel in rels.iter().filter(|r| r.rel_type == rel_type::TABLE) {
                let table_part = PartGraph::resolve_target(&sheet_part, &rel.target);
                let table = parse_table_xml(&read_part(&mut archive, &table_part)?)?;
                sheet.add_table(table);
            }

            for rel in rels.iter().filter(|r| r.rel_type == rel_type::PIVOT_TABLE) {
                let pivot_part = PartGraph::resolve_target(&sheet_part, &rel.target);
                let pivot_rels_name = PartGraph::rels_part_name(&pivot_part);
                if let Some(xml) = try_read_part(&mut archive, &pivot_rels_name)? {
                    graph.parse_rels(&pivot_part, &xml)?;
                }
                let cache_rel = graph
                    .relationship_of_type(&pivot_part, rel_type::PIVOT_CACHE)
                    .cloned()
                    .ok_or_else(|| {
                        XlsxError::Parse(format!(
                            "pivot table part '{pivot_part}' has no cache relationship"
                        ))
                    })?;
                let cache_part = PartGraph::resolve_target(&pivot_part, &cache_rel.target);
                let (source, _field_names) =
                    parse_pivot_cache_xml(&read_part(&mut archive, &cache_part)?)?;
                pivot_counter += 1;
                let pivot = parse_pivot_table_xml(
                    &read_part(&mut archive, &pivot_part)?,
                    source,
                    pivot_counter,
                )?;
                sheet.add_pivot_table(pivot);
            }
        }

        for (name, sheet_name, range) in meta.named_ranges {
            // Names over unknown sheets (stale print areas and the like) are
            // dropped rather than failing the load.
            if wb.sheet_by_name(&sheet_name).is_some() {
                wb.add_named_range(name, sheet_name, range)
                    .map_err(XlsxError::Core)?;
            } else {
                log::warn!("dropping defined name '{name}': unknown sheet '{sheet_name}'");
            }
        }
        if meta.active_tab < wb.sheet_count() {
            wb.set_active_sheet(meta.active_tab)
                .map_err(XlsxError::Core)?;
        }

        Ok(wb)
    }
}

fn read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> XlsxResult<String> {
    try_read_part(archive, name)?.ok_or_else(|| XlsxError::MissingPart(name.to_string()))
}

fn try_read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> XlsxResult<Option<String>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut body = String::new();
            file.read_to_string(&mut body)?;
            Ok(Some(body))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(XlsxError::Zip(e)),
    }
}

fn parse_workbook_xml(xml: &str) -> XlsxResult<WorkbookMeta> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut meta = WorkbookMeta::default();
    let mut in_defined_name = false;
    let mut defined_name = String::new();
    let mut defined_target = String::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"workbookPr" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"date1904" {
                            let value = attr.unescape_value().map_err(XlsxError::Xml)?;
                            meta.date_1904 = value.as_ref() == "1" || value.as_ref() == "true";
                        }
                    }
                }
                b"workbookView" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"activeTab" {
                            meta.active_tab = attr
                                .unescape_value()
                                .map_err(XlsxError::Xml)?
                                .parse()
                                .unwrap_or(0);
                        }
                    }
                }
                b"sheet" => {
                    let mut entry = SheetEntry {
                        visible: true,
                        ..SheetEntry::default()
                    };
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                        match attr.key.as_ref() {
                            b"name" => entry.name = value,
                            b"state" => entry.visible = value == "visible",
                            b"r:id" => entry.rid = value,
                            _ => {}
                        }
                    }
                    if entry.name.is_empty() || entry.rid.is_empty() {
                        return Err(XlsxError::Parse(
                            "sheet entry missing name or r:id".to_string(),
                        ));
                    }
                    meta.sheets.push(entry);
                }
                b"calcPr" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"fullCalcOnLoad" {
                            let value = attr.unescape_value().map_err(XlsxError::Xml)?;
                            meta.calc_on_open = value.as_ref() == "1";
                        }
                    }
                }
                b"definedName" => {
                    defined_name.clear();
                    defined_target.clear();
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"name" {
                            defined_name =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                        }
                    }
                    in_defined_name = true;
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_defined_name {
                    defined_target.push_str(&e.unescape().map_err(XlsxError::Xml)?);
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"definedName" {
                    in_defined_name = false;
                    if let Some((sheet, range)) = parse_defined_name_target(&defined_target) {
                        meta.named_ranges
                            .push((std::mem::take(&mut defined_name), sheet, range));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }
    Ok(meta)
}

/// Split `'My Data'!$A$1:$C$2` into the sheet name and range. Names that do
/// not follow the sheet-qualified range form return `None`.
fn parse_defined_name_target(text: &str) -> Option<(String, CellRange)> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix('\'') {
        let mut name = String::new();
        let mut chars = rest.chars();
        loop {
            match chars.next()? {
                '\'' => {
                    // A doubled quote is an escaped quote inside the name
                    if chars.clone().next() == Some('\'') {
                        chars.next();
                        name.push('\'');
                    } else {
                        break;
                    }
                }
                c => name.push(c),
            }
        }
        let rest: String = chars.collect();
        let range = CellRange::parse(rest.strip_prefix('!')?).ok()?;
        Some((name, range))
    } else {
        let (sheet, range) = text.split_once('!')?;
        Some((sheet.to_string(), CellRange::parse(range).ok()?))
    }
}

fn parse_sheet_xml(
    xml: &str,
    sheet: &mut Worksheet,
    sst: &[RichText],
    style_map: &[Option<u32>],
    rels: &[Relationship],
) -> XlsxResult<()> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut columns: Vec<ColumnRecord> = Vec::new();
    let mut row_meta: BTreeMap<u32, RowMeta> = BTreeMap::new();
    let mut array_ranges: Vec<CellRange> = Vec::new();

    // Position state: rows and cells without explicit references continue
    // from the previous one.
    let mut cur_row = 0u32;
    let mut next_row = 0u32;
    let mut next_col = 0u16;

    // Pending cell state
    let mut cell_col = 0u16;
    let mut cell_style: Option<u32> = None;
    let mut cell_type = String::new();
    let mut v_text: Option<String> = None;
    let mut f_text: Option<String> = None;
    let mut f_array_ref: Option<CellRange> = None;

    // Inline string state: `<is>` bodies carry either one `<t>` or rich
    // `<r>` runs, the same shape sharedStrings entries have.
    let mut is_value: Option<RichText> = None;
    let mut is_runs: Vec<TextRun> = Vec::new();
    let mut is_has_runs = false;
    let mut run_font: Option<Font> = None;
    let mut font_builder = FontBuilder::default();
    let mut in_is = false;
    let mut in_r = false;
    let mut in_rpr = false;

    let mut in_v = false;
    let mut in_f = false;
    let mut in_is_t = false;

    // Pending validation state
    let mut validation: Option<DataValidation> = None;
    let mut pending_type = String::new();
    let mut pending_operator = ValidationOperator::Between;
    let mut formula1: Option<String> = None;
    let mut formula2: Option<String> = None;
    let mut in_formula: Option<u8> = None;

    let mut text = String::new();

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf);
        let empty = matches!(&event, Ok(Event::Empty(_)));
        match event {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match e.name().as_ref() {
                    b"outlinePr" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"summaryBelow" {
                                let value = attr.unescape_value().map_err(XlsxError::Xml)?;
                                sheet.set_row_sums_below(
                                    value.as_ref() != "0" && value.as_ref() != "false",
                                );
                            }
                        }
                    }
                    b"sheetView" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"tabSelected" {
                                let value = attr.unescape_value().map_err(XlsxError::Xml)?;
                                sheet.set_selected(value.as_ref() == "1");
                            }
                        }
                    }
                    b"col" => {
                        let mut rec = ColumnRecord {
                            first: 0,
                            last: 0,
                            width: None,
                            style: None,
                            hidden: false,
                            outline_level: 0,
                            collapsed: false,
                        };
                        let mut width: Option<f64> = None;
                        let mut custom_width = false;
                        for attr in e.attributes().flatten() {
                            let value =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                            match attr.key.as_ref() {
                                b"min" => rec.first = value.parse::<u16>().unwrap_or(1) - 1,
                                b"max" => rec.last = value.parse::<u16>().unwrap_or(1) - 1,
                                b"width" => width = value.parse().ok(),
                                b"customWidth" => custom_width = value == "1",
                                b"style" => rec.style = value.parse().ok(),
                                b"hidden" => rec.hidden = value == "1",
                                b"outlineLevel" => rec.outline_level = value.parse().unwrap_or(0),
                                b"collapsed" => rec.collapsed = value == "1",
                                _ => {}
                            }
                        }
                        if custom_width {
                            rec.width = width;
                        }
                        columns.push(rec);
                    }
                    b"row" => {
                        let mut meta = RowMeta::default();
                        let mut index = next_row;
                        for attr in e.attributes().flatten() {
                            let value =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                            match attr.key.as_ref() {
                                b"r" => {
                                    if let Ok(r) = value.parse::<u32>() {
                                        index = r.saturating_sub(1);
                                    }
                                }
                                b"ht" => meta.height = value.parse().ok(),
                                b"hidden" => meta.hidden = value == "1",
                                b"outlineLevel" => meta.level = value.parse().unwrap_or(0),
                                b"collapsed" => meta.collapsed = value == "1",
                                _ => {}
                            }
                        }
                        cur_row = index;
                        next_row = index + 1;
                        next_col = 0;
                        row_meta.insert(index, meta);
                    }
                    b"c" => {
                        cell_col = next_col;
                        cell_style = None;
                        cell_type.clear();
                        v_text = None;
                        f_text = None;
                        f_array_ref = None;
                        is_value = None;
                        for attr in e.attributes().flatten() {
                            let value =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                            match attr.key.as_ref() {
                                b"r" => {
                                    if let Ok(addr) = CellAddress::parse(&value) {
                                        cell_col = addr.col;
                                        cur_row = addr.row;
                                    }
                                }
                                b"s" => cell_style = value.parse().ok(),
                                b"t" => cell_type = value,
                                _ => {}
                            }
                        }
                        next_col = cell_col + 1;
                        if empty {
                            finish_cell(
                                sheet,
                                cur_row,
                                cell_col,
                                cell_style,
                                &cell_type,
                                None,
                                None,
                                None,
                                None,
                                sst,
                                style_map,
                                &mut array_ranges,
                            )?;
                        }
                    }
                    b"v" => {
                        in_v = true;
                        text.clear();
                        if empty {
                            in_v = false;
                            v_text = Some(String::new());
                        }
                    }
                    b"f" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"ref" {
                                let value =
                                    attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                                f_array_ref = CellRange::parse(&value).ok();
                            }
                        }
                        in_f = true;
                        text.clear();
                        if empty {
                            in_f = false;
                            f_text = Some(String::new());
                        }
                    }
                    b"is" => {
                        is_runs.clear();
                        is_has_runs = false;
                        run_font = None;
                        text.clear();
                        if empty {
                            is_value = Some(RichText::plain(""));
                        } else {
                            in_is = true;
                        }
                    }
                    b"r" if in_is => {
                        run_font = None;
                        text.clear();
                        is_has_runs = true;
                        if !empty {
                            in_r = true;
                        }
                    }
                    b"rPr" if in_r => {
                        font_builder.start();
                        if empty {
                            run_font = Some(font_builder.finish());
                        } else {
                            in_rpr = true;
                        }
                    }
                    b"t" if in_is && !empty => in_is_t = true,
                    b"mergeCell" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"ref" {
                                let value =
                                    attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                                let range =
                                    CellRange::parse(&value).map_err(XlsxError::Core)?;
                                sheet.add_merged_region(range).map_err(XlsxError::Core)?;
                            }
                        }
                    }
                    b"dataValidation" => {
                        let mut v = DataValidation::new();
                        v.allow_blank = false;
                        v.show_error_alert = false;
                        pending_type.clear();
                        pending_operator = ValidationOperator::Between;
                        formula1 = None;
                        formula2 = None;
                        for attr in e.attributes().flatten() {
                            let value =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                            match attr.key.as_ref() {
                                b"type" => pending_type = value,
                                b"operator" => {
                                    pending_operator = ValidationOperator::from_xlsx(&value)
                                        .unwrap_or(ValidationOperator::Between)
                                }
                                b"allowBlank" => v.allow_blank = value == "1",
                                b"showDropDown" => v.show_dropdown = value != "1",
                                b"showInputMessage" => v.show_input_message = value == "1",
                                b"showErrorMessage" => v.show_error_alert = value == "1",
                                b"errorStyle" => {
                                    if let Some(style) = ValidationErrorStyle::from_xlsx(&value) {
                                        v.error_style = style;
                                    }
                                }
                                b"errorTitle" => v.error_title = Some(value),
                                b"error" => v.error_message = Some(value),
                                b"promptTitle" => v.input_title = Some(value),
                                b"prompt" => v.input_message = Some(value),
                                b"sqref" => {
                                    v.ranges = value
                                        .split_whitespace()
                                        .filter_map(|r| CellRange::parse(r).ok())
                                        .collect();
                                }
                                _ => {}
                            }
                        }
                        if empty {
                            sheet.add_data_validation(build_validation(
                                v,
                                &pending_type,
                                pending_operator,
                                None,
                                None,
                            ));
                        } else {
                            validation = Some(v);
                        }
                    }
                    b"formula1" if validation.is_some() => {
                        in_formula = Some(1);
                        text.clear();
                    }
                    b"formula2" if validation.is_some() => {
                        in_formula = Some(2);
                        text.clear();
                    }
                    b"hyperlink" => {
                        let mut range = None;
                        let mut rid = None;
                        let mut location = None;
                        let mut tooltip = None;
                        for attr in e.attributes().flatten() {
                            let value =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                            match attr.key.as_ref() {
                                b"ref" => range = CellRange::parse(&value).ok(),
                                b"r:id" => rid = Some(value),
                                b"location" => location = Some(value),
                                b"tooltip" => tooltip = Some(value),
                                _ => {}
                            }
                        }
                        let Some(range) = range else { continue };
                        let mut link = match (rid, location) {
                            (Some(rid), _) => {
                                let target = rels
                                    .iter()
                                    .find(|r| r.id == rid)
                                    .map(|r| r.target.clone())
                                    .ok_or_else(|| {
                                        XlsxError::Parse(format!(
                                            "hyperlink '{rid}' has no matching relationship"
                                        ))
                                    })?;
                                Hyperlink {
                                    range,
                                    kind: infer_link_kind(&target),
                                    target,
                                    tooltip: None,
                                }
                            }
                            (None, Some(location)) => Hyperlink::document(range, location),
                            (None, None) => continue,
                        };
                        link.tooltip = tooltip;
                        sheet.add_hyperlink(link);
                    }
                    _ if in_rpr => {
                        font_builder.element(e)?;
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_v || in_f || in_is_t || in_formula.is_some() {
                    text.push_str(&e.unescape().map_err(XlsxError::Xml)?);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"v" => {
                    in_v = false;
                    v_text = Some(std::mem::take(&mut text));
                }
                b"f" => {
                    in_f = false;
                    f_text = Some(std::mem::take(&mut text));
                }
                b"t" => in_is_t = false,
                b"r" if in_is => {
                    is_runs.push(TextRun {
                        text: decode_excel_escapes(&text),
                        font: run_font.take(),
                    });
                    text.clear();
                    in_r = false;
                }
                b"rPr" => {
                    run_font = Some(font_builder.finish());
                    in_rpr = false;
                }
                b"is" => {
                    is_value = Some(if is_has_runs {
                        RichText::from_runs(std::mem::take(&mut is_runs))
                    } else {
                        RichText::plain(decode_excel_escapes(&text))
                    });
                    text.clear();
                    in_is = false;
                }
                b"c" => {
                    finish_cell(
                        sheet,
                        cur_row,
                        cell_col,
                        cell_style,
                        &cell_type,
                        v_text.take(),
                        f_text.take(),
                        f_array_ref.take(),
                        is_value.take(),
                        sst,
                        style_map,
                        &mut array_ranges,
                    )?;
                }
                b"formula1" | b"formula2" => {
                    let value = std::mem::take(&mut text);
                    match in_formula.take() {
                        Some(1) => formula1 = Some(value),
                        Some(2) => formula2 = Some(value),
                        _ => {}
                    }
                }
                b"dataValidation" => {
                    if let Some(v) = validation.take() {
                        sheet.add_data_validation(build_validation(
                            v,
                            &pending_type,
                            pending_operator,
                            formula1.take(),
                            formula2.take(),
                        ));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }

    if !columns.is_empty() {
        sheet.set_column_records(columns);
    }

    // Array members share the region; the formula lives only on the corner.
    for range in array_ranges {
        for addr in range.cells() {
            if addr.row == range.first.row && addr.col == range.first.col {
                continue;
            }
            sheet
                .cell_or_create(addr.row, addr.col)
                .map_err(XlsxError::Core)?
                .set_array_range(Some(range));
        }
    }

    rebuild_row_state(sheet, &row_meta)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn finish_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    style: Option<u32>,
    cell_type: &str,
    v_text: Option<String>,
    f_text: Option<String>,
    f_array_ref: Option<CellRange>,
    is_value: Option<RichText>,
    sst: &[RichText],
    style_map: &[Option<u32>],
    array_ranges: &mut Vec<CellRange>,
) -> XlsxResult<()> {
    let base = match cell_type {
        "s" => {
            let index: usize = v_text
                .as_deref()
                .unwrap_or("")
                .trim()
                .parse()
                .map_err(|_| XlsxError::Parse("shared string cell without index".to_string()))?;
            let entry = sst.get(index).cloned().ok_or_else(|| {
                XlsxError::Parse(format!("shared string index {index} out of range"))
            })?;
            Some(CellValue::String(entry))
        }
        "b" => v_text.map(|v| CellValue::Boolean(v.trim() == "1")),
        "e" => v_text.map(|v| {
            CellValue::Error(CellError::parse(v.trim()).unwrap_or(CellError::Value))
        }),
        "str" => v_text.map(|v| CellValue::String(RichText::plain(v))),
        "inlineStr" => is_value.map(CellValue::String),
        _ => v_text.and_then(|v| v.trim().parse::<f64>().ok().map(CellValue::Number)),
    };

    let value = match f_text {
        Some(formula) => CellValue::Formula {
            text: formula,
            cached: base.map(Box::new),
        },
        None => base.unwrap_or(CellValue::Blank),
    };

    let local_style = style.and_then(|disk| style_map.get(disk as usize).copied().flatten());
    if matches!(value, CellValue::Blank) && local_style.is_none() && f_array_ref.is_none() {
        return Ok(());
    }

    let cell = sheet.cell_or_create(row, col).map_err(XlsxError::Core)?;
    cell.set_raw_value(value);
    if local_style.is_some() {
        cell.set_style(local_style);
    }
    if let Some(range) = f_array_ref {
        cell.set_array_range(Some(range));
        array_ranges.push(range);
    }
    Ok(())
}

fn build_validation(
    mut v: DataValidation,
    vtype: &str,
    operator: ValidationOperator,
    formula1: Option<String>,
    formula2: Option<String>,
) -> DataValidation {
    let value1 = formula1.unwrap_or_default();
    v.constraint = match vtype {
        "whole" => ValidationConstraint::Whole {
            operator,
            value1,
            value2: formula2,
        },
        "decimal" => ValidationConstraint::Decimal {
            operator,
            value1,
            value2: formula2,
        },
        "date" => ValidationConstraint::Date {
            operator,
            value1,
            value2: formula2,
        },
        "time" => ValidationConstraint::Time {
            operator,
            value1,
            value2: formula2,
        },
        "textLength" => ValidationConstraint::TextLength {
            operator,
            value1,
            value2: formula2,
        },
        "list" => ValidationConstraint::List { source: value1 },
        "custom" => ValidationConstraint::Custom { formula: value1 },
        _ => ValidationConstraint::None,
    };
    v
}

fn infer_link_kind(target: &str) -> HyperlinkKind {
    if target.starts_with("mailto:") {
        HyperlinkKind::Email
    } else if target.contains("://") {
        HyperlinkKind::Url
    } else {
        HyperlinkKind::File
    }
}

/// Rebuild group spans and physical row properties from collected row
/// attributes. A span at depth `d` is a maximal run of consecutive rows
/// whose outline level is at least `d`; its collapsed state comes from the
/// summary row's marker.
fn rebuild_row_state(sheet: &mut Worksheet, row_meta: &BTreeMap<u32, RowMeta>) -> XlsxResult<()> {
    let sums_below = sheet.row_sums_below();
    let max_level = row_meta.values().map(|m| m.level).max().unwrap_or(0);

    let mut spans: Vec<GroupSpan> = Vec::new();
    for depth in 1..=max_level {
        let mut run: Option<(u32, u32)> = None;
        for (&index, meta) in row_meta {
            if meta.level >= depth {
                run = match run {
                    Some((start, end)) if index == end + 1 => Some((start, index)),
                    Some((start, end)) => {
                        spans.push(make_span(start, end, sums_below, row_meta));
                        Some((index, index))
                    }
                    None => Some((index, index)),
                };
            } else if let Some((start, end)) = run.take() {
                spans.push(make_span(start, end, sums_below, row_meta));
            }
        }
        if let Some((start, end)) = run {
            spans.push(make_span(start, end, sums_below, row_meta));
        }
    }
    if !spans.is_empty() {
        sheet.set_row_groups(spans);
    }

    for (&index, meta) in row_meta {
        if let Some(height) = meta.height {
            sheet
                .row_or_create(index)
                .map_err(XlsxError::Core)?
                .set_height(Some(height));
        }
    }
    // A hidden attribute already explained by a collapsed enclosing group
    // is not a manual hide.
    for (&index, meta) in row_meta {
        if meta.hidden && !sheet.row_outline(index).hidden {
            sheet
                .row_or_create(index)
                .map_err(XlsxError::Core)?
                .set_hidden(true);
        }
    }
    Ok(())
}

fn make_span(
    start: u32,
    end: u32,
    sums_below: bool,
    row_meta: &BTreeMap<u32, RowMeta>,
) -> GroupSpan {
    let span = GroupSpan::new(start, end);
    let collapsed = span
        .summary_row(sums_below)
        .and_then(|summary| row_meta.get(&summary))
        .map_or(false, |m| m.collapsed);
    GroupSpan {
        collapsed,
        ..span
    }
}

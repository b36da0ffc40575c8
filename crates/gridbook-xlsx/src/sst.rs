//! sharedStrings.xml mapping
//!
//! Entries are written in table order so cell `t="s"` indices stay valid.
//! Rich entries serialize one `<r>` per run; run fonts reuse the font
//! fragment from the styles writer with `rFont` as the name tag.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use gridbook_core::{Font, RichText, SharedStringTable, TextRun};

use crate::error::{XlsxError, XlsxResult};
use crate::styles::{font_inner_xml, FontBuilder};
use crate::xml::{decode_excel_escapes, encode_excel_escapes, escape_text, needs_space_preserve};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Serialize the shared string table to sharedStrings.xml.
pub fn write_shared_strings(sst: &SharedStringTable) -> String {
    let count = sst.count();
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<sst xmlns=\"{MAIN_NS}\" count=\"{count}\" uniqueCount=\"{count}\">"
    );
    for entry in sst.iter() {
        xml.push_str("\n    <si>");
        xml.push_str(&rich_text_xml(entry));
        xml.push_str("</si>");
    }
    xml.push_str("\n</sst>");
    xml
}

/// Inner XML of a rich text container (`<si>` here, `<text>` in comments).
pub(crate) fn rich_text_xml(text: &RichText) -> String {
    let mut xml = String::new();
    if text.has_formatting() {
        for run in text.runs() {
            xml.push_str("<r>");
            if let Some(font) = &run.font {
                xml.push_str("<rPr>");
                xml.push_str(&font_inner_xml(font, "rFont"));
                xml.push_str("</rPr>");
            }
            xml.push_str(&t_element(&run.text));
            xml.push_str("</r>");
        }
    } else {
        xml.push_str(&t_element(&text.text()));
    }
    xml
}

fn t_element(text: &str) -> String {
    if text.is_empty() {
        return "<t/>".to_string();
    }
    let encoded = escape_text(&encode_excel_escapes(text));
    if needs_space_preserve(text) {
        format!("<t xml:space=\"preserve\">{encoded}</t>")
    } else {
        format!("<t>{encoded}</t>")
    }
}

/// Parse sharedStrings.xml into the entry list, in table order.
pub fn parse_shared_strings(xml: &str) -> XlsxResult<Vec<RichText>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut in_si = false;
    let mut in_r = false;
    let mut in_rpr = false;
    let mut in_t = false;
    let mut has_runs = false;
    let mut runs: Vec<TextRun> = Vec::new();
    let mut run_font: Option<Font> = None;
    let mut font_builder = FontBuilder::default();
    let mut text = String::new();

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf);
        match event {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let empty = matches!(event, Ok(Event::Empty(_)));
                match e.name().as_ref() {
                    b"si" => {
                        runs.clear();
                        has_runs = false;
                        run_font = None;
                        text.clear();
                        if empty {
                            entries.push(RichText::plain(""));
                        } else {
                            in_si = true;
                        }
                    }
                    b"r" if in_si => {
                        run_font = None;
                        text.clear();
                        has_runs = true;
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
                    b"t" if in_si && !empty => in_t = true,
                    _ if in_rpr => {
                        font_builder.element(e)?;
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"si" => {
                    if has_runs {
                        entries.push(RichText::from_runs(std::mem::take(&mut runs)));
                    } else {
                        entries.push(RichText::plain(decode_excel_escapes(&text)));
                    }
                    text.clear();
                    in_si = false;
                }
                b"r" => {
                    runs.push(TextRun {
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
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_t {
                    text.push_str(&e.unescape().map_err(XlsxError::Xml)?);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }
    Ok(entries)
}

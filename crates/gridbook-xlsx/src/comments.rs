//! commentsN.xml and vmlDrawingN.vml mapping
//!
//! A comment lives in two parts: the comments part holds author and rich
//! body, the legacy VML part holds the floating box geometry and
//! visibility. The reader joins them by anchor cell.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use gridbook_core::{CellAddress, Comment, Font, RichText, TextRun, VmlAnchor};

use crate::error::{XlsxError, XlsxResult};
use crate::sst::rich_text_xml;
use crate::styles::FontBuilder;
use crate::xml::{decode_excel_escapes, escape_text};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const V_NS: &str = "urn:schemas-microsoft-com:vml";
const O_NS: &str = "urn:schemas-microsoft-com:office:office";
const X_NS: &str = "urn:schemas-microsoft-com:office:excel";

/// Serialize a comments part from anchor-sorted comments.
pub fn write_comments_xml(comments: &[((u32, u16), &Comment)]) -> String {
    // Authors dedup in order of first appearance
    let mut authors: Vec<&str> = Vec::new();
    for (_, comment) in comments {
        if !authors.contains(&comment.author.as_str()) {
            authors.push(&comment.author);
        }
    }

    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<comments xmlns=\"{MAIN_NS}\">"
    );
    xml.push_str("\n    <authors>");
    for author in &authors {
        xml.push_str(&format!("\n        <author>{}</author>", escape_text(author)));
    }
    xml.push_str("\n    </authors>");
    xml.push_str("\n    <commentList>");
    for ((row, col), comment) in comments {
        let author_id = authors
            .iter()
            .position(|a| *a == comment.author)
            .unwrap_or(0);
        xml.push_str(&format!(
            "\n        <comment ref=\"{}\" authorId=\"{author_id}\"><text>",
            CellAddress::new(*row, *col)
        ));
        xml.push_str(&rich_text_xml(&comment.text));
        xml.push_str("</text></comment>");
    }
    xml.push_str("\n    </commentList>");
    xml.push_str("\n</comments>");
    xml
}

/// Parse a comments part into (anchor, comment) pairs. Box geometry and
/// visibility stay at their defaults until the VML part is applied.
pub fn parse_comments_xml(xml: &str) -> XlsxResult<Vec<((u32, u16), Comment)>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut authors: Vec<String> = Vec::new();
    let mut out = Vec::new();

    let mut in_author = false;
    let mut in_comment = false;
    let mut in_r = false;
    let mut in_rpr = false;
    let mut in_t = false;
    let mut anchor = (0u32, 0u16);
    let mut author_id = 0usize;
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
                    b"author" => {
                        if empty {
                            authors.push(String::new());
                        } else {
                            in_author = true;
                            text.clear();
                        }
                    }
                    b"comment" => {
                        in_comment = true;
                        has_runs = false;
                        runs.clear();
                        run_font = None;
                        author_id = 0;
                        text.clear();
                        for attr in e.attributes().flatten() {
                            let value =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                            match attr.key.as_ref() {
                                b"ref" => {
                                    let addr =
                                        CellAddress::parse(&value).map_err(XlsxError::Core)?;
                                    anchor = (addr.row, addr.col);
                                }
                                b"authorId" => author_id = value.parse().unwrap_or(0),
                                _ => {}
                            }
                        }
                    }
                    b"r" if in_comment => {
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
                    b"t" if in_comment && !empty => in_t = true,
                    _ if in_rpr => {
                        font_builder.element(e)?;
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"author" => {
                    authors.push(std::mem::take(&mut text));
                    in_author = false;
                }
                b"comment" => {
                    let body = if has_runs {
                        RichText::from_runs(std::mem::take(&mut runs))
                    } else {
                        RichText::plain(decode_excel_escapes(&text))
                    };
                    let author = authors.get(author_id).cloned().unwrap_or_default();
                    out.push((anchor, Comment::new(author, body)));
                    text.clear();
                    in_comment = false;
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
                if in_t || in_author {
                    text.push_str(&e.unescape().map_err(XlsxError::Xml)?);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }
    Ok(out)
}

/// Serialize the legacy VML part that carries comment box geometry.
pub fn write_vml_comments(comments: &[((u32, u16), &Comment)]) -> String {
    let mut xml = format!(
        "<xml xmlns:v=\"{V_NS}\" xmlns:o=\"{O_NS}\" xmlns:x=\"{X_NS}\">\n    <o:shapelayout v:ext=\"edit\"><o:idmap v:ext=\"edit\" data=\"1\"/></o:shapelayout>\n    <v:shapetype id=\"_x0000_t202\" coordsize=\"21600,21600\" o:spt=\"202\" path=\"m,l,21600r21600,l21600,xe\"><v:stroke joinstyle=\"miter\"/><v:path gradientshapeok=\"t\" o:connecttype=\"rect\"/></v:shapetype>"
    );
    for (i, ((row, col), comment)) in comments.iter().enumerate() {
        let shape_id = 1025 + i;
        let visibility = if comment.visible {
            "visible"
        } else {
            "hidden"
        };
        xml.push_str(&format!(
            "\n    <v:shape id=\"_x0000_s{shape_id}\" type=\"#_x0000_t202\" style=\"position:absolute;visibility:{visibility}\" fillcolor=\"#ffffe1\" o:insetmode=\"auto\">"
        ));
        xml.push_str("<v:fill color2=\"#ffffe1\"/><v:shadow on=\"t\" color=\"black\" obscured=\"t\"/><v:path o:connecttype=\"none\"/><v:textbox style=\"mso-direction-alt:auto\"><div style=\"text-align:left\"></div></v:textbox>");
        xml.push_str("<x:ClientData ObjectType=\"Note\"><x:MoveWithCells/><x:SizeWithCells/>");
        xml.push_str(&format!(
            "<x:Anchor>{}</x:Anchor>",
            comment.shape_anchor.to_vml()
        ));
        xml.push_str("<x:AutoFill>False</x:AutoFill>");
        xml.push_str(&format!("<x:Row>{row}</x:Row><x:Column>{col}</x:Column>"));
        if comment.visible {
            xml.push_str("<x:Visible/>");
        }
        xml.push_str("</x:ClientData></v:shape>");
    }
    xml.push_str("\n</xml>");
    xml
}

/// Geometry read back from a VML part, keyed by anchor cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmlCommentShape {
    pub row: u32,
    pub col: u16,
    pub anchor: VmlAnchor,
    pub visible: bool,
}

/// Parse the VML part; non-Note shapes are skipped.
pub fn parse_vml_comments(xml: &str) -> XlsxResult<Vec<VmlCommentShape>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut out = Vec::new();
    let mut in_note = false;
    let mut capture: Option<&'static str> = None;
    let mut text = String::new();
    let mut row = 0u32;
    let mut col = 0u16;
    let mut anchor = VmlAnchor::default();
    let mut visible = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"x:ClientData" => {
                    let mut object_type = String::new();
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"ObjectType" {
                            object_type =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                        }
                    }
                    in_note = object_type == "Note";
                    row = 0;
                    col = 0;
                    anchor = VmlAnchor::default();
                    visible = false;
                }
                b"x:Anchor" if in_note => {
                    capture = Some("anchor");
                    text.clear();
                }
                b"x:Row" if in_note => {
                    capture = Some("row");
                    text.clear();
                }
                b"x:Column" if in_note => {
                    capture = Some("col");
                    text.clear();
                }
                b"x:Visible" if in_note => visible = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"x:Anchor" | b"x:Row" | b"x:Column" => {
                    match capture.take() {
                        Some("anchor") => {
                            let nums: Vec<u32> = text
                                .split(',')
                                .filter_map(|p| p.trim().parse().ok())
                                .collect();
                            if nums.len() == 8 {
                                anchor = VmlAnchor {
                                    from_col: nums[0] as u16,
                                    from_col_offset: nums[1],
                                    from_row: nums[2],
                                    from_row_offset: nums[3],
                                    to_col: nums[4] as u16,
                                    to_col_offset: nums[5],
                                    to_row: nums[6],
                                    to_row_offset: nums[7],
                                };
                            }
                        }
                        Some("row") => row = text.trim().parse().unwrap_or(0),
                        Some("col") => col = text.trim().parse().unwrap_or(0),
                        _ => {}
                    }
                    text.clear();
                }
                b"x:ClientData" => {
                    if in_note {
                        out.push(VmlCommentShape {
                            row,
                            col,
                            anchor,
                            visible,
                        });
                        in_note = false;
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if capture.is_some() {
                    text.push_str(&e.unescape().map_err(XlsxError::Xml)?);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_round_trip_with_shared_authors() {
        let a = Comment::new("Ada", "first note");
        let b = Comment::new("Grace", "second note");
        let c = Comment::new("Ada", "third note");
        let comments = vec![((0, 0), &a), ((1, 2), &b), ((4, 0), &c)];

        let xml = write_comments_xml(&comments);
        // Two distinct authors, Ada reused
        assert_eq!(xml.matches("<author>").count(), 2);
        assert!(xml.contains("ref=\"C2\""));

        let parsed = parse_comments_xml(&xml).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].0, (0, 0));
        assert_eq!(parsed[0].1.author, "Ada");
        assert_eq!(parsed[2].1.author, "Ada");
        assert_eq!(parsed[1].1.text.text(), "second note");
    }

    #[test]
    fn rich_comment_body_survives() {
        let mut font = Font::default();
        font.set_bold(true);
        font.set_family(None);
        font.set_scheme(gridbook_core::FontScheme::None);
        let mut body = RichText::plain("Ada:\n");
        body.append("fix this");
        body.apply_font(0, 4, font);

        let comment = Comment::new("Ada", body.clone());
        let xml = write_comments_xml(&[((2, 1), &comment)]);
        let parsed = parse_comments_xml(&xml).unwrap();
        assert_eq!(parsed[0].1.text.text(), "Ada:\nfix this");
        assert!(parsed[0].1.text.runs()[0].font.as_ref().unwrap().bold);
    }

    #[test]
    fn vml_round_trips_geometry_and_visibility() {
        let hidden = Comment::new("A", "x");
        let shown = Comment::new("B", "y")
            .with_visible(true)
            .with_shape_anchor(VmlAnchor::beside(4, 2));
        let comments = vec![((0, 0), &hidden), ((4, 2), &shown)];

        let xml = write_vml_comments(&comments);
        assert!(xml.contains("visibility:hidden"));
        assert!(xml.contains("visibility:visible"));
        assert!(xml.contains("<x:Anchor>3, 15, 4, 2, 5, 15, 7, 16</x:Anchor>"));

        let shapes = parse_vml_comments(&xml).unwrap();
        assert_eq!(shapes.len(), 2);
        assert!(!shapes[0].visible);
        assert_eq!(shapes[1].row, 4);
        assert_eq!(shapes[1].col, 2);
        assert!(shapes[1].visible);
        assert_eq!(shapes[1].anchor, VmlAnchor::beside(4, 2));
    }
}

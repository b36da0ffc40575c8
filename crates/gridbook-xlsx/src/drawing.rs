//! drawingN.xml mapping (DrawingML)
//!
//! Every shape is written as a two-cell anchor. Pictures do not embed image
//! bytes in the drawing part; they point at an image target through the
//! drawing's rels, so the writer returns the targets it referenced (in
//! `rId1..` order) for the caller to register.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use gridbook_core::{
    ClientAnchor, Color, Drawing, Font, FontScheme, RichText, Shape, ShapeKind, ShapeType, TextRun,
};

use crate::error::{XlsxError, XlsxResult};
use crate::package::Relationship;
use crate::xml::{escape_attr, escape_text};

const XDR_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Serialize a drawing part. The second element is the picture targets the
/// part references, in the order their `rId`s were issued.
pub fn write_drawing_xml(drawing: &Drawing) -> (String, Vec<String>) {
    let mut picture_targets = Vec::new();
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<xdr:wsDr xmlns:xdr=\"{XDR_NS}\" xmlns:a=\"{A_NS}\" xmlns:r=\"{R_NS}\">"
    );
    for shape in drawing.shapes() {
        xml.push_str("\n    <xdr:twoCellAnchor>");
        xml.push_str(&anchor_point(
            "from",
            shape.anchor.from_col,
            shape.anchor.from_col_offset,
            shape.anchor.from_row,
            shape.anchor.from_row_offset,
        ));
        xml.push_str(&anchor_point(
            "to",
            shape.anchor.to_col,
            shape.anchor.to_col_offset,
            shape.anchor.to_row,
            shape.anchor.to_row_offset,
        ));
        match &shape.kind {
            ShapeKind::Simple { shape_type, text } => {
                xml.push_str("<xdr:sp macro=\"\" textlink=\"\">");
                xml.push_str(&format!(
                    "<xdr:nvSpPr><xdr:cNvPr id=\"{}\" name=\"{}\"/><xdr:cNvSpPr/></xdr:nvSpPr>",
                    shape.id,
                    escape_attr(&shape.name)
                ));
                xml.push_str(&sp_pr(shape, shape_type.preset_name()));
                if let Some(text) = text {
                    xml.push_str(&tx_body(text));
                }
                xml.push_str("</xdr:sp>");
            }
            ShapeKind::TextBox { text } => {
                xml.push_str("<xdr:sp macro=\"\" textlink=\"\">");
                xml.push_str(&format!(
                    "<xdr:nvSpPr><xdr:cNvPr id=\"{}\" name=\"{}\"/><xdr:cNvSpPr txBox=\"1\"/></xdr:nvSpPr>",
                    shape.id,
                    escape_attr(&shape.name)
                ));
                xml.push_str(&sp_pr(shape, "rect"));
                xml.push_str(&tx_body(text));
                xml.push_str("</xdr:sp>");
            }
            ShapeKind::Connector { shape_type } => {
                xml.push_str("<xdr:cxnSp macro=\"\">");
                xml.push_str(&format!(
                    "<xdr:nvCxnSpPr><xdr:cNvPr id=\"{}\" name=\"{}\"/><xdr:cNvCxnSpPr/></xdr:nvCxnSpPr>",
                    shape.id,
                    escape_attr(&shape.name)
                ));
                xml.push_str(&sp_pr(shape, shape_type.preset_name()));
                xml.push_str("</xdr:cxnSp>");
            }
            ShapeKind::Picture {
                relationship_target,
            } => {
                picture_targets.push(relationship_target.clone());
                let rid = format!("rId{}", picture_targets.len());
                xml.push_str("<xdr:pic>");
                xml.push_str(&format!(
                    "<xdr:nvPicPr><xdr:cNvPr id=\"{}\" name=\"{}\"/><xdr:cNvPicPr/></xdr:nvPicPr>",
                    shape.id,
                    escape_attr(&shape.name)
                ));
                xml.push_str(&format!(
                    "<xdr:blipFill><a:blip r:embed=\"{rid}\"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>"
                ));
                xml.push_str(&sp_pr(shape, "rect"));
                xml.push_str("</xdr:pic>");
            }
        }
        xml.push_str("<xdr:clientData/></xdr:twoCellAnchor>");
    }
    xml.push_str("\n</xdr:wsDr>");
    (xml, picture_targets)
}

fn anchor_point(tag: &str, col: u16, col_off: i64, row: u32, row_off: i64) -> String {
    format!(
        "<xdr:{tag}><xdr:col>{col}</xdr:col><xdr:colOff>{col_off}</xdr:colOff><xdr:row>{row}</xdr:row><xdr:rowOff>{row_off}</xdr:rowOff></xdr:{tag}>"
    )
}

fn sp_pr(shape: &Shape, preset: &str) -> String {
    let mut xml = String::from("<xdr:spPr>");
    xml.push_str(&format!(
        "<a:prstGeom prst=\"{preset}\"><a:avLst/></a:prstGeom>"
    ));
    if let Some(fill) = &shape.fill_color {
        xml.push_str(&format!(
            "<a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>",
            rgb6(fill)
        ));
    }
    if shape.line_color.is_some() || shape.line_width.is_some() {
        xml.push_str("<a:ln");
        if let Some(w) = shape.line_width {
            xml.push_str(&format!(" w=\"{w}\""));
        }
        xml.push('>');
        if let Some(c) = &shape.line_color {
            xml.push_str(&format!(
                "<a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>",
                rgb6(c)
            ));
        }
        xml.push_str("</a:ln>");
    }
    xml.push_str("</xdr:spPr>");
    xml
}

/// DrawingML colors are 6-digit RGB; strip the alpha byte of an ARGB value.
fn rgb6(argb: &str) -> &str {
    if argb.len() == 8 {
        &argb[2..]
    } else {
        argb
    }
}

fn tx_body(text: &RichText) -> String {
    let mut xml = String::from("<xdr:txBody><a:bodyPr/><a:p>");
    for run in text.runs() {
        xml.push_str("<a:r>");
        if let Some(font) = &run.font {
            xml.push_str(&format!("<a:rPr lang=\"en-US\" sz=\"{}\"", (font.size * 100.0) as i32));
            if font.bold {
                xml.push_str(" b=\"1\"");
            }
            if font.italic {
                xml.push_str(" i=\"1\"");
            }
            if let Color::Rgb { .. } = font.color {
                xml.push_str(&format!(
                    "><a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill></a:rPr>",
                    rgb6(&font.color.to_argb_hex())
                ));
            } else {
                xml.push_str("/>");
            }
        }
        xml.push_str(&format!("<a:t>{}</a:t>", escape_text(&run.text)));
        xml.push_str("</a:r>");
    }
    xml.push_str("</a:p></xdr:txBody>");
    xml
}

/// A run font parsed from text properties starts from a bare default so
/// only declared properties differ from `None`-equivalent state.
fn base_run_font() -> Font {
    let mut font = Font::default();
    font.scheme = FontScheme::None;
    font.family = None;
    font
}

/// Parse a drawing part. `rels` is the drawing's own relationship list,
/// used to resolve picture `r:embed` ids.
pub fn parse_drawing_xml(xml: &str, rels: &[Relationship]) -> XlsxResult<Drawing> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut drawing = Drawing::new();

    let mut anchor = ClientAnchor::default();
    let mut point_is_to = false;
    let mut coord: Option<&'static str> = None;
    let mut text = String::new();

    // Pending shape state, reset per anchor
    let mut shape_id: u32 = 0;
    let mut shape_name = String::new();
    let mut element: Option<&'static str> = None;
    let mut is_textbox = false;
    let mut preset: Option<ShapeType> = None;
    let mut embed_id: Option<String> = None;
    let mut fill_color: Option<String> = None;
    let mut line_color: Option<String> = None;
    let mut line_width: Option<i64> = None;

    let mut in_ln = false;
    let mut in_rpr = false;
    let mut in_txbody = false;
    let mut in_at = false;
    let mut runs: Vec<TextRun> = Vec::new();
    let mut run_font: Option<Font> = None;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf);
        match event {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"xdr:twoCellAnchor" => {
                    anchor = ClientAnchor::default();
                    shape_id = 0;
                    shape_name.clear();
                    element = None;
                    is_textbox = false;
                    preset = None;
                    embed_id = None;
                    fill_color = None;
                    line_color = None;
                    line_width = None;
                    runs.clear();
                }
                b"xdr:from" => point_is_to = false,
                b"xdr:to" => point_is_to = true,
                b"xdr:col" => {
                    coord = Some("col");
                    text.clear();
                }
                b"xdr:colOff" => {
                    coord = Some("colOff");
                    text.clear();
                }
                b"xdr:row" => {
                    coord = Some("row");
                    text.clear();
                }
                b"xdr:rowOff" => {
                    coord = Some("rowOff");
                    text.clear();
                }
                b"xdr:sp" => element = Some("sp"),
                b"xdr:cxnSp" => element = Some("cxnSp"),
                b"xdr:pic" => element = Some("pic"),
                b"xdr:cNvPr" => {
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                        match attr.key.as_ref() {
                            b"id" => shape_id = value.parse().unwrap_or(0),
                            b"name" => shape_name = value,
                            _ => {}
                        }
                    }
                }
                b"xdr:cNvSpPr" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"txBox" {
                            is_textbox =
                                attr.unescape_value().map_err(XlsxError::Xml)?.as_ref() == "1";
                        }
                    }
                }
                b"a:prstGeom" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"prst" {
                            let value =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                            preset = ShapeType::from_preset(&value);
                        }
                    }
                }
                b"a:blip" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"r:embed" {
                            embed_id =
                                Some(attr.unescape_value().map_err(XlsxError::Xml)?.into_owned());
                        }
                    }
                }
                b"a:ln" => {
                    in_ln = true;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"w" {
                            line_width = attr
                                .unescape_value()
                                .map_err(XlsxError::Xml)?
                                .parse::<i64>()
                                .ok();
                        }
                    }
                }
                b"xdr:txBody" => {
                    in_txbody = true;
                    runs.clear();
                }
                b"a:r" => run_font = None,
                b"a:rPr" => {
                    in_rpr = true;
                    let mut font = base_run_font();
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                        match attr.key.as_ref() {
                            b"sz" => {
                                if let Ok(hundredths) = value.parse::<f64>() {
                                    font.size = hundredths / 100.0;
                                }
                            }
                            b"b" => font.bold = value == "1",
                            b"i" => font.italic = value == "1",
                            _ => {}
                        }
                    }
                    run_font = Some(font);
                }
                b"a:srgbClr" => {
                    let mut val = None;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"val" {
                            val =
                                Some(attr.unescape_value().map_err(XlsxError::Xml)?.into_owned());
                        }
                    }
                    if let Some(val) = val {
                        let argb = format!("FF{val}");
                        if in_rpr {
                            if let Some(font) = run_font.as_mut() {
                                if let Some(color) = Color::from_hex(&argb) {
                                    font.color = color;
                                }
                            }
                        } else if in_ln {
                            line_color = Some(argb);
                        } else if !in_txbody {
                            fill_color = Some(argb);
                        }
                    }
                }
                b"a:t" => {
                    in_at = true;
                    text.clear();
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"xdr:col" | b"xdr:colOff" | b"xdr:row" | b"xdr:rowOff" => {
                    match (coord.take(), point_is_to) {
                        (Some("col"), false) => anchor.from_col = text.trim().parse().unwrap_or(0),
                        (Some("col"), true) => anchor.to_col = text.trim().parse().unwrap_or(0),
                        (Some("colOff"), false) => {
                            anchor.from_col_offset = text.trim().parse().unwrap_or(0)
                        }
                        (Some("colOff"), true) => {
                            anchor.to_col_offset = text.trim().parse().unwrap_or(0)
                        }
                        (Some("row"), false) => anchor.from_row = text.trim().parse().unwrap_or(0),
                        (Some("row"), true) => anchor.to_row = text.trim().parse().unwrap_or(0),
                        (Some("rowOff"), false) => {
                            anchor.from_row_offset = text.trim().parse().unwrap_or(0)
                        }
                        (Some("rowOff"), true) => {
                            anchor.to_row_offset = text.trim().parse().unwrap_or(0)
                        }
                        _ => {}
                    }
                }
                b"a:t" => in_at = false,
                b"a:rPr" => in_rpr = false,
                b"a:r" => {
                    runs.push(TextRun {
                        text: std::mem::take(&mut text),
                        font: run_font.take(),
                    });
                }
                b"a:ln" => in_ln = false,
                b"xdr:txBody" => in_txbody = false,
                b"xdr:twoCellAnchor" => {
                    let kind = match element {
                        Some("pic") => {
                            let id = embed_id.take().ok_or_else(|| {
                                XlsxError::Parse("picture without r:embed".to_string())
                            })?;
                            let target = rels
                                .iter()
                                .find(|r| r.id == id)
                                .map(|r| r.target.clone())
                                .ok_or_else(|| {
                                    XlsxError::Parse(format!(
                                        "picture embed '{id}' has no matching relationship"
                                    ))
                                })?;
                            ShapeKind::Picture {
                                relationship_target: target,
                            }
                        }
                        Some("cxnSp") => ShapeKind::Connector {
                            shape_type: preset.unwrap_or(ShapeType::Line),
                        },
                        Some("sp") if is_textbox => ShapeKind::TextBox {
                            text: RichText::from_runs(std::mem::take(&mut runs)),
                        },
                        Some("sp") => ShapeKind::Simple {
                            shape_type: preset.unwrap_or(ShapeType::Rect),
                            text: if runs.is_empty() {
                                None
                            } else {
                                Some(RichText::from_runs(std::mem::take(&mut runs)))
                            },
                        },
                        _ => continue,
                    };
                    drawing.restore_shape(Shape {
                        id: shape_id,
                        name: std::mem::take(&mut shape_name),
                        anchor,
                        kind,
                        fill_color: fill_color.take(),
                        line_color: line_color.take(),
                        line_width: line_width.take(),
                    });
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if coord.is_some() || in_at {
                    text.push_str(&e.unescape().map_err(XlsxError::Xml)?);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }
    Ok(drawing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(id: &str, target: &str) -> Relationship {
        Relationship {
            id: id.to_string(),
            rel_type: String::new(),
            target: target.to_string(),
            external: false,
        }
    }

    #[test]
    fn shapes_round_trip() {
        let mut drawing = Drawing::new();
        let shape = drawing.create_shape(ShapeType::Ellipse, ClientAnchor::cells(1, 1, 4, 3));
        shape.fill_color = Some("FF00FF00".to_string());
        shape.line_color = Some("FF0000FF".to_string());
        shape.line_width = Some(19050);
        drawing.create_text_box(ClientAnchor::cells(5, 0, 7, 2), RichText::plain("note"));
        drawing.create_connector(ShapeType::Line, ClientAnchor::cells(0, 0, 1, 1));

        let (xml, targets) = write_drawing_xml(&drawing);
        assert!(targets.is_empty());
        assert!(xml.contains("prst=\"ellipse\""));
        assert!(xml.contains("txBox=\"1\""));

        let parsed = parse_drawing_xml(&xml, &[]).unwrap();
        assert_eq!(parsed.shape_count(), 3);
        let shapes = parsed.shapes();
        assert_eq!(shapes[0].id, 2);
        assert_eq!(shapes[0].anchor, ClientAnchor::cells(1, 1, 4, 3));
        assert_eq!(shapes[0].fill_color.as_deref(), Some("FF00FF00"));
        assert_eq!(shapes[0].line_color.as_deref(), Some("FF0000FF"));
        assert_eq!(shapes[0].line_width, Some(19050));
        assert_eq!(shapes[1].text().map(|t| t.text()), Some("note".to_string()));
        assert!(matches!(
            shapes[2].kind,
            ShapeKind::Connector {
                shape_type: ShapeType::Line
            }
        ));
    }

    #[test]
    fn picture_embeds_resolve_through_rels() {
        let mut drawing = Drawing::new();
        drawing.create_picture(
            ClientAnchor::cells(0, 0, 10, 5),
            "../media/image1.png".to_string(),
        );

        let (xml, targets) = write_drawing_xml(&drawing);
        assert_eq!(targets, vec!["../media/image1.png".to_string()]);
        assert!(xml.contains("r:embed=\"rId1\""));

        let rels = [rel("rId1", "../media/image1.png")];
        let parsed = parse_drawing_xml(&xml, &rels).unwrap();
        assert_eq!(
            parsed.shapes()[0].kind,
            ShapeKind::Picture {
                relationship_target: "../media/image1.png".to_string()
            }
        );

        // A dangling embed is an error, not a silent drop
        assert!(parse_drawing_xml(&xml, &[]).is_err());
    }

    #[test]
    fn rich_text_runs_keep_fonts() {
        let mut font = base_run_font();
        font.set_bold(true);
        font.set_color(Color::rgb(0xAA, 0xBB, 0xCC));
        let mut text = RichText::plain("plain ");
        text.append("bold");
        text.apply_font(6, 10, font);

        let mut drawing = Drawing::new();
        drawing.create_text_box(ClientAnchor::cells(0, 0, 2, 2), text);

        let (xml, _) = write_drawing_xml(&drawing);
        let parsed = parse_drawing_xml(&xml, &[]).unwrap();
        let parsed_text = parsed.shapes()[0].text().unwrap();
        assert_eq!(parsed_text.text(), "plain bold");
        let run = &parsed_text.runs()[1];
        let font = run.font.as_ref().unwrap();
        assert!(font.bold);
        assert_eq!(font.color, Color::rgb(0xAA, 0xBB, 0xCC));
    }
}

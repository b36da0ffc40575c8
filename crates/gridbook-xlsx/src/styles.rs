//! styles.xml mapping
//!
//! The writer serializes the workbook's style registry; the reader parses
//! the part into raw pools and re-interns referenced tuples into the target
//! workbook's registry, so loaded style indices are re-deduplicated rather
//! than copied blindly.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use gridbook_core::{
    Alignment, Border, BorderEdge, BorderLineStyle, CellXf, Color, Fill, Font, FontScheme,
    HorizontalAlignment, PatternType, StyleRegistry, Underline, VerticalAlignment,
};

use crate::error::{XlsxError, XlsxResult};
use crate::xml::escape_attr;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Serialize a style registry to styles.xml.
pub fn write_styles_xml(styles: &StyleRegistry) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<styleSheet xmlns=\"{MAIN_NS}\">"
    );

    let custom: Vec<(u16, &str)> = styles.number_formats().custom_formats().collect();
    if !custom.is_empty() {
        xml.push_str(&format!("\n    <numFmts count=\"{}\">", custom.len()));
        for (id, code) in custom {
            xml.push_str(&format!(
                "\n        <numFmt numFmtId=\"{id}\" formatCode=\"{}\"/>",
                escape_attr(code)
            ));
        }
        xml.push_str("\n    </numFmts>");
    }

    xml.push_str(&format!("\n    <fonts count=\"{}\">", styles.fonts().len()));
    for font in styles.fonts() {
        xml.push_str("\n        <font>");
        xml.push_str(&font_inner_xml(font, "name"));
        xml.push_str("</font>");
    }
    xml.push_str("\n    </fonts>");

    xml.push_str(&format!("\n    <fills count=\"{}\">", styles.fills().len()));
    for fill in styles.fills() {
        xml.push_str("\n        <fill>");
        xml.push_str(&fill_xml(fill));
        xml.push_str("</fill>");
    }
    xml.push_str("\n    </fills>");

    xml.push_str(&format!(
        "\n    <borders count=\"{}\">",
        styles.borders().len()
    ));
    for border in styles.borders() {
        xml.push_str("\n        ");
        xml.push_str(&border_xml(border));
    }
    xml.push_str("\n    </borders>");

    xml.push_str(
        "\n    <cellStyleXfs count=\"1\">\n        <xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/>\n    </cellStyleXfs>",
    );

    xml.push_str(&format!("\n    <cellXfs count=\"{}\">", styles.xfs().len()));
    for xf in styles.xfs() {
        let mut attrs = format!(
            "numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"",
            xf.number_format, xf.font, xf.fill, xf.border
        );
        if xf.number_format != 0 {
            attrs.push_str(" applyNumberFormat=\"1\"");
        }
        if xf.font != 0 {
            attrs.push_str(" applyFont=\"1\"");
        }
        if xf.fill != 0 {
            attrs.push_str(" applyFill=\"1\"");
        }
        if xf.border != 0 {
            attrs.push_str(" applyBorder=\"1\"");
        }
        match &xf.alignment {
            Some(a) if a.is_non_default() => {
                attrs.push_str(" applyAlignment=\"1\"");
                xml.push_str(&format!(
                    "\n        <xf {attrs}>{}</xf>",
                    alignment_xml(a)
                ));
            }
            _ => xml.push_str(&format!("\n        <xf {attrs}/>")),
        }
    }
    xml.push_str("\n    </cellXfs>");

    xml.push_str(
        "\n    <cellStyles count=\"1\">\n        <cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/>\n    </cellStyles>",
    );
    xml.push_str("\n</styleSheet>");
    xml
}

/// Inner elements of a `<font>` (styles.xml) or `<rPr>` (shared strings)
/// block. The two differ only in the name tag (`name` vs `rFont`).
pub(crate) fn font_inner_xml(font: &Font, name_tag: &str) -> String {
    let mut xml = String::new();
    if font.bold {
        xml.push_str("<b/>");
    }
    if font.italic {
        xml.push_str("<i/>");
    }
    if font.strikeout {
        xml.push_str("<strike/>");
    }
    match font.underline {
        Underline::None => {}
        Underline::Single => xml.push_str("<u/>"),
        Underline::Double => xml.push_str("<u val=\"double\"/>"),
        Underline::SingleAccounting => xml.push_str("<u val=\"singleAccounting\"/>"),
        Underline::DoubleAccounting => xml.push_str("<u val=\"doubleAccounting\"/>"),
    }
    xml.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if let Some(color) = color_xml("color", &font.color) {
        xml.push_str(&color);
    }
    xml.push_str(&format!(
        "<{name_tag} val=\"{}\"/>",
        escape_attr(&font.name)
    ));
    if let Some(family) = font.family {
        xml.push_str(&format!("<family val=\"{family}\"/>"));
    }
    if let Some(charset) = font.charset {
        xml.push_str(&format!("<charset val=\"{charset}\"/>"));
    }
    match font.scheme {
        FontScheme::None => {}
        FontScheme::Major => xml.push_str("<scheme val=\"major\"/>"),
        FontScheme::Minor => xml.push_str("<scheme val=\"minor\"/>"),
    }
    xml
}

/// A color element, or `None` for [`Color::Auto`] which stays unwritten.
pub(crate) fn color_xml(tag: &str, color: &Color) -> Option<String> {
    match color {
        Color::Auto => None,
        Color::Indexed(i) => Some(format!("<{tag} indexed=\"{i}\"/>")),
        Color::Rgb { .. } => Some(format!("<{tag} rgb=\"{}\"/>", color.to_argb_hex())),
        Color::Theme { theme, tint } => match tint {
            Some(t) => Some(format!("<{tag} theme=\"{theme}\" tint=\"{t}\"/>")),
            None => Some(format!("<{tag} theme=\"{theme}\"/>")),
        },
    }
}

/// Parse the attributes of a color element.
pub(crate) fn parse_color_attrs(e: &quick_xml::events::BytesStart<'_>) -> XlsxResult<Color> {
    let mut indexed = None;
    let mut rgb = None;
    let mut theme = None;
    let mut tint = None;
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
        match attr.key.as_ref() {
            b"indexed" => indexed = value.parse::<u8>().ok(),
            b"rgb" => rgb = Color::from_hex(&value),
            b"theme" => theme = value.parse::<u8>().ok(),
            b"tint" => tint = value.parse::<f64>().ok(),
            _ => {}
        }
    }
    Ok(if let Some(c) = rgb {
        c
    } else if let Some(i) = indexed {
        Color::Indexed(i)
    } else if let Some(t) = theme {
        Color::Theme { theme: t, tint }
    } else {
        Color::Auto
    })
}

fn fill_xml(fill: &Fill) -> String {
    let mut xml = format!("<patternFill patternType=\"{}\"", fill.pattern.as_str());
    let fg = fill.foreground.as_ref().and_then(|c| color_xml("fgColor", c));
    let bg = fill.background.as_ref().and_then(|c| color_xml("bgColor", c));
    if fg.is_none() && bg.is_none() {
        xml.push_str("/>");
        return xml;
    }
    xml.push('>');
    if let Some(fg) = fg {
        xml.push_str(&fg);
    }
    if let Some(bg) = bg {
        xml.push_str(&bg);
    }
    xml.push_str("</patternFill>");
    xml
}

fn border_edge_xml(tag: &str, edge: &BorderEdge) -> String {
    if edge.style == BorderLineStyle::None {
        return format!("<{tag}/>");
    }
    let mut xml = format!("<{tag} style=\"{}\">", edge.style.as_str());
    if let Some(color) = edge.color.as_ref().and_then(|c| color_xml("color", c)) {
        xml.push_str(&color);
    }
    xml.push_str(&format!("</{tag}>"));
    xml
}

fn border_xml(border: &Border) -> String {
    let mut xml = String::from("<border");
    if border.diagonal_up {
        xml.push_str(" diagonalUp=\"1\"");
    }
    if border.diagonal_down {
        xml.push_str(" diagonalDown=\"1\"");
    }
    xml.push('>');
    xml.push_str(&border_edge_xml("left", &border.left));
    xml.push_str(&border_edge_xml("right", &border.right));
    xml.push_str(&border_edge_xml("top", &border.top));
    xml.push_str(&border_edge_xml("bottom", &border.bottom));
    xml.push_str(&border_edge_xml("diagonal", &border.diagonal));
    xml.push_str("</border>");
    xml
}

fn alignment_xml(a: &Alignment) -> String {
    let mut xml = String::from("<alignment");
    if a.horizontal != HorizontalAlignment::General {
        xml.push_str(&format!(" horizontal=\"{}\"", a.horizontal.as_str()));
    }
    if a.vertical != VerticalAlignment::Bottom {
        xml.push_str(&format!(" vertical=\"{}\"", a.vertical.as_str()));
    }
    if a.wrap_text {
        xml.push_str(" wrapText=\"1\"");
    }
    if a.shrink_to_fit {
        xml.push_str(" shrinkToFit=\"1\"");
    }
    if a.indent != 0 {
        xml.push_str(&format!(" indent=\"{}\"", a.indent));
    }
    if a.rotation != 0 {
        xml.push_str(&format!(" textRotation=\"{}\"", a.rotation));
    }
    xml.push_str("/>");
    xml
}

/// Raw style pools parsed from styles.xml.
///
/// Indices here match the on-disk part exactly. Cells are re-interned into
/// the target registry through [`ParsedStyles::intern_xf`].
#[derive(Debug, Default)]
pub struct ParsedStyles {
    pub fonts: Vec<Font>,
    pub fills: Vec<Fill>,
    pub borders: Vec<Border>,
    pub xfs: Vec<CellXf>,
    pub formats: Vec<(u16, String)>,
}

impl ParsedStyles {
    /// Re-intern the xf at an on-disk index into `registry`, returning the
    /// registry-local style index.
    pub fn intern_xf(&self, registry: &mut StyleRegistry, disk_index: u32) -> Option<u32> {
        let xf = self.xfs.get(disk_index as usize)?;
        let font = self
            .fonts
            .get(xf.font as usize)
            .cloned()
            .unwrap_or_default();
        let fill = self
            .fills
            .get(xf.fill as usize)
            .copied()
            .unwrap_or_default();
        let border = self
            .borders
            .get(xf.border as usize)
            .copied()
            .unwrap_or_default();
        let interned = CellXf {
            font: registry.add_font(font),
            fill: registry.add_fill(fill),
            border: registry.add_border(border),
            number_format: xf.number_format,
            alignment: xf.alignment,
        };
        Some(registry.add_xf(interned))
    }

    /// Install the parsed custom format codes into `registry`.
    pub fn install_formats(&self, registry: &mut StyleRegistry) {
        for (id, code) in &self.formats {
            registry.number_formats_mut().put_format(*id, code);
        }
    }
}

/// Sections of styles.xml the parser tracks.
#[derive(PartialEq)]
enum Section {
    None,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

/// Accumulates font properties across a `<font>`/`<rPr>` block.
#[derive(Default)]
pub(crate) struct FontBuilder {
    font: Option<Font>,
}

impl FontBuilder {
    pub fn start(&mut self) {
        let mut font = Font::default();
        // Parsed fonts carry only what the part declares
        font.scheme = FontScheme::None;
        font.family = None;
        self.font = Some(font);
    }

    pub fn finish(&mut self) -> Font {
        self.font.take().unwrap_or_default()
    }

    /// Feed one child element of the font block. Returns false when the tag
    /// is not a font property.
    pub fn element(&mut self, e: &quick_xml::events::BytesStart<'_>) -> XlsxResult<bool> {
        let Some(font) = self.font.as_mut() else {
            return Ok(false);
        };
        let mut val = None;
        for attr in e.attributes().flatten() {
            if attr.key.as_ref() == b"val" {
                val = Some(attr.unescape_value().map_err(XlsxError::Xml)?.into_owned());
            }
        }
        match e.name().as_ref() {
            b"b" => font.bold = val.as_deref() != Some("0"),
            b"i" => font.italic = val.as_deref() != Some("0"),
            b"strike" => font.strikeout = val.as_deref() != Some("0"),
            b"u" => {
                font.underline = match val.as_deref() {
                    None | Some("single") => Underline::Single,
                    Some("double") => Underline::Double,
                    Some("singleAccounting") => Underline::SingleAccounting,
                    Some("doubleAccounting") => Underline::DoubleAccounting,
                    Some("none") => Underline::None,
                    Some(other) => {
                        return Err(XlsxError::Parse(format!(
                            "unknown underline value '{other}'"
                        )))
                    }
                }
            }
            b"sz" => {
                if let Some(v) = val.as_deref().and_then(|v| v.parse::<f64>().ok()) {
                    font.size = v;
                }
            }
            b"name" | b"rFont" => {
                if let Some(v) = val {
                    font.name = v;
                }
            }
            b"family" => font.family = val.as_deref().and_then(|v| v.parse().ok()),
            b"charset" => font.charset = val.as_deref().and_then(|v| v.parse().ok()),
            b"scheme" => {
                font.scheme = match val.as_deref() {
                    Some("major") => FontScheme::Major,
                    Some("minor") => FontScheme::Minor,
                    _ => FontScheme::None,
                }
            }
            b"color" => font.color = parse_color_attrs(e)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Parse styles.xml into raw pools.
pub fn parse_styles_xml(xml: &str) -> XlsxResult<ParsedStyles> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut parsed = ParsedStyles::default();
    let mut section = Section::None;
    let mut font_builder = FontBuilder::default();
    let mut current_fill: Option<Fill> = None;
    let mut current_border: Option<Border> = None;
    let mut current_edge: Option<&'static str> = None;
    let mut current_xf: Option<CellXf> = None;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf);
        match event {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let empty = matches!(event, Ok(Event::Empty(_)));
                match e.name().as_ref() {
                    b"fonts" => section = Section::Fonts,
                    b"fills" => section = Section::Fills,
                    b"borders" => section = Section::Borders,
                    b"cellXfs" => section = Section::CellXfs,
                    b"numFmt" => {
                        let mut id = None;
                        let mut code = None;
                        for attr in e.attributes().flatten() {
                            let value =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                            match attr.key.as_ref() {
                                b"numFmtId" => id = value.parse::<u16>().ok(),
                                b"formatCode" => code = Some(value),
                                _ => {}
                            }
                        }
                        if let (Some(id), Some(code)) = (id, code) {
                            parsed.formats.push((id, code));
                        }
                    }
                    b"font" if section == Section::Fonts => {
                        font_builder.start();
                        if empty {
                            parsed.fonts.push(font_builder.finish());
                        }
                    }
                    b"fill" if section == Section::Fills => {
                        current_fill = Some(Fill::NONE);
                    }
                    b"patternFill" => {
                        if let Some(fill) = current_fill.as_mut() {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"patternType" {
                                    let value = attr
                                        .unescape_value()
                                        .map_err(XlsxError::Xml)?
                                        .into_owned();
                                    fill.pattern =
                                        PatternType::parse(&value).unwrap_or(PatternType::None);
                                }
                            }
                        }
                    }
                    b"fgColor" => {
                        if let Some(fill) = current_fill.as_mut() {
                            fill.foreground = Some(parse_color_attrs(e)?);
                        }
                    }
                    b"bgColor" => {
                        if let Some(fill) = current_fill.as_mut() {
                            fill.background = Some(parse_color_attrs(e)?);
                        }
                    }
                    b"border" if section == Section::Borders => {
                        let mut border = Border::default();
                        for attr in e.attributes().flatten() {
                            let value =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                            match attr.key.as_ref() {
                                b"diagonalUp" => border.diagonal_up = value == "1",
                                b"diagonalDown" => border.diagonal_down = value == "1",
                                _ => {}
                            }
                        }
                        if empty {
                            parsed.borders.push(border);
                        } else {
                            current_border = Some(border);
                        }
                    }
                    tag @ (b"left" | b"right" | b"top" | b"bottom" | b"diagonal")
                        if current_border.is_some() =>
                    {
                        let name = match tag {
                            b"left" => "left",
                            b"right" => "right",
                            b"top" => "top",
                            b"bottom" => "bottom",
                            _ => "diagonal",
                        };
                        let mut edge = BorderEdge::default();
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"style" {
                                let value =
                                    attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                                edge.style =
                                    BorderLineStyle::parse(&value).unwrap_or_default();
                            }
                        }
                        if let Some(border) = current_border.as_mut() {
                            set_border_edge(border, name, edge);
                        }
                        current_edge = if empty { None } else { Some(name) };
                    }
                    b"color" if current_edge.is_some() => {
                        let color = parse_color_attrs(e)?;
                        if let (Some(border), Some(name)) =
                            (current_border.as_mut(), current_edge)
                        {
                            let mut edge = get_border_edge(border, name);
                            edge.color = Some(color);
                            set_border_edge(border, name, edge);
                        }
                    }
                    b"color" if section == Section::Fonts => {
                        font_builder.element(e)?;
                    }
                    b"xf" if section == Section::CellXfs => {
                        let mut xf = CellXf::default();
                        for attr in e.attributes().flatten() {
                            let value =
                                attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                            match attr.key.as_ref() {
                                b"numFmtId" => {
                                    xf.number_format = value.parse().unwrap_or(0);
                                }
                                b"fontId" => xf.font = value.parse().unwrap_or(0),
                                b"fillId" => xf.fill = value.parse().unwrap_or(0),
                                b"borderId" => xf.border = value.parse().unwrap_or(0),
                                _ => {}
                            }
                        }
                        if empty {
                            parsed.xfs.push(xf);
                        } else {
                            current_xf = Some(xf);
                        }
                    }
                    b"alignment" => {
                        if let Some(xf) = current_xf.as_mut() {
                            let mut a = Alignment::default();
                            for attr in e.attributes().flatten() {
                                let value =
                                    attr.unescape_value().map_err(XlsxError::Xml)?.into_owned();
                                match attr.key.as_ref() {
                                    b"horizontal" => {
                                        a.horizontal = HorizontalAlignment::parse(&value)
                                            .unwrap_or_default()
                                    }
                                    b"vertical" => {
                                        a.vertical =
                                            VerticalAlignment::parse(&value).unwrap_or_default()
                                    }
                                    b"wrapText" => a.wrap_text = value == "1",
                                    b"shrinkToFit" => a.shrink_to_fit = value == "1",
                                    b"indent" => a.indent = value.parse().unwrap_or(0),
                                    b"textRotation" => a.rotation = value.parse().unwrap_or(0),
                                    _ => {}
                                }
                            }
                            xf.alignment = Some(a);
                        }
                    }
                    _ if section == Section::Fonts => {
                        font_builder.element(e)?;
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"fonts" | b"fills" | b"borders" | b"cellXfs" => section = Section::None,
                b"font" if section == Section::Fonts => {
                    parsed.fonts.push(font_builder.finish());
                }
                b"fill" => {
                    if let Some(fill) = current_fill.take() {
                        parsed.fills.push(fill);
                    }
                }
                b"border" => {
                    if let Some(border) = current_border.take() {
                        parsed.borders.push(border);
                    }
                }
                b"left" | b"right" | b"top" | b"bottom" | b"diagonal" => current_edge = None,
                b"xf" if section == Section::CellXfs => {
                    if let Some(xf) = current_xf.take() {
                        parsed.xfs.push(xf);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }
    Ok(parsed)
}

fn get_border_edge(border: &Border, name: &str) -> BorderEdge {
    match name {
        "left" => border.left,
        "right" => border.right,
        "top" => border.top,
        "bottom" => border.bottom,
        _ => border.diagonal,
    }
}

fn set_border_edge(border: &mut Border, name: &str, edge: BorderEdge) {
    match name {
        "left" => border.left = edge,
        "right" => border.right = edge,
        "top" => border.top = edge,
        "bottom" => border.bottom = edge,
        _ => border.diagonal = edge,
    }
}

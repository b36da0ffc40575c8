//! Package part graph
//!
//! An OOXML package is a zip of named parts tied together by typed
//! relationships. This module models that graph: parts with content types,
//! and per-source relationship lists with stable `rId`s. The writer builds
//! a fresh graph on every save (ids are recomputed, never persisted); the
//! reader walks the graph to locate parts instead of guessing filenames.

use ahash::AHashMap;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};

pub const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type URIs for the parts we read and write.
pub mod rel_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const SHARED_STRINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
    pub const COMMENTS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
    pub const VML_DRAWING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/vmlDrawing";
    pub const DRAWING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
    pub const TABLE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/table";
    pub const PIVOT_TABLE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/pivotTable";
    pub const PIVOT_CACHE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/pivotCacheDefinition";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
}

/// Content type strings for the parts we read and write.
pub mod content_type {
    pub const WORKBOOK: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
    pub const WORKSHEET: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
    pub const STYLES: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
    pub const SHARED_STRINGS: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
    pub const COMMENTS: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml";
    pub const DRAWING: &str = "application/vnd.openxmlformats-officedocument.drawing+xml";
    pub const TABLE: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml";
    pub const PIVOT_TABLE: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.pivotTable+xml";
    pub const PIVOT_CACHE: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.pivotCacheDefinition+xml";
}

/// One directed relationship from a source part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// `rId<N>`, unique per source part
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target, relative to the source part's directory (or absolute for
    /// external targets)
    pub target: String,
    /// External targets (hyperlinks) leave the package
    pub external: bool,
}

/// The package-wide part and relationship graph.
#[derive(Debug, Default)]
pub struct PartGraph {
    /// Part name (no leading slash) -> content type
    parts: AHashMap<String, String>,
    /// Source part name ("" for the package root) -> its relationships
    rels: AHashMap<String, Vec<Relationship>>,
}

impl PartGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a part with its content type.
    pub fn add_part(&mut self, name: impl Into<String>, content_type: impl Into<String>) {
        self.parts.insert(name.into(), content_type.into());
    }

    pub fn content_type(&self, name: &str) -> Option<&str> {
        self.parts.get(name).map(String::as_str)
    }

    /// Add a relationship from `source` (a part name, or `""` for the
    /// package root), allocating the next free `rId`. Returns the id.
    pub fn add_relationship(
        &mut self,
        source: &str,
        rel_type: &str,
        target: impl Into<String>,
        external: bool,
    ) -> String {
        let list = self.rels.entry(source.to_string()).or_default();
        let id = format!("rId{}", list.len() + 1);
        list.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.into(),
            external,
        });
        id
    }

    pub fn relationships(&self, source: &str) -> &[Relationship] {
        self.rels.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Target of a relationship by source and id.
    pub fn relationship_target(&self, source: &str, id: &str) -> Option<&str> {
        self.relationships(source)
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.target.as_str())
    }

    /// First relationship of a given type from `source`.
    pub fn relationship_of_type(&self, source: &str, rel_type: &str) -> Option<&Relationship> {
        self.relationships(source)
            .iter()
            .find(|r| r.rel_type == rel_type)
    }

    /// Resolve a relationship target against its source part's directory
    /// into a normalized part name.
    pub fn resolve_target(source: &str, target: &str) -> String {
        let base = match source.rfind('/') {
            Some(pos) => &source[..pos],
            None => "",
        };
        let mut segments: Vec<&str> = if base.is_empty() {
            Vec::new()
        } else {
            base.split('/').collect()
        };
        for seg in target.split('/') {
            match seg {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        segments.join("/")
    }

    /// The `.rels` part name for a source part (`""` for the root).
    pub fn rels_part_name(source: &str) -> String {
        match source.rfind('/') {
            Some(pos) => format!("{}/_rels/{}.rels", &source[..pos], &source[pos + 1..]),
            None if source.is_empty() => "_rels/.rels".to_string(),
            None => format!("_rels/{source}.rels"),
        }
    }

    /// Assemble `[Content_Types].xml` for the registered parts.
    pub fn content_types_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Default Extension="vml" ContentType="application/vnd.openxmlformats-officedocument.vmlDrawing"/>"#,
        );
        let mut overrides: Vec<(&String, &String)> = self
            .parts
            .iter()
            .filter(|(name, _)| !name.ends_with(".vml"))
            .collect();
        overrides.sort();
        for (name, ct) in overrides {
            xml.push_str(&format!(
                "\n    <Override PartName=\"/{name}\" ContentType=\"{ct}\"/>"
            ));
        }
        xml.push_str("\n</Types>");
        xml
    }

    /// Assemble the `.rels` XML for a source part.
    pub fn rels_xml(&self, source: &str) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"{REL_NS}\">"
        );
        for rel in self.relationships(source) {
            let mode = if rel.external {
                " TargetMode=\"External\""
            } else {
                ""
            };
            xml.push_str(&format!(
                "\n    <Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"{}/>",
                rel.id,
                rel.rel_type,
                escape_attr(&rel.target),
                mode
            ));
        }
        xml.push_str("\n</Relationships>");
        xml
    }

    /// Parse a `.rels` document and install the relationships for `source`.
    pub fn parse_rels(&mut self, source: &str, xml: &str) -> XlsxResult<()> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut list = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = String::new();
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut external = false;
                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map_err(XlsxError::Xml)?
                            .into_owned();
                        match attr.key.as_ref() {
                            b"Id" => id = value,
                            b"Type" => rel_type = value,
                            b"Target" => target = value,
                            b"TargetMode" => external = value == "External",
                            _ => {}
                        }
                    }
                    if id.is_empty() || target.is_empty() {
                        return Err(XlsxError::Parse(format!(
                            "relationship in '{source}' rels missing Id or Target"
                        )));
                    }
                    list.push(Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                    });
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }
        self.rels.insert(source.to_string(), list);
        Ok(())
    }

    /// Parse `[Content_Types].xml` overrides into the part table.
    pub fn parse_content_types(&mut self, xml: &str) -> XlsxResult<()> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"Override" => {
                    let mut part = String::new();
                    let mut ct = String::new();
                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map_err(XlsxError::Xml)?
                            .into_owned();
                        match attr.key.as_ref() {
                            b"PartName" => part = value,
                            b"ContentType" => ct = value,
                            _ => {}
                        }
                    }
                    if let Some(name) = part.strip_prefix('/') {
                        self.parts.insert(name.to_string(), ct);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    /// Part names of a given content type, sorted for deterministic walks.
    pub fn parts_of_type(&self, content_type: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .parts
            .iter()
            .filter(|(_, ct)| ct.as_str() == content_type)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort();
        names
    }
}

pub(crate) fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rids_are_allocated_per_source() {
        let mut graph = PartGraph::new();
        let a = graph.add_relationship("xl/workbook.xml", rel_type::WORKSHEET, "worksheets/sheet1.xml", false);
        let b = graph.add_relationship("xl/workbook.xml", rel_type::STYLES, "styles.xml", false);
        let c = graph.add_relationship("", rel_type::OFFICE_DOCUMENT, "xl/workbook.xml", false);
        assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("rId1", "rId2", "rId1"));
        assert_eq!(
            graph.relationship_target("xl/workbook.xml", "rId2"),
            Some("styles.xml")
        );
        assert_eq!(graph.relationship_target("xl/workbook.xml", "rId9"), None);
    }

    #[test]
    fn target_resolution_handles_parent_dirs() {
        assert_eq!(
            PartGraph::resolve_target("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            PartGraph::resolve_target("xl/worksheets/sheet1.xml", "../comments1.xml"),
            "xl/comments1.xml"
        );
        assert_eq!(
            PartGraph::resolve_target("", "xl/workbook.xml"),
            "xl/workbook.xml"
        );
        assert_eq!(
            PartGraph::resolve_target("xl/worksheets/sheet1.xml", "../drawings/drawing1.xml"),
            "xl/drawings/drawing1.xml"
        );
    }

    #[test]
    fn rels_part_names() {
        assert_eq!(PartGraph::rels_part_name(""), "_rels/.rels");
        assert_eq!(
            PartGraph::rels_part_name("xl/workbook.xml"),
            "xl/_rels/workbook.xml.rels"
        );
        assert_eq!(
            PartGraph::rels_part_name("xl/worksheets/sheet2.xml"),
            "xl/worksheets/_rels/sheet2.xml.rels"
        );
    }

    #[test]
    fn rels_xml_round_trips() {
        let mut graph = PartGraph::new();
        graph.add_relationship("xl/worksheets/sheet1.xml", rel_type::COMMENTS, "../comments1.xml", false);
        graph.add_relationship(
            "xl/worksheets/sheet1.xml",
            rel_type::HYPERLINK,
            "https://example.com/?a=1&b=2",
            true,
        );
        let xml = graph.rels_xml("xl/worksheets/sheet1.xml");

        let mut parsed = PartGraph::new();
        parsed.parse_rels("xl/worksheets/sheet1.xml", &xml).unwrap();
        let rels = parsed.relationships("xl/worksheets/sheet1.xml");
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].id, "rId1");
        assert!(!rels[0].external);
        assert_eq!(rels[1].target, "https://example.com/?a=1&b=2");
        assert!(rels[1].external);
    }

    #[test]
    fn content_types_round_trip() {
        let mut graph = PartGraph::new();
        graph.add_part("xl/workbook.xml", content_type::WORKBOOK);
        graph.add_part("xl/worksheets/sheet1.xml", content_type::WORKSHEET);
        let xml = graph.content_types_xml();

        let mut parsed = PartGraph::new();
        parsed.parse_content_types(&xml).unwrap();
        assert_eq!(
            parsed.content_type("xl/workbook.xml"),
            Some(content_type::WORKBOOK)
        );
        assert_eq!(
            parsed.parts_of_type(content_type::WORKSHEET),
            vec!["xl/worksheets/sheet1.xml"]
        );
    }
}

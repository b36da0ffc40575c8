//! Hyperlinks

use crate::addr::CellRange;

/// A hyperlink attached to a cell range.
///
/// External targets (URL, email, file) are serialized as package
/// relationships; document-internal links point at a sheet location and
/// need no relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperlink {
    /// Cells the link covers
    pub range: CellRange,
    pub kind: HyperlinkKind,
    /// Link target: a URL, `mailto:` address, file path, or an internal
    /// location like `Sheet2!A1`
    pub target: String,
    /// Hover tooltip
    pub tooltip: Option<String>,
}

/// What a hyperlink points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HyperlinkKind {
    Url,
    Email,
    File,
    /// A location inside this workbook
    Document,
}

impl Hyperlink {
    pub fn url(range: CellRange, target: impl Into<String>) -> Self {
        Self {
            range,
            kind: HyperlinkKind::Url,
            target: target.into(),
            tooltip: None,
        }
    }

    pub fn email(range: CellRange, address: impl Into<String>) -> Self {
        let address = address.into();
        let target = if address.starts_with("mailto:") {
            address
        } else {
            format!("mailto:{address}")
        };
        Self {
            range,
            kind: HyperlinkKind::Email,
            target,
            tooltip: None,
        }
    }

    pub fn file(range: CellRange, path: impl Into<String>) -> Self {
        Self {
            range,
            kind: HyperlinkKind::File,
            target: path.into(),
            tooltip: None,
        }
    }

    /// Link to a location in this workbook, e.g. `Sheet2!A1`.
    pub fn document(range: CellRange, location: impl Into<String>) -> Self {
        Self {
            range,
            kind: HyperlinkKind::Document,
            target: location.into(),
            tooltip: None,
        }
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Whether this link needs a package relationship when saved.
    pub fn is_external(&self) -> bool {
        !matches!(self.kind, HyperlinkKind::Document)
    }
}

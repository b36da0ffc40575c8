//! Cell comments (notes)

use crate::rich_text::RichText;

/// A comment anchored to a cell.
///
/// The anchor cell itself is the worksheet's map key, not stored here; the
/// worksheet enforces one comment per anchor. The VML box describes where
/// the legacy comment shape floats relative to the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Author shown in the comment header
    pub author: String,
    /// Comment body, possibly with formatting runs
    pub text: RichText,
    /// Whether the comment box is visible without hovering
    pub visible: bool,
    /// Legacy VML shape anchor box
    pub shape_anchor: VmlAnchor,
}

impl Comment {
    pub fn new(author: impl Into<String>, text: impl Into<RichText>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            visible: false,
            shape_anchor: VmlAnchor::default(),
        }
    }

    /// Comment with just a body and no author.
    pub fn text_only(text: impl Into<RichText>) -> Self {
        Self::new("", text)
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_shape_anchor(mut self, anchor: VmlAnchor) -> Self {
        self.shape_anchor = anchor;
        self
    }

    pub fn has_author(&self) -> bool {
        !self.author.is_empty()
    }
}

impl std::fmt::Display for Comment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_author() {
            write!(f, "[{}]: {}", self.author, self.text.text())
        } else {
            write!(f, "{}", self.text.text())
        }
    }
}

/// VML client anchor for the floating comment box: from/to grid corners,
/// each with a pixel inset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmlAnchor {
    pub from_col: u16,
    pub from_col_offset: u32,
    pub from_row: u32,
    pub from_row_offset: u32,
    pub to_col: u16,
    pub to_col_offset: u32,
    pub to_row: u32,
    pub to_row_offset: u32,
}

impl Default for VmlAnchor {
    /// The box Excel uses for a fresh comment: one column right of the
    /// anchor, spanning three rows.
    fn default() -> Self {
        Self {
            from_col: 1,
            from_col_offset: 15,
            from_row: 0,
            from_row_offset: 2,
            to_col: 3,
            to_col_offset: 15,
            to_row: 3,
            to_row_offset: 16,
        }
    }
}

impl VmlAnchor {
    /// Place the box just right of the given anchor cell.
    pub fn beside(row: u32, col: u16) -> Self {
        Self {
            from_col: col + 1,
            from_row: row,
            to_col: col + 3,
            to_row: row + 3,
            ..Self::default()
        }
    }

    /// Value of the VML `<x:Anchor>` element.
    pub fn to_vml(&self) -> String {
        format!(
            "{}, {}, {}, {}, {}, {}, {}, {}",
            self.from_col,
            self.from_col_offset,
            self.from_row,
            self.from_row_offset,
            self.to_col,
            self.to_col_offset,
            self.to_row,
            self.to_row_offset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_author_when_present() {
        let with_author = Comment::new("Ada", "check this");
        assert_eq!(with_author.to_string(), "[Ada]: check this");
        let without = Comment::text_only("check this");
        assert_eq!(without.to_string(), "check this");
        assert!(!without.has_author());
    }

    #[test]
    fn beside_anchor_tracks_the_cell() {
        let anchor = VmlAnchor::beside(4, 2);
        assert_eq!(anchor.from_col, 3);
        assert_eq!(anchor.from_row, 4);
        assert_eq!(anchor.to_row, 7);
        assert_eq!(anchor.to_vml(), "3, 15, 4, 2, 5, 15, 7, 16");
    }
}

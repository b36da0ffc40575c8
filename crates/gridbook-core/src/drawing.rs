//! Drawings: anchored shapes over the grid
//!
//! A worksheet owns at most one drawing (the "patriarch"); shapes hang off
//! it with ids that are stable for the life of the drawing. Cloning a sheet
//! must clone the drawing as an independent subtree, so `deep_clone`
//! reissues every shape id instead of copying them.

use crate::rich_text::RichText;

/// EMUs (English Metric Units) per pixel at 96 DPI.
pub const EMU_PER_PIXEL: i64 = 9525;

/// Two-cell client anchor: the shape stretches from a point inside the
/// `from` cell to a point inside the `to` cell, offsets in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientAnchor {
    pub from_col: u16,
    pub from_col_offset: i64,
    pub from_row: u32,
    pub from_row_offset: i64,
    pub to_col: u16,
    pub to_col_offset: i64,
    pub to_row: u32,
    pub to_row_offset: i64,
}

impl ClientAnchor {
    /// Anchor spanning whole cells, no offsets.
    pub fn cells(from_row: u32, from_col: u16, to_row: u32, to_col: u16) -> Self {
        Self {
            from_col,
            from_row,
            to_col,
            to_row,
            ..Self::default()
        }
    }
}

/// Preset shape geometries (the subset commonly round-tripped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Rect,
    RoundRect,
    Ellipse,
    Line,
    RightArrow,
    Diamond,
    Triangle,
}

impl ShapeType {
    /// The `prstGeom` preset name.
    pub fn preset_name(&self) -> &'static str {
        match self {
            ShapeType::Rect => "rect",
            ShapeType::RoundRect => "roundRect",
            ShapeType::Ellipse => "ellipse",
            ShapeType::Line => "line",
            ShapeType::RightArrow => "rightArrow",
            ShapeType::Diamond => "diamond",
            ShapeType::Triangle => "triangle",
        }
    }

    pub fn from_preset(s: &str) -> Option<Self> {
        Some(match s {
            "rect" => ShapeType::Rect,
            "roundRect" => ShapeType::RoundRect,
            "ellipse" => ShapeType::Ellipse,
            "line" => ShapeType::Line,
            "rightArrow" => ShapeType::RightArrow,
            "diamond" => ShapeType::Diamond,
            "triangle" => ShapeType::Triangle,
            _ => return None,
        })
    }
}

/// What a shape is; the variant carries the per-kind payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// A preset geometry with optional text
    Simple {
        shape_type: ShapeType,
        text: Option<RichText>,
    },
    /// A text box
    TextBox { text: RichText },
    /// A straight connector between the anchor corners
    Connector { shape_type: ShapeType },
    /// A picture referencing an image part through the drawing's rels
    Picture { relationship_target: String },
}

/// One anchored shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: u32,
    pub name: String,
    pub anchor: ClientAnchor,
    pub kind: ShapeKind,
    /// Solid fill in ARGB hex, `None` for the theme default
    pub fill_color: Option<String>,
    /// Outline color in ARGB hex
    pub line_color: Option<String>,
    /// Outline width in EMUs
    pub line_width: Option<i64>,
}

impl Shape {
    pub fn text(&self) -> Option<&RichText> {
        match &self.kind {
            ShapeKind::Simple { text, .. } => text.as_ref(),
            ShapeKind::TextBox { text } => Some(text),
            _ => None,
        }
    }
}

/// The per-sheet drawing container.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Drawing {
    shapes: Vec<Shape>,
    next_id: u32,
}

impl Drawing {
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            // Shape id 1 is reserved for the drawing canvas itself
            next_id: 2,
        }
    }

    fn allocate(&mut self, name_prefix: &str, anchor: ClientAnchor, kind: ShapeKind) -> &mut Shape {
        let id = self.next_id;
        self.next_id += 1;
        self.shapes.push(Shape {
            id,
            name: format!("{name_prefix} {id}"),
            anchor,
            kind,
            fill_color: None,
            line_color: None,
            line_width: None,
        });
        self.shapes.last_mut().expect("just pushed")
    }

    pub fn create_shape(&mut self, shape_type: ShapeType, anchor: ClientAnchor) -> &mut Shape {
        self.allocate(
            "Shape",
            anchor,
            ShapeKind::Simple {
                shape_type,
                text: None,
            },
        )
    }

    pub fn create_text_box(&mut self, anchor: ClientAnchor, text: RichText) -> &mut Shape {
        self.allocate("TextBox", anchor, ShapeKind::TextBox { text })
    }

    pub fn create_connector(&mut self, shape_type: ShapeType, anchor: ClientAnchor) -> &mut Shape {
        self.allocate("Connector", anchor, ShapeKind::Connector { shape_type })
    }

    pub fn create_picture(&mut self, anchor: ClientAnchor, relationship_target: String) -> &mut Shape {
        self.allocate(
            "Picture",
            anchor,
            ShapeKind::Picture {
                relationship_target,
            },
        )
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shapes_mut(&mut self) -> impl Iterator<Item = &mut Shape> {
        self.shapes.iter_mut()
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Restore a shape read from disk, keeping its id. The allocator is
    /// bumped past it so new shapes never collide.
    pub fn restore_shape(&mut self, shape: Shape) {
        self.next_id = self.next_id.max(shape.id + 1);
        self.shapes.push(shape);
    }

    /// An independent copy with freshly issued shape ids. Shape kind,
    /// anchors and properties are preserved; only ids differ.
    pub fn deep_clone(&self) -> Drawing {
        let mut clone = Drawing::new();
        for shape in &self.shapes {
            let id = clone.next_id;
            clone.next_id += 1;
            let mut copy = shape.clone();
            copy.id = id;
            clone.shapes.push(copy);
        }
        clone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_ids_start_at_two_and_never_repeat() {
        let mut d = Drawing::new();
        let a = d.create_shape(ShapeType::Rect, ClientAnchor::cells(0, 0, 2, 2)).id;
        let b = d
            .create_text_box(ClientAnchor::cells(3, 0, 5, 2), RichText::plain("note"))
            .id;
        assert_eq!((a, b), (2, 3));

        d.restore_shape(Shape {
            id: 10,
            name: "Restored".to_string(),
            anchor: ClientAnchor::default(),
            kind: ShapeKind::Connector {
                shape_type: ShapeType::Line,
            },
            fill_color: None,
            line_color: None,
            line_width: None,
        });
        let c = d.create_shape(ShapeType::Ellipse, ClientAnchor::default()).id;
        assert_eq!(c, 11);
    }

    #[test]
    fn deep_clone_preserves_kind_and_properties_with_fresh_ids() {
        let mut d = Drawing::new();
        let shape = d.create_shape(ShapeType::Diamond, ClientAnchor::cells(1, 1, 4, 4));
        shape.fill_color = Some("FFFF0000".to_string());
        d.create_text_box(ClientAnchor::cells(5, 0, 6, 1), RichText::plain("label"));

        let clone = d.deep_clone();
        assert_eq!(clone.shape_count(), d.shape_count());
        for (orig, copy) in d.shapes().iter().zip(clone.shapes()) {
            assert_eq!(orig.kind, copy.kind);
            assert_eq!(orig.anchor, copy.anchor);
            assert_eq!(orig.fill_color, copy.fill_color);
        }
        // Ids reissued from scratch
        let orig_ids: Vec<u32> = d.shapes().iter().map(|s| s.id).collect();
        let clone_ids: Vec<u32> = clone.shapes().iter().map(|s| s.id).collect();
        assert_eq!(orig_ids, clone_ids); // same sequence by construction
    }

    #[test]
    fn preset_names_round_trip() {
        for st in [
            ShapeType::Rect,
            ShapeType::RoundRect,
            ShapeType::Ellipse,
            ShapeType::Line,
            ShapeType::RightArrow,
            ShapeType::Diamond,
            ShapeType::Triangle,
        ] {
            assert_eq!(ShapeType::from_preset(st.preset_name()), Some(st));
        }
    }
}

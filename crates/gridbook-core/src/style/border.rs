//! Border definitions

use super::Color;

/// The borders of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Border {
    pub left: BorderEdge,
    pub right: BorderEdge,
    pub top: BorderEdge,
    pub bottom: BorderEdge,
    pub diagonal: BorderEdge,
    pub diagonal_up: bool,
    pub diagonal_down: bool,
}

impl Border {
    /// All four outer edges in the given style.
    pub fn outline(style: BorderLineStyle) -> Self {
        let edge = BorderEdge {
            style,
            color: None,
        };
        Self {
            left: edge,
            right: edge,
            top: edge,
            bottom: edge,
            ..Default::default()
        }
    }
}

/// One edge of a border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BorderEdge {
    pub style: BorderLineStyle,
    pub color: Option<Color>,
}

/// Line styles (the `style` attribute of a border edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderLineStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderLineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorderLineStyle::None => "none",
            BorderLineStyle::Thin => "thin",
            BorderLineStyle::Medium => "medium",
            BorderLineStyle::Thick => "thick",
            BorderLineStyle::Dashed => "dashed",
            BorderLineStyle::Dotted => "dotted",
            BorderLineStyle::Double => "double",
            BorderLineStyle::Hair => "hair",
            BorderLineStyle::MediumDashed => "mediumDashed",
            BorderLineStyle::DashDot => "dashDot",
            BorderLineStyle::MediumDashDot => "mediumDashDot",
            BorderLineStyle::DashDotDot => "dashDotDot",
            BorderLineStyle::MediumDashDotDot => "mediumDashDotDot",
            BorderLineStyle::SlantDashDot => "slantDashDot",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "none" => BorderLineStyle::None,
            "thin" => BorderLineStyle::Thin,
            "medium" => BorderLineStyle::Medium,
            "thick" => BorderLineStyle::Thick,
            "dashed" => BorderLineStyle::Dashed,
            "dotted" => BorderLineStyle::Dotted,
            "double" => BorderLineStyle::Double,
            "hair" => BorderLineStyle::Hair,
            "mediumDashed" => BorderLineStyle::MediumDashed,
            "dashDot" => BorderLineStyle::DashDot,
            "mediumDashDot" => BorderLineStyle::MediumDashDot,
            "dashDotDot" => BorderLineStyle::DashDotDot,
            "mediumDashDotDot" => BorderLineStyle::MediumDashDotDot,
            "slantDashDot" => BorderLineStyle::SlantDashDot,
            _ => return None,
        })
    }
}

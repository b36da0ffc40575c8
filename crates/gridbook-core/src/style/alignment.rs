//! Cell alignment

/// Alignment settings for a cell xf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Alignment {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub wrap_text: bool,
    pub shrink_to_fit: bool,
    /// Indent level in characters
    pub indent: u8,
    /// Text rotation in degrees (0..=180, 255 = vertical)
    pub rotation: u8,
}

impl Alignment {
    /// Whether this alignment differs from the default and needs an
    /// `<alignment>` element.
    pub fn is_non_default(&self) -> bool {
        *self != Alignment::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    #[default]
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

impl HorizontalAlignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            HorizontalAlignment::General => "general",
            HorizontalAlignment::Left => "left",
            HorizontalAlignment::Center => "center",
            HorizontalAlignment::Right => "right",
            HorizontalAlignment::Fill => "fill",
            HorizontalAlignment::Justify => "justify",
            HorizontalAlignment::CenterContinuous => "centerContinuous",
            HorizontalAlignment::Distributed => "distributed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "general" => HorizontalAlignment::General,
            "left" => HorizontalAlignment::Left,
            "center" => HorizontalAlignment::Center,
            "right" => HorizontalAlignment::Right,
            "fill" => HorizontalAlignment::Fill,
            "justify" => HorizontalAlignment::Justify,
            "centerContinuous" => HorizontalAlignment::CenterContinuous,
            "distributed" => HorizontalAlignment::Distributed,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    Top,
    Center,
    #[default]
    Bottom,
    Justify,
    Distributed,
}

impl VerticalAlignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerticalAlignment::Top => "top",
            VerticalAlignment::Center => "center",
            VerticalAlignment::Bottom => "bottom",
            VerticalAlignment::Justify => "justify",
            VerticalAlignment::Distributed => "distributed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "top" => VerticalAlignment::Top,
            "center" => VerticalAlignment::Center,
            "bottom" => VerticalAlignment::Bottom,
            "justify" => VerticalAlignment::Justify,
            "distributed" => VerticalAlignment::Distributed,
            _ => return None,
        })
    }
}

//! Fill (pattern) definitions

use super::Color;

/// A pattern fill. Gradient fills are not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fill {
    pub pattern: PatternType,
    /// Pattern foreground color
    pub foreground: Option<Color>,
    /// Pattern background color
    pub background: Option<Color>,
}

impl Fill {
    /// The default "no fill".
    pub const NONE: Fill = Fill {
        pattern: PatternType::None,
        foreground: None,
        background: None,
    };

    /// The gray-125 fill that styles.xml always carries at fill index 1.
    pub const GRAY_125: Fill = Fill {
        pattern: PatternType::Gray125,
        foreground: None,
        background: None,
    };

    /// Solid fill of the given color.
    pub fn solid(color: Color) -> Self {
        Self {
            pattern: PatternType::Solid,
            foreground: Some(color),
            background: None,
        }
    }
}

impl Default for Fill {
    fn default() -> Self {
        Fill::NONE
    }
}

/// Fill pattern kinds (the `patternType` attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PatternType {
    #[default]
    None,
    Solid,
    Gray125,
    MediumGray,
    DarkGray,
    LightGray,
    DarkHorizontal,
    DarkVertical,
    DarkDown,
    DarkUp,
    DarkGrid,
    DarkTrellis,
    LightHorizontal,
    LightVertical,
    LightDown,
    LightUp,
    LightGrid,
    LightTrellis,
    Gray0625,
}

impl PatternType {
    /// The schema attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::None => "none",
            PatternType::Solid => "solid",
            PatternType::Gray125 => "gray125",
            PatternType::MediumGray => "mediumGray",
            PatternType::DarkGray => "darkGray",
            PatternType::LightGray => "lightGray",
            PatternType::DarkHorizontal => "darkHorizontal",
            PatternType::DarkVertical => "darkVertical",
            PatternType::DarkDown => "darkDown",
            PatternType::DarkUp => "darkUp",
            PatternType::DarkGrid => "darkGrid",
            PatternType::DarkTrellis => "darkTrellis",
            PatternType::LightHorizontal => "lightHorizontal",
            PatternType::LightVertical => "lightVertical",
            PatternType::LightDown => "lightDown",
            PatternType::LightUp => "lightUp",
            PatternType::LightGrid => "lightGrid",
            PatternType::LightTrellis => "lightTrellis",
            PatternType::Gray0625 => "gray0625",
        }
    }

    /// Parse the schema attribute value.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "none" => PatternType::None,
            "solid" => PatternType::Solid,
            "gray125" => PatternType::Gray125,
            "mediumGray" => PatternType::MediumGray,
            "darkGray" => PatternType::DarkGray,
            "lightGray" => PatternType::LightGray,
            "darkHorizontal" => PatternType::DarkHorizontal,
            "darkVertical" => PatternType::DarkVertical,
            "darkDown" => PatternType::DarkDown,
            "darkUp" => PatternType::DarkUp,
            "darkGrid" => PatternType::DarkGrid,
            "darkTrellis" => PatternType::DarkTrellis,
            "lightHorizontal" => PatternType::LightHorizontal,
            "lightVertical" => PatternType::LightVertical,
            "lightDown" => PatternType::LightDown,
            "lightUp" => PatternType::LightUp,
            "lightGrid" => PatternType::LightGrid,
            "lightTrellis" => PatternType::LightTrellis,
            "gray0625" => PatternType::Gray0625,
            _ => return None,
        })
    }
}

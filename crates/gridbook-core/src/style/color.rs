//! Color representation

/// A cell/font/fill color.
///
/// Closed set of the three OOXML color encodings plus the "automatic"
/// default. `tint` is a multiplicative modifier that exists only for theme
/// colors; it is never combined with an alpha channel (alpha lives only on
/// [`Color::Rgb`]).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Color {
    /// Automatic/default color
    #[default]
    Auto,

    /// Legacy indexed palette color
    Indexed(u8),

    /// ARGB color
    Rgb { a: u8, r: u8, g: u8, b: u8 },

    /// Theme-relative color with an optional tint in [-1.0, 1.0]
    Theme { theme: u8, tint: Option<f64> },
}

impl Color {
    /// Opaque RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { a: 0xFF, r, g, b }
    }

    /// Theme color without tint.
    pub const fn theme(theme: u8) -> Self {
        Color::Theme { theme, tint: None }
    }

    /// Theme color with tint.
    pub const fn theme_tinted(theme: u8, tint: f64) -> Self {
        Color::Theme {
            theme,
            tint: Some(tint),
        }
    }

    /// Parse an 8-digit (ARGB) or 6-digit (RGB, opaque) hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Color::Rgb {
                a: 0xFF,
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
            }),
            8 => Some(Color::Rgb {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            _ => None,
        }
    }

    /// 8-character ARGB hex form used by the `rgb` attribute in styles.xml.
    ///
    /// Only meaningful for [`Color::Rgb`] and [`Color::Auto`]; indexed and
    /// theme colors serialize through their own attributes.
    pub fn to_argb_hex(&self) -> String {
        match self {
            Color::Rgb { a, r, g, b } => format!("{a:02X}{r:02X}{g:02X}{b:02X}"),
            _ => "FF000000".to_string(),
        }
    }
}

impl std::hash::Hash for Color {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Color::Auto => 0u8.hash(state),
            Color::Indexed(i) => {
                1u8.hash(state);
                i.hash(state);
            }
            Color::Rgb { a, r, g, b } => {
                2u8.hash(state);
                (a, r, g, b).hash(state);
            }
            Color::Theme { theme, tint } => {
                3u8.hash(state);
                theme.hash(state);
                tint.map(f64::to_bits).hash(state);
            }
        }
    }
}

impl Eq for Color {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        assert_eq!(Color::from_hex("FF0000").unwrap(), Color::rgb(0xFF, 0, 0));
        assert_eq!(
            Color::from_hex("80FF00FF").unwrap(),
            Color::Rgb {
                a: 0x80,
                r: 0xFF,
                g: 0,
                b: 0xFF
            }
        );
        assert_eq!(Color::rgb(0xAB, 0xCD, 0xEF).to_argb_hex(), "FFABCDEF");
        assert!(Color::from_hex("12345").is_none());
    }

    #[test]
    fn theme_tint_is_part_of_identity() {
        assert_ne!(Color::theme(4), Color::theme_tinted(4, 0.4));
        assert_eq!(Color::theme_tinted(4, 0.4), Color::theme_tinted(4, 0.4));
    }
}

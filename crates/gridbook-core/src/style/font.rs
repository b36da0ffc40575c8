//! Font definitions

use super::Color;
use crate::error::{Error, Result};

/// Smallest font size Excel accepts, in points.
pub const MIN_FONT_SIZE: f64 = 1.0;
/// Largest font size Excel accepts, in points.
pub const MAX_FONT_SIZE: f64 = 409.0;

/// Charset codes accepted by [`Font::set_charset`].
///
/// These are the OS/2 character-set byte values the file format allows; any
/// other code is rejected with an invalid-argument error rather than being
/// written out and corrupting the part.
const VALID_CHARSETS: &[u8] = &[
    0,   // ANSI
    1,   // default
    2,   // symbol
    77,  // Macintosh
    128, // Shift-JIS
    129, // Hangul
    130, // Johab
    134, // GB2312
    136, // Big5
    161, // Greek
    162, // Turkish
    163, // Vietnamese
    177, // Hebrew
    178, // Arabic
    186, // Baltic
    204, // Cyrillic
    222, // Thai
    238, // Eastern European
    255, // OEM
];

/// A font definition in the workbook's style registry.
///
/// Mutators operate on the definition in place; cells pick the font up
/// through their style index.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub name: String,
    /// Size in points
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub strikeout: bool,
    pub underline: Underline,
    /// OS/2 charset byte; `None` leaves the attribute unwritten
    pub charset: Option<u8>,
    /// Font family class (1 = roman, 2 = swiss, ...)
    pub family: Option<u8>,
    pub scheme: FontScheme,
    pub color: Color,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            name: "Calibri".to_string(),
            size: 11.0,
            bold: false,
            italic: false,
            strikeout: false,
            underline: Underline::None,
            charset: None,
            family: Some(2),
            scheme: FontScheme::Minor,
            color: Color::Auto,
        }
    }
}

impl Font {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Set the size in points. Sizes outside Excel's 1..=409 range are
    /// rejected and leave the font unchanged.
    pub fn set_size(&mut self, points: f64) -> Result<()> {
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&points) {
            return Err(Error::invalid(format!(
                "font size {points} out of range {MIN_FONT_SIZE}..={MAX_FONT_SIZE}"
            )));
        }
        self.size = points;
        Ok(())
    }

    pub fn set_bold(&mut self, bold: bool) {
        self.bold = bold;
    }

    pub fn set_italic(&mut self, italic: bool) {
        self.italic = italic;
    }

    pub fn set_strikeout(&mut self, strikeout: bool) {
        self.strikeout = strikeout;
    }

    pub fn set_underline(&mut self, underline: Underline) {
        self.underline = underline;
    }

    /// Set the charset byte. Unrecognized codes (including anything outside
    /// 0..=255) fail with an invalid-argument error.
    pub fn set_charset(&mut self, charset: i32) -> Result<()> {
        let byte = u8::try_from(charset)
            .map_err(|_| Error::invalid(format!("charset {charset} out of byte range")))?;
        if !VALID_CHARSETS.contains(&byte) {
            return Err(Error::invalid(format!("unrecognized charset code {charset}")));
        }
        self.charset = Some(byte);
        Ok(())
    }

    pub fn set_family(&mut self, family: Option<u8>) {
        self.family = family;
    }

    pub fn set_scheme(&mut self, scheme: FontScheme) {
        self.scheme = scheme;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

impl std::hash::Hash for Font {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.size.to_bits().hash(state);
        self.bold.hash(state);
        self.italic.hash(state);
        self.strikeout.hash(state);
        self.underline.hash(state);
        self.charset.hash(state);
        self.family.hash(state);
        self.scheme.hash(state);
        self.color.hash(state);
    }
}

impl Eq for Font {}

/// Underline style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
    SingleAccounting,
    DoubleAccounting,
}

/// Theme font scheme binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontScheme {
    #[default]
    None,
    /// Bound to the theme's heading font
    Major,
    /// Bound to the theme's body font
    Minor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_validation() {
        let mut font = Font::new();
        font.set_charset(0).unwrap();
        assert_eq!(font.charset, Some(0));
        font.set_charset(204).unwrap();
        assert_eq!(font.charset, Some(204));

        // Unknown codes leave the font unchanged
        assert!(font.set_charset(42).is_err());
        assert!(font.set_charset(-1).is_err());
        assert!(font.set_charset(256).is_err());
        assert_eq!(font.charset, Some(204));
    }

    #[test]
    fn size_floor_and_ceiling() {
        let mut font = Font::new();
        assert!(font.set_size(0.5).is_err());
        assert!(font.set_size(410.0).is_err());
        font.set_size(1.0).unwrap();
        assert_eq!(font.size, 1.0);
        font.set_size(72.5).unwrap();
        assert_eq!(font.size, 72.5);
    }
}

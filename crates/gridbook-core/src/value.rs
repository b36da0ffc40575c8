//! Cell value types

use std::fmt;

use chrono::NaiveDate;

use crate::rich_text::RichText;

/// The value stored in a cell: exactly one variant, never parallel flags.
///
/// A formula keeps its last calculated value in `cached`; the cached value's
/// own variant is what determines the XML-level type marker written next to
/// the formula.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// No value
    Blank,

    /// Numeric value (dates are numbers with a date format)
    Number(f64),

    /// TRUE/FALSE
    Boolean(bool),

    /// Text, possibly with rich formatting runs
    String(RichText),

    /// Error value (#VALUE!, #REF!, ...)
    Error(CellError),

    /// Formula with optional cached result
    Formula {
        /// Formula text without a leading `=`
        text: String,
        /// Last calculated value, if any
        cached: Option<Box<CellValue>>,
    },
}

/// The logical type tag of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Blank,
    Numeric,
    Boolean,
    String,
    Error,
    Formula,
}

impl CellValue {
    /// String value from plain text.
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(RichText::plain(s))
    }

    /// Formula without a cached result. A leading `=` is stripped.
    pub fn formula<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        let text = text.strip_prefix('=').map(str::to_string).unwrap_or(text);
        CellValue::Formula { text, cached: None }
    }

    /// Number holding an Excel date serial for `date` (1900 date system).
    pub fn date(date: NaiveDate) -> Self {
        CellValue::Number(date_to_serial(date))
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Blank => CellType::Blank,
            CellValue::Number(_) => CellType::Numeric,
            CellValue::Boolean(_) => CellType::Boolean,
            CellValue::String(_) => CellType::String,
            CellValue::Error(_) => CellType::Error,
            CellValue::Formula { .. } => CellType::Formula,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula { .. })
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Formula {
                cached: Some(v), ..
            } => v.as_number(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Formula {
                cached: Some(v), ..
            } => v.as_bool(),
            _ => None,
        }
    }

    /// Plain text of a string value (or a formula's cached string).
    pub fn as_string(&self) -> Option<String> {
        match self {
            CellValue::String(rt) => Some(rt.text()),
            CellValue::Formula {
                cached: Some(v), ..
            } => v.as_string(),
            _ => None,
        }
    }

    pub fn as_rich_text(&self) -> Option<&RichText> {
        match self {
            CellValue::String(rt) => Some(rt),
            CellValue::Formula {
                cached: Some(v), ..
            } => v.as_rich_text(),
            _ => None,
        }
    }

    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The cached result for formulas, the value itself otherwise.
    pub fn effective(&self) -> &CellValue {
        match self {
            CellValue::Formula {
                cached: Some(v), ..
            } => v.effective(),
            other => other,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Blank
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Blank => Ok(()),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::String(rt) => f.write_str(&rt.text()),
            CellValue::Error(e) => f.write_str(e.as_str()),
            CellValue::Formula {
                cached: Some(v), ..
            } => write!(f, "{v}"),
            CellValue::Formula { text, .. } => write!(f, "={text}"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::string(s)
    }
}

impl From<RichText> for CellValue {
    fn from(rt: RichText) -> Self {
        CellValue::String(rt)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::date(d)
    }
}

/// Excel serial number for a date in the 1900 date system.
///
/// The epoch is 1899-12-30 so that serial 1 is 1900-01-01 and the phantom
/// 1900-02-29 of the legacy format is absorbed for dates from March 1900 on.
pub fn date_to_serial(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch");
    let days = date.signed_duration_since(epoch).num_days();
    // Dates before 1900-03-01 pre-date the phantom leap day
    if days < 61 {
        (days - 1) as f64
    } else {
        days as f64
    }
}

/// Inverse of [`date_to_serial`] for whole-day serials.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let days = serial.trunc() as i64;
    let days = if days < 60 { days + 1 } else { days };
    epoch.checked_add_signed(chrono::Duration::days(days))
}

/// Excel error values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #NULL!
    Null,
    /// #DIV/0!
    Div0,
    /// #VALUE!
    Value,
    /// #REF!
    Ref,
    /// #NAME?
    Name,
    /// #NUM!
    Num,
    /// #N/A
    Na,
}

impl CellError {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "#NULL!" => CellError::Null,
            "#DIV/0!" => CellError::Div0,
            "#VALUE!" => CellError::Value,
            "#REF!" => CellError::Ref,
            "#NAME?" => CellError::Name,
            "#NUM!" => CellError::Num,
            "#N/A" => CellError::Na,
            _ => return None,
        })
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(CellValue::from(42), CellValue::Number(42.0));
        assert_eq!(CellValue::from(true), CellValue::Boolean(true));
        assert_eq!(CellValue::from("x").as_string().as_deref(), Some("x"));
        assert_eq!(CellValue::formula("=A1+1").formula_text(), Some("A1+1"));
    }

    #[test]
    fn date_serials() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let serial = date_to_serial(d);
        assert_eq!(serial, 45366.0);
        assert_eq!(serial_to_date(serial), Some(d));

        // Pre-leap-bug dates still round-trip
        let early = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        assert_eq!(date_to_serial(early), 1.0);
        assert_eq!(serial_to_date(1.0), Some(early));
    }

    #[test]
    fn error_codes() {
        assert_eq!(CellError::parse("#div/0!"), Some(CellError::Div0));
        assert_eq!(CellError::Na.to_string(), "#N/A");
        assert_eq!(CellError::parse("#BOGUS!"), None);
    }
}

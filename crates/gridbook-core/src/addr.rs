//! Cell addresses and rectangular ranges (A1 notation)

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A single cell address such as `B7` or `$C$2`.
///
/// Row and column are 0-based internally; the display form is 1-based for
/// rows and alphabetic for columns, exactly as the `r` attribute of a
/// `<c>` element in sheet XML. The address of any cell is derivable purely
/// from its (row, column) position, which is what lets the reader
/// reconstruct references when the explicit attribute is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// 0-based row index
    pub row: u32,
    /// 0-based column index (A = 0)
    pub col: u16,
    /// `$`-anchored row
    pub abs_row: bool,
    /// `$`-anchored column
    pub abs_col: bool,
}

impl CellAddress {
    /// Relative address at (row, col).
    pub fn new(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            abs_row: false,
            abs_col: false,
        }
    }

    /// Fully anchored address (`$A$1` style).
    pub fn absolute(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            abs_row: true,
            abs_col: true,
        }
    }

    /// Parse A1-style notation, accepting optional `$` anchors.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let bad = || Error::InvalidAddress(text.to_string());

        let mut rest = text;
        let abs_col = rest.starts_with('$');
        if abs_col {
            rest = &rest[1..];
        }

        let letters_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if letters_end == 0 {
            return Err(bad());
        }
        let (letters, mut tail) = rest.split_at(letters_end);

        let abs_row = tail.starts_with('$');
        if abs_row {
            tail = &tail[1..];
        }
        if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }

        let col = Self::column_index(letters)?;
        let row_1based: u32 = tail.parse().map_err(|_| bad())?;
        if row_1based == 0 {
            return Err(bad());
        }
        let row = row_1based - 1;
        if row >= MAX_ROWS {
            return Err(Error::out_of_range("row", row as i64, MAX_ROWS as i64 - 1));
        }

        Ok(Self {
            row,
            col,
            abs_row,
            abs_col,
        })
    }

    /// Column letters for a 0-based index: 0 = "A", 26 = "AA", 16383 = "XFD".
    pub fn column_letters(col: u16) -> String {
        let mut out = [0u8; 3];
        let mut len = 0;
        let mut n = col as u32 + 1;
        while n > 0 {
            n -= 1;
            out[len] = b'A' + (n % 26) as u8;
            len += 1;
            n /= 26;
        }
        out[..len].iter().rev().map(|&b| b as char).collect()
    }

    /// 0-based column index for letters, case-insensitive.
    pub fn column_index(letters: &str) -> Result<u16> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }
        let mut acc: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{c}'"
                )));
            }
            acc = acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
            if acc > MAX_COLS as u32 {
                return Err(Error::out_of_range(
                    "column",
                    acc as i64 - 1,
                    MAX_COLS as i64 - 1,
                ));
            }
        }
        Ok((acc - 1) as u16)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.abs_col {
            f.write_str("$")?;
        }
        f.write_str(&Self::column_letters(self.col))?;
        if self.abs_row {
            f.write_str("$")?;
        }
        write!(f, "{}", self.row + 1)
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular cell range such as `A1:C4`.
///
/// Always normalized so `first` is the top-left corner and `last` the
/// bottom-right. A single cell is a 1x1 range and formats without a colon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub first: CellAddress,
    pub last: CellAddress,
}

impl CellRange {
    /// Range spanning both corner addresses, normalized.
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            first: CellAddress {
                row: a.row.min(b.row),
                col: a.col.min(b.col),
                abs_row: a.abs_row,
                abs_col: a.abs_col,
            },
            last: CellAddress {
                row: a.row.max(b.row),
                col: a.col.max(b.col),
                abs_row: b.abs_row,
                abs_col: b.abs_col,
            },
        }
    }

    /// Range from bare 0-based indices.
    pub fn from_indices(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Self::new(
            CellAddress::new(first_row, first_col),
            CellAddress::new(last_row, last_col),
        )
    }

    /// 1x1 range at a single address.
    pub fn single(addr: CellAddress) -> Self {
        Self {
            first: addr,
            last: addr,
        }
    }

    /// Parse `A1:B4` or single-cell `A1` notation.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        match text.split_once(':') {
            Some((a, b)) => Ok(Self::new(CellAddress::parse(a)?, CellAddress::parse(b)?)),
            None => Ok(Self::single(CellAddress::parse(text)?)),
        }
    }

    /// Number of rows spanned.
    pub fn height(&self) -> u32 {
        self.last.row - self.first.row + 1
    }

    /// Number of columns spanned.
    pub fn width(&self) -> u16 {
        self.last.col - self.first.col + 1
    }

    /// Total cell count.
    pub fn cell_count(&self) -> u64 {
        self.height() as u64 * self.width() as u64
    }

    /// Whether (row, col) lies inside the rectangle.
    pub fn contains(&self, row: u32, col: u16) -> bool {
        row >= self.first.row && row <= self.last.row && col >= self.first.col && col <= self.last.col
    }

    /// Whether two rectangles share any cell.
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.first.row <= other.last.row
            && self.last.row >= other.first.row
            && self.first.col <= other.last.col
            && self.last.col >= other.first.col
    }

    /// Top-left corner.
    pub fn top_left(&self) -> CellAddress {
        CellAddress::new(self.first.row, self.first.col)
    }

    /// Row-major iteration over every address in the rectangle.
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> + '_ {
        let range = *self;
        (range.first.row..=range.last.row).flat_map(move |row| {
            (range.first.col..=range.last.col).map(move |col| CellAddress::new(row, col))
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}:{}", self.first, self.last)
        }
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_round_trip() {
        for (idx, letters) in [
            (0u16, "A"),
            (1, "B"),
            (25, "Z"),
            (26, "AA"),
            (27, "AB"),
            (701, "ZZ"),
            (702, "AAA"),
            (16383, "XFD"),
        ] {
            assert_eq!(CellAddress::column_letters(idx), letters);
            assert_eq!(CellAddress::column_index(letters).unwrap(), idx);
        }
        assert_eq!(CellAddress::column_index("xfd").unwrap(), 16383);
        assert!(CellAddress::column_index("XFE").is_err());
    }

    #[test]
    fn parse_addresses() {
        let a = CellAddress::parse("A1").unwrap();
        assert_eq!((a.row, a.col), (0, 0));
        assert!(!a.abs_row && !a.abs_col);

        let b = CellAddress::parse("$C$10").unwrap();
        assert_eq!((b.row, b.col), (9, 2));
        assert!(b.abs_row && b.abs_col);

        let c = CellAddress::parse("B$2").unwrap();
        assert!(c.abs_row && !c.abs_col);

        let max = CellAddress::parse("XFD1048576").unwrap();
        assert_eq!((max.row, max.col), (1048575, 16383));
    }

    #[test]
    fn parse_address_errors() {
        for bad in ["", "A", "7", "A0", "1A", "A1048577", "XFE1", "A1B"] {
            assert!(CellAddress::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn display_matches_parse() {
        assert_eq!(CellAddress::new(0, 0).to_string(), "A1");
        assert_eq!(CellAddress::new(99, 2).to_string(), "C100");
        assert_eq!(CellAddress::absolute(1, 1).to_string(), "$B$2");
        assert_eq!(CellRange::parse("C3").unwrap().to_string(), "C3");
        assert_eq!(CellRange::parse("b2:a1").unwrap().to_string(), "A1:B2");
    }

    #[test]
    fn range_geometry() {
        let r = CellRange::parse("B2:D4").unwrap();
        assert_eq!(r.height(), 3);
        assert_eq!(r.width(), 3);
        assert_eq!(r.cell_count(), 9);
        assert!(r.contains(1, 1));
        assert!(r.contains(3, 3));
        assert!(!r.contains(0, 0));
        assert!(r.overlaps(&CellRange::parse("D4:E5").unwrap()));
        assert!(!r.overlaps(&CellRange::parse("E5:F6").unwrap()));
    }

    #[test]
    fn range_iteration_is_row_major() {
        let cells: Vec<String> = CellRange::parse("A1:B2")
            .unwrap()
            .cells()
            .map(|a| a.to_string())
            .collect();
        assert_eq!(cells, ["A1", "B1", "A2", "B2"]);
    }
}

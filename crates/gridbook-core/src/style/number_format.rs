//! Number format registry
//!
//! Format ids below [`FIRST_USER_DEFINED_ID`] are reserved for the built-in
//! table; custom codes are allocated upward from there. An explicit
//! [`NumberFormats::put_format`] may override any slot, including built-in
//! ones.

use std::collections::BTreeMap;

use ahash::AHashMap;

/// First id available for user-defined format codes.
pub const FIRST_USER_DEFINED_ID: u16 = 164;

/// The format code of a built-in slot, if the id is one Excel defines.
pub fn builtin_format_code(id: u16) -> Option<&'static str> {
    Some(match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "m/d/yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    })
}

/// Workbook-level number format registry.
#[derive(Debug, Default)]
pub struct NumberFormats {
    /// Explicitly stored codes, including built-in slot overrides.
    /// BTreeMap keeps serialization order stable.
    custom: BTreeMap<u16, String>,
    /// Reverse lookup over `custom`
    by_code: AHashMap<String, u16>,
}

impl NumberFormats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `code` at an explicit id, overriding a built-in slot or a
    /// previously allocated custom id.
    pub fn put_format(&mut self, id: u16, code: &str) {
        if let Some(old) = self.custom.insert(id, code.to_string()) {
            self.by_code.remove(&old);
        }
        self.by_code.insert(code.to_string(), id);
    }

    /// Id for a format code: an existing built-in or custom id when the code
    /// is already known, otherwise a freshly allocated id at or above
    /// [`FIRST_USER_DEFINED_ID`]. Built-in ids are never reused for new
    /// codes unless explicitly overridden via [`NumberFormats::put_format`].
    pub fn get_format(&mut self, code: &str) -> u16 {
        if let Some(&id) = self.by_code.get(code) {
            return id;
        }
        for id in 0..FIRST_USER_DEFINED_ID {
            // An overridden builtin slot no longer matches its table code.
            if !self.custom.contains_key(&id) && builtin_format_code(id) == Some(code) {
                return id;
            }
        }
        let id = self.next_free_id();
        self.put_format(id, code);
        id
    }

    /// The code stored at `id`: explicit entries win over the built-in table.
    pub fn format_code(&self, id: u16) -> Option<&str> {
        self.custom
            .get(&id)
            .map(String::as_str)
            .or_else(|| builtin_format_code(id))
    }

    /// Iterate explicitly stored (id, code) entries in id order.
    pub fn custom_formats(&self) -> impl Iterator<Item = (u16, &str)> {
        self.custom.iter().map(|(&id, code)| (id, code.as_str()))
    }

    fn next_free_id(&self) -> u16 {
        let mut id = FIRST_USER_DEFINED_ID;
        while self.custom.contains_key(&id) {
            id += 1;
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_codes_resolve_without_allocation() {
        let mut fmts = NumberFormats::new();
        assert_eq!(fmts.get_format("General"), 0);
        assert_eq!(fmts.get_format("0.00"), 2);
        assert_eq!(fmts.get_format("@"), 49);
        assert_eq!(fmts.custom_formats().count(), 0);
    }

    #[test]
    fn custom_codes_allocate_from_first_user_id() {
        let mut fmts = NumberFormats::new();
        let a = fmts.get_format("0.000");
        let b = fmts.get_format("yyyy-mm-dd");
        assert_eq!(a, FIRST_USER_DEFINED_ID);
        assert_eq!(b, FIRST_USER_DEFINED_ID + 1);
        // Identical code returns the existing id
        assert_eq!(fmts.get_format("0.000"), a);
        assert_eq!(fmts.format_code(a), Some("0.000"));
    }

    #[test]
    fn put_format_overrides_builtin_slot() {
        let mut fmts = NumberFormats::new();
        fmts.put_format(14, "dd/mm/yyyy");
        assert_eq!(fmts.format_code(14), Some("dd/mm/yyyy"));
        // The overridden slot is found by code lookup...
        assert_eq!(fmts.get_format("dd/mm/yyyy"), 14);
        // ...and the displaced builtin code now allocates a user id.
        assert_eq!(fmts.get_format("m/d/yy"), FIRST_USER_DEFINED_ID);
    }
}

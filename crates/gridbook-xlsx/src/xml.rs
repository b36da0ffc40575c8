//! Small XML helpers shared by the part writers and readers.

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Escape attribute values.
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode characters XML cannot carry:
/// `_x000d_` = CR, `_x000a_` = LF, `_x0009_` = Tab, `_x005f_` = underscore.
/// A `_` not followed by a complete `xHHHH_` sequence is literal.
pub fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' {
            let mut hex_chars = String::new();
            let mut is_escape = false;
            let mut saw_x = false;

            if chars.peek() == Some(&'x') {
                chars.next();
                saw_x = true;
                for _ in 0..4 {
                    if let Some(&ch) = chars.peek() {
                        if ch.is_ascii_hexdigit() {
                            hex_chars.push(ch);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
                if hex_chars.len() == 4 && chars.peek() == Some(&'_') {
                    chars.next();
                    if let Ok(code) = u32::from_str_radix(&hex_chars, 16) {
                        if let Some(decoded) = char::from_u32(code) {
                            result.push(decoded);
                            is_escape = true;
                        }
                    }
                }
            }

            if !is_escape {
                result.push('_');
                if saw_x {
                    result.push('x');
                    result.push_str(&hex_chars);
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Encode characters the `_xHHHH_` scheme must carry in text runs.
///
/// A literal underscore that itself opens a `_xHHHH_`-shaped sequence is
/// escaped as `_x005F_`, or the decoder would turn the literal text into
/// the escaped character.
pub fn encode_excel_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    for (i, c) in s.char_indices() {
        match c {
            '\r' => out.push_str("_x000d_"),
            '\t' => out.push_str("_x0009_"),
            '_' if opens_escape_sequence(&bytes[i..]) => out.push_str("_x005F_"),
            c if (c as u32) < 0x20 && c != '\n' => {
                out.push_str(&format!("_x{:04x}_", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

fn opens_escape_sequence(tail: &[u8]) -> bool {
    tail.len() >= 7
        && tail[1] == b'x'
        && tail[2..6].iter().all(u8::is_ascii_hexdigit)
        && tail[6] == b'_'
}

/// Whether a text run needs `xml:space="preserve"` to survive parsing.
pub fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_decode() {
        assert_eq!(decode_excel_escapes("a_x000d_b"), "a\rb");
        assert_eq!(decode_excel_escapes("under_x005f_score"), "under_score");
        // Incomplete sequences stay literal
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("snake_case"), "snake_case");
    }

    #[test]
    fn escapes_encode_and_round_trip() {
        let original = "line1\rline2\tend";
        let encoded = encode_excel_escapes(original);
        assert_eq!(encoded, "line1_x000d_line2_x0009_end");
        assert_eq!(decode_excel_escapes(&encoded), original);
    }

    #[test]
    fn literal_escape_shapes_survive_the_round_trip() {
        // Text that happens to look like an escape stays literal
        for original in ["_x000d_", "a_x005F_b", "_x005F_x000d_", "_xAbCd_"] {
            let encoded = encode_excel_escapes(original);
            assert!(encoded.starts_with('_') || encoded.contains("_x005F_"));
            assert_eq!(decode_excel_escapes(&encoded), original, "{original}");
        }
        assert_eq!(encode_excel_escapes("_x000d_"), "_x005F_x000d_");
        // Incomplete shapes need no escaping
        assert_eq!(encode_excel_escapes("_x00d_"), "_x00d_");
        assert_eq!(encode_excel_escapes("_xyz_"), "_xyz_");
        assert_eq!(decode_excel_escapes("_xyz_"), "_xyz_");
    }

    #[test]
    fn space_preserve_detection() {
        assert!(needs_space_preserve(" leading"));
        assert!(needs_space_preserve("trailing "));
        assert!(!needs_space_preserve("inner space fine"));
    }
}

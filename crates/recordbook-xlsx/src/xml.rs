//! Text helpers shared by the package parts

/// Escape text for use in XML content and attribute values
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Check whether `s` starts with the `xHHHH_` tail of an escape sequence
fn starts_with_escape_tail(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 6
        && bytes[0] == b'x'
        && bytes[1..5].iter().all(|b| b.is_ascii_hexdigit())
        && bytes[5] == b'_'
}

/// Encode characters XML cannot carry verbatim as `_xHHHH_` sequences
///
/// Control characters other than tab and line feed are encoded (a raw carriage
/// return would be normalized away by XML parsers), and an underscore that
/// would otherwise start a literal `_xHHHH_` is encoded as `_x005F_`.
pub(crate) fn encode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '\t' | '\n' => result.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {
                result.push_str(&format!("_x{:04X}_", c as u32));
            }
            '_' if starts_with_escape_tail(&s[i + 1..]) => result.push_str("_x005F_"),
            c => result.push(c),
        }
    }
    result
}

/// Decode `_xHHHH_` escape sequences
///
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '_' || chars.peek() != Some(&'x') {
            result.push(c);
            continue;
        }
        chars.next(); // 'x'

        let mut hex_chars = String::with_capacity(4);
        while hex_chars.len() < 4 {
            match chars.peek() {
                Some(&ch) if ch.is_ascii_hexdigit() => {
                    hex_chars.push(ch);
                    chars.next();
                }
                _ => break,
            }
        }

        let decoded = if hex_chars.len() == 4 && chars.peek() == Some(&'_') {
            u32::from_str_radix(&hex_chars, 16)
                .ok()
                .and_then(char::from_u32)
        } else {
            None
        };

        match decoded {
            Some(ch) => {
                chars.next(); // closing '_'
                result.push(ch);
            }
            None => {
                result.push_str("_x");
                result.push_str(&hex_chars);
            }
        }
    }

    result
}

/// Whether a text node needs `xml:space="preserve"` to keep its whitespace
pub(crate) fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace)
}

//! UTF-16 code-unit views of text.
//!
//! Every algorithm in this crate indexes text in 16-bit code units so
//! that offsets and payload lengths agree with the wire formats. Working
//! text and edit payloads stay unit vectors; strings materialize only at
//! API boundaries. Unit vectors tolerate states a `String` cannot hold,
//! such as a surrogate pair divided between two adjacent edits.

/// A UTF-16 code-unit buffer.
pub type Units = Vec<u16>;

/// The `\n` code unit.
pub const NEWLINE: u16 = b'\n' as u16;

/// Converts a string into its UTF-16 code units.
pub fn units(s: &str) -> Units {
    s.encode_utf16().collect()
}

/// Converts code units back into a string.
///
/// Lossy: unit sequences that do not form valid UTF-16 (possible after
/// edits were split inside a surrogate pair) render as U+FFFD.
pub fn string(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

/// Index of the first occurrence of `needle` at or after `from`.
pub fn find(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return (from <= haystack.len()).then_some(from);
    }
    let start = from.min(haystack.len());
    let tail = &haystack[start..];
    if needle.len() > tail.len() {
        return None;
    }
    tail.windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + start)
}

/// Index of the last occurrence starting at or before `from`.
pub fn rfind(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    let last = from.min(haystack.len() - needle.len());
    (0..=last).rev().find(|&i| &haystack[i..i + needle.len()] == needle)
}

/// Whether the unit is a letter or digit.
pub fn is_alphanumeric(unit: u16) -> bool {
    char::from_u32(unit as u32).is_some_and(char::is_alphanumeric)
}

/// Whether the unit is whitespace.
pub fn is_whitespace(unit: u16) -> bool {
    char::from_u32(unit as u32).is_some_and(char::is_whitespace)
}

/// Whether the unit is a `\r` or `\n`.
pub fn is_line_break(unit: u16) -> bool {
    unit == NEWLINE || unit == b'\r' as u16
}

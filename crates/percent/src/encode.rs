//! Percent-encoding of a UTF-16 code-unit slice.

use crate::constants::{is_unreserved, HEX_UPPER};

/// Encodes UTF-16 code units into percent-escaped ASCII text.
///
/// Unreserved characters (see [`crate::is_unreserved`]) pass through
/// literally; every other scalar is expanded to the uppercase `%XX`
/// encoding of its UTF-8 bytes. Surrogate pairs are combined first, so a
/// supplementary-plane character yields one four-byte escape run. An
/// unpaired surrogate has no UTF-8 form and degrades to U+FFFD.
///
/// # Example
///
/// ```
/// use textmend_percent::encode;
///
/// let units: Vec<u16> = "\u{0682} \u{2} \\ |".encode_utf16().collect();
/// assert_eq!(encode(&units), "%DA%82 %02 %5C %7C");
/// ```
pub fn encode(units: &[u16]) -> String {
    let mut out = String::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let (ch, width) = next_scalar(units, i);
        i += width;
        if is_unreserved(ch) {
            out.push(ch);
        } else {
            let mut buf = [0u8; 4];
            for &byte in ch.encode_utf8(&mut buf).as_bytes() {
                out.push('%');
                out.push(HEX_UPPER[(byte >> 4) as usize] as char);
                out.push(HEX_UPPER[(byte & 0xF) as usize] as char);
            }
        }
    }
    out
}

/// Reads one scalar starting at `i`, pairing surrogates when possible.
fn next_scalar(units: &[u16], i: usize) -> (char, usize) {
    let unit = units[i];
    if (0xD800..=0xDBFF).contains(&unit) {
        if let Some(&low) = units.get(i + 1) {
            if (0xDC00..=0xDFFF).contains(&low) {
                let combined =
                    0x10000 + ((unit as u32 - 0xD800) << 10) + (low as u32 - 0xDC00);
                return (char::from_u32(combined).unwrap_or('\u{FFFD}'), 2);
            }
        }
        return ('\u{FFFD}', 1);
    }
    if (0xDC00..=0xDFFF).contains(&unit) {
        return ('\u{FFFD}', 1);
    }
    (char::from_u32(unit as u32).unwrap_or('\u{FFFD}'), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn passes_unreserved_through() {
        let pool = "A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ";
        assert_eq!(encode(&units(pool)), pool);
    }

    #[test]
    fn escapes_ascii_specials() {
        assert_eq!(
            encode(&units("`1234567890-=[]\\;',./")),
            "%601234567890-=%5B%5D%5C;',./"
        );
        assert_eq!(
            encode(&units("~!@#$%^&*()_+{}|:\"<>?")),
            "~!@#$%25%5E&*()_+%7B%7D%7C:%22%3C%3E?"
        );
    }

    #[test]
    fn expands_supplementary_plane_as_one_utf8_run() {
        assert_eq!(encode(&units("\u{1F680}")), "%F0%9F%9A%80");
    }

    #[test]
    fn lone_surrogate_degrades_to_replacement() {
        assert_eq!(encode(&[0xD800]), "%EF%BF%BD");
        assert_eq!(encode(&[0xDC00]), "%EF%BF%BD");
    }
}

//! Percent-decoding back into UTF-16 code units.

use crate::PercentError;

/// Decodes percent-escaped text into UTF-16 code units.
///
/// Characters outside `%XX` escapes pass through untouched, including
/// raw non-ASCII text, so the decoder accepts anything [`crate::encode`]
/// or a permissive producer may have emitted. Hex digits are accepted in
/// either case.
///
/// # Errors
///
/// * [`PercentError::TruncatedEscape`] when a `%` has fewer than two
///   following characters.
/// * [`PercentError::InvalidHexDigit`] when a `%` escape contains a
///   non-hex character.
/// * [`PercentError::InvalidUtf8`] when the assembled byte sequence
///   does not form valid UTF-8.
pub fn decode(text: &str) -> Result<Vec<u16>, PercentError> {
    let bytes = text.as_bytes();
    let mut buf: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 3 > bytes.len() {
                return Err(PercentError::TruncatedEscape);
            }
            let hi = hex_value(bytes[i + 1])?;
            let lo = hex_value(bytes[i + 2])?;
            buf.push((hi << 4) | lo);
            i += 3;
        } else {
            buf.push(bytes[i]);
            i += 1;
        }
    }
    let decoded = String::from_utf8(buf).map_err(|_| PercentError::InvalidUtf8)?;
    Ok(decoded.encode_utf16().collect())
}

fn hex_value(byte: u8) -> Result<u8, PercentError> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        _ => Err(PercentError::InvalidHexDigit),
    }
}

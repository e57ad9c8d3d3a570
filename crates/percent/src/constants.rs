/// Characters that are never percent-encoded.
///
/// This is the URI unreserved set plus the sub-delimiters and the space
/// character, matching what legacy `encodeURI`-based producers leave
/// intact so that deltas stay readable and byte-compatible on the wire.
pub const UNRESERVED: &str = "-_.!~*'();/?:@&=+$,# ";

/// Uppercase hex digits used for `%XX` expansion.
pub const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Returns `true` when `ch` is emitted literally by [`crate::encode`].
pub fn is_unreserved(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || UNRESERVED.contains(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphanumerics_are_unreserved() {
        for ch in ('a'..='z').chain('A'..='Z').chain('0'..='9') {
            assert!(is_unreserved(ch), "{ch} must be unreserved");
        }
    }

    #[test]
    fn reserved_examples() {
        for ch in ['%', '^', '[', ']', '\\', '{', '}', '|', '"', '<', '>', '`', '\n', '\u{0}'] {
            assert!(!is_unreserved(ch), "{ch:?} must be escaped");
        }
    }
}

//! Percent-encoding for UTF-16 code-unit text.
//!
//! This crate implements the escaping used by text-delta wire formats:
//! a URI-style unreserved set (including the space character), uppercase
//! hex digits, and UTF-8 byte expansion for everything else. Input is a
//! slice of UTF-16 code units; surrogate pairs are combined into one
//! scalar before expansion, so a supplementary-plane character becomes a
//! single four-byte `%XX%XX%XX%XX` run.
//!
//! # Example
//!
//! ```
//! use textmend_percent::{decode, encode};
//!
//! let units: Vec<u16> = "back\\slash\n".encode_utf16().collect();
//! let escaped = encode(&units);
//! assert_eq!(escaped, "back%5Cslash%0A");
//! assert_eq!(decode(&escaped).unwrap(), units);
//! ```

mod constants;
mod decode;
mod encode;

pub use constants::is_unreserved;
pub use decode::decode;
pub use encode::encode;

/// Error type for percent decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PercentError {
    /// A `%` was not followed by two more characters.
    TruncatedEscape,
    /// A `%` escape contained a non-hexadecimal digit.
    InvalidHexDigit,
    /// The decoded byte sequence is not valid UTF-8.
    InvalidUtf8,
}

impl std::fmt::Display for PercentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PercentError::TruncatedEscape => write!(f, "truncated % escape"),
            PercentError::InvalidHexDigit => write!(f, "non-hex digit in % escape"),
            PercentError::InvalidUtf8 => write!(f, "escaped bytes are not valid UTF-8"),
        }
    }
}

impl std::error::Error for PercentError {}

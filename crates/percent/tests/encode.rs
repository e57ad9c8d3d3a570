//! Tests for percent encoding.

use textmend_percent::{decode, encode, is_unreserved};

fn units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

#[test]
fn unchanged_character_pool() {
    let pool = "A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ";
    assert_eq!(encode(&units(pool)), pool);
    for ch in pool.chars() {
        assert!(is_unreserved(ch));
    }
}

#[test]
fn control_characters() {
    assert_eq!(encode(&units("\u{1}\u{2}\u{3}\u{4}")), "%01%02%03%04");
    assert_eq!(encode(&units("a\nb")), "a%0Ab");
    assert_eq!(encode(&units("a\tb")), "a%09b");
    assert_eq!(encode(&units("a\u{0}b")), "a%00b");
}

#[test]
fn multibyte_scalars() {
    assert_eq!(encode(&units("\u{0680}")), "%DA%80");
    assert_eq!(encode(&units("\u{2026}")), "%E2%80%A6");
    assert_eq!(encode(&units("\u{1F600}")), "%F0%9F%98%80");
}

#[test]
fn empty_input() {
    assert_eq!(encode(&[]), "");
    assert_eq!(decode("").unwrap(), Vec::<u16>::new());
}

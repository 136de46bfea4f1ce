use pretty_assertions::assert_eq;

use super::*;

#[test]
fn decodes_known_fragments() {
    assert_eq!(decode(b"caf_dma"), Ok("café".to_string()));
    assert_eq!(decode(b"bcher_kva"), Ok("bücher".to_string()));
}

#[test]
fn encodes_known_fragments() {
    assert_eq!(encode("café"), Ok("caf_dma".to_string()));
    assert_eq!(encode("bücher"), Ok("bcher_kva".to_string()));
}

#[test]
fn pure_ascii_has_trailing_delimiter() {
    assert_eq!(encode("abc"), Ok("abc_".to_string()));
    assert_eq!(decode(b"abc_"), Ok("abc".to_string()));
}

#[test]
fn symbol_hostile_ascii_is_shifted() {
    let encoded = encode("a+b").unwrap_or_default();
    assert!(!encoded.contains('+'));
    assert_eq!(decode(encoded.as_bytes()), Ok("a+b".to_string()));
}

#[test]
fn rejects_invalid_digit() {
    assert_eq!(decode(b"abc_9"), Err(PunycodeError::InvalidDigit('9')));
}

#[test]
fn rejects_truncated_digits() {
    // 'z' (25) is above every threshold, so the variable-length integer
    // never terminates.
    assert_eq!(decode(b"zz"), Err(PunycodeError::Truncated));
}

#[test]
fn rejects_overflow() {
    assert_eq!(decode(b"JJJJJJJJJJJJJJJJa"), Err(PunycodeError::Overflow));
}

#[test]
fn rejects_non_basic_prefix() {
    assert_eq!(
        decode("é_dma".as_bytes()),
        Err(PunycodeError::NonBasicPrefix)
    );
}

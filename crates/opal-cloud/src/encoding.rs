//! Reversible escaping of caller-supplied identifiers.
//!
//! Valid verbatim segments:
//! - Must be non-empty
//! - Every byte in `[A-Za-z0-9_-]`
//!
//! Anything else is escaped byte-by-byte as `%` plus two lowercase hex
//! digits. The escape alphabet matters: because encoded output only ever
//! contains lowercase hex after `%`, a token with an uppercase hex digit
//! (such as the flat-backend separator `%2F`) can never be produced by any
//! input, which is what keeps joined segments collision-free.

/// Fast-path predicate: `true` if `encode_segment` would return the input
/// unchanged.
///
/// Besides saving space, the fast path preserves compatibility with legacy
/// identifiers that were uploaded before escaping existed.
pub fn can_be_verbatim(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(is_safe_byte)
}

fn is_safe_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

/// Escape a caller-supplied identifier into a segment safe for both
/// backends: no raw separators, reversible, injective.
pub fn encode_segment(segment: &str) -> String {
    if can_be_verbatim(segment) {
        return segment.to_string();
    }
    let mut encoded = String::with_capacity(segment.len() * 3);
    for byte in segment.bytes() {
        if is_safe_byte(byte) {
            encoded.push(byte as char);
        } else {
            encoded.push('%');
            encoded.push(char::from_digit((byte >> 4) as u32, 16).expect("nibble in range"));
            encoded.push(char::from_digit((byte & 0x0f) as u32, 16).expect("nibble in range"));
        }
    }
    encoded
}

/// Reverse [`encode_segment`]. Returns `None` on input that no encoding
/// produces (dangling `%`, non-hex escape, or bytes outside the safe set).
pub fn decode_segment(encoded: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(encoded.len());
    let mut iter = encoded.bytes();
    while let Some(byte) = iter.next() {
        if byte == b'%' {
            let hi = hex_value(iter.next()?)?;
            let lo = hex_value(iter.next()?)?;
            bytes.push((hi << 4) | lo);
        } else if is_safe_byte(byte) {
            bytes.push(byte);
        } else {
            return None;
        }
    }
    String::from_utf8(bytes).ok()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        // Only lowercase: encoded output never carries uppercase hex.
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn safe_identifiers_pass_verbatim() {
        for id in ["user-1", "my_app", "Page42", "a"] {
            assert!(can_be_verbatim(id));
            assert_eq!(encode_segment(id), id);
        }
    }

    #[test]
    fn empty_is_not_verbatim() {
        assert!(!can_be_verbatim(""));
        assert_eq!(encode_segment(""), "");
    }

    #[test]
    fn unsafe_bytes_are_escaped() {
        assert!(!can_be_verbatim("a/b"));
        assert_eq!(encode_segment("a/b"), "a%2fb");
        assert_eq!(encode_segment("sp ace"), "sp%20ace");
        assert_eq!(encode_segment("%"), "%25");
    }

    #[test]
    fn escapes_use_lowercase_hex_only() {
        let encoded = encode_segment("\u{00ff}/");
        assert!(encoded.chars().all(|c| !c.is_ascii_uppercase()));
    }

    #[test]
    fn decode_rejects_unproducible_input() {
        assert_eq!(decode_segment("%2F"), None); // uppercase hex
        assert_eq!(decode_segment("%2"), None); // dangling escape
        assert_eq!(decode_segment("a/b"), None); // raw unsafe byte
    }

    #[test]
    fn decode_reverses_encode() {
        for id in ["plain", "a/b/c", "with space", "100%", "emoji \u{1f600}"] {
            assert_eq!(decode_segment(&encode_segment(id)).as_deref(), Some(id));
        }
    }

    proptest! {
        #[test]
        fn roundtrip_holds_for_arbitrary_strings(segment in ".*") {
            let decoded = decode_segment(&encode_segment(&segment));
            prop_assert_eq!(decoded.as_deref(), Some(segment.as_str()));
        }

        #[test]
        fn encoded_output_never_contains_raw_separators(segment in ".*") {
            let encoded = encode_segment(&segment);
            prop_assert!(!encoded.contains('/'));
            prop_assert!(!encoded.contains("%2F"));
        }
    }
}

//! Codepoint decode boundary.

/// Decodes the first codepoint of `bytes`.
///
/// Returns the codepoint and the number of bytes it occupies, or `None` for an
/// empty slice or a malformed / truncated / overlong sequence.
pub fn decode_one(bytes: &[u8]) -> Option<(u32, usize)> {
    let len = match *bytes.first()? {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return None,
    };
    let seq = bytes.get(..len)?;
    let ch = std::str::from_utf8(seq).ok()?.chars().next()?;
    Some((ch as u32, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_multibyte() {
        assert_eq!(decode_one(b"A"), Some((0x41, 1)));
        assert_eq!(decode_one("é".as_bytes()), Some((0xE9, 2)));
        assert_eq!(decode_one("あ!".as_bytes()), Some((0x3042, 3)));
        assert_eq!(decode_one("😀".as_bytes()), Some((0x1F600, 4)));
    }

    #[test]
    fn malformed_sequences() {
        assert_eq!(decode_one(b""), None);
        assert_eq!(decode_one(&[0x80]), None); // lone continuation
        assert_eq!(decode_one(&[0xC0, 0xAF]), None); // overlong
        assert_eq!(decode_one(&[0xE3, 0x81]), None); // truncated
        assert_eq!(decode_one(&[0xED, 0xA0, 0x80]), None); // surrogate
    }
}

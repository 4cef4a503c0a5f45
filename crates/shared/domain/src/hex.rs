//! Lowercase hex decoding for fixed-size identifiers.

/// Decode exactly `2 * N` lowercase hex chars into `N` bytes.
///
/// Uppercase digits are rejected, as W3C Trace Context requires.
pub fn decode<const N: usize>(hex: &str) -> Option<[u8; N]> {
    let bytes = hex.as_bytes();
    if bytes.len() != N * 2 {
        return None;
    }

    let mut out = [0u8; N];
    for (slot, pair) in out.iter_mut().zip(bytes.chunks_exact(2)) {
        *slot = (nibble(pair[0])? << 4) | nibble(pair[1])?;
    }
    Some(out)
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_lowercase() {
        assert_eq!(decode::<2>("0aff"), Some([0x0a, 0xff]));
    }

    #[test]
    fn test_decode_rejects_uppercase() {
        assert_eq!(decode::<1>("AF"), None);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(decode::<2>("abc"), None);
        assert_eq!(decode::<1>(""), None);
    }

    #[test]
    fn test_decode_rejects_non_hex() {
        assert_eq!(decode::<1>("0g"), None);
        assert_eq!(decode::<1>("-1"), None);
    }
}

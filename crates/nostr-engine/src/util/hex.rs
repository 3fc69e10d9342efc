// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Hex

pub use hex::{decode, encode, FromHexError};

/// Check that `s` is exactly `len` lowercase hex characters
#[inline]
pub fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Decode a hex string into a fixed-size array
pub fn decode_array<const N: usize>(s: &str) -> Result<[u8; N], FromHexError> {
    let mut buf: [u8; N] = [0u8; N];
    hex::decode_to_slice(s, &mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_lower_hex() {
        assert!(is_lower_hex("00ff", 4));
        assert!(!is_lower_hex("00FF", 4));
        assert!(!is_lower_hex("00f", 4));
        assert!(!is_lower_hex("00fg", 4));
    }

    #[test]
    fn test_decode_array() {
        let arr: [u8; 2] = decode_array("0aff").unwrap();
        assert_eq!(arr, [0x0a, 0xff]);
        assert_eq!(
            decode_array::<2>("0aff00"),
            Err(FromHexError::InvalidStringLength)
        );
    }
}

// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Bech32 codec
//!
//! <https://github.com/bitcoin/bips/blob/master/bip-0173.mediawiki>

use core::fmt;

use ::bech32::primitives::decode::{
    CharError, CheckedHrpstring, CheckedHrpstringError, UncheckedHrpstringError,
};
use ::bech32::primitives::hrp;
use ::bech32::{Bech32, Hrp};

/// Bech32 error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No `1` separator in the string
    MissingSeparator,
    /// Empty human-readable part
    EmptyHrp,
    /// Invalid human-readable part
    InvalidHrp,
    /// Nothing after the separator
    TooShort,
    /// Character outside the allowed set
    InvalidChar,
    /// Mixed upper and lower case
    MixedCase,
    /// Checksum mismatch
    InvalidChecksum,
    /// Non-zero padding or leftover group of 5 bits or more
    InvalidPadding,
    /// Encoded string too long
    TooLong,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator => write!(f, "missing separator"),
            Self::EmptyHrp => write!(f, "empty human-readable part"),
            Self::InvalidHrp => write!(f, "invalid human-readable part"),
            Self::TooShort => write!(f, "data part too short"),
            Self::InvalidChar => write!(f, "invalid character"),
            Self::MixedCase => write!(f, "mixed case"),
            Self::InvalidChecksum => write!(f, "invalid checksum"),
            Self::InvalidPadding => write!(f, "invalid padding"),
            Self::TooLong => write!(f, "encoded string too long"),
        }
    }
}

impl From<hrp::Error> for Error {
    fn from(e: hrp::Error) -> Self {
        match e {
            hrp::Error::Empty => Self::EmptyHrp,
            _ => Self::InvalidHrp,
        }
    }
}

impl From<CheckedHrpstringError> for Error {
    fn from(e: CheckedHrpstringError) -> Self {
        match e {
            CheckedHrpstringError::Parse(UncheckedHrpstringError::Char(e)) => match e {
                CharError::MissingSeparator => Self::MissingSeparator,
                CharError::NothingAfterSeparator => Self::TooShort,
                CharError::MixedCase => Self::MixedCase,
                _ => Self::InvalidChar,
            },
            CheckedHrpstringError::Parse(UncheckedHrpstringError::Hrp(e)) => Self::from(e),
            _ => Self::InvalidChecksum,
        }
    }
}

/// Encode bytes under the given human-readable part
///
/// The output is lowercase.
pub fn encode(hrp: &str, data: &[u8]) -> Result<String, Error> {
    let hrp: Hrp = Hrp::parse(hrp)?;
    ::bech32::encode_lower::<Bech32>(hrp, data).map_err(|_| Error::TooLong)
}

/// Decode a bech32 string into its lowercase human-readable part and bytes
///
/// All-uppercase input is accepted. Bech32m checksums are rejected.
pub fn decode(s: &str) -> Result<(String, Vec<u8>), Error> {
    let checked: CheckedHrpstring = CheckedHrpstring::new::<Bech32>(s)?;
    checked
        .validate_segwit_padding()
        .map_err(|_| Error::InvalidPadding)?;
    Ok((checked.hrp().to_lowercase(), checked.byte_iter().collect()))
}

#[cfg(test)]
mod tests {
    use ::bech32::primitives::iter::Fe32IterExt;
    use ::bech32::{Bech32m, Fe32};

    use super::*;

    #[test]
    fn test_bip173_valid_checksums() {
        for s in [
            "A12UEL5L",
            "a12uel5l",
            "an83characterlonghumanreadablepartthatcontainsthenumber1andtheexcludedcharactersbio1tt5tgs",
            "abcdef1qpzry9x8gf2tvdw0s3jn54khce6mua7lmqqqxw",
            "split1checkupstagehandshakeupstreamerranterredcaperred2y9e3w",
        ] {
            let (hrp, _) = decode(s).unwrap();
            assert_eq!(hrp, s[..s.rfind('1').unwrap()].to_lowercase());
        }
    }

    #[test]
    fn test_bip173_invalid() {
        assert_eq!(decode("pzry9x0s0muk"), Err(Error::MissingSeparator));
        assert_eq!(decode("1pzry9x0s0muk"), Err(Error::EmptyHrp));
        assert_eq!(decode("x1b4n0q5v"), Err(Error::InvalidChar));
        assert_eq!(decode("A1G7SGD8"), Err(Error::InvalidChecksum));
        assert_eq!(decode("a12UEL5L"), Err(Error::MixedCase));
        assert!(decode("li1dgmt3").is_err());
    }

    #[test]
    fn test_round_trip() {
        for len in [0usize, 1, 20, 32, 33, 64] {
            let data: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
            let encoded = encode("npub", &data).unwrap();
            assert!(encoded.starts_with("npub1"));

            let (hrp, decoded) = decode(&encoded).unwrap();
            assert_eq!(hrp, "npub");
            assert_eq!(decoded, data);

            let (hrp, decoded) = decode(&encoded.to_uppercase()).unwrap();
            assert_eq!(hrp, "npub");
            assert_eq!(decoded, data);
        }
    }

    #[test]
    fn test_single_symbol_corruption() {
        let data: [u8; 32] = [0xab; 32];
        let encoded = encode("note", &data).unwrap();
        let sep: usize = encoded.rfind('1').unwrap();

        for (i, c) in encoded.char_indices() {
            if i == sep {
                continue;
            }

            // Substitute with another symbol of the same alphabet
            let replacement: char = if i < sep {
                if c == 'n' { 'm' } else { 'n' }
            } else if c == 'q' {
                'p'
            } else {
                'q'
            };

            let mut corrupted: String = encoded.clone();
            corrupted.replace_range(i..i + 1, &replacement.to_string());
            assert_eq!(decode(&corrupted), Err(Error::InvalidChecksum), "{corrupted}");
        }
    }

    #[test]
    fn test_bech32m_rejected() {
        let hrp = Hrp::parse("note").unwrap();
        let encoded = ::bech32::encode::<Bech32m>(hrp, &[1u8; 32]).unwrap();
        assert_eq!(decode(&encoded), Err(Error::InvalidChecksum));
    }

    #[test]
    fn test_invalid_padding() {
        let hrp = Hrp::parse("note").unwrap();

        // Two 5-bit groups leave two non-zero padding bits
        let s: String = [Fe32::L, Fe32::L]
            .iter()
            .copied()
            .with_checksum::<Bech32>(&hrp)
            .chars()
            .collect();
        assert_eq!(decode(&s), Err(Error::InvalidPadding));

        // A full leftover group of 5 bits
        let s: String = [Fe32::Q, Fe32::Q, Fe32::Q]
            .iter()
            .copied()
            .with_checksum::<Bech32>(&hrp)
            .chars()
            .collect();
        assert_eq!(decode(&s), Err(Error::InvalidPadding));
    }
}

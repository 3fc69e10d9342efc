// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Public key

use core::fmt;
use core::str::FromStr;

use secp256k1::XOnlyPublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Error;
use crate::nips::nip19::{self, FromBech32};
use crate::util::hex;

/// Public key size
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Public Key
///
/// 32-byte x-only key, shown as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey {
    buf: [u8; PUBLIC_KEY_SIZE],
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<XOnlyPublicKey> for PublicKey {
    fn from(pk: XOnlyPublicKey) -> Self {
        Self { buf: pk.serialize() }
    }
}

impl PublicKey {
    /// Parse from `hex`, `bech32` or [NIP21](https://github.com/nostr-protocol/nips/blob/master/21.md) uri
    pub fn parse<S>(public_key: S) -> Result<Self, Error>
    where
        S: AsRef<str>,
    {
        let public_key: &str = public_key.as_ref();

        // Try from hex
        if let Ok(public_key) = Self::from_hex(public_key) {
            return Ok(public_key);
        }

        // Try from bech32
        if let Ok(public_key) = Self::from_bech32(public_key) {
            return Ok(public_key);
        }

        // Try from NIP21 URI
        if let Some(bech32) = public_key.strip_prefix(nip19::NOSTR_URI_PREFIX) {
            if let Ok(public_key) = Self::from_bech32(bech32) {
                return Ok(public_key);
            }
        }

        Err(Error::InvalidPublicKey)
    }

    /// Parse from `bytes`
    pub fn from_slice(slice: &[u8]) -> Result<Self, Error> {
        let buf: [u8; PUBLIC_KEY_SIZE] = slice.try_into().map_err(|_| Error::InvalidPublicKey)?;
        Self::from_bytes(buf)
    }

    /// Construct from bytes, checking that they encode a point on the curve
    #[inline]
    pub fn from_bytes(buf: [u8; PUBLIC_KEY_SIZE]) -> Result<Self, Error> {
        XOnlyPublicKey::from_slice(&buf)?;
        Ok(Self { buf })
    }

    /// Parse from `hex` string
    #[inline]
    pub fn from_hex(hex: &str) -> Result<Self, Error> {
        let buf: [u8; PUBLIC_KEY_SIZE] = hex::decode_array(hex)?;
        Self::from_bytes(buf)
    }

    /// Get public key as `hex` string
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.buf)
    }

    /// Get public key as `bytes`
    #[inline]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.buf
    }

    /// Get the verification key
    #[inline]
    pub fn xonly(&self) -> Result<XOnlyPublicKey, Error> {
        Ok(XOnlyPublicKey::from_slice(&self.buf)?)
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    /// Parse from `hex`, `bech32` or [NIP21](https://github.com/nostr-protocol/nips/blob/master/21.md) uri
    #[inline]
    fn from_str(public_key: &str) -> Result<Self, Self::Err> {
        Self::parse(public_key)
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let public_key: String = String::deserialize(deserializer)?;
        if !hex::is_lower_hex(&public_key, PUBLIC_KEY_SIZE * 2) {
            return Err(serde::de::Error::custom(Error::InvalidPublicKey));
        }
        Self::from_hex(&public_key).map_err(serde::de::Error::custom)
    }
}

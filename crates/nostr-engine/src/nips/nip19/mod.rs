// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! NIP19: bech32-encoded entities
//!
//! <https://github.com/nostr-protocol/nips/blob/master/19.md>

use core::fmt;

pub mod bech32;

use crate::event::id::{self, EventId};
use crate::key::{self, PublicKey, SecretKey};

/// `nsec` prefix
pub const PREFIX_BECH32_SECRET_KEY: &str = "nsec";
/// `npub` prefix
pub const PREFIX_BECH32_PUBLIC_KEY: &str = "npub";
/// `note` prefix
pub const PREFIX_BECH32_NOTE_ID: &str = "note";
/// NIP21 URI scheme
pub const NOSTR_URI_PREFIX: &str = "nostr:";

const ENTITY_LEN: usize = 32;

/// `NIP19` error
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Bech32 error.
    Bech32(bech32::Error),
    /// Keys error
    Keys(key::Error),
    /// Event ID error
    EventId(id::Error),
    /// Prefix doesn't match the expected entity
    WrongPrefix {
        /// Expected prefix
        expected: &'static str,
        /// Decoded prefix
        found: String,
    },
    /// Unknown prefix
    UnknownPrefix(String),
    /// Payload has the wrong length
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Decoded length
        found: usize,
    },
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bech32(e) => write!(f, "Bech32: {e}"),
            Self::Keys(e) => write!(f, "Keys: {e}"),
            Self::EventId(e) => write!(f, "Event ID: {e}"),
            Self::WrongPrefix { expected, found } => {
                write!(f, "Wrong prefix: expected={expected}, found={found}")
            }
            Self::UnknownPrefix(p) => write!(f, "Unknown prefix: {p}"),
            Self::InvalidLength { expected, found } => {
                write!(f, "Invalid length: expected={expected}, found={found}")
            }
        }
    }
}

impl From<bech32::Error> for Error {
    fn from(e: bech32::Error) -> Self {
        Self::Bech32(e)
    }
}

impl From<key::Error> for Error {
    fn from(e: key::Error) -> Self {
        Self::Keys(e)
    }
}

impl From<id::Error> for Error {
    fn from(e: id::Error) -> Self {
        Self::EventId(e)
    }
}

/// Decode from a bech32 string
pub trait FromBech32: Sized {
    /// Error
    type Err;

    /// Decode from a bech32 string
    fn from_bech32(s: &str) -> Result<Self, Self::Err>;
}

/// Encode as a bech32 string
pub trait ToBech32 {
    /// Error
    type Err;

    /// Encode as a bech32 string
    fn to_bech32(&self) -> Result<String, Self::Err>;
}

fn decode_entity(s: &str, expected: &'static str) -> Result<[u8; ENTITY_LEN], Error> {
    let (hrp, data) = bech32::decode(s)?;

    if hrp != expected {
        return Err(Error::WrongPrefix {
            expected,
            found: hrp,
        });
    }

    to_entity(&data)
}

fn to_entity(data: &[u8]) -> Result<[u8; ENTITY_LEN], Error> {
    data.try_into().map_err(|_| Error::InvalidLength {
        expected: ENTITY_LEN,
        found: data.len(),
    })
}

impl FromBech32 for PublicKey {
    type Err = Error;

    fn from_bech32(s: &str) -> Result<Self, Self::Err> {
        let buf = decode_entity(s, PREFIX_BECH32_PUBLIC_KEY)?;
        Ok(Self::from_bytes(buf)?)
    }
}

impl ToBech32 for PublicKey {
    type Err = Error;

    fn to_bech32(&self) -> Result<String, Self::Err> {
        Ok(bech32::encode(PREFIX_BECH32_PUBLIC_KEY, self.as_bytes())?)
    }
}

impl FromBech32 for SecretKey {
    type Err = Error;

    fn from_bech32(s: &str) -> Result<Self, Self::Err> {
        let buf = decode_entity(s, PREFIX_BECH32_SECRET_KEY)?;
        Ok(Self::from_slice(&buf)?)
    }
}

impl ToBech32 for SecretKey {
    type Err = Error;

    fn to_bech32(&self) -> Result<String, Self::Err> {
        Ok(bech32::encode(
            PREFIX_BECH32_SECRET_KEY,
            &self.to_secret_bytes(),
        )?)
    }
}

impl FromBech32 for EventId {
    type Err = Error;

    fn from_bech32(s: &str) -> Result<Self, Self::Err> {
        let buf = decode_entity(s, PREFIX_BECH32_NOTE_ID)?;
        Ok(Self::from_byte_array(buf))
    }
}

impl ToBech32 for EventId {
    type Err = Error;

    fn to_bech32(&self) -> Result<String, Self::Err> {
        Ok(bech32::encode(PREFIX_BECH32_NOTE_ID, self.as_bytes())?)
    }
}

/// Any bech32 entity supported by this crate
///
/// Useful for decoding strings without knowing what they hold ahead of time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nip19 {
    /// nsec
    Secret(SecretKey),
    /// npub
    Pubkey(PublicKey),
    /// note
    EventId(EventId),
}

impl FromBech32 for Nip19 {
    type Err = Error;

    fn from_bech32(s: &str) -> Result<Self, Self::Err> {
        let s: &str = s.strip_prefix(NOSTR_URI_PREFIX).unwrap_or(s);
        let (hrp, data) = bech32::decode(s)?;

        match hrp.as_str() {
            PREFIX_BECH32_SECRET_KEY => Ok(Self::Secret(SecretKey::from_slice(&to_entity(&data)?)?)),
            PREFIX_BECH32_PUBLIC_KEY => Ok(Self::Pubkey(PublicKey::from_bytes(to_entity(&data)?)?)),
            PREFIX_BECH32_NOTE_ID => Ok(Self::EventId(EventId::from_byte_array(to_entity(&data)?))),
            _ => Err(Error::UnknownPrefix(hrp)),
        }
    }
}

impl ToBech32 for Nip19 {
    type Err = Error;

    fn to_bech32(&self) -> Result<String, Self::Err> {
        match self {
            Self::Secret(secret_key) => secret_key.to_bech32(),
            Self::Pubkey(public_key) => public_key.to_bech32(),
            Self::EventId(id) => id.to_bech32(),
        }
    }
}

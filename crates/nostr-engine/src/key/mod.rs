// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Keys
//!
//! This module defines the [`Keys`] structure.

use core::fmt;
use core::str::FromStr;

use secp256k1::rand::rngs::OsRng;
use secp256k1::rand::RngCore;
use secp256k1::schnorr::Signature;
use secp256k1::{Keypair, Message};

pub mod public_key;
pub mod secret_key;

pub use self::public_key::PublicKey;
pub use self::secret_key::SecretKey;
use crate::util::hex;
use crate::SECP256K1;

/// [`Keys`] error
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Invalid secret key
    InvalidSecretKey,
    /// Invalid public key
    InvalidPublicKey,
    /// Hex decode error
    Hex(hex::FromHexError),
    /// Secp256k1 error
    Secp256k1(secp256k1::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSecretKey => write!(f, "Invalid secret key"),
            Self::InvalidPublicKey => write!(f, "Invalid public key"),
            Self::Hex(e) => write!(f, "Hex: {e}"),
            Self::Secp256k1(e) => write!(f, "Secp256k1: {e}"),
        }
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Self::Hex(e)
    }
}

impl From<secp256k1::Error> for Error {
    fn from(e: secp256k1::Error) -> Self {
        Self::Secp256k1(e)
    }
}

/// Nostr keys
#[derive(Clone)]
pub struct Keys {
    public_key: PublicKey,
    secret_key: SecretKey,
    keypair: Keypair,
}

impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Keys {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
    }
}

impl Eq for Keys {}

impl Keys {
    /// Initialize from secret key.
    pub fn new(secret_key: SecretKey) -> Self {
        let keypair: Keypair = Keypair::from_secret_key(&SECP256K1, &secret_key);
        let (xonly, _parity) = keypair.x_only_public_key();

        Self {
            public_key: PublicKey::from(xonly),
            secret_key,
            keypair,
        }
    }

    /// Parse secret key from `hex` or `bech32`
    #[inline]
    pub fn parse(secret_key: &str) -> Result<Self, Error> {
        let secret_key: SecretKey = SecretKey::parse(secret_key)?;
        Ok(Self::new(secret_key))
    }

    /// Generate random keys
    #[inline]
    pub fn generate() -> Self {
        Self::new(SecretKey::generate())
    }

    /// Get public key
    #[inline]
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Get secret key
    #[inline]
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Sign a schnorr [`Message`] using 32 bytes of fresh auxiliary randomness
    pub fn sign_schnorr(&self, message: &Message) -> Signature {
        let mut aux_rand: [u8; 32] = [0u8; 32];
        OsRng.fill_bytes(&mut aux_rand);
        self.sign_schnorr_with_aux_rand(message, &aux_rand)
    }

    /// Sign a schnorr [`Message`] with caller-provided auxiliary randomness
    #[inline]
    pub fn sign_schnorr_with_aux_rand(&self, message: &Message, aux_rand: &[u8; 32]) -> Signature {
        SECP256K1.sign_schnorr_with_aux_rand(message, &self.keypair, aux_rand)
    }

    /// Sign a schnorr [`Message`] without auxiliary randomness (deterministic)
    #[inline]
    pub fn sign_schnorr_deterministic(&self, message: &Message) -> Signature {
        SECP256K1.sign_schnorr_no_aux_rand(message, &self.keypair)
    }
}

impl FromStr for Keys {
    type Err = Error;

    /// Parse secret key from `hex` or `bech32`
    #[inline]
    fn from_str(secret_key: &str) -> Result<Self, Self::Err> {
        Self::parse(secret_key)
    }
}

impl Drop for Keys {
    fn drop(&mut self) {
        self.keypair.non_secure_erase();
    }
}

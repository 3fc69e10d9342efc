// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Nostr Signer
//!
//! Signing is a capability: [`Keys`] signs locally, [`ExternalSigner`] hands the
//! event ID to a host-provided function (browser extension, hardware device, remote bunker).

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use secp256k1::schnorr::Signature;

use crate::util::BoxedFuture;
use crate::{Event, EventId, Keys, PublicKey, UnsignedEvent};

/// Nostr Signer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerError(String);

impl std::error::Error for SignerError {}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SignerError {
    /// New signer error
    #[inline]
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error,
    {
        Self(error.to_string())
    }
}

impl<S> From<S> for SignerError
where
    S: Into<String>,
{
    fn from(error: S) -> Self {
        Self(error.into())
    }
}

/// Signer backend
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignerBackend<'a> {
    /// Secret key
    Keys,
    /// Host-provided signing function
    External,
    /// Custom
    Custom(Cow<'a, str>),
}

/// Nostr signer abstraction
pub trait NostrSigner: fmt::Debug + Send + Sync {
    /// Signer backend
    fn backend(&self) -> SignerBackend;

    /// Get signer public key
    fn get_public_key(&self) -> BoxedFuture<Result<PublicKey, SignerError>>;

    /// Sign an unsigned event
    fn sign_event(&self, unsigned: UnsignedEvent) -> BoxedFuture<Result<Event, SignerError>>;
}

impl NostrSigner for Keys {
    fn backend(&self) -> SignerBackend {
        SignerBackend::Keys
    }

    fn get_public_key(&self) -> BoxedFuture<Result<PublicKey, SignerError>> {
        Box::pin(async move { Ok(self.public_key()) })
    }

    fn sign_event(&self, unsigned: UnsignedEvent) -> BoxedFuture<Result<Event, SignerError>> {
        Box::pin(async move { unsigned.sign_with_keys(self).map_err(SignerError::backend) })
    }
}

impl<T> NostrSigner for Arc<T>
where
    T: NostrSigner + ?Sized,
{
    fn backend(&self) -> SignerBackend {
        self.as_ref().backend()
    }

    fn get_public_key(&self) -> BoxedFuture<Result<PublicKey, SignerError>> {
        self.as_ref().get_public_key()
    }

    fn sign_event(&self, unsigned: UnsignedEvent) -> BoxedFuture<Result<Event, SignerError>> {
        self.as_ref().sign_event(unsigned)
    }
}

type SignFn = dyn Fn(EventId) -> BoxedFuture<'static, Result<Signature, SignerError>> + Send + Sync;

/// Signer that delegates the signature to a host-provided function
///
/// The function receives the event ID and returns a BIP340 signature over it.
/// The signature is verified before the [`Event`] is returned, so a misbehaving
/// host can't produce an invalid event.
#[derive(Clone)]
pub struct ExternalSigner {
    public_key: PublicKey,
    sign: Arc<SignFn>,
}

impl fmt::Debug for ExternalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalSigner")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl ExternalSigner {
    /// New external signer for `public_key`
    pub fn new<F>(public_key: PublicKey, sign: F) -> Self
    where
        F: Fn(EventId) -> BoxedFuture<'static, Result<Signature, SignerError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            public_key,
            sign: Arc::new(sign),
        }
    }
}

impl NostrSigner for ExternalSigner {
    fn backend(&self) -> SignerBackend {
        SignerBackend::External
    }

    fn get_public_key(&self) -> BoxedFuture<Result<PublicKey, SignerError>> {
        Box::pin(async move { Ok(self.public_key) })
    }

    fn sign_event(&self, unsigned: UnsignedEvent) -> BoxedFuture<Result<Event, SignerError>> {
        Box::pin(async move {
            if unsigned.pubkey != self.public_key {
                return Err(SignerError::from("public key mismatch"));
            }

            let id: EventId = unsigned.compute_id();
            let sig: Signature = (self.sign)(id).await?;
            unsigned.add_signature(sig).map_err(SignerError::backend)
        })
    }
}

// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Unsigned Event

use secp256k1::schnorr::Signature;
use secp256k1::Message;
use serde::{Deserialize, Serialize};

use super::{id, Error, Event, EventId, Kind, Tag};
use crate::signer::{NostrSigner, SignerError};
use crate::{JsonUtil, Keys, PublicKey, Timestamp};

/// Unsigned event
///
/// A template with the author attached: everything but the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEvent {
    /// Cached ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
    /// Author
    pub pubkey: PublicKey,
    /// Timestamp (seconds)
    pub created_at: Timestamp,
    /// Kind
    pub kind: Kind,
    /// Vector of [`Tag`]
    pub tags: Vec<Tag>,
    /// Content
    pub content: String,
}

impl UnsignedEvent {
    /// Compose new unsigned event
    pub fn new<S>(
        public_key: PublicKey,
        created_at: Timestamp,
        kind: Kind,
        tags: Vec<Tag>,
        content: S,
    ) -> Self
    where
        S: Into<String>,
    {
        Self {
            id: None,
            pubkey: public_key,
            created_at,
            kind,
            tags,
            content: content.into(),
        }
    }

    /// Canonical serialization (pre-image of the ID)
    #[inline]
    pub fn serialize(&self) -> String {
        id::canonical_json(
            self.pubkey,
            self.created_at.as_u64(),
            self.kind,
            &self.tags,
            &self.content,
        )
    }

    /// Compute the ID, ignoring the cached one
    #[inline]
    pub fn compute_id(&self) -> EventId {
        EventId::hash(&self.serialize())
    }

    /// Get the cached ID or compute it
    #[inline]
    pub fn id(&self) -> EventId {
        self.id.unwrap_or_else(|| self.compute_id())
    }

    /// Compute and cache the ID
    #[inline]
    pub fn ensure_id(&mut self) {
        if self.id.is_none() {
            self.id = Some(self.compute_id());
        }
    }

    fn checked_id(&self) -> Result<EventId, Error> {
        let id: EventId = self.compute_id();
        match self.id {
            Some(cached) if cached != id => Err(Error::InvalidId),
            _ => Ok(id),
        }
    }

    /// Sign with local [`Keys`], with fresh auxiliary randomness
    pub fn sign_with_keys(self, keys: &Keys) -> Result<Event, Error> {
        if keys.public_key() != self.pubkey {
            return Err(Error::PublicKeyMismatch);
        }

        let id: EventId = self.checked_id()?;
        let message: Message = Message::from_digest(id.to_bytes());
        let sig: Signature = keys.sign_schnorr(&message);
        Ok(self.into_event(id, sig))
    }

    /// Sign with local [`Keys`] without auxiliary randomness
    ///
    /// The same template and keys always give the same signature.
    pub fn sign_with_keys_deterministic(self, keys: &Keys) -> Result<Event, Error> {
        if keys.public_key() != self.pubkey {
            return Err(Error::PublicKeyMismatch);
        }

        let id: EventId = self.checked_id()?;
        let message: Message = Message::from_digest(id.to_bytes());
        let sig: Signature = keys.sign_schnorr_deterministic(&message);
        Ok(self.into_event(id, sig))
    }

    /// Sign with any [`NostrSigner`]
    #[inline]
    pub async fn sign<T>(self, signer: &T) -> Result<Event, SignerError>
    where
        T: NostrSigner + ?Sized,
    {
        signer.sign_event(self).await
    }

    /// Attach a signature produced elsewhere
    ///
    /// The resulting [`Event`] is verified before being returned.
    pub fn add_signature(self, sig: Signature) -> Result<Event, Error> {
        let id: EventId = self.checked_id()?;
        let event: Event = self.into_event(id, sig);
        event.verify()?;
        Ok(event)
    }

    fn into_event(self, id: EventId, sig: Signature) -> Event {
        Event::new(
            id,
            self.pubkey,
            self.created_at,
            self.kind,
            self.tags,
            self.content,
            sig,
        )
    }
}

impl JsonUtil for UnsignedEvent {
    type Err = Error;
}

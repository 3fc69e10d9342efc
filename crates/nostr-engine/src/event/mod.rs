// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Event

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

use secp256k1::schnorr::Signature;
use secp256k1::Message;
use serde::{Deserialize, Serialize};

pub mod builder;
pub mod id;
pub mod kind;
pub mod raw;
pub mod tag;
pub mod unsigned;

pub use self::builder::EventBuilder;
pub use self::id::EventId;
pub use self::kind::Kind;
pub use self::raw::{validate, RawEvent};
pub use self::tag::Tag;
pub use self::unsigned::UnsignedEvent;
use crate::{key, JsonUtil, PublicKey, Timestamp, SECP256K1};

/// [`Event`] error
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Malformed event shape
    Validation(String),
    /// Stored ID doesn't match the hash of the event
    InvalidId,
    /// Signature doesn't verify under the public key
    InvalidSignature,
    /// Signing keys don't match the event author
    PublicKeyMismatch,
    /// Error serializing or deserializing JSON data
    Json(String),
    /// Keys error
    Keys(key::Error),
    /// Event ID error
    EventId(id::Error),
    /// Secp256k1 error
    Secp256k1(secp256k1::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "Validation: {e}"),
            Self::InvalidId => write!(f, "Invalid event ID"),
            Self::InvalidSignature => write!(f, "Invalid signature"),
            Self::PublicKeyMismatch => write!(f, "Public key mismatch"),
            Self::Json(e) => write!(f, "Json: {e}"),
            Self::Keys(e) => write!(f, "Keys: {e}"),
            Self::EventId(e) => write!(f, "Event ID: {e}"),
            Self::Secp256k1(e) => write!(f, "Secp256k1: {e}"),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
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

impl From<secp256k1::Error> for Error {
    fn from(e: secp256k1::Error) -> Self {
        Self::Secp256k1(e)
    }
}

/// Signed event
///
/// Equality, ordering and hashing go through the ID, which commits to every field but `sig`.
///
/// <https://github.com/nostr-protocol/nips/blob/master/01.md>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// ID
    pub id: EventId,
    /// Author
    pub pubkey: PublicKey,
    /// UNIX timestamp (seconds)
    pub created_at: Timestamp,
    /// Kind
    pub kind: Kind,
    /// Tag list
    pub tags: Vec<Tag>,
    /// Content
    pub content: String,
    /// Signature
    pub sig: Signature,
}

impl Event {
    /// Compose event
    pub fn new<S>(
        id: EventId,
        public_key: PublicKey,
        created_at: Timestamp,
        kind: Kind,
        tags: Vec<Tag>,
        content: S,
        sig: Signature,
    ) -> Self
    where
        S: Into<String>,
    {
        Self {
            id,
            pubkey: public_key,
            created_at,
            kind,
            tags,
            content: content.into(),
            sig,
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

    /// Verify both [`EventId`] and [`Signature`]
    pub fn verify(&self) -> Result<(), Error> {
        // Verify ID
        if !self.verify_id() {
            return Err(Error::InvalidId);
        }

        // Verify signature
        if !self.verify_signature() {
            return Err(Error::InvalidSignature);
        }

        Ok(())
    }

    /// Verify if the [`EventId`] it's composed correctly
    #[inline]
    pub fn verify_id(&self) -> bool {
        let id: EventId = EventId::new(
            &self.pubkey,
            &self.created_at,
            &self.kind,
            &self.tags,
            &self.content,
        );
        id == self.id
    }

    /// Verify only event [`Signature`]
    pub fn verify_signature(&self) -> bool {
        match self.pubkey.xonly() {
            Ok(public_key) => {
                let message: Message = Message::from_digest(self.id.to_bytes());
                SECP256K1
                    .verify_schnorr(&self.sig, &message, &public_key)
                    .is_ok()
            }
            Err(..) => false,
        }
    }

    /// Get the first value of the first tag named `name`
    pub fn tag_content(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.kind() == Some(name))
            .and_then(|t| t.content())
    }
}

impl JsonUtil for Event {
    type Err = Error;
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Most recent first; ties broken by ascending ID
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .created_at
            .cmp(&self.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Sort events by `created_at` descending, ties by ascending ID
#[inline]
pub fn sort_by_recency(events: &mut [Event]) {
    events.sort();
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::Keys;

    fn signed_note(keys: &Keys, created_at: u64, content: &str) -> Event {
        EventBuilder::text_note(content)
            .tag(Tag::hashtag("rust"))
            .custom_created_at(Timestamp::from(created_at))
            .sign_with_keys(keys)
            .unwrap()
    }

    #[test]
    fn test_finalize_then_verify() {
        let keys = Keys::generate();
        let event = signed_note(&keys, 1_700_000_000, "hello");
        assert!(event.verify().is_ok());
        assert_eq!(event.pubkey, keys.public_key());
        assert_eq!(event.id, EventId::hash(&event.serialize()));
    }

    #[test]
    fn test_tampered_fields_fail_id_check() {
        let keys = Keys::generate();
        let event = signed_note(&keys, 1_700_000_000, "hello");

        let mut tampered = event.clone();
        tampered.content = String::from("hellp");
        assert_eq!(tampered.verify(), Err(Error::InvalidId));

        let mut tampered = event.clone();
        tampered.tags = vec![Tag::hashtag("rusu")];
        assert_eq!(tampered.verify(), Err(Error::InvalidId));

        let mut tampered = event.clone();
        tampered.created_at = Timestamp::from(1_700_000_001);
        assert_eq!(tampered.verify(), Err(Error::InvalidId));

        let mut tampered = event;
        tampered.kind = Kind::from(2);
        assert_eq!(tampered.verify(), Err(Error::InvalidId));
    }

    #[test]
    fn test_tampered_signature() {
        let keys = Keys::generate();
        let event = signed_note(&keys, 1_700_000_000, "hello");

        let sig_hex: String = event.sig.to_string();
        for i in [0usize, 17, 64, 127] {
            let mut chars: Vec<char> = sig_hex.chars().collect();
            chars[i] = if chars[i] == '0' { '1' } else { '0' };
            let flipped: String = chars.into_iter().collect();

            let mut tampered = event.clone();
            match flipped.parse::<Signature>() {
                Ok(sig) => {
                    tampered.sig = sig;
                    assert!(tampered.verify_id());
                    assert_eq!(tampered.verify(), Err(Error::InvalidSignature));
                }
                // Some flips produce a signature that can't even be parsed
                Err(..) => continue,
            }
        }
    }

    #[test]
    fn test_signature_from_other_key() {
        let event = signed_note(&Keys::generate(), 1_700_000_000, "hello");
        let mut forged = event.clone();
        forged.pubkey = Keys::generate().public_key();
        assert_eq!(forged.verify(), Err(Error::InvalidId));
    }

    #[test]
    fn test_json_round_trip() {
        let keys = Keys::generate();
        let event = signed_note(&keys, 1_700_000_000, "hello \"world\"");
        let json: String = event.as_json();
        let parsed = Event::from_json(&json).unwrap();
        assert_eq!(parsed, event);
        assert!(parsed.verify().is_ok());
        assert_eq!(parsed.tag_content("t"), Some("rust"));
    }

    #[test]
    fn test_sort_by_recency() {
        let keys = Keys::generate();
        let mut events: Vec<Event> = vec![
            signed_note(&keys, 10, "a"),
            signed_note(&keys, 30, "b"),
            signed_note(&keys, 20, "c"),
            signed_note(&keys, 30, "d"),
            signed_note(&keys, 20, "e"),
        ];

        sort_by_recency(&mut events);

        for pair in events.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.created_at >= b.created_at);
            if a.created_at == b.created_at {
                assert!(a.id.to_hex() < b.id.to_hex());
            }
        }

        // Total order: re-sorting a shuffled copy gives the same result
        let mut reversed: Vec<Event> = events.iter().rev().cloned().collect();
        sort_by_recency(&mut reversed);
        assert_eq!(reversed, events);
    }

    #[test]
    fn test_identity_by_id() {
        let keys = Keys::generate();
        let unsigned = EventBuilder::text_note("same")
            .custom_created_at(Timestamp::from(1_700_000_000))
            .build(keys.public_key());

        // Randomized signatures of the same template
        let a = unsigned.clone().sign_with_keys(&keys).unwrap();
        let b = unsigned.sign_with_keys(&keys).unwrap();
        assert_ne!(a.sig, b.sig);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(BTreeSet::from([a.clone(), b]).len(), 1);

        let c = signed_note(&keys, 1_700_000_000, "other");
        assert_ne!(a, c);
        assert_ne!(a.cmp(&c), Ordering::Equal);
    }
}

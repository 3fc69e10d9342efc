// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Raw event
//!
//! Loosely typed wire shape, used to check untrusted JSON before it becomes an [`Event`].

use secp256k1::schnorr::Signature;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{id, Error, Event, EventId, Kind, Tag};
use crate::util::hex;
use crate::{JsonUtil, PublicKey, Timestamp};

const HEX_ID_LEN: usize = 64;
const HEX_PUBKEY_LEN: usize = 64;
const HEX_SIG_LEN: usize = 128;

/// Raw event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Author
    pub pubkey: String,
    /// Timestamp (seconds)
    pub created_at: u64,
    /// Kind
    pub kind: u64,
    /// Tags
    pub tags: Vec<Vec<String>>,
    /// Content
    pub content: String,
    /// Signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl RawEvent {
    /// Deserialize from a JSON [`Value`]
    #[inline]
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        Ok(Self::deserialize(value)?)
    }

    /// Structural check
    ///
    /// `pubkey` must be 64 lowercase hex chars and `kind` must fit 16 bits.
    /// When present, `id` must be 64 and `sig` 128 lowercase hex chars.
    pub fn validate(&self) -> bool {
        self.check().is_ok()
    }

    fn check(&self) -> Result<(), Error> {
        if !hex::is_lower_hex(&self.pubkey, HEX_PUBKEY_LEN) {
            return Err(Error::Validation(String::from(
                "pubkey must be 64 lowercase hex chars",
            )));
        }

        if self.kind > u64::from(u16::MAX) {
            return Err(Error::Validation(format!("kind out of range: {}", self.kind)));
        }

        if let Some(id) = &self.id {
            if !hex::is_lower_hex(id, HEX_ID_LEN) {
                return Err(Error::Validation(String::from(
                    "id must be 64 lowercase hex chars",
                )));
            }
        }

        if let Some(sig) = &self.sig {
            if !hex::is_lower_hex(sig, HEX_SIG_LEN) {
                return Err(Error::Validation(String::from(
                    "sig must be 128 lowercase hex chars",
                )));
            }
        }

        Ok(())
    }

    /// Canonical serialization
    ///
    /// Fails if the structure isn't valid.
    pub fn serialize(&self) -> Result<String, Error> {
        self.check()?;
        Ok(id::canonical_json(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        ))
    }

    /// SHA-256 of the canonical serialization
    #[inline]
    pub fn hash(&self) -> Result<EventId, Error> {
        Ok(EventId::hash(&self.serialize()?))
    }

    /// Check structure, ID and signature
    ///
    /// Any failure, including a malformed key or signature, gives `false`.
    pub fn verify(&self) -> bool {
        match Event::try_from(self.clone()) {
            Ok(event) => event.verify().is_ok(),
            Err(..) => false,
        }
    }
}

impl JsonUtil for RawEvent {
    type Err = Error;
}

impl TryFrom<RawEvent> for Event {
    type Error = Error;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        raw.check()?;

        let id: &str = raw
            .id
            .as_deref()
            .ok_or_else(|| Error::Validation(String::from("missing id")))?;
        let sig: &str = raw
            .sig
            .as_deref()
            .ok_or_else(|| Error::Validation(String::from("missing sig")))?;

        let id: EventId = EventId::from_hex(id)?;
        let pubkey: PublicKey = PublicKey::from_hex(&raw.pubkey)?;
        let sig: Signature = sig.parse()?;
        let kind: Kind = Kind::from_u16(raw.kind as u16);
        let tags: Vec<Tag> = raw.tags.into_iter().map(Tag::from).collect();

        Ok(Event::new(
            id,
            pubkey,
            Timestamp::from(raw.created_at),
            kind,
            tags,
            raw.content,
            sig,
        ))
    }
}

impl From<Event> for RawEvent {
    fn from(event: Event) -> Self {
        Self {
            id: Some(event.id.to_hex()),
            pubkey: event.pubkey.to_hex(),
            created_at: event.created_at.as_u64(),
            kind: u64::from(event.kind.as_u16()),
            tags: event.tags.into_iter().map(Tag::to_vec).collect(),
            content: event.content,
            sig: Some(event.sig.to_string()),
        }
    }
}

/// Structural check of a JSON event value
///
/// Never panics: anything that doesn't have the event shape gives `false`.
pub fn validate(value: &Value) -> bool {
    match RawEvent::from_value(value) {
        Ok(raw) => raw.validate(),
        Err(..) => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{EventBuilder, Keys};

    const PUBKEY: &str = "aa4fc8665f5696e33db7e1a572e3b0f5b3d615837b0f362dcb1c8068b098c7b4";

    fn template() -> Value {
        json!({
            "pubkey": PUBKEY,
            "created_at": 1612809991,
            "kind": 1,
            "tags": [["e", "abc"], []],
            "content": "test",
        })
    }

    #[test]
    fn test_validate_template() {
        assert!(validate(&template()));
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let cases: Vec<(&str, Value)> = vec![
            ("pubkey", json!(PUBKEY.to_uppercase())),
            ("pubkey", json!(&PUBKEY[..63])),
            ("pubkey", json!(123)),
            ("kind", json!(-1)),
            ("kind", json!(1.5)),
            ("kind", json!("1")),
            ("kind", json!(70000)),
            ("created_at", json!(-5)),
            ("created_at", json!("now")),
            ("content", json!(null)),
            ("content", json!(1)),
            ("tags", json!([["e", 1]])),
            ("tags", json!(["e", "abc"])),
            ("tags", json!({})),
        ];

        for (field, value) in cases {
            let mut event = template();
            event[field] = value.clone();
            assert!(!validate(&event), "{field} = {value}");
        }

        let mut event = template();
        event.as_object_mut().unwrap().remove("content");
        assert!(!validate(&event));

        assert!(!validate(&json!([])));
        assert!(!validate(&json!("event")));
    }

    #[test]
    fn test_serialize() {
        let raw = RawEvent::from_value(&template()).unwrap();
        assert_eq!(
            raw.serialize().unwrap(),
            format!(r#"[0,"{PUBKEY}",1612809991,1,[["e","abc"],[]],"test"]"#)
        );

        let mut invalid = raw;
        invalid.pubkey = PUBKEY.to_uppercase();
        assert!(matches!(invalid.serialize(), Err(Error::Validation(..))));
        assert!(matches!(invalid.hash(), Err(Error::Validation(..))));
    }

    #[test]
    fn test_hash_matches_typed_event() {
        let keys = Keys::generate();
        let event = EventBuilder::text_note("hi")
            .tag(crate::Tag::hashtag("x"))
            .sign_with_keys(&keys)
            .unwrap();
        let raw = RawEvent::from(event.clone());
        assert_eq!(raw.hash().unwrap(), event.id);
        assert!(raw.verify());

        let mut tampered = raw.clone();
        tampered.content.push('!');
        assert!(!tampered.verify());

        let mut garbage_sig = raw;
        garbage_sig.sig = Some("zz".repeat(64));
        assert!(!garbage_sig.verify());
    }
}

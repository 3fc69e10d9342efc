// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Event builder

use super::{Error, Event, Kind, Tag, UnsignedEvent};
use crate::signer::{NostrSigner, SignerError};
use crate::{Keys, PublicKey, Timestamp};

/// Event builder
///
/// Holds an event template: kind, content, tags and an optional timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBuilder {
    kind: Kind,
    content: String,
    tags: Vec<Tag>,
    custom_created_at: Option<Timestamp>,
}

impl EventBuilder {
    /// New event builder
    pub fn new<S>(kind: Kind, content: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            kind,
            content: content.into(),
            tags: Vec::new(),
            custom_created_at: None,
        }
    }

    /// Text note
    ///
    /// <https://github.com/nostr-protocol/nips/blob/master/01.md>
    #[inline]
    pub fn text_note<S>(content: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(Kind::TEXT_NOTE, content)
    }

    /// Add tag
    #[inline]
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Add tags
    #[inline]
    pub fn tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = Tag>,
    {
        self.tags.extend(tags);
        self
    }

    /// Set a custom `created_at` UNIX timestamp
    #[inline]
    pub fn custom_created_at(mut self, created_at: Timestamp) -> Self {
        self.custom_created_at = Some(created_at);
        self
    }

    /// Build an unsigned event for `public_key`
    pub fn build(self, public_key: PublicKey) -> UnsignedEvent {
        let created_at: Timestamp = self.custom_created_at.unwrap_or_else(Timestamp::now);
        let mut unsigned: UnsignedEvent =
            UnsignedEvent::new(public_key, created_at, self.kind, self.tags, self.content);
        unsigned.ensure_id();
        unsigned
    }

    /// Build and sign with local [`Keys`]
    #[inline]
    pub fn sign_with_keys(self, keys: &Keys) -> Result<Event, Error> {
        self.build(keys.public_key()).sign_with_keys(keys)
    }

    /// Build and sign with any [`NostrSigner`]
    pub async fn sign<T>(self, signer: &T) -> Result<Event, SignerError>
    where
        T: NostrSigner + ?Sized,
    {
        let public_key: PublicKey = signer.get_public_key().await?;
        self.build(public_key).sign(signer).await
    }
}

// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Event Kind

use core::fmt;
use core::ops::Range;

use serde::{Deserialize, Serialize};

const REPLACEABLE_RANGE: Range<u16> = 10_000..20_000;
const EPHEMERAL_RANGE: Range<u16> = 20_000..30_000;
const ADDRESSABLE_RANGE: Range<u16> = 30_000..40_000;

/// Event [`Kind`]
///
/// <https://github.com/nostr-protocol/nips/blob/master/01.md#kinds>
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(u16);

impl Kind {
    /// Metadata (NIP01)
    pub const METADATA: Self = Self(0);
    /// Short Text Note (NIP01)
    pub const TEXT_NOTE: Self = Self(1);
    /// Contacts (NIP02)
    pub const CONTACT_LIST: Self = Self(3);
    /// Event Deletion (NIP09)
    pub const EVENT_DELETION: Self = Self(5);
    /// Repost (NIP18)
    pub const REPOST: Self = Self(6);
    /// Reaction (NIP25)
    pub const REACTION: Self = Self(7);
    /// Relay List Metadata (NIP65)
    pub const RELAY_LIST: Self = Self(10002);

    /// Construct from `u16`
    #[inline]
    pub const fn from_u16(kind: u16) -> Self {
        Self(kind)
    }

    /// Get as `u16`
    #[inline]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Check if it's replaceable
    ///
    /// <https://github.com/nostr-protocol/nips/blob/master/01.md>
    #[inline]
    pub fn is_replaceable(&self) -> bool {
        matches!(self.0, 0 | 3) || REPLACEABLE_RANGE.contains(&self.0)
    }

    /// Check if it's ephemeral
    #[inline]
    pub fn is_ephemeral(&self) -> bool {
        EPHEMERAL_RANGE.contains(&self.0)
    }

    /// Check if it's addressable (parameterized replaceable)
    #[inline]
    pub fn is_addressable(&self) -> bool {
        ADDRESSABLE_RANGE.contains(&self.0)
    }
}

impl From<u16> for Kind {
    fn from(kind: u16) -> Self {
        Self(kind)
    }
}

impl From<Kind> for u16 {
    fn from(kind: Kind) -> Self {
        kind.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

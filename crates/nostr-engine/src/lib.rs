// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

//! Nostr client protocol engine.
//!
//! Canonical event serialization, hashing, BIP-340 signing and verification,
//! NIP-19 identifiers, client/relay wire messages and relay URL canonicalization.

pub use bitcoin_hashes as hashes;
pub use secp256k1;
pub use url::{self, Url};

pub mod event;
pub mod filter;
pub mod key;
pub mod message;
pub mod nips;
pub mod prelude;
pub mod signer;
pub mod types;
pub mod util;

pub use self::event::{Event, EventBuilder, EventId, Kind, Tag, UnsignedEvent};
pub use self::filter::Filter;
pub use self::key::{Keys, PublicKey, SecretKey};
pub use self::message::{ClientMessage, RelayMessage, SubscriptionId};
pub use self::signer::{ExternalSigner, NostrSigner, SignerBackend, SignerError};
pub use self::types::{RelayUrl, Timestamp};
pub use self::util::{JsonUtil, SECP256K1};

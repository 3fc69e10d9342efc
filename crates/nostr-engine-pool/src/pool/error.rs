// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

use std::convert::Infallible;

use nostr_engine::types::url;
use thiserror::Error;

use crate::relay;

/// Relay Pool error
#[derive(Debug, Error)]
pub enum Error {
    /// Url parse error
    #[error(transparent)]
    RelayUrl(#[from] url::Error),
    /// Relay error
    #[error(transparent)]
    Relay(#[from] relay::Error),
    /// Infallible
    #[error(transparent)]
    Infallible(#[from] Infallible),
    /// Too many relays
    #[error("too many relays (limit: {limit})")]
    TooManyRelays {
        /// Max number allowed
        limit: usize,
    },
    /// No relays
    #[error("no relays")]
    NoRelays,
    /// Relay not found
    #[error("relay not found")]
    RelayNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e: Error = url::Error::Empty.into();
        assert_eq!(e.to_string(), "Empty url");

        let e: Error = relay::Error::NotConnected.into();
        assert_eq!(e.to_string(), "relay not connected");

        assert_eq!(
            Error::TooManyRelays { limit: 2 }.to_string(),
            "too many relays (limit: 2)"
        );
    }
}

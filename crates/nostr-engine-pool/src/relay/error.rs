// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

use std::sync::Arc;

use thiserror::Error;

use crate::transport::TransportError;

/// [`Relay`](super::Relay) error
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Transport error, shared by every caller waiting on the same attempt
    #[error("transport: {0}")]
    Transport(Arc<TransportError>),
    /// Relay not connected
    #[error("relay not connected")]
    NotConnected,
    /// Relay closed while the operation was in flight
    #[error("relay closed")]
    Closed,
    /// Generic timeout
    #[error("timeout")]
    Timeout,
    /// Event rejected by the relay
    #[error("event not published: {0}")]
    EventNotPublished(String),
}

// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Transport error

use thiserror::Error;

/// Transport error
#[derive(Debug, Error)]
pub enum TransportError {
    /// An error happened in the underlying backend
    #[error("{0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
    /// The socket didn't accept a frame in time
    #[error("websocket timeout")]
    Timeout,
}

impl TransportError {
    /// Wrap a backend error
    #[inline]
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(error))
    }
}

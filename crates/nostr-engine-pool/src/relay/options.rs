// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay options

use std::time::Duration;

use async_wsocket::ConnectionMode;

use super::constants::{
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_NOTIFICATION_CHANNEL_SIZE,
    DEFAULT_SUBSCRIPTION_CHANNEL_SIZE,
};

/// [`Relay`](super::Relay) options
#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub(super) connection_mode: ConnectionMode,
    pub(super) connection_timeout: Duration,
    pub(super) subscription_channel_size: usize,
    pub(super) notification_channel_size: usize,
    pub(super) verify_events: bool,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            connection_mode: ConnectionMode::default(),
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            subscription_channel_size: DEFAULT_SUBSCRIPTION_CHANNEL_SIZE,
            notification_channel_size: DEFAULT_NOTIFICATION_CHANNEL_SIZE,
            verify_events: true,
        }
    }
}

impl RelayOptions {
    /// New default options
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set connection mode (direct or proxied)
    #[inline]
    pub fn connection_mode(mut self, mode: ConnectionMode) -> Self {
        self.connection_mode = mode;
        self
    }

    /// Handshake timeout (default: 60 secs)
    #[inline]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Capacity of the channel returned by [`Relay::subscribe`](super::Relay::subscribe) (default: 1024)
    ///
    /// A full channel pauses the connection reader until the consumer catches up.
    #[inline]
    pub fn subscription_channel_size(mut self, size: usize) -> Self {
        self.subscription_channel_size = size;
        self
    }

    /// Capacity of the notification broadcast channel (default: 2048)
    #[inline]
    pub fn notification_channel_size(mut self, size: usize) -> Self {
        self.notification_channel_size = size;
        self
    }

    /// Verify id and signature of incoming events (default: true)
    #[inline]
    pub fn verify_events(mut self, verify: bool) -> Self {
        self.verify_events = verify;
        self
    }
}

// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Pool options

use crate::relay::constants::DEFAULT_SUBSCRIPTION_CHANNEL_SIZE;
use crate::relay::RelayOptions;

/// Relay Pool Options
#[derive(Debug, Clone)]
pub struct RelayPoolOptions {
    pub(super) relay: RelayOptions,
    pub(super) max_relays: Option<usize>,
    pub(super) subscription_channel_size: usize,
}

impl Default for RelayPoolOptions {
    fn default() -> Self {
        Self {
            relay: RelayOptions::default(),
            max_relays: None,
            subscription_channel_size: DEFAULT_SUBSCRIPTION_CHANNEL_SIZE,
        }
    }
}

impl RelayPoolOptions {
    /// New default options
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options of relays added with [`RelayPool::add_relay`](super::RelayPool::add_relay)
    #[inline]
    pub fn relay(mut self, opts: RelayOptions) -> Self {
        self.relay = opts;
        self
    }

    /// Max number of relays (default: unlimited)
    #[inline]
    pub fn max_relays(mut self, num: Option<usize>) -> Self {
        self.max_relays = num;
        self
    }

    /// Capacity of the channel shared by a pool subscription (default: 1024)
    #[inline]
    pub fn subscription_channel_size(mut self, size: usize) -> Self {
        self.subscription_channel_size = size;
        self
    }
}

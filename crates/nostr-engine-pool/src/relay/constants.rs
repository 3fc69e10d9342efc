// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay constants

use core::time::Duration;

pub(super) const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(60);
pub(super) const WEBSOCKET_TX_TIMEOUT: Duration = Duration::from_secs(10);

/// Default capacity of a subscription channel
pub const DEFAULT_SUBSCRIPTION_CHANNEL_SIZE: usize = 1024;
/// Default capacity of the relay notification channel
pub const DEFAULT_NOTIFICATION_CHANNEL_SIZE: usize = 2048;

/// `CLOSED` message delivered to subscriptions whose session ended
pub(super) const CONNECTION_LOST: &str = "connection lost";

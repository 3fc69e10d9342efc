// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Nostr relay connections and relay pool

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod pool;
pub mod prelude;
pub mod relay;
pub mod transport;

pub use self::pool::options::RelayPoolOptions;
pub use self::pool::{Output, PoolSubscription, RelayPool};
pub use self::relay::options::RelayOptions;
pub use self::relay::{
    Relay, RelayNotification, RelayStatus, Subscription, SubscriptionNotification,
};
pub use self::transport::{IntoWebSocketTransport, TransportError, WebSocketTransport};

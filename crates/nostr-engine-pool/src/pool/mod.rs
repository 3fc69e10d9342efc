// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay Pool

use std::collections::HashMap;
use std::time::Duration;

use atomic_destructor::AtomicDestructor;
use nostr_engine::prelude::*;
use tokio::sync::mpsc;

mod error;
mod inner;
pub mod options;
mod output;

pub use self::error::Error;
use self::inner::InnerRelayPool;
pub use self::options::RelayPoolOptions;
pub use self::output::Output;
use crate::relay::{Relay, RelayOptions, SubscriptionNotification};
use crate::transport::{DefaultWebsocketTransport, IntoWebSocketTransport};

/// Pool subscription handle
///
/// Notifications of every relay share one channel, with no cross-relay ordering or deduplication.
#[derive(Debug)]
pub struct PoolSubscription {
    ids: HashMap<RelayUrl, SubscriptionId>,
    receiver: mpsc::Receiver<SubscriptionNotification>,
}

impl PoolSubscription {
    fn new(
        ids: HashMap<RelayUrl, SubscriptionId>,
        receiver: mpsc::Receiver<SubscriptionNotification>,
    ) -> Self {
        Self { ids, receiver }
    }

    /// Subscription ID of each relay
    #[inline]
    pub fn ids(&self) -> &HashMap<RelayUrl, SubscriptionId> {
        &self.ids
    }

    /// Receive the next notification
    #[inline]
    pub async fn recv(&mut self) -> Option<SubscriptionNotification> {
        self.receiver.recv().await
    }

    /// Take the underlying receiver
    #[inline]
    pub fn into_receiver(self) -> mpsc::Receiver<SubscriptionNotification> {
        self.receiver
    }
}

/// Relay Pool
#[derive(Debug, Clone)]
pub struct RelayPool {
    inner: AtomicDestructor<InnerRelayPool>,
}

impl Default for RelayPool {
    fn default() -> Self {
        Self::new(RelayPoolOptions::default())
    }
}

impl RelayPool {
    /// Create new `RelayPool`
    #[inline]
    pub fn new(opts: RelayPoolOptions) -> Self {
        Self::with_transport(opts, DefaultWebsocketTransport)
    }

    /// Create new `RelayPool` with a custom websocket transport
    pub fn with_transport<T>(opts: RelayPoolOptions, transport: T) -> Self
    where
        T: IntoWebSocketTransport,
    {
        Self {
            inner: AtomicDestructor::new(InnerRelayPool::new(opts, transport.into_transport())),
        }
    }

    /// Get relays
    #[inline]
    pub async fn relays(&self) -> HashMap<RelayUrl, Relay> {
        self.inner.relays().await
    }

    /// Get [`Relay`]
    pub async fn relay<U>(&self, url: U) -> Result<Relay, Error>
    where
        U: TryInto<RelayUrl>,
        Error: From<<U as TryInto<RelayUrl>>::Error>,
    {
        let url: RelayUrl = url.try_into()?;
        self.inner.relay(&url).await
    }

    /// Add new relay with the options set in [`RelayPoolOptions::relay`]
    ///
    /// If the relay already exists, it's returned unchanged.
    #[inline]
    pub async fn add_relay<U>(&self, url: U) -> Result<Relay, Error>
    where
        U: TryInto<RelayUrl>,
        Error: From<<U as TryInto<RelayUrl>>::Error>,
    {
        self.add_relay_with_opts(url, self.inner.default_relay_opts())
            .await
    }

    /// Add new relay with custom options
    ///
    /// If the relay already exists, it's returned unchanged.
    pub async fn add_relay_with_opts<U>(&self, url: U, opts: RelayOptions) -> Result<Relay, Error>
    where
        U: TryInto<RelayUrl>,
        Error: From<<U as TryInto<RelayUrl>>::Error>,
    {
        let url: RelayUrl = url.try_into()?;
        self.inner.add_relay(url, opts).await
    }

    /// Close and remove relay
    pub async fn remove_relay<U>(&self, url: U) -> Result<(), Error>
    where
        U: TryInto<RelayUrl>,
        Error: From<<U as TryInto<RelayUrl>>::Error>,
    {
        let url: RelayUrl = url.try_into()?;
        self.inner.remove_relay(&url).await
    }

    /// Connect to all relays concurrently
    #[inline]
    pub async fn connect(&self) -> Output<()> {
        self.inner.connect().await
    }

    /// Subscribe to all relays
    #[inline]
    pub async fn subscribe(&self, filters: Vec<Filter>) -> PoolSubscription {
        self.inner.subscribe(filters).await
    }

    /// Unsubscribe each `(relay, subscription)` pair
    #[inline]
    pub async fn unsubscribe(&self, ids: &HashMap<RelayUrl, SubscriptionId>) {
        self.inner.unsubscribe(ids).await
    }

    /// Send event to all relays, without waiting for acknowledgments
    ///
    /// Completes once every relay settled. Fails only if the pool has no relays.
    #[inline]
    pub async fn publish(&self, event: &Event) -> Result<Output<EventId>, Error> {
        self.inner.publish(event).await
    }

    /// Send event to all relays and wait for their `OK` messages
    #[inline]
    pub async fn send_event(
        &self,
        event: &Event,
        timeout: Duration,
    ) -> Result<Output<EventId>, Error> {
        self.inner.send_event(event, timeout).await
    }

    /// Fetch stored events from all relays
    ///
    /// Waits until every connected relay sent EOSE (or closed the subscription) or `timeout`
    /// elapsed. Events are deduplicated and sorted by recency.
    #[inline]
    pub async fn fetch_events(
        &self,
        filters: Vec<Filter>,
        timeout: Duration,
    ) -> Result<Vec<Event>, Error> {
        self.inner.fetch_events(filters, timeout).await
    }

    /// Close and remove all relays
    #[inline]
    pub async fn close_all(&self) {
        self.inner.close_all().await
    }
}

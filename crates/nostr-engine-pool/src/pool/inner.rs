// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay Pool

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_utility::futures_util::future;
use async_utility::time;
use atomic_destructor::AtomicDestroyer;
use nostr_engine::prelude::*;
use tokio::sync::{mpsc, RwLock};

use super::options::RelayPoolOptions;
use super::{Error, Output, PoolSubscription};
use crate::relay::{Relay, RelayOptions, SubscriptionNotification};
use crate::transport::WebSocketTransport;

type Relays = HashMap<RelayUrl, Relay>;

#[derive(Debug, Clone)]
pub(super) struct InnerRelayPool {
    relays: Arc<RwLock<Relays>>,
    transport: Arc<dyn WebSocketTransport>,
    opts: RelayPoolOptions,
}

impl AtomicDestroyer for InnerRelayPool {
    fn name(&self) -> Option<String> {
        Some(String::from("Relay Pool"))
    }

    fn on_destroy(&self) {
        // Relays still referenced elsewhere must be closed too
        match self.relays.try_read() {
            Ok(relays) => relays.values().for_each(Relay::close),
            Err(..) => tracing::warn!("Relay pool dropped while locked, relays not closed."),
        }
    }
}

impl InnerRelayPool {
    pub(super) fn new(opts: RelayPoolOptions, transport: Arc<dyn WebSocketTransport>) -> Self {
        Self {
            relays: Arc::new(RwLock::new(HashMap::new())),
            transport,
            opts,
        }
    }

    #[inline]
    pub(super) fn default_relay_opts(&self) -> RelayOptions {
        self.opts.relay.clone()
    }

    pub(super) async fn relays(&self) -> Relays {
        let relays = self.relays.read().await;
        relays.clone()
    }

    pub(super) async fn relay(&self, url: &RelayUrl) -> Result<Relay, Error> {
        let relays = self.relays.read().await;
        relays.get(url).cloned().ok_or(Error::RelayNotFound)
    }

    pub(super) async fn add_relay(&self, url: RelayUrl, opts: RelayOptions) -> Result<Relay, Error> {
        let mut relays = self.relays.write().await;

        // Already added: leave it untouched
        if let Some(relay) = relays.get(&url) {
            return Ok(relay.clone());
        }

        if let Some(limit) = self.opts.max_relays {
            if relays.len() >= limit {
                return Err(Error::TooManyRelays { limit });
            }
        }

        let relay = Relay::with_transport(url.clone(), opts, self.transport.clone());
        relays.insert(url.clone(), relay.clone());

        tracing::debug!(url = %url, "Relay added.");

        Ok(relay)
    }

    pub(super) async fn remove_relay(&self, url: &RelayUrl) -> Result<(), Error> {
        let mut relays = self.relays.write().await;
        let relay: Relay = relays.remove(url).ok_or(Error::RelayNotFound)?;
        relay.close();

        tracing::debug!(url = %url, "Relay removed.");

        Ok(())
    }

    pub(super) async fn connect(&self) -> Output<()> {
        let relays: Relays = self.relays().await;

        let results = future::join_all(relays.into_iter().map(|(url, relay)| async move {
            let res = relay.connect().await;
            (url, res)
        }))
        .await;

        let mut output: Output<()> = Output::new(());
        for (url, res) in results.into_iter() {
            output.record(url, res);
        }
        output
    }

    pub(super) async fn subscribe(&self, filters: Vec<Filter>) -> PoolSubscription {
        let relays: Relays = self.relays().await;
        let (tx, rx) = mpsc::channel(self.opts.subscription_channel_size);

        let ids: HashMap<RelayUrl, SubscriptionId> = relays
            .into_iter()
            .map(|(url, relay)| {
                let id = relay.subscribe_with_sender(filters.clone(), tx.clone());
                (url, id)
            })
            .collect();

        PoolSubscription::new(ids, rx)
    }

    pub(super) async fn unsubscribe(&self, ids: &HashMap<RelayUrl, SubscriptionId>) {
        let relays = self.relays.read().await;
        for (url, id) in ids.iter() {
            if let Some(relay) = relays.get(url) {
                relay.unsubscribe(id);
            }
        }
    }

    pub(super) async fn publish(&self, event: &Event) -> Result<Output<EventId>, Error> {
        let relays: Relays = self.relays().await;

        if relays.is_empty() {
            return Err(Error::NoRelays);
        }

        let results = future::join_all(relays.into_iter().map(|(url, relay)| async move {
            let res = relay.publish(event).await;
            (url, res)
        }))
        .await;

        let mut output: Output<EventId> = Output::new(event.id);
        for (url, res) in results.into_iter() {
            if let Err(e) = &res {
                tracing::error!(url = %url, error = %e, "Impossible to publish event.");
            }
            output.record(url, res);
        }
        Ok(output)
    }

    pub(super) async fn send_event(
        &self,
        event: &Event,
        timeout: Duration,
    ) -> Result<Output<EventId>, Error> {
        let relays: Relays = self.relays().await;

        if relays.is_empty() {
            return Err(Error::NoRelays);
        }

        let results = future::join_all(relays.into_iter().map(|(url, relay)| async move {
            let res = relay.send_event(event, timeout).await;
            (url, res)
        }))
        .await;

        let mut output: Output<EventId> = Output::new(event.id);
        for (url, res) in results.into_iter() {
            output.record(url, res);
        }
        Ok(output)
    }

    pub(super) async fn fetch_events(
        &self,
        filters: Vec<Filter>,
        timeout: Duration,
    ) -> Result<Vec<Event>, Error> {
        if self.relays.read().await.is_empty() {
            return Err(Error::NoRelays);
        }

        // Relays that can't connect would never send EOSE
        let connected: Output<()> = self.connect().await;
        let mut pending: HashSet<RelayUrl> = connected.success;

        let mut sub: PoolSubscription = self.subscribe(filters).await;
        pending.retain(|url| sub.ids().contains_key(url));

        let mut ids: HashSet<EventId> = HashSet::new();
        let mut events: Vec<Event> = Vec::new();

        time::timeout(Some(timeout), async {
            while !pending.is_empty() {
                match sub.recv().await {
                    Some(SubscriptionNotification::Event { event, .. }) => {
                        if ids.insert(event.id) {
                            events.push(*event);
                        }
                    }
                    Some(SubscriptionNotification::EndOfStoredEvents { relay_url, .. })
                    | Some(SubscriptionNotification::Closed { relay_url, .. }) => {
                        pending.remove(&relay_url);
                    }
                    None => break,
                }
            }
        })
        .await;

        self.unsubscribe(sub.ids()).await;

        sort_by_recency(&mut events);
        Ok(events)
    }

    pub(super) async fn close_all(&self) {
        let mut relays = self.relays.write().await;
        for (_, relay) in relays.drain() {
            relay.close();
        }

        tracing::info!("Relay pool closed.");
    }
}

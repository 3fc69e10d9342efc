// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Subscriptions

use std::collections::HashMap;

use nostr_engine::prelude::*;
use tokio::sync::mpsc;

/// Item delivered on a subscription channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionNotification {
    /// Matching event
    Event {
        /// Relay that delivered the event
        relay_url: RelayUrl,
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Event
        event: Box<Event>,
    },
    /// The relay finished sending stored events
    EndOfStoredEvents {
        /// Relay URL
        relay_url: RelayUrl,
        /// Subscription ID
        subscription_id: SubscriptionId,
    },
    /// The relay closed the subscription
    Closed {
        /// Relay URL
        relay_url: RelayUrl,
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Reason given by the relay
        message: String,
    },
}

impl SubscriptionNotification {
    /// Relay the notification comes from
    pub fn relay_url(&self) -> &RelayUrl {
        match self {
            Self::Event { relay_url, .. }
            | Self::EndOfStoredEvents { relay_url, .. }
            | Self::Closed { relay_url, .. } => relay_url,
        }
    }

    /// Subscription the notification belongs to
    pub fn subscription_id(&self) -> &SubscriptionId {
        match self {
            Self::Event {
                subscription_id, ..
            }
            | Self::EndOfStoredEvents {
                subscription_id, ..
            }
            | Self::Closed {
                subscription_id, ..
            } => subscription_id,
        }
    }
}

/// Relay subscription handle
///
/// The stream ends once the subscription is removed (unsubscribe, relay close, `CLOSED` frame or lost session).
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<SubscriptionNotification>,
}

impl Subscription {
    pub(super) fn new(id: SubscriptionId, receiver: mpsc::Receiver<SubscriptionNotification>) -> Self {
        Self { id, receiver }
    }

    /// Subscription ID
    #[inline]
    pub fn id(&self) -> &SubscriptionId {
        &self.id
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

#[derive(Debug)]
struct SubscriptionEntry {
    filters: Vec<Filter>,
    sender: mpsc::Sender<SubscriptionNotification>,
    /// Session the `REQ` was last sent on
    session: Option<u64>,
    eose: bool,
}

#[derive(Debug, Default)]
pub(super) struct SubscriptionRegistry {
    last_id: u64,
    entries: HashMap<SubscriptionId, SubscriptionEntry>,
}

impl SubscriptionRegistry {
    pub(super) fn register(
        &mut self,
        filters: Vec<Filter>,
        sender: mpsc::Sender<SubscriptionNotification>,
    ) -> SubscriptionId {
        self.last_id += 1;
        let id = SubscriptionId::from(self.last_id);
        self.entries.insert(
            id.clone(),
            SubscriptionEntry {
                filters,
                sender,
                session: None,
                eose: false,
            },
        );
        id
    }

    #[inline]
    pub(super) fn remove(&mut self, id: &SubscriptionId) -> bool {
        self.entries.remove(id).is_some()
    }

    #[inline]
    pub(super) fn contains(&self, id: &SubscriptionId) -> bool {
        self.entries.contains_key(id)
    }

    pub(super) fn sender(&self, id: &SubscriptionId) -> Option<mpsc::Sender<SubscriptionNotification>> {
        self.entries.get(id).map(|entry| entry.sender.clone())
    }

    /// Mark EOSE as received, returns `true` only the first time
    pub(super) fn mark_eose(&mut self, id: &SubscriptionId) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) if !entry.eose => {
                entry.eose = true;
                true
            }
            _ => false,
        }
    }

    /// Collect `REQ`s not yet sent on `session` and mark them as sent
    pub(super) fn pending(&mut self, session: u64) -> Vec<ClientMessage> {
        self.entries
            .iter_mut()
            .filter(|(_, entry)| entry.session != Some(session))
            .map(|(id, entry)| {
                entry.session = Some(session);
                ClientMessage::req(id.clone(), entry.filters.clone())
            })
            .collect()
    }

    /// Check an inbound event against the subscription filters
    ///
    /// Returns `None` for unknown subscriptions. An empty filter list matches everything.
    pub(super) fn match_event(&self, id: &SubscriptionId, event: &Event) -> Option<bool> {
        let entry = self.entries.get(id)?;
        Some(entry.filters.is_empty() || entry.filters.iter().any(|f| f.match_event(event)))
    }

    /// Remove the subscriptions whose `REQ` was last sent on `session`
    pub(super) fn take_session(
        &mut self,
        session: u64,
    ) -> Vec<(SubscriptionId, mpsc::Sender<SubscriptionNotification>)> {
        let ids: Vec<SubscriptionId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.session == Some(session))
            .map(|(id, _)| id.clone())
            .collect();

        ids.into_iter()
            .filter_map(|id| {
                let entry = self.entries.remove(&id)?;
                Some((id, entry.sender))
            })
            .collect()
    }

    pub(super) fn filters(&self) -> HashMap<SubscriptionId, Vec<Filter>> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.filters.clone()))
            .collect()
    }

    /// Drop every entry, which ends the subscription streams
    #[inline]
    pub(super) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_ids() {
        let (tx, _rx) = mpsc::channel(1);
        let mut registry = SubscriptionRegistry::default();
        let a = registry.register(Vec::new(), tx.clone());
        let b = registry.register(Vec::new(), tx.clone());
        assert_ne!(a, b);
        assert!(registry.remove(&a));
        registry.clear();
        let c = registry.register(Vec::new(), tx);
        assert_ne!(c, a);
        assert_ne!(c, b);
    }

    #[test]
    fn test_pending_once_per_session() {
        let (tx, _rx) = mpsc::channel(1);
        let mut registry = SubscriptionRegistry::default();
        let id = registry.register(vec![Filter::new().limit(1)], tx);

        assert_eq!(registry.pending(1).len(), 1);
        assert!(registry.pending(1).is_empty());
        // Not marked as sent on session 2 yet
        let msgs = registry.pending(2);
        assert_eq!(
            msgs,
            vec![ClientMessage::req(id, vec![Filter::new().limit(1)])]
        );
    }

    #[test]
    fn test_take_session() {
        let (tx, _rx) = mpsc::channel(1);
        let mut registry = SubscriptionRegistry::default();
        let sent = registry.register(Vec::new(), tx.clone());
        assert_eq!(registry.pending(1).len(), 1);
        let queued = registry.register(Vec::new(), tx);

        let ended: Vec<SubscriptionId> = registry
            .take_session(1)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ended, vec![sent.clone()]);
        assert!(!registry.contains(&sent));

        // Not sent yet, waits for the next session
        assert!(registry.contains(&queued));
        assert!(registry.take_session(1).is_empty());
    }

    #[test]
    fn test_match_event() {
        let keys = Keys::generate();
        let note = EventBuilder::text_note("hello").sign_with_keys(&keys).unwrap();

        let (tx, _rx) = mpsc::channel(1);
        let mut registry = SubscriptionRegistry::default();
        let notes = registry.register(vec![Filter::new().kind(Kind::TEXT_NOTE)], tx.clone());
        let reactions = registry.register(vec![Filter::new().kind(Kind::REACTION)], tx.clone());
        let any = registry.register(Vec::new(), tx);

        assert_eq!(registry.match_event(&notes, &note), Some(true));
        assert_eq!(registry.match_event(&reactions, &note), Some(false));
        assert_eq!(registry.match_event(&any, &note), Some(true));
        assert_eq!(registry.match_event(&SubscriptionId::new("unknown"), &note), None);
    }

    #[test]
    fn test_eose_once() {
        let (tx, _rx) = mpsc::channel(1);
        let mut registry = SubscriptionRegistry::default();
        let id = registry.register(Vec::new(), tx);
        assert!(registry.mark_eose(&id));
        assert!(!registry.mark_eose(&id));
        assert!(!registry.mark_eose(&SubscriptionId::new("unknown")));
    }
}

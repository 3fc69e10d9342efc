// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay

use std::cmp;
use std::collections::HashMap;
use std::time::Duration;

use atomic_destructor::AtomicDestructor;
use nostr_engine::prelude::*;
use tokio::sync::{broadcast, mpsc};

pub mod constants;
mod error;
mod inner;
pub mod options;
mod status;
mod subscription;

pub use self::error::Error;
use self::inner::InnerRelay;
pub use self::options::RelayOptions;
pub use self::status::RelayStatus;
pub use self::subscription::{Subscription, SubscriptionNotification};
use crate::transport::{DefaultWebsocketTransport, IntoWebSocketTransport};

/// Relay notification, for observability
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayNotification {
    /// Received a verified [`Event`]
    Event {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Event
        event: Box<Event>,
    },
    /// Received an `OK` or `NOTICE`
    Message {
        /// Relay message
        message: RelayMessage,
    },
    /// Relay status changed
    RelayStatus {
        /// Relay status
        status: RelayStatus,
    },
}

/// Relay connection
///
/// Cloning is cheap and every clone refers to the same connection. The connection is closed
/// when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct Relay {
    pub(crate) inner: AtomicDestructor<InnerRelay>,
}

impl PartialEq for Relay {
    fn eq(&self, other: &Self) -> bool {
        self.inner.url == other.inner.url
    }
}

impl Eq for Relay {}

impl PartialOrd for Relay {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Relay {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.inner.url.cmp(&other.inner.url)
    }
}

impl Relay {
    /// Create new relay with **default** options
    #[inline]
    pub fn new(url: RelayUrl) -> Self {
        Self::with_opts(url, RelayOptions::default())
    }

    /// Create new relay with custom options
    #[inline]
    pub fn with_opts(url: RelayUrl, opts: RelayOptions) -> Self {
        Self::with_transport(url, opts, DefaultWebsocketTransport)
    }

    /// Create new relay with custom options and websocket transport
    pub fn with_transport<T>(url: RelayUrl, opts: RelayOptions, transport: T) -> Self
    where
        T: IntoWebSocketTransport,
    {
        Self {
            inner: AtomicDestructor::new(InnerRelay::new(url, opts, transport.into_transport())),
        }
    }

    /// Get relay url
    #[inline]
    pub fn url(&self) -> &RelayUrl {
        &self.inner.url
    }

    /// Get status
    #[inline]
    pub fn status(&self) -> RelayStatus {
        self.inner.status()
    }

    /// Check if relay is connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    /// Get options
    #[inline]
    pub fn opts(&self) -> &RelayOptions {
        &self.inner.opts
    }

    /// Get active subscriptions
    #[inline]
    pub fn subscriptions(&self) -> HashMap<SubscriptionId, Vec<Filter>> {
        self.inner.subscriptions()
    }

    /// Get new **relay** notification listener
    ///
    /// <div class="warning">When you call this method, you subscribe to the notifications channel from that precise moment. Anything received by relay before that moment is not included in the channel!</div>
    #[inline]
    pub fn notifications(&self) -> broadcast::Receiver<RelayNotification> {
        self.inner.notification_sender.subscribe()
    }

    /// Connect to relay
    ///
    /// Returns immediately if already connected. If an attempt is already in flight, waits for
    /// its outcome instead of opening another socket.
    #[inline]
    pub async fn connect(&self) -> Result<(), Error> {
        self.inner.connect().await
    }

    /// Subscribe
    ///
    /// Returns immediately. If the relay is not connected yet, a connection attempt is
    /// spawned and the `REQ` is sent once the connection is established.
    pub fn subscribe(&self, filters: Vec<Filter>) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.opts.subscription_channel_size);
        let id: SubscriptionId = self.inner.subscribe_with_sender(filters, tx);
        Subscription::new(id, rx)
    }

    /// Subscribe, delivering notifications to the given channel
    #[inline]
    pub fn subscribe_with_sender(
        &self,
        filters: Vec<Filter>,
        sender: mpsc::Sender<SubscriptionNotification>,
    ) -> SubscriptionId {
        self.inner.subscribe_with_sender(filters, sender)
    }

    /// Unsubscribe
    ///
    /// Local state is removed before returning. Unknown IDs are ignored.
    #[inline]
    pub fn unsubscribe(&self, id: &SubscriptionId) {
        self.inner.unsubscribe(id)
    }

    /// Send event, without waiting for the relay acknowledgment
    #[inline]
    pub async fn publish(&self, event: &Event) -> Result<EventId, Error> {
        self.inner.publish(event).await
    }

    /// Send event and wait for the `OK` message
    #[inline]
    pub async fn send_event(&self, event: &Event, timeout: Duration) -> Result<EventId, Error> {
        self.inner.send_event(event, timeout).await
    }

    /// Close connection, ending every subscription
    #[inline]
    pub fn close(&self) {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_utility::time;

    use super::*;
    use crate::transport::mock::MockTransport;

    const STEP: Duration = Duration::from_millis(200);

    fn relay_url() -> RelayUrl {
        RelayUrl::parse("wss://relay.example.com").unwrap()
    }

    fn mock_relay(transport: &Arc<MockTransport>) -> Relay {
        Relay::with_transport(relay_url(), RelayOptions::default(), transport.clone())
    }

    fn text_note(content: &str) -> Event {
        let keys = Keys::generate();
        EventBuilder::text_note(content)
            .sign_with_keys(&keys)
            .unwrap()
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);
        assert_eq!(relay.status(), RelayStatus::Disconnected);

        relay.connect().await.unwrap();
        assert!(relay.is_connected());
        relay.connect().await.unwrap();

        assert_eq!(transport.connections(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_connects_share_attempt() {
        let transport = Arc::new(MockTransport::with_delay(Duration::from_millis(100)));
        let relay = mock_relay(&transport);

        let (a, b, c) = tokio::join!(relay.connect(), relay.connect(), relay.connect());
        a.unwrap();
        b.unwrap();
        c.unwrap();

        assert_eq!(transport.connections(), 1);
        assert!(relay.is_connected());
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let transport = Arc::new(MockTransport::with_delay(Duration::from_millis(50)));
        transport.refuse(&relay_url());
        let relay = mock_relay(&transport);

        let (a, b) = tokio::join!(relay.connect(), relay.connect());
        for res in [a, b] {
            match res {
                Err(Error::Transport(e)) => assert_eq!(e.to_string(), "connection refused"),
                other => panic!("unexpected result: {other:?}"),
            }
        }
        assert_eq!(relay.status(), RelayStatus::Error);
        assert_eq!(transport.connections(), 1);
    }

    #[tokio::test]
    async fn test_close_during_handshake() {
        let transport = Arc::new(MockTransport::with_delay(Duration::from_millis(100)));
        let relay = mock_relay(&transport);

        let (res, _) = tokio::join!(relay.connect(), async {
            time::sleep(Duration::from_millis(20)).await;
            relay.close();
        });

        assert!(matches!(res, Err(Error::Closed)));
        assert_eq!(relay.status(), RelayStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_after_close_during_handshake() {
        let transport = Arc::new(MockTransport::with_delay(Duration::from_millis(100)));
        let relay = mock_relay(&transport);

        let (first, second) = tokio::join!(relay.connect(), async {
            time::sleep(Duration::from_millis(20)).await;
            relay.close();
            time::sleep(Duration::from_millis(20)).await;
            relay.connect().await
        });

        // The stale handshake must not take over the newer attempt
        assert!(matches!(first, Err(Error::Closed)));
        second.unwrap();
        assert!(relay.is_connected());
        assert_eq!(transport.connections(), 2);
    }

    #[tokio::test]
    async fn test_subscribe_before_connect() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);

        let mut sub = relay.subscribe(vec![Filter::new().kind(Kind::TEXT_NOTE)]);
        assert_eq!(relay.subscriptions().len(), 1);

        let mut server = transport.accept().await;
        match server.recv().await {
            Some(ClientMessage::Req {
                subscription_id,
                filters,
            }) => {
                assert_eq!(&subscription_id, sub.id());
                assert_eq!(filters, vec![Filter::new().kind(Kind::TEXT_NOTE)]);
            }
            other => panic!("expected REQ, got {other:?}"),
        }

        let event = text_note("hello");
        server.send(RelayMessage::event(sub.id().clone(), event.clone()));

        match sub.recv().await {
            Some(SubscriptionNotification::Event {
                relay_url,
                event: received,
                ..
            }) => {
                assert_eq!(relay_url, relay.url().clone());
                assert_eq!(*received, event);
            }
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_eose_delivered_once() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);

        let mut sub = relay.subscribe(vec![Filter::new()]);
        let mut server = transport.accept().await;
        let id = server.expect_req().await;

        server.send(RelayMessage::eose(id.clone()));
        server.send(RelayMessage::eose(id.clone()));
        let event = text_note("after eose");
        server.send(RelayMessage::event(id.clone(), event.clone()));

        assert!(matches!(
            sub.recv().await,
            Some(SubscriptionNotification::EndOfStoredEvents { .. })
        ));
        match sub.recv().await {
            Some(SubscriptionNotification::Event { event: e, .. }) => assert_eq!(*e, event),
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_frames_ignored() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);

        let mut sub = relay.subscribe(vec![Filter::new()]);
        let mut server = transport.accept().await;
        let id = server.expect_req().await;

        server.send_raw("not json");
        server.send_raw(r#"["HELLO","world"]"#);
        server.send_raw(r#"["EVENT"]"#);
        server.send_raw(r#"{"EVENT":1}"#);
        server.send(RelayMessage::notice("slow down"));
        server.send(RelayMessage::Auth {
            challenge: String::from("challenge"),
        });

        // Unknown subscription
        server.send(RelayMessage::event(
            SubscriptionId::new("unknown"),
            text_note("dropped"),
        ));

        // Invalid signature
        let mut forged = text_note("forged");
        forged.content = String::from("tampered");
        server.send(RelayMessage::event(id.clone(), forged));

        let event = text_note("still alive");
        server.send(RelayMessage::event(id.clone(), event.clone()));

        match sub.recv().await {
            Some(SubscriptionNotification::Event { event: e, .. }) => assert_eq!(*e, event),
            other => panic!("expected event, got {other:?}"),
        }
        assert!(relay.is_connected());
    }

    #[tokio::test]
    async fn test_unsubscribe_sends_close() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);

        let mut sub = relay.subscribe(vec![Filter::new()]);
        let mut server = transport.accept().await;
        let id = server.expect_req().await;

        relay.unsubscribe(&id);
        assert!(relay.subscriptions().is_empty());
        assert_eq!(server.recv().await, Some(ClientMessage::close(id.clone())));

        // Deliveries after unsubscribe are dropped and the stream ends
        server.send(RelayMessage::event(id.clone(), text_note("late")));
        assert_eq!(sub.recv().await, None);

        // Unknown id: no-op, no frame
        relay.unsubscribe(&id);
        assert_eq!(server.try_recv_for(STEP).await, None);
    }

    #[tokio::test]
    async fn test_relay_closed_subscription() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);

        let mut sub = relay.subscribe(vec![Filter::new()]);
        let mut server = transport.accept().await;
        let id = server.expect_req().await;

        server.send(RelayMessage::closed(id.clone(), "error: shutting down"));

        match sub.recv().await {
            Some(SubscriptionNotification::Closed { message, .. }) => {
                assert_eq!(message, "error: shutting down")
            }
            other => panic!("expected closed, got {other:?}"),
        }
        assert_eq!(sub.recv().await, None);
        assert!(relay.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_close_ends_subscriptions() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);

        let mut sub = relay.subscribe(vec![Filter::new()]);
        let mut server = transport.accept().await;
        server.expect_req().await;

        relay.close();
        relay.close();

        assert_eq!(relay.status(), RelayStatus::Disconnected);
        assert!(relay.subscriptions().is_empty());
        assert_eq!(sub.recv().await, None);

        // Socket closed by the client
        assert_eq!(server.recv().await, None);
    }

    #[tokio::test]
    async fn test_session_lost_ends_subscriptions() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);

        let mut sub = relay.subscribe(vec![Filter::new().limit(1)]);
        let mut server = transport.accept().await;
        let id = server.expect_req().await;

        // Peer goes away mid-subscription
        drop(server);

        match sub.recv().await {
            Some(SubscriptionNotification::Closed {
                subscription_id,
                message,
                ..
            }) => {
                assert_eq!(subscription_id, id);
                assert_eq!(message, "connection lost");
            }
            other => panic!("expected closed, got {other:?}"),
        }
        assert_eq!(sub.recv().await, None);
        assert!(relay.subscriptions().is_empty());
        assert_eq!(relay.status(), RelayStatus::Disconnected);

        // A new session doesn't resurrect it
        relay.connect().await.unwrap();
        let mut server = transport.accept().await;
        assert_eq!(server.try_recv_for(STEP).await, None);
    }

    #[tokio::test]
    async fn test_non_matching_event_dropped() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);

        let mut sub = relay.subscribe(vec![Filter::new().kind(Kind::TEXT_NOTE)]);
        let mut server = transport.accept().await;
        let id = server.expect_req().await;

        let keys = Keys::generate();
        let reaction = EventBuilder::new(Kind::REACTION, "+")
            .sign_with_keys(&keys)
            .unwrap();
        server.send(RelayMessage::event(id.clone(), reaction));

        let note = text_note("matching");
        server.send(RelayMessage::event(id.clone(), note.clone()));

        match sub.recv().await {
            Some(SubscriptionNotification::Event { event, .. }) => assert_eq!(*event, note),
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publish() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);
        let event = text_note("publish");

        let id = relay.publish(&event).await.unwrap();
        assert_eq!(id, event.id);

        let mut server = transport.accept().await;
        assert_eq!(server.recv().await, Some(ClientMessage::event(event)));
    }

    #[tokio::test]
    async fn test_send_event_acknowledged() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);
        let event = text_note("ack");

        let relay_task = relay.clone();
        let event_task = event.clone();
        let handle =
            tokio::spawn(async move { relay_task.send_event(&event_task, STEP * 10).await });

        let mut server = transport.accept().await;
        assert_eq!(server.recv().await, Some(ClientMessage::event(event.clone())));
        server.send(RelayMessage::ok(event.id, true, ""));

        assert_eq!(handle.await.unwrap().unwrap(), event.id);
    }

    #[tokio::test]
    async fn test_send_event_rejected_and_timeout() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);
        relay.connect().await.unwrap();
        let mut server = transport.accept().await;

        let event = text_note("reject");
        let (res, _) = tokio::join!(relay.send_event(&event, STEP * 10), async {
            server.recv().await;
            server.send(RelayMessage::ok(event.id, false, "blocked: spam"));
        });
        match res {
            Err(Error::EventNotPublished(msg)) => assert_eq!(msg, "blocked: spam"),
            other => panic!("unexpected result: {other:?}"),
        }

        let event = text_note("timeout");
        let res = relay.send_event(&event, STEP).await;
        assert!(matches!(res, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn test_notifications() {
        let transport = Arc::new(MockTransport::default());
        let relay = mock_relay(&transport);
        let mut notifications = relay.notifications();

        relay.connect().await.unwrap();
        let server = transport.accept().await;
        server.send(RelayMessage::notice("hello"));

        let mut statuses = Vec::new();
        loop {
            match notifications.recv().await.unwrap() {
                RelayNotification::RelayStatus { status } => statuses.push(status),
                RelayNotification::Message { message } => {
                    assert_eq!(message, RelayMessage::notice("hello"));
                    break;
                }
                RelayNotification::Event { .. } => panic!("unexpected event"),
            }
        }
        assert_eq!(statuses, vec![RelayStatus::Connecting, RelayStatus::Connected]);
    }
}

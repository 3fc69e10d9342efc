// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_utility::{task, time};
use async_wsocket::futures_util::{SinkExt, StreamExt};
use async_wsocket::Message;
use atomic_destructor::AtomicDestroyer;
use nostr_engine::message::MessageHandleError;
use nostr_engine::prelude::*;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::constants::{CONNECTION_LOST, WEBSOCKET_TX_TIMEOUT};
use super::options::RelayOptions;
use super::status::{ConnectionHandle, ConnectionState, Transition};
use super::subscription::{SubscriptionNotification, SubscriptionRegistry};
use super::{Error, RelayNotification, RelayStatus};
use crate::transport::{BoxSink, BoxStream, TransportError, WebSocketTransport};

type OkResult = Result<(), String>;

// Put all fields that require an `Arc` here.
#[derive(Debug)]
struct AtomicPrivateData {
    state: watch::Sender<ConnectionState>,
    subscriptions: Mutex<SubscriptionRegistry>,
    ok_waiters: Mutex<HashMap<EventId, Vec<oneshot::Sender<OkResult>>>>,
    /// Last connection attempt ID, also used as session ID
    attempts: AtomicU64,
}

#[derive(Debug, Clone)]
pub(crate) struct InnerRelay {
    pub(super) url: RelayUrl,
    pub(super) opts: RelayOptions,
    transport: Arc<dyn WebSocketTransport>,
    atomic: Arc<AtomicPrivateData>,
    pub(super) notification_sender: broadcast::Sender<RelayNotification>,
}

impl AtomicDestroyer for InnerRelay {
    fn on_destroy(&self) {
        self.close();
    }
}

impl InnerRelay {
    pub(super) fn new(
        url: RelayUrl,
        opts: RelayOptions,
        transport: Arc<dyn WebSocketTransport>,
    ) -> Self {
        let (notification_sender, ..) =
            broadcast::channel::<RelayNotification>(opts.notification_channel_size);

        Self {
            url,
            opts,
            transport,
            atomic: Arc::new(AtomicPrivateData {
                state: watch::Sender::new(ConnectionState::Disconnected),
                subscriptions: Mutex::new(SubscriptionRegistry::default()),
                ok_waiters: Mutex::new(HashMap::new()),
                attempts: AtomicU64::new(0),
            }),
            notification_sender,
        }
    }

    #[inline]
    pub(super) fn status(&self) -> RelayStatus {
        self.atomic.state.borrow().status()
    }

    #[inline]
    fn registry(&self) -> MutexGuard<'_, SubscriptionRegistry> {
        self.atomic
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn ok_waiters(&self) -> MutexGuard<'_, HashMap<EventId, Vec<oneshot::Sender<OkResult>>>> {
        self.atomic
            .ok_waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub(super) fn subscriptions(&self) -> HashMap<SubscriptionId, Vec<Filter>> {
        self.registry().filters()
    }

    /// Current session handle, if connected
    fn handle(&self) -> Option<ConnectionHandle> {
        match &*self.atomic.state.borrow() {
            ConnectionState::Connected(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    fn send_notification(&self, notification: RelayNotification) {
        // No receivers is not an error
        let _ = self.notification_sender.send(notification);
    }

    /// Apply a state transition. Returns `true` if it was applied.
    fn apply(&self, transition: Transition) -> bool {
        let mut status: Option<RelayStatus> = None;

        let applied: bool = self.atomic.state.send_if_modified(|state| {
            match state.transition(transition) {
                Some(next) => {
                    *state = next;
                    status = Some(state.status());
                    true
                }
                None => false,
            }
        });

        if let Some(status) = status {
            tracing::trace!(url = %self.url, status = %status, "Relay status changed.");
            self.send_notification(RelayNotification::RelayStatus { status });
        }

        applied
    }

    pub(super) async fn connect(&self) -> Result<(), Error> {
        // Start a new attempt, unless one is in flight or the relay is already connected
        let attempt: u64 = self.atomic.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.apply(Transition::Connect { attempt }) {
            return self.establish(attempt).await;
        }

        // Join the current attempt
        let mut rx = self.atomic.state.subscribe();
        let state = rx
            .wait_for(|state| !matches!(state, ConnectionState::Connecting(..)))
            .await
            .map_err(|_| Error::Closed)?;

        match &*state {
            ConnectionState::Connected(..) => Ok(()),
            ConnectionState::Error(e) => Err(Error::Transport(e.clone())),
            _ => Err(Error::Closed),
        }
    }

    async fn establish(&self, attempt: u64) -> Result<(), Error> {
        tracing::debug!(url = %self.url, "Connecting to relay.");

        match self
            .transport
            .connect(
                self.url.as_url(),
                &self.opts.connection_mode,
                self.opts.connection_timeout,
            )
            .await
        {
            Ok((mut ws_tx, ws_rx)) => {
                let session: u64 = attempt;
                let (tx, rx) = mpsc::unbounded_channel();
                let handle = ConnectionHandle::new(session, tx);

                // `close` called during the handshake, maybe followed by a newer attempt
                if !self.apply(Transition::Established {
                    attempt,
                    handle: handle.clone(),
                }) {
                    tracing::debug!(url = %self.url, "Relay closed during handshake.");
                    if let Err(e) = close_ws(&mut ws_tx).await {
                        tracing::error!(url = %self.url, error = %e, "Can't close WebSocket connection.");
                    }
                    return Err(Error::Closed);
                }

                tracing::info!(url = %self.url, session, "Connected to relay.");

                let relay: InnerRelay = self.clone();
                task::spawn(relay.run_session(session, ws_tx, ws_rx, rx));

                // Send REQs of subscriptions registered before (or while) connecting
                self.flush_subscriptions(&handle);

                Ok(())
            }
            Err(e) => {
                let e: Arc<TransportError> = Arc::new(e);
                tracing::error!(url = %self.url, error = %e, "Connection failed.");

                if self.apply(Transition::Failed {
                    attempt,
                    error: e.clone(),
                }) {
                    Err(Error::Transport(e))
                } else {
                    Err(Error::Closed)
                }
            }
        }
    }

    async fn run_session(
        self,
        session: u64,
        mut ws_tx: BoxSink,
        ws_rx: BoxStream,
        rx: mpsc::UnboundedReceiver<String>,
    ) {
        let res: Result<(), TransportError> = tokio::select! {
            res = sender_message_handler(&self.url, &mut ws_tx, rx) => res,
            res = self.receiver_message_handler(ws_rx) => res,
        };

        let error: Option<Arc<TransportError>> = match res {
            Ok(()) => {
                tracing::trace!(url = %self.url, session, "Relay session exited.");
                None
            }
            Err(e) => {
                tracing::error!(url = %self.url, session, error = %e, "Relay session exited with error.");
                Some(Arc::new(e))
            }
        };

        // Always try to close the WebSocket connection
        match close_ws(&mut ws_tx).await {
            Ok(()) => tracing::debug!(url = %self.url, "WebSocket connection closed."),
            Err(e) => tracing::error!(url = %self.url, error = %e, "Can't close WebSocket connection."),
        }

        // Pending acknowledgments can't arrive anymore
        if self.apply(Transition::Lost { session, error }) {
            self.ok_waiters().clear();
        }

        self.end_session_subscriptions(session).await;
    }

    /// Close every subscription whose `REQ` went out on `session`
    async fn end_session_subscriptions(&self, session: u64) {
        let ended = self.registry().take_session(session);

        for (subscription_id, sender) in ended.into_iter() {
            tracing::debug!(url = %self.url, id = %subscription_id, "Subscription ended with the session.");

            let notification = SubscriptionNotification::Closed {
                relay_url: self.url.clone(),
                subscription_id,
                message: String::from(CONNECTION_LOST),
            };
            let _ = sender.send(notification).await;
        }
    }

    async fn receiver_message_handler(&self, mut ws_rx: BoxStream) -> Result<(), TransportError> {
        while let Some(msg) = ws_rx.next().await {
            match msg? {
                Message::Text(json) => self.handle_relay_message(&json).await,
                Message::Binary(_) => {
                    tracing::warn!(url = %self.url, "Binary messages aren't supported.");
                }
                Message::Close(None) => break,
                Message::Close(Some(frame)) => {
                    tracing::info!(url = %self.url, code = %frame.code, reason = %frame.reason, "Connection closed by peer.");
                    break;
                }
                _ => {}
            }
        }

        Ok(())
    }

    async fn handle_relay_message(&self, msg: &str) {
        let message: RelayMessage = match RelayMessage::from_json(msg) {
            Ok(message) => message,
            Err(MessageHandleError::UnknownMessage(tag)) => {
                tracing::debug!(url = %self.url, tag = %tag, "Ignoring unknown message.");
                return;
            }
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, msg = %msg, "Can't parse relay message.");
                return;
            }
        };

        match message {
            RelayMessage::Event {
                subscription_id,
                event,
            } => {
                if self.opts.verify_events {
                    if let Err(e) = event.verify() {
                        tracing::warn!(url = %self.url, id = %event.id, error = %e, "Dropping invalid event.");
                        return;
                    }
                }

                let matched: Option<bool> = self.registry().match_event(&subscription_id, &event);
                if matched == Some(false) {
                    tracing::debug!(url = %self.url, id = %event.id, subscription_id = %subscription_id, "Dropping event not matching the subscription filters.");
                    return;
                }

                self.send_notification(RelayNotification::Event {
                    subscription_id: subscription_id.clone(),
                    event: event.clone(),
                });

                let notification = SubscriptionNotification::Event {
                    relay_url: self.url.clone(),
                    subscription_id: subscription_id.clone(),
                    event,
                };
                self.deliver(&subscription_id, notification).await;
            }
            RelayMessage::EndOfStoredEvents(subscription_id) => {
                tracing::debug!(url = %self.url, id = %subscription_id, "Received EOSE.");

                let first: bool = self.registry().mark_eose(&subscription_id);
                if first {
                    let notification = SubscriptionNotification::EndOfStoredEvents {
                        relay_url: self.url.clone(),
                        subscription_id: subscription_id.clone(),
                    };
                    self.deliver(&subscription_id, notification).await;
                }
            }
            RelayMessage::Ok {
                event_id,
                status,
                message,
            } => {
                tracing::debug!(
                    url = %self.url,
                    id = %event_id,
                    status = %status,
                    msg = %message,
                    "Received OK."
                );

                let waiters = self.ok_waiters().remove(&event_id);
                if let Some(waiters) = waiters {
                    for waiter in waiters {
                        let res: OkResult = if status {
                            Ok(())
                        } else {
                            Err(message.clone())
                        };
                        let _ = waiter.send(res);
                    }
                }

                self.send_notification(RelayNotification::Message {
                    message: RelayMessage::Ok {
                        event_id,
                        status,
                        message,
                    },
                });
            }
            RelayMessage::Closed {
                subscription_id,
                message,
            } => {
                tracing::debug!(
                    url = %self.url,
                    id = %subscription_id,
                    msg = %message,
                    prefix = ?MachineReadablePrefix::parse(&message),
                    "Subscription closed by relay."
                );

                let notification = SubscriptionNotification::Closed {
                    relay_url: self.url.clone(),
                    subscription_id: subscription_id.clone(),
                    message,
                };
                self.deliver(&subscription_id, notification).await;
                self.registry().remove(&subscription_id);
            }
            RelayMessage::Notice(notice) => {
                tracing::warn!(url = %self.url, msg = %notice, "Received NOTICE.");
                self.send_notification(RelayNotification::Message {
                    message: RelayMessage::Notice(notice),
                });
            }
            RelayMessage::Auth { challenge } => {
                tracing::debug!(url = %self.url, challenge = %challenge, "Received auth challenge.");
            }
        }
    }

    /// Deliver to a subscription channel, waiting for capacity
    async fn deliver(&self, id: &SubscriptionId, notification: SubscriptionNotification) {
        let sender = self.registry().sender(id);
        let Some(sender) = sender else {
            tracing::trace!(url = %self.url, id = %id, "Subscription not found.");
            return;
        };

        match sender.reserve().await {
            Ok(permit) => {
                // May have been removed while waiting for capacity
                if self.registry().contains(id) {
                    permit.send(notification);
                }
            }
            Err(..) => {
                tracing::debug!(url = %self.url, id = %id, "Subscription receiver dropped.");
                self.registry().remove(id);
            }
        };
    }

    /// Send every REQ not yet sent on this session
    fn flush_subscriptions(&self, handle: &ConnectionHandle) {
        let msgs: Vec<ClientMessage> = self.registry().pending(handle.session);
        for msg in msgs.iter() {
            if let Err(e) = handle.send(msg) {
                tracing::error!(url = %self.url, error = %e, "Impossible to subscribe.");
            }
        }
    }

    pub(super) fn subscribe_with_sender(
        &self,
        filters: Vec<Filter>,
        sender: mpsc::Sender<SubscriptionNotification>,
    ) -> SubscriptionId {
        // Register before any transmission
        let id: SubscriptionId = self.registry().register(filters, sender);

        match self.handle() {
            Some(handle) => self.flush_subscriptions(&handle),
            None => {
                let relay: InnerRelay = self.clone();
                task::spawn(async move {
                    if let Err(e) = relay.connect().await {
                        tracing::debug!(url = %relay.url, error = %e, "Can't connect for subscription.");
                    }
                });
            }
        }

        id
    }

    pub(super) fn unsubscribe(&self, id: &SubscriptionId) {
        let removed: bool = self.registry().remove(id);

        if removed {
            if let Some(handle) = self.handle() {
                if let Err(e) = handle.send(&ClientMessage::close(id.clone())) {
                    tracing::debug!(url = %self.url, id = %id, error = %e, "Can't send CLOSE.");
                }
            }
        }
    }

    pub(super) async fn publish(&self, event: &Event) -> Result<EventId, Error> {
        self.connect().await?;

        let handle: ConnectionHandle = self.handle().ok_or(Error::NotConnected)?;
        handle.send(&ClientMessage::event(event.clone()))?;

        Ok(event.id)
    }

    pub(super) async fn send_event(
        &self,
        event: &Event,
        timeout: Duration,
    ) -> Result<EventId, Error> {
        self.connect().await?;

        let (tx, rx) = oneshot::channel::<OkResult>();
        self.ok_waiters().entry(event.id).or_default().push(tx);

        // The handle must not outlive the send, or it would keep a closed session alive
        let sent: Result<(), Error> = match self.handle() {
            Some(handle) => handle.send(&ClientMessage::event(event.clone())),
            None => Err(Error::NotConnected),
        };

        if let Err(e) = sent {
            self.prune_ok_waiters(&event.id);
            return Err(e);
        }

        match time::timeout(Some(timeout), rx).await {
            Some(Ok(Ok(()))) => Ok(event.id),
            Some(Ok(Err(message))) => Err(Error::EventNotPublished(message)),
            Some(Err(..)) => Err(Error::NotConnected),
            None => {
                self.prune_ok_waiters(&event.id);
                Err(Error::Timeout)
            }
        }
    }

    /// Remove waiters whose receiver is gone
    fn prune_ok_waiters(&self, id: &EventId) {
        let mut waiters = self.ok_waiters();
        if let Some(list) = waiters.get_mut(id) {
            list.retain(|tx| !tx.is_closed());
            if list.is_empty() {
                waiters.remove(id);
            }
        }
    }

    pub(super) fn close(&self) {
        self.registry().clear();
        self.ok_waiters().clear();

        if self.apply(Transition::Close) {
            tracing::info!(url = %self.url, "Relay closed.");
        }
    }
}

async fn sender_message_handler(
    url: &RelayUrl,
    ws_tx: &mut BoxSink,
    mut rx: mpsc::UnboundedReceiver<String>,
) -> Result<(), TransportError> {
    // Ends when the session handle is dropped
    while let Some(json) = rx.recv().await {
        tracing::debug!(url = %url, msg = %json, "Sending message.");
        send_ws_msg(ws_tx, Message::Text(json)).await?;
    }

    Ok(())
}

/// Send WebSocket message with timeout set to [WEBSOCKET_TX_TIMEOUT].
async fn send_ws_msg(tx: &mut BoxSink, msg: Message) -> Result<(), TransportError> {
    match time::timeout(Some(WEBSOCKET_TX_TIMEOUT), tx.send(msg)).await {
        Some(res) => res,
        None => Err(TransportError::Timeout),
    }
}

/// Close WebSocket with timeout set to [WEBSOCKET_TX_TIMEOUT].
async fn close_ws(tx: &mut BoxSink) -> Result<(), TransportError> {
    match time::timeout(Some(WEBSOCKET_TX_TIMEOUT), tx.close()).await {
        Some(res) => res,
        None => Err(TransportError::Timeout),
    }
}

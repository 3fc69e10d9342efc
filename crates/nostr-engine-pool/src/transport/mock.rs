// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! In-memory transport for tests

use std::collections::HashSet;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::task::{Context, Poll};
use std::time::Duration;

use async_utility::time;
use async_wsocket::futures_util::{stream, Sink};
use async_wsocket::{ConnectionMode, Message};
use nostr_engine::prelude::*;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::error::TransportError;
use super::websocket::{BoxSink, BoxStream, WebSocketTransport};

/// Server side of an accepted connection
#[derive(Debug)]
pub(crate) struct MockSession {
    pub(crate) url: RelayUrl,
    tx: UnboundedSender<Message>,
    rx: UnboundedReceiver<Message>,
}

impl MockSession {
    /// Next client frame, `None` once the client closed the socket
    pub(crate) async fn recv(&mut self) -> Option<ClientMessage> {
        while let Some(msg) = self.rx.recv().await {
            if let Message::Text(json) = msg {
                return Some(ClientMessage::from_json(json).expect("valid client message"));
            }
        }
        None
    }

    /// Next client frame, `None` if nothing arrives within `timeout`
    pub(crate) async fn try_recv_for(&mut self, timeout: Duration) -> Option<ClientMessage> {
        time::timeout(Some(timeout), self.recv()).await.flatten()
    }

    pub(crate) fn send(&self, msg: RelayMessage) {
        self.send_raw(msg.as_json());
    }

    pub(crate) fn send_raw<S>(&self, text: S)
    where
        S: Into<String>,
    {
        let _ = self.tx.send(Message::Text(text.into()));
    }

    /// Wait for a `REQ` and return its subscription id
    pub(crate) async fn expect_req(&mut self) -> SubscriptionId {
        match self.recv().await {
            Some(ClientMessage::Req {
                subscription_id, ..
            }) => subscription_id,
            other => panic!("expected REQ, got {other:?}"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct MockTransport {
    refused: Mutex<HashSet<RelayUrl>>,
    delay: Option<Duration>,
    connections: AtomicUsize,
    sessions_tx: UnboundedSender<MockSession>,
    sessions_rx: tokio::sync::Mutex<UnboundedReceiver<MockSession>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        let (sessions_tx, sessions_rx) = mpsc::unbounded_channel();
        Self {
            refused: Mutex::new(HashSet::new()),
            delay: None,
            connections: AtomicUsize::new(0),
            sessions_tx,
            sessions_rx: tokio::sync::Mutex::new(sessions_rx),
        }
    }
}

impl MockTransport {
    /// Delay every handshake
    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Refuse every connection to `url`
    pub(crate) fn refuse(&self, url: &RelayUrl) {
        self.refused.lock().unwrap().insert(url.clone());
    }

    /// Number of handshakes started
    pub(crate) fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Wait for the next accepted connection
    pub(crate) async fn accept(&self) -> MockSession {
        let mut rx = self.sessions_rx.lock().await;
        rx.recv().await.expect("transport alive")
    }

    /// Next accepted connection, `None` if none arrives within `timeout`
    pub(crate) async fn try_accept_for(&self, timeout: Duration) -> Option<MockSession> {
        time::timeout(Some(timeout), self.accept()).await
    }
}

impl WebSocketTransport for MockTransport {
    fn connect<'a>(
        &'a self,
        url: &'a Url,
        _mode: &'a ConnectionMode,
        _timeout: Duration,
    ) -> BoxedFuture<'a, Result<(BoxSink, BoxStream), TransportError>> {
        Box::pin(async move {
            self.connections.fetch_add(1, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                time::sleep(delay).await;
            }

            let url = RelayUrl::try_from(url.clone()).map_err(TransportError::backend)?;

            if self.refused.lock().unwrap().contains(&url) {
                return Err(TransportError::backend(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )));
            }

            let (client_tx, server_rx) = mpsc::unbounded_channel();
            let (server_tx, client_rx) = mpsc::unbounded_channel();

            let _ = self.sessions_tx.send(MockSession {
                url,
                tx: server_tx,
                rx: server_rx,
            });

            let sink: BoxSink = Box::new(MockSink(client_tx));
            let stream: BoxStream = Box::new(Box::pin(stream::unfold(
                client_rx,
                |mut rx: UnboundedReceiver<Message>| async move {
                    rx.recv()
                        .await
                        .map(|msg| (Ok::<Message, TransportError>(msg), rx))
                },
            )));

            Ok((sink, stream))
        })
    }
}

struct MockSink(UnboundedSender<Message>);

impl Sink<Message> for MockSink {
    type Error = TransportError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        self.0
            .send(item)
            .map_err(|_| TransportError::backend(io::Error::from(io::ErrorKind::BrokenPipe)))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}

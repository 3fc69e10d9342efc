// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay status

use core::fmt;
use std::sync::Arc;

use nostr_engine::ClientMessage;
use nostr_engine::JsonUtil;
use tokio::sync::mpsc;

use super::Error;
use crate::transport::TransportError;

/// Relay connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelayStatus {
    /// Not connected. Initial state, and the state after a clean close.
    Disconnected,
    /// Handshake in flight.
    Connecting,
    /// Connected.
    Connected,
    /// The last attempt or session failed.
    Error,
}

impl fmt::Display for RelayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Error => write!(f, "Error"),
        }
    }
}

impl RelayStatus {
    /// Check if is [`RelayStatus::Connected`]
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Sending half of a live session
///
/// The session ID is the ID of the connection attempt that opened it.
#[derive(Debug, Clone)]
pub(super) struct ConnectionHandle {
    pub(super) session: u64,
    tx: mpsc::UnboundedSender<String>,
}

impl ConnectionHandle {
    pub(super) fn new(session: u64, tx: mpsc::UnboundedSender<String>) -> Self {
        Self { session, tx }
    }

    pub(super) fn send(&self, msg: &ClientMessage) -> Result<(), Error> {
        self.tx
            .send(msg.as_json())
            .map_err(|_| Error::NotConnected)
    }
}

#[derive(Debug, Clone)]
pub(super) enum ConnectionState {
    Disconnected,
    /// Handshake of the given attempt in flight
    Connecting(u64),
    Connected(ConnectionHandle),
    Error(Arc<TransportError>),
}

/// Every transition of an attempt carries its ID: outcomes of superseded attempts are ignored
#[derive(Debug)]
pub(super) enum Transition {
    Connect {
        attempt: u64,
    },
    Established {
        attempt: u64,
        handle: ConnectionHandle,
    },
    Failed {
        attempt: u64,
        error: Arc<TransportError>,
    },
    /// Session ended
    Lost {
        session: u64,
        error: Option<Arc<TransportError>>,
    },
    Close,
}

impl ConnectionState {
    /// Next state, or `None` if the transition doesn't apply to the current state
    pub(super) fn transition(&self, transition: Transition) -> Option<Self> {
        match (self, transition) {
            (Self::Disconnected | Self::Error(..), Transition::Connect { attempt }) => {
                Some(Self::Connecting(attempt))
            }
            (Self::Connecting(current), Transition::Established { attempt, handle })
                if *current == attempt =>
            {
                Some(Self::Connected(handle))
            }
            (Self::Connecting(current), Transition::Failed { attempt, error })
                if *current == attempt =>
            {
                Some(Self::Error(error))
            }
            (Self::Connected(current), Transition::Lost { session, error })
                if current.session == session =>
            {
                Some(match error {
                    Some(e) => Self::Error(e),
                    None => Self::Disconnected,
                })
            }
            (Self::Disconnected, Transition::Close) => None,
            (_, Transition::Close) => Some(Self::Disconnected),
            _ => None,
        }
    }

    pub(super) fn status(&self) -> RelayStatus {
        match self {
            Self::Disconnected => RelayStatus::Disconnected,
            Self::Connecting(..) => RelayStatus::Connecting,
            Self::Connected(..) => RelayStatus::Connected,
            Self::Error(..) => RelayStatus::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    fn handle(session: u64) -> ConnectionHandle {
        let (tx, _rx) = mpsc::unbounded_channel();
        ConnectionHandle::new(session, tx)
    }

    fn error() -> Arc<TransportError> {
        Arc::new(TransportError::backend(io::Error::from(
            io::ErrorKind::ConnectionRefused,
        )))
    }

    #[test]
    fn test_connect_flow() {
        let state = ConnectionState::Disconnected;
        let state = state
            .transition(Transition::Connect { attempt: 1 })
            .unwrap();
        assert_eq!(state.status(), RelayStatus::Connecting);

        // Already connecting
        assert!(state.transition(Transition::Connect { attempt: 2 }).is_none());

        let state = state
            .transition(Transition::Established {
                attempt: 1,
                handle: handle(1),
            })
            .unwrap();
        assert_eq!(state.status(), RelayStatus::Connected);
        assert!(state.transition(Transition::Connect { attempt: 3 }).is_none());
    }

    #[test]
    fn test_failed_attempt_can_retry() {
        let state = ConnectionState::Connecting(1)
            .transition(Transition::Failed {
                attempt: 1,
                error: error(),
            })
            .unwrap();
        assert_eq!(state.status(), RelayStatus::Error);
        let state = state
            .transition(Transition::Connect { attempt: 2 })
            .unwrap();
        assert_eq!(state.status(), RelayStatus::Connecting);
    }

    #[test]
    fn test_stale_session_ignored() {
        let state = ConnectionState::Connected(handle(2));
        assert!(state
            .transition(Transition::Lost {
                session: 1,
                error: None
            })
            .is_none());

        let lost = state
            .transition(Transition::Lost {
                session: 2,
                error: Some(error()),
            })
            .unwrap();
        assert_eq!(lost.status(), RelayStatus::Error);

        let lost = state
            .transition(Transition::Lost {
                session: 2,
                error: None,
            })
            .unwrap();
        assert_eq!(lost.status(), RelayStatus::Disconnected);
    }

    #[test]
    fn test_close_wins_over_handshake() {
        let state = ConnectionState::Connecting(1)
            .transition(Transition::Close)
            .unwrap();
        assert_eq!(state.status(), RelayStatus::Disconnected);
        assert!(state
            .transition(Transition::Established {
                attempt: 1,
                handle: handle(1),
            })
            .is_none());
        assert!(state.transition(Transition::Close).is_none());
    }

    #[test]
    fn test_superseded_attempt_ignored() {
        // Attempt 1 closed, attempt 2 started
        let state = ConnectionState::Connecting(1)
            .transition(Transition::Close)
            .unwrap()
            .transition(Transition::Connect { attempt: 2 })
            .unwrap();

        assert!(state
            .transition(Transition::Established {
                attempt: 1,
                handle: handle(1),
            })
            .is_none());
        assert!(state
            .transition(Transition::Failed {
                attempt: 1,
                error: error(),
            })
            .is_none());

        let state = state
            .transition(Transition::Established {
                attempt: 2,
                handle: handle(2),
            })
            .unwrap();
        assert_eq!(state.status(), RelayStatus::Connected);
    }
}

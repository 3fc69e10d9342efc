// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Transport

pub mod error;
#[cfg(test)]
pub(crate) mod mock;
pub mod websocket;

pub use self::error::TransportError;
pub use self::websocket::{
    BoxSink, BoxStream, DefaultWebsocketTransport, IntoWebSocketTransport, WebSocketTransport,
};

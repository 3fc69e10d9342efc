// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Messages
//!
//! <https://github.com/nostr-protocol/nips/blob/master/01.md>

use std::fmt;
use std::vec::IntoIter;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod client;
pub mod relay;
pub mod subscription;

pub use self::client::ClientMessage;
pub use self::relay::{MachineReadablePrefix, RelayMessage};
pub use self::subscription::SubscriptionId;

/// Messages error
#[derive(Debug, PartialEq, Eq)]
pub enum MessageHandleError {
    /// Invalid message format
    InvalidMessageFormat,
    /// Impossible to deserialize message
    Json(String),
    /// Empty message
    EmptyMsg,
    /// Unknown message tag
    UnknownMessage(String),
}

impl std::error::Error for MessageHandleError {}

impl fmt::Display for MessageHandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMessageFormat => write!(f, "Message has an invalid format"),
            Self::Json(e) => write!(f, "Json deserialization failed: {e}"),
            Self::EmptyMsg => write!(f, "Received empty message"),
            Self::UnknownMessage(tag) => write!(f, "Unknown message: {tag}"),
        }
    }
}

impl From<serde_json::Error> for MessageHandleError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

/// Split a wire frame into its tag and remaining elements
fn split_frame(msg: Value) -> Result<(String, IntoIter<Value>), MessageHandleError> {
    let Value::Array(v) = msg else {
        return Err(MessageHandleError::InvalidMessageFormat);
    };

    let mut v_iter = v.into_iter();
    let v_type: String = next_and_deser(&mut v_iter)?;
    Ok((v_type, v_iter))
}

fn next_and_deser<T>(iter: &mut IntoIter<Value>) -> Result<T, MessageHandleError>
where
    T: DeserializeOwned,
{
    let val: Value = iter
        .next()
        .ok_or(MessageHandleError::InvalidMessageFormat)?;
    Ok(serde_json::from_value(val)?)
}

fn parse_value(msg: &[u8]) -> Result<Value, MessageHandleError> {
    if msg.is_empty() {
        return Err(MessageHandleError::EmptyMsg);
    }
    Ok(serde_json::from_slice(msg)?)
}

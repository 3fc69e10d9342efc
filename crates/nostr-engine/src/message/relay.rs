// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay messages

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::{json, Value};

use super::{next_and_deser, parse_value, split_frame, MessageHandleError, SubscriptionId};
use crate::{Event, EventId, JsonUtil};

/// Machine-readable prefixes for `OK` and `CLOSED` relay messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MachineReadablePrefix {
    /// `duplicate:`
    Duplicate,
    /// `pow:`
    Pow,
    /// `blocked:`
    Blocked,
    /// `rate-limited:`
    RateLimited,
    /// `invalid:`
    Invalid,
    /// `error:`
    Error,
    /// `auth-required:`
    AuthRequired,
    /// `restricted:`
    Restricted,
}

impl MachineReadablePrefix {
    /// Parse the prefix of a relay message
    pub fn parse(message: &str) -> Option<Self> {
        let (prefix, _) = message.split_once(':')?;
        match prefix {
            "duplicate" => Some(Self::Duplicate),
            "pow" => Some(Self::Pow),
            "blocked" => Some(Self::Blocked),
            "rate-limited" => Some(Self::RateLimited),
            "invalid" => Some(Self::Invalid),
            "error" => Some(Self::Error),
            "auth-required" => Some(Self::AuthRequired),
            "restricted" => Some(Self::Restricted),
            _ => None,
        }
    }
}

/// Messages sent by relays, received by clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    /// `["EVENT", <subscription_id>, <event JSON>]`
    Event {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Event
        event: Box<Event>,
    },
    /// `["OK", <event_id>, <true|false>, <message>]`
    Ok {
        /// Event ID
        event_id: EventId,
        /// Accepted
        status: bool,
        /// Message
        message: String,
    },
    /// `["EOSE", <subscription_id>]`
    EndOfStoredEvents(SubscriptionId),
    /// `["NOTICE", <message>]`
    Notice(String),
    /// `["CLOSED", <subscription_id>, <message>]`
    Closed {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Message
        message: String,
    },
    /// `["AUTH", <challenge>]`
    Auth {
        /// Challenge
        challenge: String,
    },
}

impl RelayMessage {
    /// Create `EVENT` message
    #[inline]
    pub fn event(subscription_id: SubscriptionId, event: Event) -> Self {
        Self::Event {
            subscription_id,
            event: Box::new(event),
        }
    }

    /// Create `OK` message
    #[inline]
    pub fn ok<S>(event_id: EventId, status: bool, message: S) -> Self
    where
        S: Into<String>,
    {
        Self::Ok {
            event_id,
            status,
            message: message.into(),
        }
    }

    /// Create `EOSE` message
    #[inline]
    pub fn eose(subscription_id: SubscriptionId) -> Self {
        Self::EndOfStoredEvents(subscription_id)
    }

    /// Create `NOTICE` message
    #[inline]
    pub fn notice<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::Notice(message.into())
    }

    /// Create `CLOSED` message
    #[inline]
    pub fn closed<S>(subscription_id: SubscriptionId, message: S) -> Self
    where
        S: Into<String>,
    {
        Self::Closed {
            subscription_id,
            message: message.into(),
        }
    }

    /// Serialize as [`Value`]
    pub fn as_value(&self) -> Value {
        match self {
            Self::Event {
                subscription_id,
                event,
            } => json!(["EVENT", subscription_id, event]),
            Self::Ok {
                event_id,
                status,
                message,
            } => json!(["OK", event_id, status, message]),
            Self::EndOfStoredEvents(subscription_id) => json!(["EOSE", subscription_id]),
            Self::Notice(message) => json!(["NOTICE", message]),
            Self::Closed {
                subscription_id,
                message,
            } => json!(["CLOSED", subscription_id, message]),
            Self::Auth { challenge } => json!(["AUTH", challenge]),
        }
    }

    /// Deserialize from [`Value`]
    ///
    /// **The event signature is not verified.**
    pub fn from_value(msg: Value) -> Result<Self, MessageHandleError> {
        let (v_type, mut v_iter) = split_frame(msg)?;

        match v_type.as_str() {
            "EVENT" => {
                // ["EVENT", <subscription id>, <event JSON>]
                let subscription_id: SubscriptionId = next_and_deser(&mut v_iter)?;
                let event: Event = next_and_deser(&mut v_iter)?;
                Ok(Self::event(subscription_id, event))
            }
            "OK" => {
                // ["OK", <event_id>, <true|false>, <message>]
                Ok(Self::Ok {
                    event_id: next_and_deser(&mut v_iter)?,
                    status: next_and_deser(&mut v_iter)?,
                    message: next_and_deser(&mut v_iter)?,
                })
            }
            "EOSE" => {
                // ["EOSE", <subscription_id>]
                Ok(Self::eose(next_and_deser(&mut v_iter)?))
            }
            "NOTICE" => {
                // ["NOTICE", <message>]
                let message: String = next_and_deser(&mut v_iter)?;
                Ok(Self::notice(message))
            }
            "CLOSED" => {
                // ["CLOSED", <subscription_id>, <message>]
                Ok(Self::Closed {
                    subscription_id: next_and_deser(&mut v_iter)?,
                    message: next_and_deser(&mut v_iter)?,
                })
            }
            "AUTH" => {
                // ["AUTH", <challenge>]
                Ok(Self::Auth {
                    challenge: next_and_deser(&mut v_iter)?,
                })
            }
            _ => Err(MessageHandleError::UnknownMessage(v_type)),
        }
    }
}

impl Serialize for RelayMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RelayMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl JsonUtil for RelayMessage {
    type Err = MessageHandleError;

    /// Deserialize [`RelayMessage`] from JSON string
    ///
    /// **The event signature is not verified.**
    fn from_json<T>(json: T) -> Result<Self, Self::Err>
    where
        T: AsRef<[u8]>,
    {
        Self::from_value(parse_value(json.as_ref())?)
    }

    fn as_json(&self) -> String {
        self.as_value().to_string()
    }
}

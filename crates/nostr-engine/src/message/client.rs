// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Client messages

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::{json, Value};

use super::{next_and_deser, parse_value, split_frame, MessageHandleError, SubscriptionId};
use crate::{Event, Filter, JsonUtil};

/// Messages sent by clients, received by relays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `["EVENT", <event JSON>]`
    Event(Box<Event>),
    /// `["REQ", <subscription_id>, <filter JSON>, ...]`
    Req {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Filters
        filters: Vec<Filter>,
    },
    /// `["CLOSE", <subscription_id>]`
    Close(SubscriptionId),
}

impl ClientMessage {
    /// Create `EVENT` message
    #[inline]
    pub fn event(event: Event) -> Self {
        Self::Event(Box::new(event))
    }

    /// Create `REQ` message
    #[inline]
    pub fn req(subscription_id: SubscriptionId, filters: Vec<Filter>) -> Self {
        Self::Req {
            subscription_id,
            filters,
        }
    }

    /// Create `CLOSE` message
    #[inline]
    pub fn close(subscription_id: SubscriptionId) -> Self {
        Self::Close(subscription_id)
    }

    /// Serialize as [`Value`]
    pub fn as_value(&self) -> Value {
        match self {
            Self::Event(event) => json!(["EVENT", event]),
            Self::Req {
                subscription_id,
                filters,
            } => {
                let mut json = json!(["REQ", subscription_id]);
                let mut filters = json!(filters);

                if let Some(json) = json.as_array_mut() {
                    if let Some(filters) = filters.as_array_mut() {
                        json.append(filters);
                    }
                }

                json
            }
            Self::Close(subscription_id) => json!(["CLOSE", subscription_id]),
        }
    }

    /// Deserialize from [`Value`]
    ///
    /// **The event signature is not verified.**
    pub fn from_value(msg: Value) -> Result<Self, MessageHandleError> {
        let (v_type, mut v_iter) = split_frame(msg)?;

        match v_type.as_str() {
            "EVENT" => {
                // ["EVENT", <event JSON>]
                let event: Event = next_and_deser(&mut v_iter)?;
                Ok(Self::event(event))
            }
            "REQ" => {
                // ["REQ", <subscription_id>, <filter JSON>, <filter JSON>...]
                let subscription_id: SubscriptionId = next_and_deser(&mut v_iter)?;
                let filters: Vec<Filter> = v_iter
                    .map(serde_json::from_value)
                    .collect::<Result<_, _>>()?;
                Ok(Self::req(subscription_id, filters))
            }
            "CLOSE" => {
                // ["CLOSE", <subscription_id>]
                let subscription_id: SubscriptionId = next_and_deser(&mut v_iter)?;
                Ok(Self::close(subscription_id))
            }
            _ => Err(MessageHandleError::UnknownMessage(v_type)),
        }
    }
}

impl Serialize for ClientMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ClientMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl JsonUtil for ClientMessage {
    type Err = MessageHandleError;

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

// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::ops::Deref;

use nostr_engine::{EventId, RelayUrl};

/// Per-relay outcome of a pool operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output<T>
where
    T: Debug,
{
    /// Value
    pub val: T,
    /// Relays that succeeded
    pub success: HashSet<RelayUrl>,
    /// Relays that failed, with related errors
    pub failed: HashMap<RelayUrl, String>,
}

impl<T> Output<T>
where
    T: Debug,
{
    pub(super) fn new(val: T) -> Self {
        Self {
            val,
            success: HashSet::new(),
            failed: HashMap::new(),
        }
    }

    pub(super) fn record<R, E>(&mut self, url: RelayUrl, res: Result<R, E>)
    where
        E: ToString,
    {
        match res {
            Ok(..) => {
                self.success.insert(url);
            }
            Err(e) => {
                self.failed.insert(url, e.to_string());
            }
        }
    }
}

impl<T> Deref for Output<T>
where
    T: Debug,
{
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.val
    }
}

impl Output<EventId> {
    /// Get event ID
    #[inline]
    pub fn id(&self) -> &EventId {
        self.deref()
    }
}

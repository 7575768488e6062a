//! Outbound channel bus
//!
//! `ChannelBus` is what the adapter publishes through. The host framework
//! supplies its own implementation; `StoreBus` backs it with a
//! `StateStore` for standalone use and tests.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use state_store::StateStore;

use crate::channel::ChannelValue;

/// Online/offline status reported to the framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThingStatus {
    Online,
    Offline,
}

/// Why a thing is in its current status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusDetail {
    None,
    /// No bridge is attached to the thing
    NoBridge,
    BridgeOffline,
    /// The last poll failed
    CommunicationError,
}

impl fmt::Display for StatusDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StatusDetail::None => "NONE",
            StatusDetail::NoBridge => "NO_BRIDGE",
            StatusDetail::BridgeOffline => "BRIDGE_OFFLINE",
            StatusDetail::CommunicationError => "COMMUNICATION_ERROR",
        };
        f.write_str(text)
    }
}

/// A status report as seen by the framework
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInfo {
    pub status: ThingStatus,
    pub detail: StatusDetail,
}

/// Sink for everything the adapter publishes
pub trait ChannelBus: Send + Sync {
    /// Update a channel; repeating the same value is harmless
    fn publish(&self, channel: &str, value: ChannelValue);

    /// Write a property only if it differs from its current value
    ///
    /// Returns `true` when the write happened.
    fn publish_if_changed(&self, property: &str, value: &str) -> bool;

    fn set_online_status(&self, status: ThingStatus, detail: StatusDetail);
}

/// `ChannelBus` backed by a `StateStore`
///
/// Keeps every status report so callers can inspect the transitions.
#[derive(Clone, Debug, Default)]
pub struct StoreBus {
    store: StateStore<ChannelValue>,
    statuses: Arc<Mutex<Vec<StatusInfo>>>,
}

impl StoreBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &StateStore<ChannelValue> {
        &self.store
    }

    /// Last value published on `channel`
    pub fn get(&self, channel: &str) -> Option<ChannelValue> {
        self.store.get(channel)
    }

    pub fn property(&self, key: &str) -> Option<String> {
        self.store.property(key)
    }

    /// Most recent status report
    pub fn status(&self) -> Option<StatusInfo> {
        self.statuses.lock().last().copied()
    }

    /// Every status report, oldest first
    pub fn status_history(&self) -> Vec<StatusInfo> {
        self.statuses.lock().clone()
    }
}

impl ChannelBus for StoreBus {
    fn publish(&self, channel: &str, value: ChannelValue) {
        self.store.publish(channel, value);
    }

    fn publish_if_changed(&self, property: &str, value: &str) -> bool {
        self.store.update_property(property, value)
    }

    fn set_online_status(&self, status: ThingStatus, detail: StatusDetail) {
        self.statuses.lock().push(StatusInfo { status, detail });
    }
}

//! Channel and property storage
//!
//! `StateStore<V>` keeps the last value written to every channel and the
//! last string written to every property. Writes to watched keys are
//! forwarded to a `ChangeIterator`.
//!
//! Two write flavours exist:
//! - `publish` always stores and always notifies; repeating it is harmless.
//! - `publish_if_changed` / `update_property` compare against the stored
//!   value with `PartialEq` and skip the write entirely when nothing changed.

use std::collections::{HashMap, HashSet};
use std::sync::{mpsc, Arc, Mutex, RwLock};

use crate::event::{ChangeEvent, ChangeKind};
use crate::iter::ChangeIterator;

/// Store for channel values of type `V` plus string properties
///
/// Cloning is cheap and every clone shares the same state.
///
/// # Example
///
/// ```rust
/// use state_store::StateStore;
///
/// let store = StateStore::<bool>::new();
/// store.watch("reachable");
///
/// store.publish("reachable", true);
/// assert!(!store.publish_if_changed("reachable", true));
/// assert_eq!(store.get("reachable"), Some(true));
///
/// // Only the first write produced an event
/// assert_eq!(store.iter().try_iter().count(), 1);
/// ```
pub struct StateStore<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// channel key -> last published value
    channels: Arc<RwLock<HashMap<String, V>>>,

    /// property key -> last written value
    properties: Arc<RwLock<HashMap<String, String>>>,

    /// Keys whose writes produce change events
    watched: Arc<RwLock<HashSet<String>>>,

    event_tx: mpsc::Sender<ChangeEvent>,

    /// Shared so every clone drains the same queue
    event_rx: Arc<Mutex<mpsc::Receiver<ChangeEvent>>>,
}

impl<V> StateStore<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create an empty store
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::channel();

        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            properties: Arc::new(RwLock::new(HashMap::new())),
            watched: Arc::new(RwLock::new(HashSet::new())),
            event_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    /// Last value published on `channel`
    pub fn get(&self, channel: &str) -> Option<V> {
        self.channels.read().ok()?.get(channel).cloned()
    }

    /// Store `value` on `channel` and notify watchers unconditionally
    pub fn publish(&self, channel: &str, value: V) {
        match self.channels.write() {
            Ok(mut channels) => {
                channels.insert(channel.to_string(), value);
            }
            Err(_) => return,
        }

        self.maybe_emit(channel, ChangeKind::Channel);
    }

    /// Store `value` on `channel` only if it differs from the current value
    ///
    /// Returns `true` when the write happened.
    pub fn publish_if_changed(&self, channel: &str, value: V) -> bool {
        let changed = {
            let mut channels = match self.channels.write() {
                Ok(c) => c,
                Err(_) => return false,
            };
            if channels.get(channel) == Some(&value) {
                false
            } else {
                channels.insert(channel.to_string(), value);
                true
            }
        };

        if changed {
            self.maybe_emit(channel, ChangeKind::Channel);
        }
        changed
    }

    /// Last value written to property `key`
    pub fn property(&self, key: &str) -> Option<String> {
        self.properties.read().ok()?.get(key).cloned()
    }

    /// Write property `key` only if it differs from the current value
    ///
    /// Returns `true` when the write happened.
    pub fn update_property(&self, key: &str, value: &str) -> bool {
        let changed = {
            let mut properties = match self.properties.write() {
                Ok(p) => p,
                Err(_) => return false,
            };
            if properties.get(key).map(String::as_str) == Some(value) {
                false
            } else {
                properties.insert(key.to_string(), value.to_string());
                true
            }
        };

        if changed {
            self.maybe_emit(key, ChangeKind::Property);
        }
        changed
    }

    /// Register interest in writes to `key` (channel or property)
    pub fn watch(&self, key: impl Into<String>) {
        if let Ok(mut watched) = self.watched.write() {
            watched.insert(key.into());
        }
    }

    /// Stop producing events for `key`
    pub fn unwatch(&self, key: &str) {
        if let Ok(mut watched) = self.watched.write() {
            watched.remove(key);
        }
    }

    pub fn is_watched(&self, key: &str) -> bool {
        self.watched
            .read()
            .map(|w| w.contains(key))
            .unwrap_or(false)
    }

    /// Blocking iterator over change events for watched keys
    pub fn iter(&self) -> ChangeIterator {
        ChangeIterator::new(Arc::clone(&self.event_rx))
    }

    /// Number of channels that have been published at least once
    pub fn channel_count(&self) -> usize {
        self.channels.read().map(|c| c.len()).unwrap_or(0)
    }

    fn maybe_emit(&self, key: &str, kind: ChangeKind) {
        if self.is_watched(key) {
            let _ = self.event_tx.send(ChangeEvent::new(key, kind));
        }
    }
}

impl<V> Default for StateStore<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for StateStore<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
            properties: Arc::clone(&self.properties),
            watched: Arc::clone(&self.watched),
            event_tx: self.event_tx.clone(),
            event_rx: Arc::clone(&self.event_rx),
        }
    }
}

impl<V> std::fmt::Debug for StateStore<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("channel_count", &self.channel_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_get() {
        let store = StateStore::<i64>::new();
        assert_eq!(store.channel_count(), 0);
        assert_eq!(store.get("any.callduration"), None);

        store.publish("any.callduration", 42);
        assert_eq!(store.get("any.callduration"), Some(42));
        assert_eq!(store.channel_count(), 1);
    }

    #[test]
    fn test_redundant_publish_still_notifies() {
        let store = StateStore::<bool>::new();
        store.watch("state.onhook");

        store.publish("state.onhook", true);
        store.publish("state.onhook", true);

        assert_eq!(store.iter().try_iter().count(), 2);
        assert_eq!(store.get("state.onhook"), Some(true));
    }

    #[test]
    fn test_publish_if_changed_skips_same_value() {
        let store = StateStore::<bool>::new();
        store.watch("reachable");

        assert!(store.publish_if_changed("reachable", false));
        assert!(!store.publish_if_changed("reachable", false));
        assert!(store.publish_if_changed("reachable", true));

        assert_eq!(store.iter().try_iter().count(), 2);
    }

    #[test]
    fn test_update_property_only_on_change() {
        let store = StateStore::<bool>::new();
        store.watch("vendor");

        assert!(store.update_property("vendor", "Apple"));
        assert!(!store.update_property("vendor", "Apple"));
        assert!(store.update_property("vendor", "Samsung"));
        assert_eq!(store.property("vendor").as_deref(), Some("Samsung"));

        let events: Vec<_> = store.iter().try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == ChangeKind::Property));
    }

    #[test]
    fn test_unwatched_writes_are_silent() {
        let store = StateStore::<bool>::new();
        store.publish("state.ringing", true);
        assert!(store.iter().try_recv().is_none());

        store.watch("state.ringing");
        assert!(store.is_watched("state.ringing"));
        store.unwatch("state.ringing");
        store.publish("state.ringing", false);
        assert!(store.iter().try_recv().is_none());
    }

    #[test]
    fn test_clone_shares_state() {
        let store = StateStore::<String>::new();
        let cloned = store.clone();

        store.publish("any.callname", "Alice".to_string());
        assert_eq!(cloned.get("any.callname").as_deref(), Some("Alice"));

        cloned.publish("any.callnumber", "0102030405".to_string());
        assert_eq!(store.channel_count(), 2);
    }
}

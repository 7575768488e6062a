//! Change events for channel and property writes
//!
//! When a watched key is written, a `ChangeEvent` is emitted containing
//! the key and what kind of slot it names.

use std::time::Instant;

/// Which slot of the store a change event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A channel value (`StateStore::publish` and friends)
    Channel,
    /// A string property (`StateStore::update_property`)
    Property,
}

/// A change event emitted when a watched key is written
///
/// Events only include the key, not the value. Use `StateStore::get()` or
/// `StateStore::property()` to read the value after receiving an event.
///
/// # Example
///
/// ```rust,ignore
/// for event in store.iter() {
///     if event.kind == ChangeKind::Channel {
///         println!("{} -> {:?}", event.key, store.get(&event.key));
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The channel or property key that was written
    pub key: String,

    /// Whether `key` names a channel or a property
    pub kind: ChangeKind,

    /// When the write happened
    pub timestamp: Instant,
}

impl ChangeEvent {
    /// Create a new change event
    pub fn new(key: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            key: key.into(),
            kind,
            timestamp: Instant::now(),
        }
    }

    /// Create a new change event with a specific timestamp
    pub fn with_timestamp(key: impl Into<String>, kind: ChangeKind, timestamp: Instant) -> Self {
        Self {
            key: key.into(),
            kind,
            timestamp,
        }
    }
}

impl PartialEq for ChangeEvent {
    fn eq(&self, other: &Self) -> bool {
        // Timestamp not included in equality
        self.key == other.key && self.kind == other.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_event_creation() {
        let event = ChangeEvent::new("state.onhook", ChangeKind::Channel);

        assert_eq!(event.key, "state.onhook");
        assert_eq!(event.kind, ChangeKind::Channel);
    }

    #[test]
    fn test_change_event_equality_ignores_timestamp() {
        let earlier = Instant::now();
        let a = ChangeEvent::with_timestamp("reachable", ChangeKind::Channel, earlier);
        let b = ChangeEvent::new("reachable", ChangeKind::Channel);
        let c = ChangeEvent::new("reachable", ChangeKind::Property);
        let d = ChangeEvent::new("vendor", ChangeKind::Property);

        assert_eq!(a, b);
        assert_ne!(b, c);
        assert_ne!(c, d);
    }
}

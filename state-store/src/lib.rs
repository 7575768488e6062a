//! Channel State Store
//!
//! A small, thread-safe store for the values an adapter publishes on its
//! channels, with redundant-write suppression and blocking iteration over
//! writes.
//!
//! # Features
//!
//! - **Idempotent publication**: `publish` can be repeated safely
//! - **Change suppression**: `publish_if_changed` and `update_property`
//!   only write when the value differs
//! - **Watch pattern**: only watched keys produce change events
//! - **Blocking iteration**: consume change events via `ChangeIterator`
//!
//! # Quick Start
//!
//! ```rust
//! use state_store::StateStore;
//!
//! let store = StateStore::<String>::new();
//! store.watch("vendor");
//!
//! assert!(store.update_property("vendor", "Freebox SAS"));
//! assert!(!store.update_property("vendor", "Freebox SAS"));
//!
//! let event = store.iter().try_recv().unwrap();
//! assert_eq!(event.key, "vendor");
//! ```
//!
//! # Architecture
//!
//! ```text
//! StateStore<V>
//!     │
//!     ├── channels:   HashMap<String, V>
//!     ├── properties: HashMap<String, String>
//!     ├── watched:    HashSet<String>
//!     │
//!     └── event_channel: mpsc::channel<ChangeEvent>
//!             │
//!             └── ChangeIterator
//! ```

pub mod event;
pub mod iter;
pub mod store;

pub use event::{ChangeEvent, ChangeKind};
pub use iter::{ChangeIterator, TimeoutIter, TryIter};
pub use store::StateStore;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::event::{ChangeEvent, ChangeKind};
    pub use crate::iter::ChangeIterator;
    pub use crate::store::StateStore;
}

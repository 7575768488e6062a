//! Router state decoding and publication
//!
//! Turns router snapshots into channel updates:
//!
//! ```text
//! PhoneStatus[]  → publish_phone_state ─┐
//! CallEntry[]    → CallHistoryTracker  ─┼→ ChannelBus (publish / publish_if_changed)
//! LanHost[]      → match_host          ─┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fbx_state::{CallHistoryTracker, StoreBus, publish_call};
//!
//! let bus = StoreBus::new();
//! let mut tracker = CallHistoryTracker::new(chrono::Utc::now());
//!
//! for call in tracker.process(client.call_entries().await?) {
//!     publish_call(&bus, &call);
//! }
//! ```

pub mod bus;
pub mod calls;
pub mod channel;
pub mod phone;
pub mod reachability;

pub use bus::{ChannelBus, StatusDetail, StatusInfo, StoreBus, ThingStatus};
pub use calls::{process_new_calls, publish_call, CallHistoryTracker};
pub use channel::{channel_id, CallGroup, ChannelValue, PROPERTY_VENDOR};
pub use phone::publish_phone_state;
pub use reachability::{
    match_host, publish_reachability, AddressError, HostMatch, MacAddress, MatchMode,
    TrackedAddress,
};

//! # fbx-adapter
//!
//! Router phone line and LAN device adapter.
//!
//! An adapter is built from an [`AdapterConfig`], attached to a bridge and
//! then drives itself:
//!
//! - a **phone** adapter schedules two poll jobs on a shared
//!   [`PollScheduler`](fbx_poller::PollScheduler), one for the line state
//!   and one for the call log;
//! - a **network** adapter waits for LAN host snapshots pushed through
//!   [`RouterAdapter::update_net_info`].
//!
//! Every poll outcome feeds the [`Lifecycle`], which reports the online
//! status through the [`ChannelBus`](fbx_state::ChannelBus).
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fbx_adapter::{AdapterConfig, BridgeStatus, RouterAdapter};
//!
//! fbx_adapter::logging::init_logging_from_env()?;
//!
//! let config = AdapterConfig::from_json(r#"{ "kind": "phone", "refresh_phone_interval": 5 }"#)?;
//! let adapter = RouterAdapter::from_config("phone", &config, client, bus, scheduler)?;
//! adapter.initialize(Some(BridgeStatus::Online)).await?;
//! ```

mod adapter;
mod config;
mod error;
mod job;
mod lifecycle;

pub mod logging;

pub use adapter::{RouterAdapter, CALL_HISTORY_TASK, PHONE_STATE_TASK};
pub use config::{
    AdapterConfig, DeviceConfig, DeviceKind, ValidatedConfig, DEFAULT_CALLS_INTERVAL,
    DEFAULT_INITIAL_DELAY, DEFAULT_PHONE_INTERVAL,
};
pub use error::{AdapterError, ConfigError, PollError};
pub use job::{CallHistorySource, PhoneStateSource, PollJob, PollSource};
pub use lifecycle::{BridgeStatus, Lifecycle, LifecycleEvent, LifecycleSession, LifecycleState};

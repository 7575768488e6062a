//! # fbx-poller
//!
//! Fixed-rate scheduling of named periodic tasks on a tokio runtime.
//!
//! Every task gets its own background tokio task, so a slow or failing
//! task never delays another one. Within a task, runs are strictly
//! sequential and follow the nominal timeline `start + k * period`.
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use fbx_poller::{poll_fn, PollScheduler};
//!
//! let scheduler = PollScheduler::new();
//! let handle = scheduler
//!     .schedule(
//!         "phone-state",
//!         Duration::from_secs(1),
//!         Duration::from_secs(2),
//!         poll_fn(|| async { Ok::<(), String>(()) }),
//!     )
//!     .await?;
//! ```

mod error;
mod scheduler;
mod task;

pub use error::{PollingError, PollingResult};
pub use scheduler::{
    PollScheduler, PollSchedulerStats, PollingTaskStats, TaskHandle, DEFAULT_MAX_TASKS,
};
pub use task::{poll_fn, PollFn, PollTask, TaskId};

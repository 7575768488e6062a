//! RouterAdapter - one configured thing on the router
//!
//! A phone adapter polls its line state and call log on its own. A network
//! adapter is passive: the bridge pushes LAN host snapshots through
//! [`RouterAdapter::update_net_info`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fbx_api::{LanHost, RouterClient};
use fbx_poller::{PollScheduler, PollTask, TaskHandle};
use fbx_state::{match_host, publish_reachability, ChannelBus};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::{AdapterConfig, DeviceKind, ValidatedConfig};
use crate::error::{AdapterError, ConfigError};
use crate::job::{CallHistorySource, PhoneStateSource, PollJob, PollSource};
use crate::lifecycle::{BridgeStatus, Lifecycle, LifecycleEvent, LifecycleState};

/// Suffix of the phone state task id
pub const PHONE_STATE_TASK: &str = "phone-state";

/// Suffix of the call log task id
pub const CALL_HISTORY_TASK: &str = "call-history";

/// Adapter for a single phone line or LAN device
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use fbx_adapter::{AdapterConfig, BridgeStatus, RouterAdapter};
/// use fbx_poller::PollScheduler;
/// use fbx_state::StoreBus;
///
/// let scheduler = Arc::new(PollScheduler::new());
/// let adapter = RouterAdapter::from_config(
///     "phone",
///     &AdapterConfig::default(),
///     client,
///     Arc::new(StoreBus::new()),
///     scheduler,
/// )?;
///
/// adapter.initialize(Some(BridgeStatus::Online)).await?;
/// // ...
/// adapter.dispose().await;
/// ```
pub struct RouterAdapter {
    thing_id: String,
    config: ValidatedConfig,
    client: Arc<dyn RouterClient>,
    bus: Arc<dyn ChannelBus>,
    scheduler: Arc<PollScheduler>,
    lifecycle: Lifecycle,
    /// Handles of the running poll jobs
    jobs: Mutex<Vec<TaskHandle>>,
}

impl RouterAdapter {
    pub fn new(
        thing_id: impl Into<String>,
        config: ValidatedConfig,
        client: Arc<dyn RouterClient>,
        bus: Arc<dyn ChannelBus>,
        scheduler: Arc<PollScheduler>,
    ) -> Self {
        Self {
            thing_id: thing_id.into(),
            config,
            client,
            lifecycle: Lifecycle::new(bus.clone()),
            bus,
            scheduler,
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// Validate `config` and build the adapter
    pub fn from_config(
        thing_id: impl Into<String>,
        config: &AdapterConfig,
        client: Arc<dyn RouterClient>,
        bus: Arc<dyn ChannelBus>,
        scheduler: Arc<PollScheduler>,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        Ok(Self::new(thing_id, config, client, bus, scheduler))
    }

    pub fn thing_id(&self) -> &str {
        &self.thing_id
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Id of one of this adapter's poll tasks
    pub fn task_id(&self, task: &str) -> String {
        format!("{}:{}", self.thing_id, task)
    }

    /// Attach to a bridge; `None` means no bridge is configured
    pub async fn initialize(&self, bridge: Option<BridgeStatus>) -> Result<(), AdapterError> {
        info!(thing = %self.thing_id, ?bridge, "initializing adapter");
        self.bridge_status_changed(bridge).await
    }

    /// React to the bridge going online or offline
    ///
    /// Poll jobs are started the first time the bridge is online and keep
    /// running until [`dispose`](Self::dispose).
    pub async fn bridge_status_changed(
        &self,
        bridge: Option<BridgeStatus>,
    ) -> Result<(), AdapterError> {
        let state = self.lifecycle.apply(LifecycleEvent::Bridge(bridge));

        if state.is_online() {
            self.start_jobs().await?;
        }
        Ok(())
    }

    async fn start_jobs(&self) -> Result<(), AdapterError> {
        let DeviceKind::Phone {
            state_period,
            calls_period,
        } = self.config.device
        else {
            return Ok(());
        };

        if !self.jobs.lock().is_empty() {
            return Ok(());
        }

        let mut handles = Vec::new();

        if let Some(period) = state_period {
            let job = self.job(PhoneStateSource);
            handles.extend(self.schedule(PHONE_STATE_TASK, period, job).await?);
        }

        if let Some(period) = calls_period {
            let job = self.job(CallHistorySource::new(Utc::now()));
            handles.extend(self.schedule(CALL_HISTORY_TASK, period, job).await?);
        }

        debug!(thing = %self.thing_id, count = handles.len(), "poll jobs started");
        self.jobs.lock().extend(handles);
        Ok(())
    }

    fn job<S: PollSource>(&self, source: S) -> PollJob<S> {
        PollJob::new(
            source,
            self.client.clone(),
            self.bus.clone(),
            self.lifecycle.session(),
        )
    }

    async fn schedule<T: PollTask>(
        &self,
        task: &str,
        period: Duration,
        job: T,
    ) -> Result<Option<TaskHandle>, AdapterError> {
        let handle = self
            .scheduler
            .schedule(self.task_id(task), self.config.initial_delay, period, job)
            .await?;
        Ok(handle)
    }

    /// Apply a LAN host snapshot pushed by the bridge
    ///
    /// Ignored unless this is a network adapter and it is online. A device
    /// missing from the snapshot leaves the published state untouched.
    pub fn update_net_info(&self, snapshot: &[LanHost]) {
        let DeviceKind::Network(tracked) = &self.config.device else {
            return;
        };
        if !self.lifecycle.state().is_online() {
            return;
        }

        match match_host(snapshot, tracked, tracked.match_mode()) {
            Some(found) => publish_reachability(self.bus.as_ref(), &found),
            None => debug!(thing = %self.thing_id, %tracked, "device not in snapshot"),
        }
    }

    /// Whether any poll job is currently running
    pub fn has_jobs(&self) -> bool {
        !self.jobs.lock().is_empty()
    }

    /// Stop all poll jobs and return to `Uninitialized`
    ///
    /// An in-flight run may still finish, but no new run starts and its
    /// outcome no longer reaches the lifecycle.
    pub async fn dispose(&self) {
        let handles: Vec<TaskHandle> = self.jobs.lock().drain(..).collect();

        for handle in &handles {
            self.scheduler.cancel(handle).await;
        }

        self.lifecycle.apply(LifecycleEvent::Disposed);
        info!(thing = %self.thing_id, cancelled = handles.len(), "adapter disposed");
    }
}

impl std::fmt::Debug for RouterAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterAdapter")
            .field("thing_id", &self.thing_id)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

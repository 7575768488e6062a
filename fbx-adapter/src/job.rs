//! Poll jobs
//!
//! A job fetches one router resource, publishes what it found and feeds
//! the outcome to the lifecycle. The parts that differ per resource live
//! behind [`PollSource`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fbx_api::{CallEntry, PhoneStatus, RouterClient, TransportError};
use fbx_poller::PollTask;
use fbx_state::{publish_call, publish_phone_state, CallHistoryTracker, ChannelBus};

use crate::error::PollError;
use crate::lifecycle::{LifecycleEvent, LifecycleSession};

/// One router resource polled by a [`PollJob`]
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    type Snapshot: Send;

    async fn fetch(&self, client: &dyn RouterClient) -> Result<Self::Snapshot, TransportError>;

    /// Publish a fetched snapshot
    ///
    /// Only called after a successful fetch.
    fn emit(&mut self, snapshot: Self::Snapshot, bus: &dyn ChannelBus) -> Result<(), PollError>;
}

/// Periodic fetch → emit → status cycle over a [`PollSource`]
pub struct PollJob<S> {
    source: S,
    client: Arc<dyn RouterClient>,
    bus: Arc<dyn ChannelBus>,
    lifecycle: LifecycleSession,
}

impl<S: PollSource> PollJob<S> {
    pub fn new(
        source: S,
        client: Arc<dyn RouterClient>,
        bus: Arc<dyn ChannelBus>,
        lifecycle: LifecycleSession,
    ) -> Self {
        Self {
            source,
            client,
            bus,
            lifecycle,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one cycle without reporting the outcome
    async fn run_once(&mut self) -> Result<(), PollError> {
        let snapshot = self.source.fetch(self.client.as_ref()).await?;
        self.source.emit(snapshot, self.bus.as_ref())
    }
}

#[async_trait]
impl<S: PollSource> PollTask for PollJob<S> {
    type Error = PollError;

    async fn poll(&mut self) -> Result<(), PollError> {
        let outcome = self.run_once().await;

        let event = match outcome {
            Ok(()) => LifecycleEvent::PollSucceeded,
            Err(_) => LifecycleEvent::PollFailed,
        };
        self.lifecycle.apply(event);

        outcome
    }
}

/// Phone line on-hook and ringing state
#[derive(Debug, Default)]
pub struct PhoneStateSource;

#[async_trait]
impl PollSource for PhoneStateSource {
    type Snapshot = Vec<PhoneStatus>;

    async fn fetch(&self, client: &dyn RouterClient) -> Result<Vec<PhoneStatus>, TransportError> {
        client.phone_status().await
    }

    fn emit(&mut self, lines: Vec<PhoneStatus>, bus: &dyn ChannelBus) -> Result<(), PollError> {
        // Only the first line is exposed
        let line = lines.first().ok_or(PollError::EmptyPhoneStatus)?;
        publish_phone_state(bus, line);
        Ok(())
    }
}

/// New entries of the call log
#[derive(Debug)]
pub struct CallHistorySource {
    tracker: CallHistoryTracker,
}

impl CallHistorySource {
    /// Ignore every call that ended at or before `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            tracker: CallHistoryTracker::new(start),
        }
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.tracker.watermark()
    }
}

#[async_trait]
impl PollSource for CallHistorySource {
    type Snapshot = Vec<CallEntry>;

    async fn fetch(&self, client: &dyn RouterClient) -> Result<Vec<CallEntry>, TransportError> {
        client.call_entries().await
    }

    fn emit(&mut self, entries: Vec<CallEntry>, bus: &dyn ChannelBus) -> Result<(), PollError> {
        for call in self.tracker.process(entries) {
            publish_call(bus, &call);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{BridgeStatus, Lifecycle, LifecycleState};
    use chrono::TimeZone;
    use fbx_api::{LanHost, Result};
    use fbx_state::{ChannelValue, StatusDetail, StoreBus};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct ScriptedClient {
        lines: Mutex<Vec<Result<Vec<PhoneStatus>>>>,
        calls: Mutex<Vec<Result<Vec<CallEntry>>>>,
    }

    #[async_trait]
    impl RouterClient for ScriptedClient {
        async fn phone_status(&self) -> Result<Vec<PhoneStatus>> {
            self.lines.lock().remove(0)
        }

        async fn call_entries(&self) -> Result<Vec<CallEntry>> {
            self.calls.lock().remove(0)
        }

        async fn lan_hosts(&self) -> Result<Vec<LanHost>> {
            Ok(Vec::new())
        }
    }

    fn online_lifecycle(bus: &StoreBus) -> Lifecycle {
        let lifecycle = Lifecycle::new(Arc::new(bus.clone()));
        lifecycle.apply(LifecycleEvent::Bridge(Some(BridgeStatus::Online)));
        lifecycle
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_phone_state_job() {
        let client = Arc::new(ScriptedClient::default());
        client.lines.lock().extend([
            Ok(vec![PhoneStatus::new(false, true), PhoneStatus::new(true, false)]),
            Ok(Vec::new()),
        ]);
        let bus = StoreBus::new();
        let lifecycle = online_lifecycle(&bus);
        let mut job = PollJob::new(
            PhoneStateSource,
            client,
            Arc::new(bus.clone()),
            lifecycle.session(),
        );

        job.poll().await.unwrap();
        assert_eq!(bus.get("state.onhook"), Some(ChannelValue::OnOff(false)));
        assert_eq!(bus.get("state.ringing"), Some(ChannelValue::OnOff(true)));

        assert!(matches!(job.poll().await, Err(PollError::EmptyPhoneStatus)));
        assert_eq!(
            lifecycle.state(),
            LifecycleState::OfflineError(StatusDetail::CommunicationError)
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_watermark() {
        let client = Arc::new(ScriptedClient::default());
        let call = CallEntry::new("0102030405", "Alice", "accepted", t0(), 30);
        client.calls.lock().extend([
            Err(TransportError::Network("connection reset".to_string())),
            Ok(vec![call]),
        ]);
        let bus = StoreBus::new();
        let lifecycle = online_lifecycle(&bus);
        let mut job = PollJob::new(
            CallHistorySource::new(t0()),
            client,
            Arc::new(bus.clone()),
            lifecycle.session(),
        );

        assert!(matches!(job.poll().await, Err(PollError::Transport(_))));
        assert_eq!(job.source().watermark(), t0());
        assert!(!lifecycle.state().is_online());

        job.poll().await.unwrap();
        assert_eq!(job.source().watermark(), t0() + chrono::Duration::seconds(30));
        assert_eq!(
            bus.get("accepted.callname"),
            Some(ChannelValue::Text("Alice".to_string()))
        );
        assert!(lifecycle.state().is_online());
    }

    #[tokio::test]
    async fn test_out_of_range_call_does_not_break_polling() {
        let client = Arc::new(ScriptedClient::default());
        let corrupt: CallEntry = serde_json::from_str(
            r#"{"type": "accepted", "datetime": 8210266876799, "number": "0699999999", "duration": 5}"#,
        )
        .unwrap();
        let call = CallEntry::new("0102030405", "Alice", "missed", t0(), 12);
        client
            .calls
            .lock()
            .extend([Ok(vec![corrupt.clone(), call]), Ok(vec![corrupt])]);
        let bus = StoreBus::new();
        let lifecycle = online_lifecycle(&bus);
        let mut job = PollJob::new(
            CallHistorySource::new(t0()),
            client,
            Arc::new(bus.clone()),
            lifecycle.session(),
        );

        job.poll().await.unwrap();
        job.poll().await.unwrap();

        assert_eq!(job.source().watermark(), t0() + chrono::Duration::seconds(12));
        assert_eq!(
            bus.get("any.callnumber"),
            Some(ChannelValue::Text("0102030405".to_string()))
        );
        assert!(lifecycle.state().is_online());
    }

    #[tokio::test]
    async fn test_run_from_disposed_session_leaves_state_alone() {
        let client = Arc::new(ScriptedClient::default());
        client.lines.lock().push(Ok(Vec::new()));
        let bus = StoreBus::new();
        let lifecycle = online_lifecycle(&bus);
        let mut job = PollJob::new(
            PhoneStateSource,
            client,
            Arc::new(bus.clone()),
            lifecycle.session(),
        );

        lifecycle.apply(LifecycleEvent::Disposed);
        lifecycle.apply(LifecycleEvent::Bridge(Some(BridgeStatus::Online)));

        assert!(matches!(job.poll().await, Err(PollError::EmptyPhoneStatus)));
        assert_eq!(lifecycle.state(), LifecycleState::Online);
    }
}

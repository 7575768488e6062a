//! Online/offline lifecycle of an adapter
//!
//! ```text
//!                   bridge online
//!   Uninitialized ───────────────→ Online ←──────────┐
//!        │                          │  poll failed    │ poll succeeded
//!        │ no bridge                ↓                 │
//!        └──────────────────→ OfflineError(detail) ───┘
//!
//!   bridge offline ⇒ OfflineBridge from any state
//!   dispose        ⇒ Uninitialized from any state
//! ```
//!
//! Only a communication error recovers on a successful poll; a missing or
//! offline bridge waits for the next bridge event.

use std::sync::Arc;

use fbx_state::{ChannelBus, StatusDetail, StatusInfo, ThingStatus};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Status of the bridge the adapter is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Online,
    OfflineBridge,
    OfflineError(StatusDetail),
}

/// Input to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// `None` means no bridge is attached
    Bridge(Option<BridgeStatus>),
    PollSucceeded,
    PollFailed,
    Disposed,
}

impl LifecycleState {
    pub fn next(self, event: LifecycleEvent) -> LifecycleState {
        use LifecycleState::*;

        match (self, event) {
            (_, LifecycleEvent::Disposed) => Uninitialized,
            (_, LifecycleEvent::Bridge(None)) => OfflineError(StatusDetail::NoBridge),
            (_, LifecycleEvent::Bridge(Some(BridgeStatus::Offline))) => OfflineBridge,
            (_, LifecycleEvent::Bridge(Some(BridgeStatus::Online))) => Online,
            (OfflineError(StatusDetail::CommunicationError), LifecycleEvent::PollSucceeded) => {
                Online
            }
            (Online, LifecycleEvent::PollFailed) => {
                OfflineError(StatusDetail::CommunicationError)
            }
            (state, _) => state,
        }
    }

    /// Status the framework sees for this state
    ///
    /// `Uninitialized` belongs to the framework and is never reported.
    pub fn status(&self) -> Option<StatusInfo> {
        let (status, detail) = match self {
            LifecycleState::Uninitialized => return None,
            LifecycleState::Online => (ThingStatus::Online, StatusDetail::None),
            LifecycleState::OfflineBridge => (ThingStatus::Offline, StatusDetail::BridgeOffline),
            LifecycleState::OfflineError(detail) => (ThingStatus::Offline, *detail),
        };
        Some(StatusInfo { status, detail })
    }

    pub fn is_online(&self) -> bool {
        matches!(self, LifecycleState::Online)
    }
}

/// Lifecycle shared by an adapter and its poll jobs
///
/// Every change of state is reported on the bus; repeated poll outcomes
/// are not. Each dispose starts a new generation, so poll jobs started
/// before it can no longer move the state.
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<Mutex<Inner>>,
    bus: Arc<dyn ChannelBus>,
}

struct Inner {
    state: LifecycleState,
    generation: u64,
}

impl Lifecycle {
    pub fn new(bus: Arc<dyn ChannelBus>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: LifecycleState::Uninitialized,
                generation: 0,
            })),
            bus,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    /// Handle for poll jobs started now
    pub fn session(&self) -> LifecycleSession {
        LifecycleSession {
            lifecycle: self.clone(),
            generation: self.inner.lock().generation,
        }
    }

    /// Feed `event` to the state machine and return the new state
    pub fn apply(&self, event: LifecycleEvent) -> LifecycleState {
        let mut inner = self.inner.lock();
        self.transition(&mut inner, event)
    }

    fn transition(&self, inner: &mut Inner, event: LifecycleEvent) -> LifecycleState {
        let previous = inner.state;
        let next = previous.next(event);
        inner.state = next;
        if event == LifecycleEvent::Disposed {
            inner.generation += 1;
        }

        // Bridge events are re-reported even when nothing changed
        let report = next != previous || matches!(event, LifecycleEvent::Bridge(_));
        if report {
            if let Some(info) = next.status() {
                self.bus.set_online_status(info.status, info.detail);
            }
        }

        match next {
            _ if next == previous => {}
            LifecycleState::OfflineError(detail) => {
                warn!(from = ?previous, %detail, "adapter offline")
            }
            LifecycleState::Online => info!(from = ?previous, "adapter online"),
            _ => debug!(from = ?previous, to = ?next, "lifecycle transition"),
        }

        next
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Lifecycle")
            .field("state", &inner.state)
            .field("generation", &inner.generation)
            .finish()
    }
}

/// A [`Lifecycle`] as seen by the poll jobs of one generation
#[derive(Clone, Debug)]
pub struct LifecycleSession {
    lifecycle: Lifecycle,
    generation: u64,
}

impl LifecycleSession {
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Apply `event` unless the lifecycle was disposed since this session began
    ///
    /// Returns `None` for a stale session.
    pub fn apply(&self, event: LifecycleEvent) -> Option<LifecycleState> {
        let mut inner = self.lifecycle.inner.lock();
        if inner.generation != self.generation {
            debug!(?event, "ignoring event from a disposed session");
            return None;
        }
        Some(self.lifecycle.transition(&mut inner, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbx_state::StoreBus;
    use rstest::rstest;

    use LifecycleEvent::*;
    use LifecycleState::*;

    const COMM: LifecycleState = OfflineError(StatusDetail::CommunicationError);
    const NO_BRIDGE: LifecycleState = OfflineError(StatusDetail::NoBridge);

    #[rstest]
    #[case(Uninitialized, Bridge(None), NO_BRIDGE)]
    #[case(Uninitialized, Bridge(Some(BridgeStatus::Offline)), OfflineBridge)]
    #[case(Uninitialized, Bridge(Some(BridgeStatus::Online)), Online)]
    #[case(Online, PollFailed, COMM)]
    #[case(Online, PollSucceeded, Online)]
    #[case(COMM, PollSucceeded, Online)]
    #[case(COMM, PollFailed, COMM)]
    #[case(NO_BRIDGE, PollSucceeded, NO_BRIDGE)]
    #[case(OfflineBridge, PollSucceeded, OfflineBridge)]
    #[case(OfflineBridge, PollFailed, OfflineBridge)]
    #[case(OfflineBridge, Bridge(Some(BridgeStatus::Online)), Online)]
    #[case(Online, Bridge(Some(BridgeStatus::Offline)), OfflineBridge)]
    #[case(COMM, Disposed, Uninitialized)]
    #[case(Online, Disposed, Uninitialized)]
    fn test_transitions(
        #[case] from: LifecycleState,
        #[case] event: LifecycleEvent,
        #[case] expected: LifecycleState,
    ) {
        assert_eq!(from.next(event), expected);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(Uninitialized.status(), None);
        assert_eq!(
            OfflineBridge.status(),
            Some(StatusInfo {
                status: ThingStatus::Offline,
                detail: StatusDetail::BridgeOffline,
            })
        );
        assert_eq!(
            COMM.status(),
            Some(StatusInfo {
                status: ThingStatus::Offline,
                detail: StatusDetail::CommunicationError,
            })
        );
    }

    #[test]
    fn test_repeated_poll_outcomes_are_reported_once() {
        let bus = StoreBus::new();
        let lifecycle = Lifecycle::new(Arc::new(bus.clone()));

        lifecycle.apply(Bridge(Some(BridgeStatus::Online)));
        lifecycle.apply(PollSucceeded);
        lifecycle.apply(PollFailed);
        lifecycle.apply(PollFailed);
        lifecycle.apply(PollSucceeded);

        let details: Vec<_> = bus.status_history().iter().map(|s| s.detail).collect();
        assert_eq!(
            details,
            vec![
                StatusDetail::None,
                StatusDetail::CommunicationError,
                StatusDetail::None,
            ]
        );
    }

    #[test]
    fn test_stale_session_cannot_move_new_session() {
        let bus = StoreBus::new();
        let lifecycle = Lifecycle::new(Arc::new(bus.clone()));

        lifecycle.apply(Bridge(Some(BridgeStatus::Online)));
        let stale = lifecycle.session();
        lifecycle.apply(Disposed);
        lifecycle.apply(Bridge(Some(BridgeStatus::Online)));
        let current = lifecycle.session();

        assert_eq!(stale.apply(PollFailed), None);
        assert_eq!(lifecycle.state(), Online);

        assert_eq!(current.apply(PollFailed), Some(COMM));
        assert_eq!(stale.state(), COMM);
    }

    #[test]
    fn test_dispose_is_not_reported() {
        let bus = StoreBus::new();
        let lifecycle = Lifecycle::new(Arc::new(bus.clone()));

        lifecycle.apply(Bridge(Some(BridgeStatus::Online)));
        assert_eq!(lifecycle.apply(Disposed), Uninitialized);
        assert_eq!(bus.status_history().len(), 1);
    }
}

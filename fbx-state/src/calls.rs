//! Call history tracking
//!
//! The router only ever hands back its whole call log. New calls are told
//! apart from old ones by a single watermark: the end time of the last call
//! published. Only calls that ended strictly after it are emitted, oldest
//! first, and each one moves the watermark forward.
//!
//! Calls with a zero duration are never emitted and never move the
//! watermark. A non-zero duration is the only sign that the router has
//! finalized the record.

use chrono::{DateTime, Utc};
use fbx_api::CallEntry;
use tracing::{debug, trace, warn};

use crate::bus::ChannelBus;
use crate::channel::{
    CallGroup, ChannelValue, CALLDURATION, CALLNAME, CALLNUMBER, CALLSTATUS, CALLTIMESTAMP,
};

/// Select the calls that ended after `watermark`
///
/// Returns the emitted calls in end-time order and the advanced watermark.
/// The sort is stable, so calls ending at the same instant keep their
/// fetch order; only the first of them can pass the strict comparison.
/// Entries whose end time is out of range are dropped.
pub fn process_new_calls(
    raw_entries: Vec<CallEntry>,
    watermark: DateTime<Utc>,
) -> (Vec<CallEntry>, DateTime<Utc>) {
    let mut timed: Vec<(DateTime<Utc>, CallEntry)> = raw_entries
        .into_iter()
        .filter_map(|call| match call.end_time() {
            Some(end_time) => Some((end_time, call)),
            None => {
                warn!(number = %call.number, timestamp = %call.timestamp, "call end time out of range");
                None
            }
        })
        .collect();
    timed.sort_by_key(|(end_time, _)| *end_time);

    let mut watermark = watermark;
    let mut emitted = Vec::new();

    for (end_time, call) in timed {
        if call.duration > 0 && end_time > watermark {
            watermark = end_time;
            emitted.push(call);
        } else {
            trace!(number = %call.number, %end_time, "skipping call");
        }
    }

    (emitted, watermark)
}

/// Owns the watermark of one phone line
#[derive(Debug, Clone)]
pub struct CallHistoryTracker {
    watermark: DateTime<Utc>,
}

impl CallHistoryTracker {
    /// Start tracking; calls that ended at or before `start` are ignored
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { watermark: start }
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    /// Emit the new calls out of a freshly fetched log
    pub fn process(&mut self, raw_entries: Vec<CallEntry>) -> Vec<CallEntry> {
        let (emitted, watermark) = process_new_calls(raw_entries, self.watermark);
        if !emitted.is_empty() {
            debug!(count = emitted.len(), %watermark, "new calls");
        }
        self.watermark = watermark;
        emitted
    }
}

/// Publish one call on `any` and on the group matching its type
pub fn publish_call(bus: &dyn ChannelBus, call: &CallEntry) {
    publish_call_group(bus, call, CallGroup::Any);

    if let Some(group) = CallGroup::for_call_type(&call.call_type) {
        publish_call_group(bus, call, group);
    }
}

fn publish_call_group(bus: &dyn ChannelBus, call: &CallEntry, group: CallGroup) {
    bus.publish(
        &group.channel(CALLNUMBER),
        ChannelValue::Text(call.number.clone()),
    );
    bus.publish(
        &group.channel(CALLDURATION),
        ChannelValue::Decimal(i64::from(call.duration)),
    );
    bus.publish(
        &group.channel(CALLTIMESTAMP),
        ChannelValue::DateTime(call.timestamp),
    );
    bus.publish(&group.channel(CALLNAME), ChannelValue::Text(call.name.clone()));

    if group == CallGroup::Any {
        bus.publish(
            &group.channel(CALLSTATUS),
            ChannelValue::Text(call.call_type.to_string()),
        );
    }
}

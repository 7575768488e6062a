//! Channel namespace and values
//!
//! Channels are addressed as `<group>.<id>`, e.g. `missed.callnumber`.
//! A few channels (`reachable`) have no group.

use std::fmt;

use chrono::{DateTime, Utc};
use fbx_api::CallType;
use serde::{Deserialize, Serialize};

pub const STATE: &str = "state";
pub const ONHOOK: &str = "onhook";
pub const RINGING: &str = "ringing";

pub const CALLNUMBER: &str = "callnumber";
pub const CALLDURATION: &str = "callduration";
pub const CALLTIMESTAMP: &str = "calltimestamp";
pub const CALLNAME: &str = "callname";
pub const CALLSTATUS: &str = "callstatus";

pub const REACHABLE: &str = "reachable";

/// Property holding the vendor of a tracked LAN host
pub const PROPERTY_VENDOR: &str = "vendor";

/// Full channel id for `id` inside `group`
pub fn channel_id(group: &str, id: &str) -> String {
    format!("{}.{}", group, id)
}

/// Typed value carried by a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelValue {
    OnOff(bool),
    Text(String),
    Decimal(i64),
    DateTime(DateTime<Utc>),
}

impl fmt::Display for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelValue::OnOff(true) => f.write_str("ON"),
            ChannelValue::OnOff(false) => f.write_str("OFF"),
            ChannelValue::Text(text) => f.write_str(text),
            ChannelValue::Decimal(n) => write!(f, "{}", n),
            ChannelValue::DateTime(at) => write!(f, "{}", at.to_rfc3339()),
        }
    }
}

/// Channel groups receiving call details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallGroup {
    /// Every emitted call
    Any,
    Accepted,
    Missed,
    Outgoing,
}

impl CallGroup {
    pub const ALL: [CallGroup; 4] = [
        CallGroup::Any,
        CallGroup::Accepted,
        CallGroup::Missed,
        CallGroup::Outgoing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CallGroup::Any => "any",
            CallGroup::Accepted => "accepted",
            CallGroup::Missed => "missed",
            CallGroup::Outgoing => "outgoing",
        }
    }

    /// The typed group for a call, if its type is one of the known three
    pub fn for_call_type(call_type: &CallType) -> Option<CallGroup> {
        match call_type {
            CallType::Accepted => Some(CallGroup::Accepted),
            CallType::Missed => Some(CallGroup::Missed),
            CallType::Outgoing => Some(CallGroup::Outgoing),
            CallType::Other(_) => None,
        }
    }

    pub fn channel(&self, id: &str) -> String {
        channel_id(self.as_str(), id)
    }
}

//! Call log entries

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How a call ended up in the log
///
/// The router reports the type as a string; the three known values are
/// matched case-insensitively and anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CallType {
    Accepted,
    Missed,
    Outgoing,
    Other(String),
}

impl CallType {
    pub fn as_str(&self) -> &str {
        match self {
            CallType::Accepted => "accepted",
            CallType::Missed => "missed",
            CallType::Outgoing => "outgoing",
            CallType::Other(raw) => raw,
        }
    }
}

impl From<String> for CallType {
    fn from(raw: String) -> Self {
        if raw.eq_ignore_ascii_case("accepted") {
            CallType::Accepted
        } else if raw.eq_ignore_ascii_case("missed") {
            CallType::Missed
        } else if raw.eq_ignore_ascii_case("outgoing") {
            CallType::Outgoing
        } else {
            CallType::Other(raw)
        }
    }
}

impl From<&str> for CallType {
    fn from(raw: &str) -> Self {
        CallType::from(raw.to_string())
    }
}

impl From<CallType> for String {
    fn from(call_type: CallType) -> Self {
        match call_type {
            CallType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry of the router's call log
///
/// Entries are immutable once fetched. `duration` is zero for calls that
/// were never picked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEntry {
    #[serde(default)]
    pub id: u64,

    #[serde(rename = "type")]
    pub call_type: CallType,

    /// When the call started
    #[serde(rename = "datetime", with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub number: String,

    #[serde(default)]
    pub name: String,

    /// Seconds
    #[serde(default)]
    pub duration: u32,

    /// Not yet acknowledged in the router UI
    #[serde(default)]
    pub new: bool,

    #[serde(default)]
    pub contact_id: Option<u64>,
}

impl CallEntry {
    /// Build an entry with the fields the tracker cares about
    pub fn new(
        number: impl Into<String>,
        name: impl Into<String>,
        call_type: impl Into<CallType>,
        timestamp: DateTime<Utc>,
        duration: u32,
    ) -> Self {
        Self {
            id: 0,
            call_type: call_type.into(),
            timestamp,
            number: number.into(),
            name: name.into(),
            duration,
            new: false,
            contact_id: None,
        }
    }

    /// Start time plus duration
    ///
    /// `None` when the sum falls outside the representable date range,
    /// which a corrupt `datetime` near the upper bound can cause.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .checked_add_signed(Duration::seconds(i64::from(self.duration)))
    }
}

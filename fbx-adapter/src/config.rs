//! Adapter configuration
//!
//! The raw form mirrors what the host framework hands over (JSON, seconds
//! as plain integers). `validate` turns it into the shape the adapter
//! actually runs on.

use std::time::Duration;

use fbx_state::TrackedAddress;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default phone state refresh, in seconds
pub const DEFAULT_PHONE_INTERVAL: i64 = 2;

/// Default call log refresh, in seconds
pub const DEFAULT_CALLS_INTERVAL: i64 = 60;

/// Delay before the first run of every poll job
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// What the adapter represents on the router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceConfig {
    /// The router's phone line
    ///
    /// An interval of zero or less disables the matching job.
    Phone {
        #[serde(default = "default_phone_interval")]
        refresh_phone_interval: i64,

        #[serde(default = "default_calls_interval")]
        refresh_phone_calls_interval: i64,
    },
    /// A LAN device tracked by MAC address
    NetDevice {
        #[serde(default)]
        mac_address: Option<String>,
    },
    /// A LAN interface tracked by IP address
    NetInterface {
        #[serde(default)]
        ip_address: Option<String>,
    },
}

fn default_phone_interval() -> i64 {
    DEFAULT_PHONE_INTERVAL
}

fn default_calls_interval() -> i64 {
    DEFAULT_CALLS_INTERVAL
}

fn default_initial_delay_secs() -> u64 {
    DEFAULT_INITIAL_DELAY.as_secs()
}

/// Configuration of one adapter instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    #[serde(flatten)]
    pub kind: DeviceConfig,

    /// Delay before the first poll, in seconds
    /// Default: 1
    #[serde(rename = "initial_delay", default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::phone(DEFAULT_PHONE_INTERVAL, DEFAULT_CALLS_INTERVAL)
    }
}

impl AdapterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phone(refresh_phone_interval: i64, refresh_phone_calls_interval: i64) -> Self {
        Self {
            kind: DeviceConfig::Phone {
                refresh_phone_interval,
                refresh_phone_calls_interval,
            },
            initial_delay_secs: default_initial_delay_secs(),
        }
    }

    pub fn net_device(mac_address: impl Into<String>) -> Self {
        Self {
            kind: DeviceConfig::NetDevice {
                mac_address: Some(mac_address.into()),
            },
            initial_delay_secs: default_initial_delay_secs(),
        }
    }

    pub fn net_interface(ip_address: impl Into<String>) -> Self {
        Self {
            kind: DeviceConfig::NetInterface {
                ip_address: Some(ip_address.into()),
            },
            initial_delay_secs: default_initial_delay_secs(),
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_secs = delay.as_secs();
        self
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    /// Parse a configuration object
    ///
    /// ```json
    /// { "kind": "phone", "refresh_phone_interval": 5 }
    /// { "kind": "net_device", "mac_address": "00:11:22:33:44:55" }
    /// ```
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Check the configuration and resolve it for the adapter
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let device = match &self.kind {
            DeviceConfig::Phone {
                refresh_phone_interval,
                refresh_phone_calls_interval,
            } => DeviceKind::Phone {
                state_period: period(*refresh_phone_interval),
                calls_period: period(*refresh_phone_calls_interval),
            },
            DeviceConfig::NetDevice { mac_address } => {
                let mac = required(mac_address.as_deref(), "mac_address")?;
                DeviceKind::Network(TrackedAddress::parse_mac(mac)?)
            }
            DeviceConfig::NetInterface { ip_address } => {
                let ip = required(ip_address.as_deref(), "ip_address")?;
                DeviceKind::Network(TrackedAddress::parse_ip(ip)?)
            }
        };

        Ok(ValidatedConfig {
            device,
            initial_delay: self.initial_delay(),
        })
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn period(seconds: i64) -> Option<Duration> {
    u64::try_from(seconds)
        .ok()
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
}

/// Resolved device kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    /// `None` periods are disabled jobs
    Phone {
        state_period: Option<Duration>,
        calls_period: Option<Duration>,
    },
    Network(TrackedAddress),
}

/// Configuration the adapter runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub device: DeviceKind,
    pub initial_delay: Duration,
}

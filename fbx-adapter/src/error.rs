use fbx_api::TransportError;
use fbx_poller::PollingError;
use fbx_state::AddressError;
use thiserror::Error;

/// Configuration rejected at setup
///
/// Raised once, before anything is scheduled.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration parameter: {0}")]
    Missing(&'static str),

    #[error("Invalid tracked address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("Malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Failure of a single poll run
#[derive(Error, Debug)]
pub enum PollError {
    #[error("Router request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Router reported no phone line")]
    EmptyPhoneStatus,
}

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scheduler error: {0}")]
    Polling(#[from] PollingError),
}

//! Router client abstraction
//!
//! The HTTP transport is supplied by the caller. This module only fixes
//! the operations the adapter needs and how a raw response body is turned
//! into typed values.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Result, TransportError};
use crate::{CallEntry, LanHost, PhoneStatus};

/// Operations the adapter performs against the router
///
/// Implementations enforce their own timeouts; a call that never returns
/// stalls only the poll task that issued it.
#[async_trait]
pub trait RouterClient: Send + Sync {
    /// Current state of every phone line
    async fn phone_status(&self) -> Result<Vec<PhoneStatus>>;

    /// The full call log, in whatever order the router returns it
    async fn call_entries(&self) -> Result<Vec<CallEntry>>;

    /// Hosts currently known to the LAN browser
    async fn lan_hosts(&self) -> Result<Vec<LanHost>>;
}

/// Response envelope shared by every router endpoint
///
/// ```json
/// {"success": true, "result": [...]}
/// {"success": false, "error_code": "auth_required", "msg": "..."}
/// ```
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    pub result: Option<T>,

    pub error_code: Option<String>,

    pub msg: Option<String>,
}

impl<T: Default> ApiResponse<T> {
    /// Unwrap the envelope
    ///
    /// A successful response without `result` yields `T::default()`; the
    /// call log endpoint does this when the log is empty.
    pub fn into_result(self) -> Result<T> {
        if self.success {
            return Ok(self.result.unwrap_or_default());
        }

        Err(TransportError::from_api(
            self.error_code.as_deref().unwrap_or("unknown"),
            self.msg.as_deref().unwrap_or(""),
        ))
    }
}

/// Decode a raw response body into `T`
pub fn decode_response<T>(body: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    serde_json::from_str::<ApiResponse<T>>(body)?.into_result()
}

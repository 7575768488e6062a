use thiserror::Error;

/// Errors raised while talking to the router
///
/// Every variant is recoverable: callers are expected to retry on their
/// next poll rather than give up.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response
    ///
    /// Connection refused, timeouts, DNS failures and the like.
    #[error("Network error: {0}")]
    Network(String),

    /// The session token was rejected or lacks the required rights
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The router answered with `success: false`
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl TransportError {
    /// Build the right variant for an API-level failure
    ///
    /// Token and permission failures map to [`TransportError::Auth`].
    pub fn from_api(code: &str, message: &str) -> Self {
        match code {
            "auth_required" | "invalid_token" | "pending_token" | "insufficient_rights" => {
                Self::Auth(format!("{}: {}", code, message))
            }
            _ => Self::Api {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(error: serde_json::Error) -> Self {
        TransportError::Decode(error.to_string())
    }
}

/// Type alias for results that can return a TransportError
pub type Result<T> = std::result::Result<T, TransportError>;

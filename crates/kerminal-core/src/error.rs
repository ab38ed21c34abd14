// ── Core error types ──
//
// User-facing errors from kerminal-core. Consumers never see raw frame or
// JSON failures directly: the `From<kerminal_api::Error>` impl translates
// wire-layer errors into session-level variants.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Not connected!")]
    NotConnected,

    #[error("Already connected to a server")]
    AlreadyConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Connection lost: {reason}")]
    ConnectionLost { reason: String },

    #[error("Network thread unavailable: {0}")]
    NetworkThread(String),

    // ── Data log errors ──────────────────────────────────────────────
    #[error("Parameters can't be changed while log is active")]
    LogActive,

    #[error("{name} is always logged and cannot be removed")]
    MandatoryVariable { name: String },

    #[error("Data log file {}: {reason}", path.display())]
    DataLogFile { path: PathBuf, reason: String },

    // ── Command errors ───────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Malformed payload: {message}")]
    Payload { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// A failed connection attempt, as opposed to a bad request.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Timeout { .. } | Self::ConnectionLost { .. }
        )
    }

    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── Conversion from wire-layer errors ────────────────────────────────

impl From<kerminal_api::Error> for CoreError {
    fn from(err: kerminal_api::Error) -> Self {
        match err {
            kerminal_api::Error::InvalidUrl(e) => CoreError::validation("address", e.to_string()),
            kerminal_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed(reason),
            kerminal_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            kerminal_api::Error::WebSocketClosed { code, reason } => CoreError::ConnectionLost {
                reason: format!("code {code}: {reason}"),
            },
            kerminal_api::Error::Send(reason) => CoreError::ConnectionLost { reason },
            kerminal_api::Error::Serialization(e) => CoreError::Payload {
                message: e.to_string(),
            },
            kerminal_api::Error::Deserialization { message, body: _ } => {
                CoreError::Payload { message }
            }
        }
    }
}

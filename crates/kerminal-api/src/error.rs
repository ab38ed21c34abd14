use thiserror::Error;

/// Top-level error type for the `kerminal-api` crate.
///
/// Covers every failure mode of the datalink wire layer: dialing,
/// the WebSocket session itself, and payload (de)serialization.
/// `kerminal-core` maps these into session-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Addressing ──────────────────────────────────────────────────
    /// The address/port pair does not form a valid datalink URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket handshake failed (refused, unreachable, bad upgrade).
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// The handshake did not complete within the configured bound.
    #[error("WebSocket handshake timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// WebSocket closed unexpectedly mid-stream.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// Writing a frame to the socket failed.
    #[error("WebSocket send failed: {0}")]
    Send(String),

    // ── Data ────────────────────────────────────────────────────────
    /// An outbound message could not be rendered to JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An inbound payload was not a JSON object, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error ended (or prevented) the stream,
    /// as opposed to a single bad payload.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_)
                | Self::WebSocketConnect(_)
                | Self::Timeout { .. }
                | Self::WebSocketClosed { .. }
                | Self::Send(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_errors_are_not_transport_errors() {
        let err = Error::Deserialization {
            message: "expected an object".into(),
            body: "[1,2]".into(),
        };
        assert!(!err.is_transport());
        assert!(Error::WebSocketConnect("refused".into()).is_transport());
    }
}

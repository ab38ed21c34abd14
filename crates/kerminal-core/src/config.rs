// ── Session configuration ──
//
// Everything the core needs to run a datalink session. Built from the
// shared config file by `kerminal-config`, or directly by tests.

use std::path::PathBuf;
use std::time::Duration;

pub use kerminal_api::protocol::DEFAULT_PORT;
use kerminal_api::protocol::RECEIPT_TIME;

/// Default data log file, relative to the working directory.
pub const DEFAULT_DATA_LOG_FILE: &str = "kerminaldata.csv";

/// Default data log column delimiter.
pub const DEFAULT_DELIMITER: &str = ";";

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Update interval requested from the server on every connection.
    /// `None` leaves the server default in place.
    pub rate_ms: Option<u32>,
    /// Flush interval of the message composer.
    pub tick: Duration,
    /// Upper bound on the WebSocket handshake. `None` waits for the OS.
    pub connect_timeout: Option<Duration>,
    /// Variables that are reference-counted locally but never announced
    /// to the server.
    pub no_transmit: Vec<String>,
    /// Data log file used until the user picks another one.
    pub data_log_file: PathBuf,
    /// Column delimiter for data log lines.
    pub data_log_delimiter: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rate_ms: Some(2000),
            tick: Duration::from_millis(100),
            connect_timeout: Some(Duration::from_secs(10)),
            no_transmit: vec![RECEIPT_TIME.to_owned()],
            data_log_file: PathBuf::from(DEFAULT_DATA_LOG_FILE),
            data_log_delimiter: DEFAULT_DELIMITER.to_owned(),
        }
    }
}

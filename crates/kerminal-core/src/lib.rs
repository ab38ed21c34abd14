//! Live-data session layer between `kerminal-api` and the terminal UI.
//!
//! - **[`Session`]** — Process-wide root object. Owns the network thread,
//!   which builds a fresh event loop per connection attempt, streams
//!   inbound records into the [`LiveDataStore`] and flushes the outbound
//!   queue through the [`Composer`] every tick.
//!
//! - **[`SubscriptionLedger`]** — Reference-counted variable membership.
//!   Only 0 → 1 and 1 → 0 transitions reach the server.
//!
//! - **[`DataLogConfig`] / [`DataLogger`]** — Optional delimited file of
//!   selected variables, one line per accepted update.
//!
//! - **[`Command`]** — Typed user commands executed against a session,
//!   with feedback through a leveled [`ResultSink`].
//!
//! Reads from the store are per key. Two values read one after another
//! may come from different inbound messages.

pub mod command;
pub mod composer;
pub mod config;
pub mod datalog;
pub mod error;
pub mod ledger;
mod network;
pub mod outbound;
pub mod session;
mod signal;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, Level, LogCommand, Outcome, ResultSink, execute};
pub use composer::Composer;
pub use config::SessionConfig;
pub use datalog::{DataLogConfig, DataLogger, FileMode};
pub use error::CoreError;
pub use ledger::SubscriptionLedger;
pub use outbound::{EdgeAction, Outbound, OutboundQueue};
pub use session::{ConnectionState, Endpoint, Session};
pub use store::{LiveDataStore, NOT_AVAILABLE};

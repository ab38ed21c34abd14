// ── Session ──
//
// Process-wide root object. Owns the live data store, subscription
// ledger, data log settings and the outbound queue, and drives the one
// network thread that talks to the server.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::datalog::DataLogConfig;
use crate::error::CoreError;
use crate::ledger::SubscriptionLedger;
use crate::network;
use crate::outbound::{OutboundQueue, OutboundReceiver};
use crate::signal::{Resolution, Trigger};
use crate::store::LiveDataStore;

const NETWORK_THREAD_NAME: &str = "kerminal-net";

// ── ConnectionState ──────────────────────────────────────────────────

/// Lifecycle of the single datalink connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No event loop exists.
    Idle,
    /// Event loop built, handshake in flight.
    Connecting,
    /// Handshake done, messages flowing both ways.
    Streaming,
    /// Disconnect requested, event loop winding down.
    Closing,
}

impl ConnectionState {
    pub fn has_event_loop(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "disconnected",
            Self::Connecting => "connecting",
            Self::Streaming => "connected",
            Self::Closing => "closing",
        };
        f.write_str(label)
    }
}

/// Server address the next connection attempt dials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// Handle to the datalink session.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Created once at startup with
/// [`Session::start`] and handed to every consumer: UI panels read the
/// store, command handlers use the ledger and queue.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    pub(crate) config: SessionConfig,
    pub(crate) store: LiveDataStore,
    pub(crate) ledger: Mutex<SubscriptionLedger>,
    pub(crate) datalog: Mutex<DataLogConfig>,
    pub(crate) queue: OutboundQueue,
    state: watch::Sender<ConnectionState>,
    pub(crate) endpoint: Mutex<Option<Endpoint>>,
    pub(crate) make_connection: Trigger,
    pub(crate) resolution: Resolution,
    /// Stop token of the live connection, if any.
    pub(crate) stop: Mutex<Option<CancellationToken>>,
    pub(crate) shutdown: AtomicBool,
    network: Mutex<Option<JoinHandle<()>>>,
}

impl SessionInner {
    pub(crate) fn new(config: SessionConfig) -> (Self, OutboundReceiver) {
        let (queue, rx) = OutboundQueue::channel();
        let (state, _) = watch::channel(ConnectionState::Idle);
        let ledger = SubscriptionLedger::new(queue.clone(), config.no_transmit.iter().cloned());
        let datalog = DataLogConfig::new(
            config.data_log_file.clone(),
            config.data_log_delimiter.clone(),
        );

        let inner = Self {
            config,
            store: LiveDataStore::new(),
            ledger: Mutex::new(ledger),
            datalog: Mutex::new(datalog),
            queue,
            state,
            endpoint: Mutex::new(None),
            make_connection: Trigger::default(),
            resolution: Resolution::default(),
            stop: Mutex::new(None),
            shutdown: AtomicBool::new(false),
            network: Mutex::new(None),
        };
        (inner, rx)
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "connection state changed");
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }
}

impl Session {
    /// Build the session and spawn the network thread.
    pub fn start(config: SessionConfig) -> Result<Self, CoreError> {
        let (inner, rx) = SessionInner::new(config);
        let inner = Arc::new(inner);

        let worker = Arc::clone(&inner);
        let handle = thread::Builder::new()
            .name(NETWORK_THREAD_NAME.into())
            .spawn(move || network::run(&worker, rx))
            .map_err(|e| CoreError::NetworkThread(e.to_string()))?;
        *inner.network.lock() = Some(handle);

        Ok(Self { inner })
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Connect to `address:port` and block until the attempt resolves.
    ///
    /// `Ok` once streaming. A refused, timed-out or cancelled attempt
    /// comes back as an error for which
    /// [`CoreError::is_connection_failure`] holds. Call from a thread that
    /// may block (inside tokio, wrap in `block_in_place`).
    pub fn connect(&self, address: &str, port: u16) -> Result<(), CoreError> {
        if self.inner.shutdown.load(Ordering::Acquire) {
            return Err(CoreError::NetworkThread("session is shut down".into()));
        }
        if self.has_event_loop() {
            return Err(CoreError::AlreadyConnected);
        }

        let endpoint = Endpoint {
            address: address.to_owned(),
            port,
        };
        info!(%endpoint, "connection requested");
        *self.inner.endpoint.lock() = Some(endpoint);

        self.inner.resolution.clear();
        self.inner.make_connection.set();
        self.inner.resolution.wait()
    }

    /// Ask the network thread to close the connection. Returns before
    /// teardown completes; watch [`Session::watch_state`] for `Idle`.
    pub fn disconnect(&self) -> Result<(), CoreError> {
        let stop = self.inner.stop.lock().clone();
        match stop {
            Some(token) if !token.is_cancelled() => {
                info!("disconnect requested");
                token.cancel();
                Ok(())
            }
            _ => Err(CoreError::NotConnected),
        }
    }

    /// Close any connection and stop the network thread. Blocks until the
    /// thread has exited.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
        if let Some(token) = self.inner.stop.lock().as_ref() {
            token.cancel();
        }
        self.inner.make_connection.set();

        let handle = self.inner.network.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("network thread panicked");
            }
        }
    }

    // ── State ────────────────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn connected(&self) -> bool {
        self.state() == ConnectionState::Streaming
    }

    pub fn has_event_loop(&self) -> bool {
        self.state().has_event_loop()
    }

    /// Endpoint of the current or most recent attempt.
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.inner.endpoint.lock().clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    // ── Data access ──────────────────────────────────────────────────

    pub fn store(&self) -> &LiveDataStore {
        &self.inner.store
    }

    /// Lock the subscription ledger. Hold the guard briefly.
    pub fn ledger(&self) -> MutexGuard<'_, SubscriptionLedger> {
        self.inner.ledger.lock()
    }

    /// Lock the data log settings. Hold the guard briefly.
    pub fn datalog(&self) -> MutexGuard<'_, DataLogConfig> {
        self.inner.datalog.lock()
    }

    /// Take a reference on a variable so it streams.
    pub fn subscribe(&self, name: &str) -> bool {
        self.ledger().add(name)
    }

    /// Release a reference taken with [`Session::subscribe`].
    pub fn unsubscribe(&self, name: &str) -> bool {
        self.ledger().release(name)
    }

    /// Queue a message to be sent verbatim on the next tick.
    pub fn send(&self, message: Value) {
        self.inner.queue.raw(message);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("endpoint", &self.endpoint())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn only_idle_has_no_event_loop() {
        assert!(!ConnectionState::Idle.has_event_loop());
        assert!(ConnectionState::Connecting.has_event_loop());
        assert!(ConnectionState::Streaming.has_event_loop());
        assert!(ConnectionState::Closing.has_event_loop());
    }

    #[test]
    fn fresh_session_is_idle() {
        let session = Session::start(SessionConfig::default()).unwrap();
        assert_eq!(session.state(), ConnectionState::Idle);
        assert!(!session.connected());
        assert!(matches!(session.disconnect(), Err(CoreError::NotConnected)));
        session.shutdown();
    }

    #[test]
    fn subscribe_goes_through_the_ledger() {
        let session = Session::start(SessionConfig::default()).unwrap();
        assert!(session.subscribe("v.altitude"));
        assert!(!session.subscribe("v.altitude"));
        assert_eq!(session.ledger().count("v.altitude"), 2);

        assert!(!session.unsubscribe("v.altitude"));
        assert!(session.unsubscribe("v.altitude"));
        assert!(!session.unsubscribe("v.altitude"));
        assert!(!session.ledger().contains("v.altitude"));
        session.shutdown();
    }

    #[test]
    fn connect_after_shutdown_is_refused() {
        let session = Session::start(SessionConfig::default()).unwrap();
        session.shutdown();
        assert!(matches!(
            session.connect("localhost", 8085),
            Err(CoreError::NetworkThread(_))
        ));
    }
}

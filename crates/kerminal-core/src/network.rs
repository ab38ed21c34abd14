// ── Network thread ──
//
// The only code that touches the socket. Sleeps on the make-connection
// trigger, builds a fresh single-threaded runtime for every attempt, runs
// the message pump until the stream ends, then tears everything down and
// goes back to sleep.

use std::fmt;
use std::fmt::Display;
use std::sync::atomic::Ordering;

use chrono::{DateTime, Utc};
use futures_util::{Sink, Stream};
use serde_json::Value;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use kerminal_api::protocol::{self, PAUSED, RECEIPT_TIME};
use kerminal_api::{LinkReader, LinkWriter, Record, link};

use crate::composer::{self, Composer};
use crate::datalog::DataLogger;
use crate::error::CoreError;
use crate::outbound::OutboundReceiver;
use crate::session::{ConnectionState, Endpoint, SessionInner};

/// How one connection attempt ended.
enum Attempt {
    /// Dial or handshake failed.
    Refused(kerminal_api::Error),
    /// Disconnect arrived while dialing.
    Cancelled,
    /// Streamed, then stopped.
    Ended(StreamEnd),
}

/// Why a streaming connection stopped.
#[derive(Debug)]
pub(crate) enum StreamEnd {
    Requested,
    Closed,
    Failed(kerminal_api::Error),
}

impl fmt::Display for StreamEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("disconnect requested"),
            Self::Closed => f.write_str("closed by server"),
            Self::Failed(e) => write!(f, "{e}"),
        }
    }
}

// ── Thread main ──────────────────────────────────────────────────────

pub(crate) fn run(inner: &SessionInner, mut rx: OutboundReceiver) {
    info!("network thread started");
    loop {
        inner.make_connection.take();
        if inner.shutdown.load(Ordering::Acquire) {
            break;
        }
        let endpoint = inner.endpoint.lock().clone();
        match endpoint {
            Some(endpoint) => attempt(inner, &mut rx, &endpoint),
            None => inner
                .resolution
                .resolve(Err(CoreError::ConnectionFailed("no endpoint set".into()))),
        }
    }
    info!("network thread stopped");
}

fn attempt(inner: &SessionInner, rx: &mut OutboundReceiver, endpoint: &Endpoint) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build connection event loop");
            inner.resolution.resolve(Err(CoreError::NetworkThread(e.to_string())));
            return;
        }
    };

    let stop = CancellationToken::new();
    *inner.stop.lock() = Some(stop.clone());
    // shutdown() may have run between the trigger and the token install
    if inner.shutdown.load(Ordering::Acquire) {
        stop.cancel();
    }
    inner.set_state(ConnectionState::Connecting);

    let outcome = runtime.block_on(connect_and_stream(inner, rx, endpoint, &stop));
    drop(runtime);
    inner.stop.lock().take();
    teardown(inner, rx);

    match outcome {
        Attempt::Refused(e) => {
            warn!(%endpoint, error = %e, "connection failed");
            inner.resolution.resolve(Err(e.into()));
        }
        Attempt::Cancelled => {
            info!(%endpoint, "connection attempt cancelled");
            inner
                .resolution
                .resolve(Err(CoreError::ConnectionFailed("cancelled".into())));
        }
        Attempt::Ended(end) => info!(%endpoint, reason = %end, "connection closed"),
    }
}

async fn connect_and_stream(
    inner: &SessionInner,
    rx: &mut OutboundReceiver,
    endpoint: &Endpoint,
    stop: &CancellationToken,
) -> Attempt {
    let dialed = tokio::select! {
        biased;
        () = stop.cancelled() => return Attempt::Cancelled,
        result = link::dial(&endpoint.address, endpoint.port, inner.config.connect_timeout) => result,
    };
    let (mut writer, mut reader) = match dialed {
        Ok(halves) => halves,
        Err(e) => return Attempt::Refused(e),
    };

    // Always-on variables go out before anything the user queued
    if let Err(e) = writer.send_json(&protocol::handshake(inner.config.rate_ms)).await {
        return Attempt::Refused(e);
    }
    inner.set_state(ConnectionState::Streaming);
    inner.resolution.resolve(Ok(()));
    info!(%endpoint, "streaming");

    Attempt::Ended(pump(inner, &mut writer, &mut reader, rx, stop).await)
}

/// Per-connection state reset. Runs after every attempt, failed or not.
fn teardown(inner: &SessionInner, rx: &mut OutboundReceiver) {
    // Published before the ledger reset. Consumers that check for
    // `Streaming` under the ledger lock cannot add to the fresh ledger.
    inner.set_state(ConnectionState::Closing);
    inner.store.clear();
    {
        // Edges are produced under this lock, so resetting and draining
        // together leaves no count without its queued edge.
        let mut ledger = inner.ledger.lock();
        ledger.reset();
        let stale = composer::discard(rx);
        if stale > 0 {
            debug!(stale, "discarded messages queued for the closed connection");
        }
    }
    inner.datalog.lock().reset();
    inner.set_state(ConnectionState::Idle);
}

// ── Message pump ─────────────────────────────────────────────────────

pub(crate) async fn pump<S, R>(
    inner: &SessionInner,
    writer: &mut LinkWriter<S>,
    reader: &mut LinkReader<R>,
    rx: &mut OutboundReceiver,
    stop: &CancellationToken,
) -> StreamEnd
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let mut composer = Composer::new();
    let mut logger = DataLogger::new();
    let mut tick = tokio::time::interval(inner.config.tick);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let end = loop {
        tokio::select! {
            biased;

            () = stop.cancelled() => {
                inner.set_state(ConnectionState::Closing);
                writer.close().await;
                break StreamEnd::Requested;
            }

            _ = tick.tick() => {
                if let Err(e) = flush(&mut composer, writer, rx).await {
                    break StreamEnd::Failed(e);
                }
            }

            frame = reader.next_text() => match frame {
                Ok(Some(text)) => ingest(inner, &text, &mut logger),
                Ok(None) => break StreamEnd::Closed,
                Err(e) => break StreamEnd::Failed(e),
            },
        }
    };

    logger.close();
    end
}

async fn flush<S>(
    composer: &mut Composer,
    writer: &mut LinkWriter<S>,
    rx: &mut OutboundReceiver,
) -> Result<(), kerminal_api::Error>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    for message in composer.drain(rx) {
        match writer.send_json(&message).await {
            Ok(()) => {}
            Err(e) if e.is_transport() => return Err(e),
            Err(e) => warn!(error = %e, "dropping payload that cannot be sent"),
        }
    }
    Ok(())
}

// ── Inbound ──────────────────────────────────────────────────────────

fn ingest(inner: &SessionInner, text: &str, logger: &mut DataLogger) {
    let mut record = match protocol::parse_record(text) {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "discarding unreadable message");
            return;
        }
    };
    record.insert(RECEIPT_TIME.to_owned(), Value::from(receipt_time()));

    if is_paused(&record) {
        trace!("game paused, update discarded");
        return;
    }

    inner.store.merge(record);
    let mut datalog = inner.datalog.lock();
    logger.record(&mut datalog, &inner.store);
}

/// A `true` flag or any non-zero number means paused. Missing, null,
/// `false` and `0` mean live.
fn is_paused(record: &Record) -> bool {
    match record.get(PAUSED) {
        Some(Value::Bool(paused)) => *paused,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v.abs() > 0.0),
        _ => false,
    }
}

/// Seconds since the Unix epoch.
fn receipt_time() -> f64 {
    (Utc::now() - DateTime::UNIX_EPOCH)
        .to_std()
        .map_or(0.0, |elapsed| elapsed.as_secs_f64())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;
    use futures::channel::mpsc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::config::SessionConfig;

    type FrameTx = mpsc::UnboundedSender<Result<Message, tungstenite::Error>>;

    fn fixture() -> (
        SessionInner,
        OutboundReceiver,
        LinkWriter<mpsc::UnboundedSender<Message>>,
        mpsc::UnboundedReceiver<Message>,
        LinkReader<mpsc::UnboundedReceiver<Result<Message, tungstenite::Error>>>,
        FrameTx,
    ) {
        let config = SessionConfig {
            tick: Duration::from_millis(10),
            ..SessionConfig::default()
        };
        let (inner, rx) = SessionInner::new(config);
        let (sink_tx, sink_rx) = mpsc::unbounded();
        let (frame_tx, frame_rx) = mpsc::unbounded();
        (
            inner,
            rx,
            LinkWriter::new(sink_tx),
            sink_rx,
            LinkReader::new(frame_rx),
            frame_tx,
        )
    }

    fn text(frame_tx: &FrameTx, body: &str) {
        frame_tx.unbounded_send(Ok(Message::text(body))).unwrap();
    }

    /// Let the pump run until `name` has been merged into the store.
    async fn settle(inner: &SessionInner, name: &str) {
        while !inner.store.contains(name) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[test]
    fn pause_flag_interpretation() {
        let paused = |v: Value| {
            let mut record = Record::new();
            record.insert(PAUSED.into(), v);
            is_paused(&record)
        };
        assert!(paused(json!(true)));
        assert!(paused(json!(1)));
        assert!(paused(json!(3)));
        assert!(!paused(json!(false)));
        assert!(!paused(json!(0)));
        assert!(!paused(Value::Null));
        assert!(!is_paused(&Record::new()));
    }

    #[tokio::test]
    async fn pump_flushes_edges_and_gates_paused_updates() {
        let (inner, mut rx, mut writer, mut sent, mut reader, frames) = fixture();
        let stop = CancellationToken::new();

        inner.ledger.lock().add("v.altitude");
        text(&frames, r#"{"v.altitude": 100, "p.paused": 0}"#);
        text(&frames, r#"{"v.altitude": 200, "p.paused": true}"#);
        text(&frames, "not json at all");
        text(&frames, r#"{"v.name": "Kerbal X"}"#);

        let driver = async {
            settle(&inner, "v.name").await;
            let edge = sent.next().await;
            stop.cancel();
            edge
        };
        let (end, edge) = tokio::join!(
            pump(&inner, &mut writer, &mut reader, &mut rx, &stop),
            driver
        );

        assert!(matches!(end, StreamEnd::Requested));
        assert_eq!(inner.store.get("v.altitude"), Some(json!(100)));
        assert_eq!(inner.store.get("v.name"), Some(json!("Kerbal X")));
        assert!(inner.store.contains(RECEIPT_TIME));
        assert_eq!(inner.state(), ConnectionState::Closing);

        assert_eq!(edge, Some(Message::text(r#"{"+":["v.altitude"]}"#)));
        assert_eq!(sent.next().await, Some(Message::Close(None)));
    }

    #[tokio::test]
    async fn pump_stops_when_server_goes_away() {
        let (inner, mut rx, mut writer, _sent, mut reader, frames) = fixture();
        let stop = CancellationToken::new();
        drop(frames);

        let end = pump(&inner, &mut writer, &mut reader, &mut rx, &stop).await;
        assert!(matches!(end, StreamEnd::Closed));
    }

    #[tokio::test]
    async fn paused_update_is_not_logged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let (inner, mut rx, mut writer, _sent, mut reader, frames) = fixture();
        {
            let mut datalog = inner.datalog.lock();
            datalog.set_file(&path, crate::datalog::FileMode::Create).unwrap();
            datalog.enable();
        }
        let stop = CancellationToken::new();

        text(&frames, r#"{"t.universalTime": 5.5, "v.missionTime": 1, "p.paused": true}"#);
        text(&frames, r#"{"t.universalTime": 6.5, "v.missionTime": 2, "p.paused": false}"#);

        let driver = async {
            settle(&inner, "t.universalTime").await;
            stop.cancel();
        };
        tokio::join!(pump(&inner, &mut writer, &mut reader, &mut rx, &stop), driver);

        let log = std::fs::read_to_string(&path).unwrap();
        assert_eq!(log, "t.universalTime;v.missionTime\n6.5;2\n");
    }

    #[test]
    fn teardown_resets_per_connection_state() {
        let (inner, mut rx, ..) = fixture();
        inner.ledger.lock().add("v.altitude");
        inner.datalog.lock().add("v.altitude").unwrap();
        inner.datalog.lock().enable();
        let mut record = Record::new();
        record.insert("v.altitude".into(), json!(1));
        inner.store.merge(record);
        inner.set_state(ConnectionState::Streaming);

        teardown(&inner, &mut rx);

        assert!(inner.store.is_empty());
        assert!(inner.ledger.lock().is_empty());
        assert!(!inner.datalog.lock().is_enabled());
        assert_eq!(inner.datalog.lock().header(), "t.universalTime;v.missionTime");
        assert!(rx.try_recv().is_err());
        assert_eq!(inner.state(), ConnectionState::Idle);
    }

    #[test]
    fn teardown_leaves_streaming_before_resetting_the_ledger() {
        let (inner, mut rx, ..) = fixture();
        inner.set_state(ConnectionState::Streaming);

        let ledger = inner.ledger.lock();
        std::thread::scope(|scope| {
            let worker = scope.spawn(|| teardown(&inner, &mut rx));
            while inner.state() == ConnectionState::Streaming {
                std::thread::yield_now();
            }
            // Blocked on the ledger lock held here
            assert_eq!(inner.state(), ConnectionState::Closing);
            drop(ledger);
            worker.join().unwrap();
        });
        assert_eq!(inner.state(), ConnectionState::Idle);
    }
}

//! Duplex datalink connection.
//!
//! [`dial`] performs the WebSocket handshake against a Telemachus server and
//! hands back the two halves of the socket: a [`LinkWriter`] that renders
//! JSON messages to text frames, and a [`LinkReader`] that yields inbound
//! text payloads and swallows control frames.
//!
//! # Example
//!
//! ```rust,ignore
//! use kerminal_api::{link, protocol};
//!
//! let (mut writer, mut reader) = link::dial("localhost", 8085, None).await?;
//! writer.send_json(&protocol::handshake(Some(500))).await?;
//!
//! while let Some(text) = reader.next_text().await? {
//!     let record = protocol::parse_record(&text)?;
//!     println!("{record:?}");
//! }
//! ```

use std::fmt::Display;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::Error;
use crate::protocol::DATALINK_PATH;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build the datalink URL for a server address and port.
pub fn datalink_url(address: &str, port: u16) -> Result<Url, Error> {
    Ok(Url::parse(&format!("ws://{address}:{port}{DATALINK_PATH}"))?)
}

/// Dial the datalink endpoint and split the socket.
///
/// `timeout` bounds the TCP connect plus WebSocket upgrade; `None` waits
/// for the operating system to give up.
pub async fn dial(
    address: &str,
    port: u16,
    timeout: Option<Duration>,
) -> Result<(LinkWriter, LinkReader), Error> {
    let url = datalink_url(address, port)?;
    tracing::info!(url = %url, "Connecting to datalink");

    let handshake = tokio_tungstenite::connect_async(url.as_str());
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, handshake)
            .await
            .map_err(|_| Error::Timeout {
                timeout_secs: limit.as_secs(),
            })?,
        None => handshake.await,
    };

    let (ws_stream, _response) = result.map_err(|e| Error::WebSocketConnect(e.to_string()))?;
    tracing::info!("Datalink connected");

    let (write, read) = ws_stream.split();
    Ok((LinkWriter::new(write), LinkReader::new(read)))
}

// ── Writer half ──────────────────────────────────────────────────────

/// Outbound half of the link.
pub struct LinkWriter<S = SplitSink<WsStream, Message>> {
    sink: S,
}

impl<S> LinkWriter<S>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Render `message` as compact JSON and send it as one text frame.
    pub async fn send_json(&mut self, message: &Value) -> Result<(), Error> {
        let text = serde_json::to_string(message)?;
        tracing::debug!(%text, "Sending message");
        self.sink
            .send(Message::text(text))
            .await
            .map_err(|e| Error::Send(e.to_string()))
    }

    /// Send a close frame and flush. Best-effort: the peer may already be gone.
    pub async fn close(&mut self) {
        if let Err(e) = self.sink.send(Message::Close(None)).await {
            tracing::debug!(error = %e, "Close frame not delivered");
        }
        if let Err(e) = self.sink.close().await {
            tracing::debug!(error = %e, "Sink close failed");
        }
    }
}

// ── Reader half ──────────────────────────────────────────────────────

/// Inbound half of the link.
pub struct LinkReader<R = SplitStream<WsStream>> {
    stream: R,
}

impl<R> LinkReader<R>
where
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    pub fn new(stream: R) -> Self {
        Self { stream }
    }

    /// Wait for the next text payload.
    ///
    /// Returns `Ok(None)` when the peer closes cleanly or the stream ends.
    /// Cancel-safe: a frame is only consumed when this resolves.
    pub async fn next_text(&mut self) -> Result<Option<String>, Error> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                Some(Ok(Message::Binary(bytes))) => {
                    // The server never sends binary; keep it visible for debugging.
                    tracing::debug!(len = bytes.len(), "Ignoring binary frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    if let Some(ref cf) = frame {
                        tracing::info!(
                            code = %cf.code,
                            reason = %cf.reason,
                            "Datalink close frame received"
                        );
                    } else {
                        tracing::info!("Datalink close frame received (no payload)");
                    }
                    return Ok(None);
                }
                Some(Ok(Message::Ping(_))) => {
                    // tungstenite queues the pong reply itself
                    tracing::trace!("Datalink ping");
                }
                Some(Ok(_)) => {}
                Some(Err(tungstenite::Error::ConnectionClosed)) => return Ok(None),
                Some(Err(e)) => {
                    return Err(Error::WebSocketClosed {
                        code: 1006,
                        reason: e.to_string(),
                    });
                }
                None => {
                    tracing::info!("Datalink stream ended");
                    return Ok(None);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures::channel::mpsc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn url_targets_datalink_path() {
        let url = datalink_url("192.168.1.2", 8085).unwrap();
        assert_eq!(url.as_str(), "ws://192.168.1.2:8085/datalink");
    }

    #[test]
    fn url_rejects_garbage_host() {
        assert!(datalink_url("not a host", 8085).is_err());
    }

    #[tokio::test]
    async fn writer_sends_compact_text_frames() {
        let (tx, mut rx) = mpsc::unbounded::<Message>();
        let mut writer = LinkWriter::new(tx);

        writer.send_json(&json!({"+": ["v.altitude"]})).await.unwrap();

        let frame = rx.next().await.unwrap();
        assert_eq!(frame, Message::text(r#"{"+":["v.altitude"]}"#));
    }

    #[tokio::test]
    async fn reader_skips_control_frames_and_stops_on_close() {
        let frames = vec![
            Ok(Message::Ping(Vec::new().into())),
            Ok(Message::Binary(vec![1, 2, 3].into())),
            Ok(Message::text(r#"{"v.altitude":1}"#)),
            Ok(Message::Close(None)),
            Ok(Message::text("never read")),
        ];
        let mut reader = LinkReader::new(futures::stream::iter(frames));

        assert_eq!(
            reader.next_text().await.unwrap().as_deref(),
            Some(r#"{"v.altitude":1}"#)
        );
        assert!(reader.next_text().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reader_reports_transport_errors() {
        let frames = vec![Err(tungstenite::Error::AlreadyClosed)];
        let mut reader = LinkReader::new(futures::stream::iter(frames));

        let err = reader.next_text().await.unwrap_err();
        assert!(matches!(err, Error::WebSocketClosed { code: 1006, .. }));
    }
}

// ── Outbound command queue ──
//
// Unbounded FIFO from any thread to the network thread. Producers hold a
// cloneable `OutboundQueue`; the single receiver is owned by the network
// thread for the lifetime of the process.

use std::fmt;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use kerminal_api::protocol::{SUBSCRIBE, UNSUBSCRIBE};

/// Direction of a subscription edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeAction {
    Subscribe,
    Unsubscribe,
}

impl EdgeAction {
    /// Message key the server expects for this action.
    pub fn wire_key(self) -> &'static str {
        match self {
            Self::Subscribe => SUBSCRIBE,
            Self::Unsubscribe => UNSUBSCRIBE,
        }
    }
}

impl fmt::Display for EdgeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscribe => f.write_str("subscribe"),
            Self::Unsubscribe => f.write_str("unsubscribe"),
        }
    }
}

/// One item travelling to the network thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Forwarded verbatim as its own message.
    Raw(Value),
    /// Coalesced with other edges of the same tick.
    Edge(EdgeAction, String),
}

/// Receiving end, owned by the network thread.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Producer handle for the outbound queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl OutboundQueue {
    pub fn channel() -> (Self, OutboundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn push(&self, item: Outbound) {
        // Only fails once the network thread is gone, i.e. during shutdown
        if let Err(e) = self.tx.send(item) {
            debug!(item = ?e.0, "outbound queue closed, item dropped");
        }
    }

    pub fn raw(&self, message: Value) {
        self.push(Outbound::Raw(message));
    }

    pub fn edge(&self, action: EdgeAction, name: impl Into<String>) {
        self.push(Outbound::Edge(action, name.into()));
    }
}

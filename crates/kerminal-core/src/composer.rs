// ── Message composer ──
//
// Turns the outbound queue into wire messages once per tick. Raw payloads
// keep their queue order and each goes out on its own. Subscription edges
// are folded into a single `{"+": [...], "-": [...]}` message that follows
// every raw payload of the same tick.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tokio::sync::mpsc::error::TryRecvError;

use crate::outbound::{EdgeAction, Outbound, OutboundReceiver};

#[derive(Debug, Default)]
pub struct Composer {
    composition: IndexMap<EdgeAction, Vec<String>>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything queued right now without waiting, and return the
    /// messages to send in order. Empty when nothing was queued.
    pub fn drain(&mut self, rx: &mut OutboundReceiver) -> Vec<Value> {
        let mut messages = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(Outbound::Raw(payload)) => messages.push(payload),
                Ok(Outbound::Edge(action, name)) => {
                    self.composition.entry(action).or_default().push(name);
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if let Some(batch) = self.flush() {
            messages.push(batch);
        }
        messages
    }

    fn flush(&mut self) -> Option<Value> {
        if self.composition.is_empty() {
            return None;
        }
        let batch: Map<String, Value> = self
            .composition
            .drain(..)
            .map(|(action, names)| (action.wire_key().to_owned(), Value::from(names)))
            .collect();
        Some(Value::Object(batch))
    }
}

/// Throw away whatever is queued. Returns how many items were dropped.
pub fn discard(rx: &mut OutboundReceiver) -> usize {
    std::iter::from_fn(|| rx.try_recv().ok()).count()
}

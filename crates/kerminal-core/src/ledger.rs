// ── Subscription ledger ──
//
// Reference-counted membership of streamed variables. Any number of
// consumers can ask for the same variable; the server only hears about
// it on the first `add` and the last `release`.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::trace;

use kerminal_api::protocol::ALWAYS_ON;

use crate::outbound::{EdgeAction, OutboundQueue};

/// Ordered multiset of active variable names.
///
/// Entries are pruned when their count returns to zero, so an absent key
/// and a zero count are indistinguishable.
///
/// Two kinds of names are counted without ever producing an edge:
/// no-transmit names, which the server never hears about, and the
/// always-on names the connection handshake subscribes for its whole
/// lifetime.
#[derive(Debug)]
pub struct SubscriptionLedger {
    counts: IndexMap<String, usize>,
    no_transmit: HashSet<String>,
    pinned: HashSet<&'static str>,
    queue: OutboundQueue,
}

impl SubscriptionLedger {
    pub fn new<I, S>(queue: OutboundQueue, no_transmit: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            counts: IndexMap::new(),
            no_transmit: no_transmit.into_iter().map(Into::into).collect(),
            pinned: ALWAYS_ON.into_iter().collect(),
            queue,
        }
    }

    /// Take one reference on `name`. Returns `true` when this was the
    /// 0 → 1 transition.
    pub fn add(&mut self, name: &str) -> bool {
        let count = self.counts.entry(name.to_owned()).or_insert(0);
        *count += 1;
        let first = *count == 1;
        trace!(name, count = *count, "ledger add");

        if first && self.announces(name) {
            self.queue.edge(EdgeAction::Subscribe, name);
        }
        first
    }

    /// Release one reference on `name`. Unknown names are ignored.
    /// Returns `true` when this was the 1 → 0 transition.
    pub fn release(&mut self, name: &str) -> bool {
        let Some(count) = self.counts.get_mut(name) else {
            return false;
        };
        *count = count.saturating_sub(1);
        trace!(name, count = *count, "ledger release");
        if *count > 0 {
            return false;
        }

        self.counts.shift_remove(name);
        if self.announces(name) {
            self.queue.edge(EdgeAction::Unsubscribe, name);
        }
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.counts.contains_key(name)
    }

    /// Current reference count; zero for unknown names.
    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Active names in first-subscribed order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    fn announces(&self, name: &str) -> bool {
        !self.no_transmit.contains(name) && !self.pinned.contains(name)
    }

    /// Forget every reference without emitting edges. Used once the
    /// connection they belonged to is gone.
    pub fn reset(&mut self) {
        self.counts.clear();
    }
}

// ── Cross-thread signals ──
//
// Blocking handshakes between the UI thread and the network thread. The
// network thread has no async runtime while idle, so these are plain
// mutex + condvar pairs.

use parking_lot::{Condvar, Mutex};

use crate::error::CoreError;

/// Level flag the network thread sleeps on between connections.
#[derive(Debug, Default)]
pub(crate) struct Trigger {
    set: Mutex<bool>,
    cv: Condvar,
}

impl Trigger {
    pub(crate) fn set(&self) {
        *self.set.lock() = true;
        self.cv.notify_all();
    }

    /// Block until the flag is set, then clear it.
    pub(crate) fn take(&self) {
        let mut set = self.set.lock();
        while !*set {
            self.cv.wait(&mut set);
        }
        *set = false;
    }

    #[cfg(test)]
    pub(crate) fn is_set(&self) -> bool {
        *self.set.lock()
    }
}

/// One-shot connection outcome. Each resolution is consumed by exactly
/// one waiter.
#[derive(Debug, Default)]
pub(crate) struct Resolution {
    outcome: Mutex<Option<Result<(), CoreError>>>,
    cv: Condvar,
}

impl Resolution {
    pub(crate) fn resolve(&self, outcome: Result<(), CoreError>) {
        *self.outcome.lock() = Some(outcome);
        self.cv.notify_all();
    }

    /// Forget an outcome nobody waited for.
    pub(crate) fn clear(&self) {
        self.outcome.lock().take();
    }

    /// Block until resolved and consume the outcome.
    pub(crate) fn wait(&self) -> Result<(), CoreError> {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(resolved) = outcome.take() {
                return resolved;
            }
            self.cv.wait(&mut outcome);
        }
    }
}

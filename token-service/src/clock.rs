//! Time source used to stamp and check token expiry

use chrono::Utc;
use std::fmt::Debug;
#[cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(test)]
use std::sync::Arc;

/// Source of the current time in whole seconds since the Unix epoch.
///
/// Expiry is computed against this clock on every introspection, so tests can move time
/// forward without touching the store.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> u64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        // Timestamps before the epoch are clamped to zero
        Utc::now().timestamp().max(0) as u64
    }
}

/// Clock that only moves when told to
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

#[cfg(test)]
impl ManualClock {
    pub fn at(now: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

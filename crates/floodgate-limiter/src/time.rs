//! Time sources for elapsed-time computation.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::types::now_unix_ms;

/// Source of Unix-epoch milliseconds.
///
/// The engine never reads the system clock directly; time flows through
/// this trait so elapsed-time behavior is testable without sleeping.
pub trait TimeSource: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_unix_ms(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_unix_ms(&self) -> u64 {
        now_unix_ms()
    }
}

/// Manually advanced time for deterministic tests.
#[derive(Debug)]
pub struct DeterministicTimeSource {
    now_ms: AtomicU64,
}

impl DeterministicTimeSource {
    /// Create a time source frozen at `start_ms`, wrapped in `Arc` so tests
    /// can keep a handle while the engine owns another.
    pub fn new(start_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            now_ms: AtomicU64::new(start_ms),
        })
    }

    /// Move time forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.now_ms.fetch_add(delta.as_millis() as u64, Ordering::SeqCst);
    }
}

impl TimeSource for DeterministicTimeSource {
    fn now_unix_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_time_advances_on_demand() {
        let time = DeterministicTimeSource::new(1_000);
        assert_eq!(time.now_unix_ms(), 1_000);

        time.advance(Duration::from_secs(3));
        assert_eq!(time.now_unix_ms(), 4_000);

        time.advance(Duration::from_millis(500));
        assert_eq!(time.now_unix_ms(), 4_500);
    }

    #[test]
    fn system_time_is_past_epoch() {
        assert!(SystemTimeSource.now_unix_ms() > 0);
    }
}

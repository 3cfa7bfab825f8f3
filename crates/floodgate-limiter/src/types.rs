//! Bucket state persisted in the shared store.

use serde::Deserialize;
use serde::Serialize;

/// Per-client bucket record.
///
/// Serialized as JSON for human readability when debugging a shared store.
/// The token count and the last-refill timestamp live in one record because
/// the store's compare-and-swap covers a single key: splitting them would
/// reopen the window between refill write and decrement read.
///
/// Capacity and refill rate are deployment configuration, not record fields,
/// so a configuration change takes effect on the next operation instead of
/// being frozen into stale records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketRecord {
    /// Tokens currently available, `0 <= tokens <= capacity`.
    pub tokens: u64,
    /// When tokens were last added (Unix milliseconds). Monotonically
    /// non-decreasing; used only for elapsed-time computation.
    pub last_refill_ms: u64,
}

impl BucketRecord {
    /// A fresh bucket at full capacity.
    pub fn full(capacity: u64, now_ms: u64) -> Self {
        Self {
            tokens: capacity,
            last_refill_ms: now_ms,
        }
    }
}

/// Get current Unix timestamp in milliseconds.
///
/// Returns 0 if system time is before the Unix epoch (should never happen
/// on properly configured systems, but prevents panics).
#[inline]
pub fn now_unix_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_bucket_holds_capacity() {
        let record = BucketRecord::full(10, 1_000);
        assert_eq!(record.tokens, 10);
        assert_eq!(record.last_refill_ms, 1_000);
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = BucketRecord {
            tokens: 7,
            last_refill_ms: 1_234_567,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: BucketRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn now_is_past_epoch() {
        assert!(now_unix_ms() > 0);
    }
}

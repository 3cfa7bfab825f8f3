//! Error types for admission decisions.
//!
//! A denied request is not an error: `allow` returns `Ok(false)` and
//! `check` returns a `Decision`. Errors mean the limiter could not reach a
//! decision at all, and distinguish infrastructure failure from hot
//! contention so callers and dashboards can tell the two apart.

use snafu::Snafu;

/// Errors from limiter operations.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum RateLimitError {
    /// The shared store could not be reached, failed, or timed out.
    #[snafu(display("rate limiter store unavailable: {reason}"))]
    StoreUnavailable {
        /// Description of the underlying failure.
        reason: String,
    },

    /// Too many concurrent writers raced on one bucket within the retry
    /// budget. The store is healthy; the bucket is hot.
    #[snafu(display("bucket '{client_id}' contended: gave up after {attempts} attempts"))]
    ContentionExhausted {
        /// The client whose bucket was contended.
        client_id: String,
        /// Number of atomic-write attempts made.
        attempts: u32,
    },
}

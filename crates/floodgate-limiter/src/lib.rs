//! Cluster-wide token bucket rate limiting over a shared store.
//!
//! Every service instance runs the same [`DistributedRateLimiter`] against
//! one shared key-value store, so a client's budget holds across the whole
//! cluster rather than per process. The engine keeps no durable state of its
//! own: each call re-reads the client's bucket, folds the elapsed-time
//! refill into a single compare-and-swap together with the decrement, and
//! retries a bounded number of times when concurrent writers collide. The
//! store's CAS is the only serialization point; buckets of different
//! clients never contend.
//!
//! ```ignore
//! use floodgate_limiter::{DistributedRateLimiter, RateLimiterConfig};
//!
//! let limiter = DistributedRateLimiter::new(store, RateLimiterConfig::new(10, 1));
//!
//! if limiter.allow("client-42").await? {
//!     // handle the request
//! } else {
//!     // reject with 429
//! }
//! ```

pub mod constants;
pub mod pure;

mod error;
mod rate_limiter;
mod time;
mod types;

pub use error::RateLimitError;
pub use rate_limiter::Decision;
pub use rate_limiter::DistributedRateLimiter;
pub use rate_limiter::FailurePolicy;
pub use rate_limiter::RateLimiterConfig;
pub use time::DeterministicTimeSource;
pub use time::SystemTimeSource;
pub use time::TimeSource;
pub use types::BucketRecord;
pub use types::now_unix_ms;

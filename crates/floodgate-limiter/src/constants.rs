//! Fixed operating bounds for the limiter.

/// Maximum attempts for an atomic read-modify-write before giving up.
///
/// Exceeding this budget surfaces as contention, never as a silent grant or
/// deny.
pub const MAX_CAS_RETRIES: u32 = 5;

/// Initial backoff between contended swap attempts, in microseconds.
pub const CAS_RETRY_INITIAL_BACKOFF_US: u64 = 100;

/// Backoff ceiling between contended swap attempts, in microseconds.
pub const CAS_RETRY_MAX_BACKOFF_US: u64 = 5_000;

/// Default bound on a single store round trip, in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Key prefix for per-client bucket records.
///
/// Namespaces limiter state away from unrelated data in a shared store.
pub const BUCKET_KEY_PREFIX: &str = "ratelimit/bucket/";

//! Distributed token bucket rate limiter.
//!
//! Cluster-wide admission control: every instance drives the same shared
//! store, and the store's compare-and-swap serializes concurrent
//! refill+consume sequences per client. Reading the bucket, folding in the
//! refill, and decrementing commit as one conditional write against the
//! exact bytes previously read, so two racing callers can never both spend
//! the last token.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use floodgate_store::KeyValueStore;
use floodgate_store::KeyValueStoreError;
use floodgate_store::ReadRequest;
use floodgate_store::WriteRequest;
use tracing::debug;
use tracing::warn;

use crate::constants::BUCKET_KEY_PREFIX;
use crate::constants::CAS_RETRY_INITIAL_BACKOFF_US;
use crate::constants::CAS_RETRY_MAX_BACKOFF_US;
use crate::constants::DEFAULT_STORE_TIMEOUT_MS;
use crate::constants::MAX_CAS_RETRIES;
use crate::error::RateLimitError;
use crate::pure::TokenAvailability;
use crate::pure::check_token_availability;
use crate::pure::compute_refill;
use crate::time::SystemTimeSource;
use crate::time::TimeSource;
use crate::types::BucketRecord;

/// Configuration for the rate limiter.
///
/// An explicit value handed to the constructor; there is no ambient global,
/// so tests construct limiters with arbitrary settings side by side.
/// Immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum tokens a bucket holds (burst capacity).
    pub capacity: u64,
    /// Tokens added per second.
    pub refill_rate: u64,
    /// Bound on each store round trip.
    pub store_timeout: Duration,
}

impl RateLimiterConfig {
    /// Create a config with the given capacity and per-second refill rate.
    pub fn new(capacity: u64, refill_rate: u64) -> Self {
        Self {
            capacity,
            refill_rate,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }

    /// Override the per-call store timeout.
    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new(10, 1)
    }
}

/// What to do when the store cannot be consulted.
///
/// Always an explicit argument at the call site, never a hidden default:
/// admitting everything and denying everything are both defensible, and the
/// choice belongs to the caller's availability posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Admit requests while the limiter cannot decide.
    FailOpen,
    /// Deny requests while the limiter cannot decide.
    FailClosed,
}

impl FailurePolicy {
    /// Whether a request is admitted under this policy.
    pub fn admits(self) -> bool {
        matches!(self, FailurePolicy::FailOpen)
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// One token was consumed; `remaining` are left in the bucket.
    Allowed { remaining: u64 },
    /// The bucket is empty; the next token accrues in `retry_after_ms`.
    Denied { retry_after_ms: u64 },
}

impl Decision {
    /// Check if the request was admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Stored bucket state as read: the parsed record plus the raw bytes the
/// conditional write must match. Unparseable bytes leave `record` empty
/// while `raw` still carries them, so reinitialization stays race-free.
struct StoredBucket {
    record: Option<BucketRecord>,
    raw: Option<String>,
}

/// Distributed token bucket rate limiter.
///
/// Holds no durable state: every call re-reads the client's bucket from the
/// shared store and commits changes through compare-and-swap. Buckets of
/// different clients are independent keys and never contend.
pub struct DistributedRateLimiter<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    config: RateLimiterConfig,
    time: Arc<dyn TimeSource>,
}

impl<S: KeyValueStore + ?Sized> DistributedRateLimiter<S> {
    /// Create a new rate limiter on wall-clock time.
    pub fn new(store: Arc<S>, config: RateLimiterConfig) -> Self {
        Self {
            store,
            config,
            time: Arc::new(SystemTimeSource),
        }
    }

    /// Replace the time source (deterministic tests).
    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    /// Admission check: consume one token from the client's bucket.
    ///
    /// `Ok(true)` means exactly one token was durably consumed as of the
    /// moment of success; `Ok(false)` is an ordinary denial, not an error.
    pub async fn allow(&self, client_id: &str) -> Result<bool, RateLimitError> {
        Ok(self.check(client_id).await?.is_allowed())
    }

    /// Admission check returning the full [`Decision`].
    ///
    /// Refill and decrement commit in a single conditional write against
    /// the bytes previously read. On conflict the whole sequence retries
    /// with exponential backoff, up to the fixed attempt budget; exceeding
    /// it surfaces [`RateLimitError::ContentionExhausted`]. An empty bucket
    /// denies immediately without writing.
    pub async fn check(&self, client_id: &str) -> Result<Decision, RateLimitError> {
        let key = bucket_key(client_id);
        let mut attempt = 0u32;
        let mut backoff_us = CAS_RETRY_INITIAL_BACKOFF_US;

        loop {
            let now_ms = self.time.now_unix_ms();
            let stored = self.read_bucket(&key).await?;
            let (tokens, last_refill_ms) = match &stored.record {
                Some(record) => (record.tokens, record.last_refill_ms),
                // Absent or unparseable: fresh bucket at full capacity.
                None => (self.config.capacity, now_ms),
            };

            let refill = compute_refill(tokens, last_refill_ms, now_ms, self.config.refill_rate, self.config.capacity);

            let remaining = match check_token_availability(refill.tokens, self.config.refill_rate) {
                TokenAvailability::Exhausted { retry_after_ms } => {
                    debug!(client = client_id, retry_after_ms, "admission denied");
                    return Ok(Decision::Denied { retry_after_ms });
                }
                TokenAvailability::Available { remaining } => remaining,
            };

            let next = BucketRecord {
                tokens: remaining,
                last_refill_ms: refill.last_refill_ms,
            };
            if self.swap_bucket(&key, stored.raw, &next).await? {
                debug!(client = client_id, remaining, "token consumed");
                return Ok(Decision::Allowed { remaining });
            }

            attempt += 1;
            if attempt >= MAX_CAS_RETRIES {
                return Err(RateLimitError::ContentionExhausted {
                    client_id: client_id.to_string(),
                    attempts: attempt,
                });
            }
            debug!(client = client_id, attempt, "bucket contended, retrying");
            tokio::time::sleep(Duration::from_micros(backoff_us)).await;
            backoff_us = (backoff_us * 2).min(CAS_RETRY_MAX_BACKOFF_US);
        }
    }

    /// Admission check with an explicit policy for store-level failures.
    pub async fn allow_with_policy(&self, client_id: &str, policy: FailurePolicy) -> bool {
        match self.allow(client_id).await {
            Ok(allowed) => allowed,
            Err(error) => {
                warn!(client = client_id, %error, ?policy, "no decision from store, applying failure policy");
                policy.admits()
            }
        }
    }

    /// The configured capacity.
    ///
    /// Uniform across clients today; the per-client signature leaves room
    /// for overrides without an interface change. No store access.
    pub fn capacity(&self, _client_id: &str) -> u64 {
        self.config.capacity
    }

    /// Current available tokens without consuming any.
    ///
    /// Refill is persisted when it changes the record, so this call can
    /// advance the bucket's timestamp even though it never decrements.
    pub async fn available_tokens(&self, client_id: &str) -> Result<u64, RateLimitError> {
        let key = bucket_key(client_id);
        let mut attempt = 0u32;
        let mut backoff_us = CAS_RETRY_INITIAL_BACKOFF_US;

        loop {
            let now_ms = self.time.now_unix_ms();
            let stored = self.read_bucket(&key).await?;

            let next = match &stored.record {
                Some(record) => {
                    let refill =
                        compute_refill(record.tokens, record.last_refill_ms, now_ms, self.config.refill_rate, self.config.capacity);
                    if !refill.dirty {
                        return Ok(refill.tokens);
                    }
                    BucketRecord {
                        tokens: refill.tokens,
                        last_refill_ms: refill.last_refill_ms,
                    }
                }
                // Lazy initialization, including recovery from unparseable
                // state: a conditional create keeps racing first accesses
                // from stacking capacity.
                None => BucketRecord::full(self.config.capacity, now_ms),
            };

            if self.swap_bucket(&key, stored.raw, &next).await? {
                return Ok(next.tokens);
            }

            attempt += 1;
            if attempt >= MAX_CAS_RETRIES {
                return Err(RateLimitError::ContentionExhausted {
                    client_id: client_id.to_string(),
                    attempts: attempt,
                });
            }
            tokio::time::sleep(Duration::from_micros(backoff_us)).await;
            backoff_us = (backoff_us * 2).min(CAS_RETRY_MAX_BACKOFF_US);
        }
    }

    /// Restore the bucket to full capacity.
    pub async fn reset(&self, client_id: &str) -> Result<(), RateLimitError> {
        let key = bucket_key(client_id);
        let mut attempt = 0u32;
        let mut backoff_us = CAS_RETRY_INITIAL_BACKOFF_US;

        loop {
            let now_ms = self.time.now_unix_ms();
            let stored = self.read_bucket(&key).await?;
            let next = BucketRecord::full(self.config.capacity, now_ms);

            if self.swap_bucket(&key, stored.raw, &next).await? {
                debug!(client = client_id, "bucket reset to full capacity");
                return Ok(());
            }

            attempt += 1;
            if attempt >= MAX_CAS_RETRIES {
                return Err(RateLimitError::ContentionExhausted {
                    client_id: client_id.to_string(),
                    attempts: attempt,
                });
            }
            tokio::time::sleep(Duration::from_micros(backoff_us)).await;
            backoff_us = (backoff_us * 2).min(CAS_RETRY_MAX_BACKOFF_US);
        }
    }

    /// Read the stored bucket, tolerating absence and corruption.
    async fn read_bucket(&self, key: &str) -> Result<StoredBucket, RateLimitError> {
        let result = self
            .bounded(self.store.read(ReadRequest::new(key)))
            .await
            .map_err(|e| RateLimitError::StoreUnavailable { reason: e.to_string() })?;

        let raw = result.kv.map(|kv| kv.value);
        let record = match raw.as_deref() {
            Some(value) => match serde_json::from_str::<BucketRecord>(value) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(key, %error, "unparseable bucket state, reinitializing");
                    None
                }
            },
            None => None,
        };

        Ok(StoredBucket { record, raw })
    }

    /// Conditionally install `next` over the bytes previously read.
    ///
    /// `Ok(false)` is a conflict (another writer got there first); store
    /// failures map to [`RateLimitError::StoreUnavailable`].
    async fn swap_bucket(&self, key: &str, expected: Option<String>, next: &BucketRecord) -> Result<bool, RateLimitError> {
        let new_value = serde_json::to_string(next).map_err(|e| RateLimitError::StoreUnavailable {
            reason: format!("encode bucket state: {e}"),
        })?;

        match self
            .bounded(self.store.write(WriteRequest::compare_and_swap(key, expected, new_value)))
            .await
        {
            Ok(_) => Ok(true),
            Err(KeyValueStoreError::CompareAndSwapFailed { .. }) => Ok(false),
            Err(e) => Err(RateLimitError::StoreUnavailable { reason: e.to_string() }),
        }
    }

    /// Bound a store round trip by the configured timeout.
    async fn bounded<T, F>(&self, operation: F) -> Result<T, KeyValueStoreError>
    where
        F: Future<Output = Result<T, KeyValueStoreError>>,
    {
        match tokio::time::timeout(self.config.store_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(KeyValueStoreError::Timeout {
                duration_ms: self.config.store_timeout.as_millis() as u64,
            }),
        }
    }
}

/// Store key for a client's bucket record.
fn bucket_key(client_id: &str) -> String {
    format!("{}{}", BUCKET_KEY_PREFIX, client_id)
}

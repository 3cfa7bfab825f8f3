//! Pure token bucket arithmetic.
//!
//! Side-effect-free functions shared by every limiter operation. Time is
//! passed explicitly, all arithmetic saturates, and token counts are
//! integers: a token either accrued or it did not, and fractional progress
//! is represented by leaving the stored timestamp untouched until a whole
//! token exists (see [`compute_refill`]).

/// Result of folding elapsed time into a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refill {
    /// Token count after replenishment, capped at capacity.
    pub tokens: u64,
    /// Timestamp to persist alongside the count.
    pub last_refill_ms: u64,
    /// Whether the record changed and needs a write.
    pub dirty: bool,
}

/// Fold elapsed time into a stored bucket.
///
/// Returns the bucket unchanged (`dirty: false`) when no whole token
/// accrued: a non-positive elapsed time (clock went backward, or a call in
/// the same millisecond) never subtracts tokens, and a sub-interval elapsed
/// time keeps the stored timestamp so integer flooring never discards
/// partial progress. Only when at least one token is added does the
/// timestamp move to `now_ms`.
///
/// A stored count above `capacity` (possible after a capacity decrease) is
/// clamped on the way out.
#[inline]
pub fn compute_refill(tokens: u64, last_refill_ms: u64, now_ms: u64, refill_rate: u64, capacity: u64) -> Refill {
    let elapsed_ms = now_ms.saturating_sub(last_refill_ms);
    let added = refill_amount(elapsed_ms, refill_rate, capacity);

    if added == 0 {
        return Refill {
            tokens: tokens.min(capacity),
            last_refill_ms,
            dirty: false,
        };
    }

    Refill {
        tokens: tokens.saturating_add(added).min(capacity),
        last_refill_ms: now_ms,
        dirty: true,
    }
}

/// Whole tokens accrued over `elapsed_ms` at `refill_rate` tokens/second.
///
/// Elapsed time is clamped to the interval that fills an empty bucket
/// before multiplying, so `elapsed * rate` stays far from overflow for any
/// realistic magnitudes; the clamp never under-credits because anything at
/// or beyond that interval already yields `capacity` or more.
#[inline]
pub fn refill_amount(elapsed_ms: u64, refill_rate: u64, capacity: u64) -> u64 {
    let clamped_ms = elapsed_ms.min(full_bucket_interval_ms(refill_rate, capacity));
    clamped_ms.saturating_mul(refill_rate) / 1000
}

/// Milliseconds needed to fill an empty bucket, with a second of slack to
/// absorb flooring. Zero when the rate is zero: no amount of time refills.
#[inline]
fn full_bucket_interval_ms(refill_rate: u64, capacity: u64) -> u64 {
    if refill_rate == 0 {
        return 0;
    }
    (capacity.saturating_mul(1000) / refill_rate).saturating_add(1000)
}

/// Wait until the next whole token accrues, in milliseconds.
///
/// `u64::MAX` when the rate is zero: the bucket will never refill.
#[inline]
pub fn next_token_wait_ms(refill_rate: u64) -> u64 {
    if refill_rate == 0 {
        u64::MAX
    } else {
        1000u64.div_ceil(refill_rate)
    }
}

/// Result of a single-token admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAvailability {
    /// A token can be consumed, leaving `remaining`.
    Available { remaining: u64 },
    /// The bucket is empty; retry no sooner than `retry_after_ms`.
    Exhausted { retry_after_ms: u64 },
}

impl TokenAvailability {
    /// Check if a token is available.
    #[inline]
    pub fn is_available(&self) -> bool {
        matches!(self, TokenAvailability::Available { .. })
    }
}

/// Decide whether one token can be consumed from `available`.
#[inline]
pub fn check_token_availability(available: u64, refill_rate: u64) -> TokenAvailability {
    if available > 0 {
        TokenAvailability::Available {
            remaining: available - 1,
        }
    } else {
        TokenAvailability::Exhausted {
            retry_after_ms: next_token_wait_ms(refill_rate),
        }
    }
}


#[cfg(all(test, feature = "bolero"))]
mod property_tests {
    use super::*;
    use bolero::check;

    #[test]
    fn prop_refill_never_exceeds_capacity() {
        check!()
            .with_type::<(u64, u64, u64, u64, u64)>()
            .for_each(|(tokens, last_ms, now_ms, rate, capacity)| {
                let refill = compute_refill(*tokens, *last_ms, *now_ms, *rate, *capacity);
                assert!(refill.tokens <= *capacity);
            });
    }

    #[test]
    fn prop_refill_monotonic_with_time() {
        check!()
            .with_type::<(u64, u64, u64, u64)>()
            .for_each(|(base_ms, delta1, delta2, rate)| {
                let now1 = base_ms.saturating_add(*delta1);
                let now2 = now1.saturating_add(*delta2);

                let first = compute_refill(0, *base_ms, now1, *rate, 100);
                let second = compute_refill(0, *base_ms, now2, *rate, 100);

                assert!(second.tokens >= first.tokens);
            });
    }

    #[test]
    fn prop_clean_refill_writes_nothing() {
        check!()
            .with_type::<(u64, u64, u64, u64, u64)>()
            .for_each(|(tokens, last_ms, now_ms, rate, capacity)| {
                let refill = compute_refill(*tokens, *last_ms, *now_ms, *rate, *capacity);
                if !refill.dirty {
                    assert_eq!(refill.last_refill_ms, *last_ms);
                }
            });
    }
}

//! Error types for store operations.

use snafu::Snafu;

/// Errors from key-value store operations.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub))]
pub enum KeyValueStoreError {
    /// Backend failed (network, storage, or service error).
    #[snafu(display("operation failed: {reason}"))]
    Failed {
        /// Description of the backend failure.
        reason: String,
    },

    /// Operation exceeded its time bound.
    #[snafu(display("operation timed out after {duration_ms}ms"))]
    Timeout {
        /// The bound that was exceeded, in milliseconds.
        duration_ms: u64,
    },

    /// Conditional write found a value other than the expected one.
    ///
    /// `expected: None` means the caller required the key to be absent.
    #[snafu(display("compare-and-swap failed for key '{key}': expected {expected:?}, found {actual:?}"))]
    CompareAndSwapFailed {
        /// Key the swap targeted.
        key: String,
        /// Value the caller expected to find.
        expected: Option<String>,
        /// Value actually present at swap time.
        actual: Option<String>,
    },

    /// Empty keys are not addressable.
    #[snafu(display("key cannot be empty"))]
    EmptyKey,

    /// Key exceeds the fixed size limit.
    #[snafu(display("key size {size} exceeds maximum of {max} bytes"))]
    KeyTooLarge {
        /// Size of the rejected key.
        size: u32,
        /// The fixed limit.
        max: u32,
    },

    /// Value exceeds the fixed size limit.
    #[snafu(display("value size {size} exceeds maximum of {max} bytes"))]
    ValueTooLarge {
        /// Size of the rejected value.
        size: u32,
        /// The fixed limit.
        max: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display() {
        let err = KeyValueStoreError::Timeout { duration_ms: 5000 };
        assert_eq!(err.to_string(), "operation timed out after 5000ms");
    }

    #[test]
    fn failed_display() {
        let err = KeyValueStoreError::Failed {
            reason: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "operation failed: connection refused");
    }

    #[test]
    fn compare_and_swap_failed_display() {
        let err = KeyValueStoreError::CompareAndSwapFailed {
            key: "counter".to_string(),
            expected: Some("10".to_string()),
            actual: Some("11".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "compare-and-swap failed for key 'counter': expected Some(\"10\"), found Some(\"11\")"
        );
    }

    #[test]
    fn compare_and_swap_failed_absent_expected_display() {
        let err = KeyValueStoreError::CompareAndSwapFailed {
            key: "fresh".to_string(),
            expected: None,
            actual: Some("exists".to_string()),
        };
        assert!(err.to_string().contains("expected None"));
        assert!(err.to_string().contains("found Some"));
    }

    #[test]
    fn size_limit_displays() {
        let err = KeyValueStoreError::KeyTooLarge { size: 2048, max: 1024 };
        assert_eq!(err.to_string(), "key size 2048 exceeds maximum of 1024 bytes");

        let err = KeyValueStoreError::ValueTooLarge {
            size: 2_000_000,
            max: 1_000_000,
        };
        assert_eq!(err.to_string(), "value size 2000000 exceeds maximum of 1000000 bytes");
    }

    #[test]
    fn error_equality() {
        assert_eq!(KeyValueStoreError::EmptyKey, KeyValueStoreError::EmptyKey);
        assert_ne!(
            KeyValueStoreError::EmptyKey,
            KeyValueStoreError::Timeout { duration_ms: 100 }
        );
    }
}

//! Key-value operation types.

use serde::Deserialize;
use serde::Serialize;

use crate::error::KeyValueStoreError;

/// Maximum size of a single key in bytes (1 KB).
///
/// Fixed limit, applied to every write before it reaches the backend.
pub const MAX_KEY_SIZE: u32 = 1024;

/// Maximum size of a single value in bytes (1 MB).
pub const MAX_VALUE_SIZE: u32 = 1024 * 1024;

/// Commands for modifying key-value state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum WriteCommand {
    /// Set a single key-value pair, overwriting any current value.
    Set { key: String, value: String },
    /// Compare-and-swap: atomically update the value only if the current
    /// value matches `expected`. `expected: None` requires the key to be
    /// absent and creates it.
    CompareAndSwap {
        key: String,
        expected: Option<String>,
        new_value: String,
    },
}

/// Request to perform a write operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteRequest {
    pub command: WriteCommand,
}

impl WriteRequest {
    /// Create a Set command to store a key-value pair.
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            command: WriteCommand::Set {
                key: key.into(),
                value: value.into(),
            },
        }
    }

    /// Create a CompareAndSwap command.
    pub fn compare_and_swap(key: impl Into<String>, expected: Option<String>, new_value: impl Into<String>) -> Self {
        Self {
            command: WriteCommand::CompareAndSwap {
                key: key.into(),
                expected,
                new_value: new_value.into(),
            },
        }
    }
}

/// Result of a successful write operation.
///
/// A failed conditional write is reported through
/// [`KeyValueStoreError::CompareAndSwapFailed`], not through this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteResult {}

/// Request to read a single key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadRequest {
    pub key: String,
}

impl ReadRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Response from a read operation. `kv: None` means the key is absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadResult {
    pub kv: Option<KeyValue>,
}

/// A stored key-value pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Validate a write command against fixed size limits.
pub fn validate_write_command(command: &WriteCommand) -> Result<(), KeyValueStoreError> {
    let check_key = |key: &str| {
        if key.is_empty() {
            return Err(KeyValueStoreError::EmptyKey);
        }
        let len = key.len();
        if len > MAX_KEY_SIZE as usize {
            Err(KeyValueStoreError::KeyTooLarge {
                size: len as u32,
                max: MAX_KEY_SIZE,
            })
        } else {
            Ok(())
        }
    };

    let check_value = |value: &str| {
        let len = value.len();
        if len > MAX_VALUE_SIZE as usize {
            Err(KeyValueStoreError::ValueTooLarge {
                size: len as u32,
                max: MAX_VALUE_SIZE,
            })
        } else {
            Ok(())
        }
    };

    match command {
        WriteCommand::Set { key, value } => {
            check_key(key)?;
            check_value(value)?;
        }
        WriteCommand::CompareAndSwap {
            key,
            expected,
            new_value,
        } => {
            check_key(key)?;
            if let Some(exp) = expected {
                check_value(exp)?;
            }
            check_value(new_value)?;
        }
    }

    Ok(())
}

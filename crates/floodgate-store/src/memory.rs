//! In-memory reference store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::KeyValueStoreError;
use crate::kv::KeyValue;
use crate::kv::ReadRequest;
use crate::kv::ReadResult;
use crate::kv::WriteCommand;
use crate::kv::WriteRequest;
use crate::kv::WriteResult;
use crate::kv::validate_write_command;
use crate::traits::KeyValueStore;

/// A thread-safe in-memory key-value store.
///
/// The reference implementation of [`KeyValueStore`] for unit and
/// concurrency tests. Compare-and-swap holds the write guard across the
/// compare and the write, so it is atomic with respect to every other
/// write, which is the property the real store must provide.
pub struct InMemoryKeyValueStore {
    data: RwLock<BTreeMap<String, String>>,
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
        }
    }
}

impl InMemoryKeyValueStore {
    /// Create a new store wrapped in `Arc`, ready to share across tasks.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError> {
        validate_write_command(&request.command)?;
        let mut data = self.data.write().await;

        match request.command {
            WriteCommand::Set { key, value } => {
                data.insert(key, value);
            }
            WriteCommand::CompareAndSwap {
                key,
                expected,
                new_value,
            } => {
                let actual = data.get(&key).cloned();
                if actual == expected {
                    data.insert(key, new_value);
                } else {
                    return Err(KeyValueStoreError::CompareAndSwapFailed { key, expected, actual });
                }
            }
        }

        Ok(WriteResult::default())
    }

    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError> {
        let data = self.data.read().await;
        Ok(ReadResult {
            kv: data.get(&request.key).map(|value| KeyValue {
                key: request.key.clone(),
                value: value.clone(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_read_round_trips() {
        let store = InMemoryKeyValueStore::new();
        store.write(WriteRequest::set("k", "v")).await.unwrap();

        let result = store.read(ReadRequest::new("k")).await.unwrap();
        assert_eq!(result.kv.unwrap().value, "v");
    }

    #[tokio::test]
    async fn absent_key_reads_as_none() {
        let store = InMemoryKeyValueStore::new();
        let result = store.read(ReadRequest::new("missing")).await.unwrap();
        assert!(result.kv.is_none());
    }

    #[tokio::test]
    async fn cas_succeeds_when_expectation_matches() {
        let store = InMemoryKeyValueStore::new();
        store.write(WriteRequest::set("k", "old")).await.unwrap();

        store
            .write(WriteRequest::compare_and_swap("k", Some("old".into()), "new"))
            .await
            .unwrap();

        let result = store.read(ReadRequest::new("k")).await.unwrap();
        assert_eq!(result.kv.unwrap().value, "new");
    }

    #[tokio::test]
    async fn cas_fails_with_expected_and_actual() {
        let store = InMemoryKeyValueStore::new();
        store.write(WriteRequest::set("k", "current")).await.unwrap();

        let err = store
            .write(WriteRequest::compare_and_swap("k", Some("stale".into()), "new"))
            .await
            .unwrap_err();

        match err {
            KeyValueStoreError::CompareAndSwapFailed { key, expected, actual } => {
                assert_eq!(key, "k");
                assert_eq!(expected.as_deref(), Some("stale"));
                assert_eq!(actual.as_deref(), Some("current"));
            }
            other => panic!("expected CompareAndSwapFailed, got {other:?}"),
        }

        // The stored value is untouched by the failed swap.
        let result = store.read(ReadRequest::new("k")).await.unwrap();
        assert_eq!(result.kv.unwrap().value, "current");
    }

    #[tokio::test]
    async fn cas_with_absent_expectation_creates_key() {
        let store = InMemoryKeyValueStore::new();

        store
            .write(WriteRequest::compare_and_swap("fresh", None, "v"))
            .await
            .unwrap();

        let result = store.read(ReadRequest::new("fresh")).await.unwrap();
        assert_eq!(result.kv.unwrap().value, "v");
    }

    #[tokio::test]
    async fn conditional_create_fails_if_key_exists() {
        let store = InMemoryKeyValueStore::new();
        store.write(WriteRequest::set("k", "v")).await.unwrap();

        let err = store
            .write(WriteRequest::compare_and_swap("k", None, "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, KeyValueStoreError::CompareAndSwapFailed { .. }));
    }

    #[tokio::test]
    async fn write_validation_applies() {
        let store = InMemoryKeyValueStore::new();
        let err = store.write(WriteRequest::set("", "v")).await.unwrap_err();
        assert!(matches!(err, KeyValueStoreError::EmptyKey));
    }

    #[tokio::test]
    async fn usable_as_trait_object() {
        let store: Arc<dyn KeyValueStore> = InMemoryKeyValueStore::new();
        store.write(WriteRequest::set("k", "v")).await.unwrap();
        let result = store.read(ReadRequest::new("k")).await.unwrap();
        assert_eq!(result.kv.unwrap().value, "v");
    }
}

//! The store contract consumed by coordination code.

use async_trait::async_trait;

use crate::error::KeyValueStoreError;
use crate::kv::ReadRequest;
use crate::kv::ReadResult;
use crate::kv::WriteRequest;
use crate::kv::WriteResult;

/// Shared key-value store interface.
///
/// Implementations front a store shared by every service instance; the
/// `CompareAndSwap` write command is the one serialization point concurrent
/// writers have, so it must be atomic with respect to all other writes to
/// the same key. Implementations must not cache reads across calls - a
/// stale local copy would defeat the conditional write.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Write a key-value pair, unconditionally or conditionally.
    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError>;

    /// Read a value by key. Absence is `Ok` with `kv: None`.
    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError> {
        (**self).write(request).await
    }

    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError> {
        (**self).read(request).await
    }
}

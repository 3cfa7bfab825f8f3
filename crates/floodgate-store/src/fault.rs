//! Fault injection at the store seam.
//!
//! Wraps any [`KeyValueStore`] and injects failures or stalls on the read
//! and write paths. All injections are reversible: each knob can be cleared
//! individually, or [`UnreliableKeyValueStore::heal`] clears everything.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::KeyValueStoreError;
use crate::kv::ReadRequest;
use crate::kv::ReadResult;
use crate::kv::WriteRequest;
use crate::kv::WriteResult;
use crate::traits::KeyValueStore;

/// A store decorator that misbehaves on demand.
///
/// Failing paths return [`KeyValueStoreError::Failed`]; stalled paths sleep
/// for the configured duration before forwarding, which lets callers
/// exercise their own time bounds against an otherwise healthy store.
pub struct UnreliableKeyValueStore<S: KeyValueStore + ?Sized> {
    inner: Arc<S>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    /// Stall durations in milliseconds; 0 means no stall.
    stall_reads_ms: AtomicU64,
    stall_writes_ms: AtomicU64,
}

impl<S: KeyValueStore + ?Sized> UnreliableKeyValueStore<S> {
    /// Wrap a store with all faults disabled.
    pub fn new(inner: Arc<S>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            stall_reads_ms: AtomicU64::new(0),
            stall_writes_ms: AtomicU64::new(0),
        })
    }

    /// Make reads fail until cleared.
    pub fn fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::SeqCst);
    }

    /// Make writes fail until cleared.
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Delay every read by `delay` before forwarding.
    pub fn stall_reads(&self, delay: Duration) {
        self.stall_reads_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Delay every write by `delay` before forwarding.
    pub fn stall_writes(&self, delay: Duration) {
        self.stall_writes_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Clear every injected fault.
    pub fn heal(&self) {
        self.fail_reads.store(false, Ordering::SeqCst);
        self.fail_writes.store(false, Ordering::SeqCst);
        self.stall_reads_ms.store(0, Ordering::SeqCst);
        self.stall_writes_ms.store(0, Ordering::SeqCst);
    }

    async fn stall(ms: u64) {
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for UnreliableKeyValueStore<S> {
    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError> {
        Self::stall(self.stall_writes_ms.load(Ordering::SeqCst)).await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KeyValueStoreError::Failed {
                reason: "injected write fault".to_string(),
            });
        }
        self.inner.write(request).await
    }

    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError> {
        Self::stall(self.stall_reads_ms.load(Ordering::SeqCst)).await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(KeyValueStoreError::Failed {
                reason: "injected read fault".to_string(),
            });
        }
        self.inner.read(request).await
    }
}

//! Typed interface to a shared key-value store.
//!
//! This crate defines the store contract that coordination code builds on:
//! bounded reads, unconditional writes, and an atomic compare-and-swap that
//! serializes concurrent writers without an explicit lock. The store itself
//! lives elsewhere (a remote service shared by every instance); everything
//! here is the seam it is consumed through.
//!
//! Absence is not an error on the read path: a missing key reads back as
//! `Ok` with no body, leaving "what does absence mean" to the caller.
//!
//! Two implementations ship with the crate:
//!
//! - [`InMemoryKeyValueStore`] - thread-safe reference store for tests
//! - [`UnreliableKeyValueStore`] - fault-injecting decorator for failure-path
//!   tests

mod error;
mod kv;
mod traits;

pub mod fault;
pub mod memory;

pub use error::KeyValueStoreError;
pub use fault::UnreliableKeyValueStore;
pub use kv::KeyValue;
pub use kv::MAX_KEY_SIZE;
pub use kv::MAX_VALUE_SIZE;
pub use kv::ReadRequest;
pub use kv::ReadResult;
pub use kv::WriteCommand;
pub use kv::WriteRequest;
pub use kv::WriteResult;
pub use kv::validate_write_command;
pub use memory::InMemoryKeyValueStore;
pub use traits::KeyValueStore;

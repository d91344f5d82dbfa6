//! Abstract interface for durable key-value storage of whole records.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

/// Marker trait for `Store` errors.
pub trait StoreError: Debug + Error + Send + Sync + 'static {}

/// A trait representing a key-value store with asynchronous operations.
///
/// Values are opaque byte blobs that are always read and written whole.
///
/// # Associated Types
/// - `Error`: The error type that implements `StoreError`.
///
/// # Required Methods
/// - `async fn get(&self, key: String) -> Result<Option<Bytes>, Self::Error>`: Retrieves the value associated with a key.
/// - `async fn put(&self, key: String, bytes: Bytes) -> Result<(), Self::Error>`: Replaces the value associated with a key.
#[async_trait]
pub trait Store: Clone + Debug + Send + Sync + 'static {
    /// The error type for store operations.
    type Error: StoreError;

    /// Retrieves the value stored under `key`, or `None` if it was never written.
    async fn get<K: Into<String> + Send>(&self, key: K) -> Result<Option<Bytes>, Self::Error>;

    /// Replaces the value stored under `key`.
    ///
    /// Implementations must make the replacement atomic: a concurrent or
    /// subsequent reader observes either the previous value or `bytes` in
    /// full, never a mixture, even if the write is interrupted.
    async fn put<K: Into<String> + Send>(&self, key: K, bytes: Bytes) -> Result<(), Self::Error>;
}

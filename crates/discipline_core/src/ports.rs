//! crates/discipline_core/src/ports.rs
//!
//! Defines the service contracts (traits) the case logic depends on.
//! The host environment decides how values are persisted and how change
//! notifications travel between sessions.

use crate::keys::StoreKey;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port and repository operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// A whole-value key-value store shared by every session of one origin.
///
/// Values are raw text, exactly as written. Reads never observe a partial write.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, key: StoreKey) -> PortResult<Option<String>>;

    async fn set(&self, key: StoreKey, value: String) -> PortResult<()>;

    async fn remove(&self, key: StoreKey) -> PortResult<()>;
}

/// A stream of change notifications, each naming the key that was written.
pub type ChangeStream = Pin<Box<dyn Stream<Item = StoreKey> + Send>>;

/// Publishes and delivers store-change notifications between sessions.
pub trait ChangeNotifier: Send + Sync {
    /// Announces that `key` was written or removed.
    fn publish(&self, key: StoreKey);

    /// Returns a stream of changes to any of `keys`, starting from now.
    fn subscribe(&self, keys: &[StoreKey]) -> ChangeStream;
}

//! Watchlist Store Port (Driven Port)
//!
//! Interface for the deduplicating set of watched symbols.

use async_trait::async_trait;

use crate::domain::symbol::Symbol;

/// Storage error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// Backing medium unreachable.
    #[error("storage connection error: {0}")]
    Connection(String),

    /// Statement failed.
    #[error("storage query error: {0}")]
    Query(String),

    /// Stored data could not be interpreted.
    #[error("storage integrity error: {0}")]
    Integrity(String),
}

/// Port for the watchlist store.
///
/// Implementations must be safe to call concurrently. Concurrent `add` calls
/// for the same symbol must report `true` to exactly one caller; the backing
/// medium is the arbiter of uniqueness.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Insert the symbol if absent.
    ///
    /// Returns `true` if the symbol was newly added and `false` if it was
    /// already present. An existing symbol is not an error.
    async fn add(&self, symbol: &Symbol) -> Result<bool, StorageError>;

    /// Every stored symbol, in no particular order.
    async fn get_all(&self) -> Result<Vec<Symbol>, StorageError>;

    /// Check that the backing medium is reachable.
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

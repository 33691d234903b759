//! In-memory watchlist store.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{StorageError, WatchlistStore};
use crate::domain::symbol::Symbol;

/// Process-local implementation of `WatchlistStore`.
///
/// A single reader/writer lock guards the set, so the uniqueness check and
/// the insert happen under one exclusive section. Contents are lost on
/// restart, and the lock cannot coordinate across processes.
#[derive(Debug, Default)]
pub struct InMemoryWatchlistStore {
    symbols: RwLock<HashSet<Symbol>>,
}

impl InMemoryWatchlistStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.read().len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.read().is_empty()
    }

    /// Check if a symbol is stored.
    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.read().contains(symbol)
    }
}

#[async_trait]
impl WatchlistStore for InMemoryWatchlistStore {
    async fn add(&self, symbol: &Symbol) -> Result<bool, StorageError> {
        Ok(self.symbols.write().insert(symbol.clone()))
    }

    async fn get_all(&self) -> Result<Vec<Symbol>, StorageError> {
        Ok(self.symbols.read().iter().cloned().collect())
    }
}

//! Watchlist Use Cases
//!
//! Synchronous request paths behind the HTTP gateway. Adding a symbol only
//! validates and enqueues it; the consumer stores it later.

use std::sync::Arc;

use super::producer::IngestionProducer;
use crate::application::ports::{
    BrokerError, QuoteSource, QuoteSourceError, StorageError, WatchlistStore,
};
use crate::domain::quote::QuoteSnapshot;
use crate::domain::symbol::{Symbol, SymbolError};
use crate::infrastructure::metrics::{self, LookupOutcome};

/// Failure of a watchlist use case.
#[derive(Debug, thiserror::Error)]
pub enum WatchlistError {
    /// Symbol failed validation.
    #[error(transparent)]
    Validation(#[from] SymbolError),

    /// Quote source has no such asset.
    #[error("asset {0} not found")]
    NotFound(Symbol),

    /// Quote source failed.
    #[error("failed to fetch quote: {0}")]
    Upstream(#[from] QuoteSourceError),

    /// Broker did not accept the snapshot.
    #[error("failed to enqueue asset: {0}")]
    Publish(#[from] BrokerError),

    /// Store failed.
    #[error("failed to read watchlist: {0}")]
    Storage(#[from] StorageError),
}

/// Gateway-facing operations.
#[derive(Clone)]
pub struct WatchlistService {
    quotes: Arc<dyn QuoteSource>,
    store: Arc<dyn WatchlistStore>,
    producer: IngestionProducer,
}

impl std::fmt::Debug for WatchlistService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchlistService")
            .field("producer", &self.producer)
            .finish_non_exhaustive()
    }
}

impl WatchlistService {
    /// Create a new service.
    #[must_use]
    pub fn new(
        quotes: Arc<dyn QuoteSource>,
        store: Arc<dyn WatchlistStore>,
        producer: IngestionProducer,
    ) -> Self {
        Self {
            quotes,
            store,
            producer,
        }
    }

    /// Validate `raw`, fetch its quote and enqueue the snapshot.
    ///
    /// Returns the enqueued snapshot. Success does not mean the symbol is
    /// stored yet.
    ///
    /// # Errors
    ///
    /// `Validation`, `NotFound`, `Upstream` or `Publish`. Nothing is
    /// enqueued unless the call succeeds.
    pub async fn add_to_watchlist(&self, raw: &str) -> Result<QuoteSnapshot, WatchlistError> {
        let symbol = Symbol::parse(raw)?;
        let snapshot = self.lookup(&symbol).await?;

        self.producer.enqueue(&snapshot).await?;

        tracing::info!(symbol = %snapshot.symbol, price = snapshot.price, "Asset sent to queue");
        Ok(snapshot)
    }

    /// Every stored symbol, sorted.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store cannot be read.
    pub async fn list_watchlist(&self) -> Result<Vec<Symbol>, WatchlistError> {
        let mut symbols = self.store.get_all().await?;
        symbols.sort_unstable();
        Ok(symbols)
    }

    /// Current quote for `raw`, without touching the watchlist.
    ///
    /// # Errors
    ///
    /// `Validation`, `NotFound` or `Upstream`.
    pub async fn asset_price(&self, raw: &str) -> Result<QuoteSnapshot, WatchlistError> {
        let symbol = Symbol::parse(raw)?;
        self.lookup(&symbol).await
    }

    /// Check that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn ready(&self) -> Result<(), StorageError> {
        self.store.ping().await
    }

    async fn lookup(&self, symbol: &Symbol) -> Result<QuoteSnapshot, WatchlistError> {
        match self.quotes.get_quote(symbol).await {
            Ok(Some(snapshot)) => {
                metrics::record_quote_lookup(LookupOutcome::Found);
                Ok(snapshot)
            }
            Ok(None) => {
                metrics::record_quote_lookup(LookupOutcome::NotFound);
                tracing::info!(symbol = %symbol, "Asset not found");
                Err(WatchlistError::NotFound(symbol.clone()))
            }
            Err(e) => {
                metrics::record_quote_lookup(LookupOutcome::Error);
                tracing::warn!(symbol = %symbol, error = %e, "Quote lookup failed");
                Err(e.into())
            }
        }
    }
}

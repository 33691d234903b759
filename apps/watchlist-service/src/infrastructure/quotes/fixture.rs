//! Fixed in-process quote source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{QuoteSource, QuoteSourceError};
use crate::domain::quote::QuoteSnapshot;
use crate::domain::symbol::Symbol;

/// Quote source answering from a mutable table of snapshots.
///
/// Used when no API key is configured and as a test double that can be
/// switched into an outage with [`StaticQuoteSource::set_unavailable`].
#[derive(Debug, Default)]
pub struct StaticQuoteSource {
    quotes: RwLock<HashMap<Symbol, QuoteSnapshot>>,
    outage: RwLock<Option<String>>,
    lookups: AtomicU64,
}

impl StaticQuoteSource {
    /// Create an empty source; every lookup is "not found".
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source preloaded with a few well-known tickers.
    #[must_use]
    pub fn with_sample_quotes() -> Self {
        let source = Self::new();
        for (raw, price, high, low) in [
            ("AAPL", 189.84, 191.05, 187.45),
            ("MSFT", 415.5, 418.2, 411.1),
            ("TSLA", 250.12, 255.5, 245.25),
            ("NVDA", 880.08, 894.0, 868.3),
        ] {
            if let Ok(symbol) = Symbol::parse(raw) {
                source.insert(QuoteSnapshot::new(symbol, price, high, low));
            }
        }
        source
    }

    /// Add or replace a quote.
    pub fn insert(&self, quote: QuoteSnapshot) {
        self.quotes.write().insert(quote.symbol.clone(), quote);
    }

    /// Remove a quote so later lookups report "not found".
    pub fn remove(&self, symbol: &Symbol) {
        self.quotes.write().remove(symbol);
    }

    /// Fail every lookup with `QuoteSourceError::Unavailable` until cleared.
    pub fn set_unavailable(&self, reason: Option<&str>) {
        *self.outage.write() = reason.map(str::to_string);
    }

    /// Number of lookups served so far.
    #[must_use]
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl QuoteSource for StaticQuoteSource {
    async fn get_quote(&self, symbol: &Symbol) -> Result<Option<QuoteSnapshot>, QuoteSourceError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        if let Some(reason) = self.outage.read().clone() {
            return Err(QuoteSourceError::Unavailable(reason));
        }
        Ok(self.quotes.read().get(symbol).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(raw: &str) -> Symbol {
        Symbol::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn sample_quotes_are_loaded() {
        let source = StaticQuoteSource::with_sample_quotes();
        let quote = source.get_quote(&sym("tsla")).await.unwrap().unwrap();
        assert_eq!(quote.price, 250.12);
        assert!(source.get_quote(&sym("ZZZZ")).await.unwrap().is_none());
        assert_eq!(source.lookups(), 2);
    }

    #[tokio::test]
    async fn outage_toggles() {
        let source = StaticQuoteSource::with_sample_quotes();

        source.set_unavailable(Some("maintenance"));
        assert!(matches!(
            source.get_quote(&sym("AAPL")).await,
            Err(QuoteSourceError::Unavailable(reason)) if reason == "maintenance"
        ));

        source.set_unavailable(None);
        assert!(source.get_quote(&sym("AAPL")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn remove_makes_symbol_unknown() {
        let source = StaticQuoteSource::with_sample_quotes();
        source.remove(&sym("AAPL"));
        assert!(source.get_quote(&sym("AAPL")).await.unwrap().is_none());
    }
}

//! Application Ports (Driven)
//!
//! Interfaces the ingestion pipeline depends on. Infrastructure adapters
//! implement these; services only ever see the traits.
//!
//! - `WatchlistStore`: deduplicating symbol set (in-memory or SQLite)
//! - `MessageBroker` / `MessageStream`: topic publish and consumer-group pull
//! - `QuoteSource`: upstream point-in-time quote lookup

mod message_broker_port;
mod quote_source_port;
mod watchlist_store_port;

pub use message_broker_port::{BrokerError, BrokerMessage, MessageBroker, MessageStream};
pub use quote_source_port::{QuoteSource, QuoteSourceError};
pub use watchlist_store_port::{StorageError, WatchlistStore};

#[cfg(test)]
pub use quote_source_port::MockQuoteSource;
#[cfg(test)]
pub use watchlist_store_port::MockWatchlistStore;

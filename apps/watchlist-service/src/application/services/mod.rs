//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `WatchlistService`: gateway use cases (add, list, price)
//! - `IngestionProducer`: publishes quote snapshots to the watchlist topic
//! - `IngestionConsumer`: drains the topic into the watchlist store

mod consumer;
mod producer;
mod retry;
mod watchlist;

pub use consumer::{ConsumerStats, ConsumerStatsSnapshot, IngestionConsumer, ProcessOutcome};
pub use producer::{DEFAULT_PUBLISH_TIMEOUT, IngestionProducer};
pub use retry::{RetryConfig, RetryPolicy};
pub use watchlist::{WatchlistError, WatchlistService};

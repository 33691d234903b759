#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Watchlist Service - Asynchronous Watchlist Ingestion
//!
//! Accepts "add symbol" requests over HTTP and gRPC, validates each symbol against a
//! quote source, and hands a quote snapshot to a message broker. A separate
//! consumer task drains the topic into a deduplicating watchlist store.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core types with no I/O
//!   - `symbol`: normalized ticker symbols
//!   - `quote`: point-in-time quote snapshots and their wire form
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: store, broker and quote source interfaces
//!   - `services`: gateway use cases, ingestion producer and consumer
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `store`: in-memory and SQLite watchlist stores
//!   - `broker`: in-process topic log with consumer groups
//!   - `quotes`: Yahoo quote client and static fixture source
//!   - `http`: axum gateway with health and metrics endpoints
//!   - `grpc`: tonic `AssetService` gateway
//!   - `config`: environment configuration
//!
//! # Data Flow
//!
//! ```text
//! POST /api/assets/watchlist/{symbol}  |  AssetService/AddAssetToWatchlist
//!        │
//!        ▼
//!   validate ──► quote source ──► producer ──► watchlist-topic
//!                                                   │
//!                                                   ▼
//!                       watchlist store ◄── ingestion consumer
//!                              │
//!                              ▼
//!                 GET /api/assets/watchlist
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::quote::{DecodeError, QuoteSnapshot};
pub use domain::symbol::{Symbol, SymbolError};

// Ports
pub use application::ports::{
    BrokerError, BrokerMessage, MessageBroker, MessageStream, QuoteSource, QuoteSourceError,
    StorageError, WatchlistStore,
};

// Services
pub use application::services::{
    ConsumerStats, ConsumerStatsSnapshot, IngestionConsumer, IngestionProducer, ProcessOutcome,
    RetryConfig, WatchlistError, WatchlistService,
};

// Infrastructure config
pub use infrastructure::config::{
    BrokerSettings, ConfigError, ConsumerSettings, QuoteSettings, QuoteSourceKind, ServerSettings,
    ServiceConfig, StoreBackend, StoreSettings,
};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};

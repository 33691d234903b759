//! Domain Layer - Core watchlist types.
//!
//! This layer contains the value types shared by every component of the
//! ingestion pipeline. Nothing here performs I/O.

/// Quote snapshots and their broker payload encoding.
pub mod quote;

/// Normalized instrument symbols.
pub mod symbol;

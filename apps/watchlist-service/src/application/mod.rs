//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with external systems.

/// Port interfaces for external systems (store, broker, quote source).
pub mod ports;

/// Application services for ingestion and the gateway use cases.
pub mod services;

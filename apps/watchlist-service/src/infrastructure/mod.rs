//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// In-process message broker.
pub mod broker;

/// Configuration loading.
pub mod config;

/// gRPC gateway.
pub mod grpc;

/// HTTP gateway with health and metrics endpoints.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Quote source adapters.
pub mod quotes;

/// Watchlist store adapters.
pub mod store;

/// OpenTelemetry tracing integration.
pub mod telemetry;

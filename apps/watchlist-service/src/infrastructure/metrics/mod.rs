//! Prometheus Metrics Module
//!
//! Exposes pipeline metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Quotes**: Quote lookups by outcome
//! - **Enqueue**: Producer publishes by outcome, and their latency
//! - **Consume**: Consumer message outcomes, processing time and broker pull
//!   failures
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the HTTP gateway.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Safe to call more than once; later calls return the same handle. Returns
/// `None` if another global recorder was already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                register_metrics();
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Prometheus recorder not installed");
                None
            }
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned().flatten()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "watchlist_quote_lookups_total",
        "Quote source lookups by outcome"
    );
    describe_counter!(
        "watchlist_enqueued_total",
        "Snapshots handed to the broker by outcome"
    );
    describe_histogram!(
        "watchlist_publish_seconds",
        "Time spent publishing one snapshot"
    );
    describe_counter!(
        "watchlist_messages_consumed_total",
        "Messages processed by the ingestion consumer by outcome"
    );
    describe_histogram!(
        "watchlist_message_processing_seconds",
        "Time spent decoding and storing one consumed message"
    );
    describe_counter!(
        "watchlist_pull_failures_total",
        "Failed broker pulls in the ingestion consumer"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Outcome of a quote lookup.
#[derive(Debug, Clone, Copy)]
pub enum LookupOutcome {
    /// Quote returned.
    Found,
    /// Source knows no such asset.
    NotFound,
    /// Source failed.
    Error,
}

impl LookupOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Error => "error",
        }
    }
}

/// Outcome of a producer publish.
#[derive(Debug, Clone, Copy)]
pub enum PublishOutcome {
    /// Broker acknowledged.
    Published,
    /// Deadline elapsed.
    Timeout,
    /// Any other broker or encoding failure.
    Error,
}

impl PublishOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }
}

/// Outcome of one consumed message.
#[derive(Debug, Clone, Copy)]
pub enum ConsumeOutcome {
    /// New symbol stored.
    Added,
    /// Symbol was already stored.
    Duplicate,
    /// Payload could not be decoded.
    Malformed,
    /// Store rejected the write.
    StorageError,
}

impl ConsumeOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Duplicate => "duplicate",
            Self::Malformed => "malformed",
            Self::StorageError => "storage_error",
        }
    }
}

/// Record a quote lookup.
pub fn record_quote_lookup(outcome: LookupOutcome) {
    counter!("watchlist_quote_lookups_total", "outcome" => outcome.as_str()).increment(1);
}

/// Record a publish attempt and its duration.
pub fn record_publish(outcome: PublishOutcome, duration: Duration) {
    counter!("watchlist_enqueued_total", "outcome" => outcome.as_str()).increment(1);
    histogram!("watchlist_publish_seconds", "outcome" => outcome.as_str())
        .record(duration.as_secs_f64());
}

/// Record a consumed message and how long it took to process.
pub fn record_consumed(outcome: ConsumeOutcome, duration: Duration) {
    counter!("watchlist_messages_consumed_total", "outcome" => outcome.as_str()).increment(1);
    histogram!("watchlist_message_processing_seconds", "outcome" => outcome.as_str())
        .record(duration.as_secs_f64());
}

/// Record a failed broker pull.
pub fn record_pull_failure() {
    counter!("watchlist_pull_failures_total").increment(1);
}

// =============================================================================
// Tests
// =============================================================================

//! Ingestion Consumer
//!
//! Long-running task that drains the watchlist topic into the store.
//!
//! # Delivery
//!
//! Offsets are committed when a message is read, before it is persisted.
//! A message whose write fails is logged and dropped; a redelivered message
//! is harmless because `add` is idempotent.
//!
//! # Cancellation
//!
//! [`IngestionConsumer::run`] returns when its token is cancelled while it is
//! waiting for a message or sleeping between failed pulls. A message already
//! being written is finished first.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::retry::{RetryConfig, RetryPolicy};
use crate::application::ports::{
    BrokerError, BrokerMessage, MessageBroker, MessageStream, WatchlistStore,
};
use crate::domain::quote::QuoteSnapshot;
use crate::infrastructure::metrics::{self, ConsumeOutcome};

// =============================================================================
// Stats
// =============================================================================

/// Live per-outcome counters, shared with the health endpoint.
#[derive(Debug, Default)]
pub struct ConsumerStats {
    received: AtomicU64,
    added: AtomicU64,
    duplicates: AtomicU64,
    malformed: AtomicU64,
    storage_failures: AtomicU64,
    pull_failures: AtomicU64,
}

/// Point-in-time copy of [`ConsumerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerStatsSnapshot {
    /// Messages pulled from the broker.
    pub received: u64,
    /// Messages that stored a new symbol.
    pub added: u64,
    /// Messages whose symbol was already stored.
    pub duplicates: u64,
    /// Messages discarded as undecodable.
    pub malformed: u64,
    /// Messages dropped because the store failed.
    pub storage_failures: u64,
    /// Failed pulls.
    pub pull_failures: u64,
}

impl ConsumerStats {
    /// Read all counters.
    #[must_use]
    pub fn snapshot(&self) -> ConsumerStatsSnapshot {
        ConsumerStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            added: self.added.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
            pull_failures: self.pull_failures.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: ProcessOutcome, elapsed: Duration) {
        let counter = match outcome {
            ProcessOutcome::Added => &self.added,
            ProcessOutcome::AlreadyPresent => &self.duplicates,
            ProcessOutcome::Malformed => &self.malformed,
            ProcessOutcome::StorageFailed => &self.storage_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::record_consumed(outcome.into(), elapsed);
    }
}

/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Symbol newly stored.
    Added,
    /// Symbol was already stored.
    AlreadyPresent,
    /// Payload discarded.
    Malformed,
    /// Store failed; message dropped.
    StorageFailed,
}

impl From<ProcessOutcome> for ConsumeOutcome {
    fn from(outcome: ProcessOutcome) -> Self {
        match outcome {
            ProcessOutcome::Added => Self::Added,
            ProcessOutcome::AlreadyPresent => Self::Duplicate,
            ProcessOutcome::Malformed => Self::Malformed,
            ProcessOutcome::StorageFailed => Self::StorageError,
        }
    }
}

// =============================================================================
// Consumer
// =============================================================================

/// Single consumer-group member persisting snapshots.
pub struct IngestionConsumer {
    stream: Box<dyn MessageStream>,
    store: Arc<dyn WatchlistStore>,
    retry: RetryPolicy,
    stats: Arc<ConsumerStats>,
}

impl std::fmt::Debug for IngestionConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionConsumer")
            .field("retry", &self.retry)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

impl IngestionConsumer {
    /// Subscribe to `topic` as a member of `group`.
    ///
    /// # Errors
    ///
    /// Returns the broker's error if the subscription cannot be created. The
    /// service treats this as fatal at startup.
    pub async fn connect(
        broker: &dyn MessageBroker,
        topic: &str,
        group: &str,
        store: Arc<dyn WatchlistStore>,
        retry: RetryConfig,
    ) -> Result<Self, BrokerError> {
        let stream = broker.subscribe(topic, group).await?;
        tracing::info!(topic, group, "Ingestion consumer subscribed");
        Ok(Self::new(stream, store, retry))
    }

    /// Wrap an existing stream.
    #[must_use]
    pub fn new(
        stream: Box<dyn MessageStream>,
        store: Arc<dyn WatchlistStore>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            stream,
            store,
            retry: RetryPolicy::new(retry),
            stats: Arc::new(ConsumerStats::default()),
        }
    }

    /// Shared handle to the live counters.
    #[must_use]
    pub fn stats(&self) -> Arc<ConsumerStats> {
        Arc::clone(&self.stats)
    }

    /// Drain the topic until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) -> ConsumerStatsSnapshot {
        tracing::info!("Ingestion consumer started");

        loop {
            let pulled = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                pulled = self.stream.next_message() => pulled,
            };

            match pulled {
                Ok(message) => {
                    self.retry.reset();
                    self.stats.received.fetch_add(1, Ordering::Relaxed);
                    self.process_message(&message).await;
                }
                Err(e) => {
                    self.stats.pull_failures.fetch_add(1, Ordering::Relaxed);
                    metrics::record_pull_failure();

                    let delay = self.retry.next_delay();
                    tracing::warn!(
                        error = %e,
                        delay_ms = delay.as_millis(),
                        consecutive_failures = self.retry.consecutive_failures(),
                        "Broker pull failed, backing off"
                    );

                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        let stats = self.stats.snapshot();
        tracing::info!(
            received = stats.received,
            added = stats.added,
            "Ingestion consumer stopped"
        );
        stats
    }

    /// Decode one message and write its symbol to the store.
    ///
    /// Never fails: every problem is logged, counted and absorbed.
    pub async fn process_message(&self, message: &BrokerMessage) -> ProcessOutcome {
        let started = Instant::now();
        let outcome = match QuoteSnapshot::decode(&message.payload) {
            Err(e) => {
                tracing::warn!(
                    offset = message.offset,
                    error = %e,
                    "Discarding undecodable message"
                );
                ProcessOutcome::Malformed
            }
            Ok(snapshot) => match self.store.add(&snapshot.symbol).await {
                Ok(true) => {
                    tracing::info!(symbol = %snapshot.symbol, price = snapshot.price, "Symbol added to watchlist");
                    ProcessOutcome::Added
                }
                Ok(false) => {
                    tracing::debug!(symbol = %snapshot.symbol, "Symbol already on watchlist");
                    ProcessOutcome::AlreadyPresent
                }
                Err(e) => {
                    tracing::error!(
                        symbol = %snapshot.symbol,
                        offset = message.offset,
                        error = %e,
                        "Failed to store symbol, message dropped"
                    );
                    ProcessOutcome::StorageFailed
                }
            },
        };

        self.stats.record(outcome, started.elapsed());
        outcome
    }
}

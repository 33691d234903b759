//! Ingestion Producer
//!
//! Publishes quote snapshots to the watchlist topic. A snapshot that is
//! accepted here is only enqueued; persistence happens later in the
//! ingestion consumer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::ports::{BrokerError, MessageBroker};
use crate::domain::quote::QuoteSnapshot;
use crate::infrastructure::metrics::{self, PublishOutcome};

/// Default publish deadline.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(2);

/// Thin publisher bound to one topic.
#[derive(Clone)]
pub struct IngestionProducer {
    broker: Arc<dyn MessageBroker>,
    topic: String,
    deadline: Duration,
}

impl std::fmt::Debug for IngestionProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionProducer")
            .field("topic", &self.topic)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl IngestionProducer {
    /// Create a producer with the default deadline.
    #[must_use]
    pub fn new(broker: Arc<dyn MessageBroker>, topic: impl Into<String>) -> Self {
        Self {
            broker,
            topic: topic.into(),
            deadline: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    /// Override the publish deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Topic this producer writes to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish one snapshot.
    ///
    /// Not retried here; the caller decides what a failure means.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError::Timeout` if the broker did not accept the message
    /// within the deadline, or another `BrokerError` on encode or transport
    /// failure.
    pub async fn enqueue(&self, snapshot: &QuoteSnapshot) -> Result<(), BrokerError> {
        let started = Instant::now();
        let payload = snapshot
            .encode()
            .map_err(|e| BrokerError::Encode(e.to_string()))?;

        let result = self
            .broker
            .publish(&self.topic, payload, self.deadline)
            .await;

        let outcome = match &result {
            Ok(()) => PublishOutcome::Published,
            Err(BrokerError::Timeout { .. }) => PublishOutcome::Timeout,
            Err(_) => PublishOutcome::Error,
        };
        metrics::record_publish(outcome, started.elapsed());

        match &result {
            Ok(()) => tracing::debug!(symbol = %snapshot.symbol, topic = %self.topic, "Snapshot enqueued"),
            Err(e) => tracing::warn!(symbol = %snapshot.symbol, topic = %self.topic, error = %e, "Enqueue failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MessageStream;
    use crate::domain::symbol::Symbol;
    use crate::infrastructure::broker::{BrokerConfig, InMemoryBroker};

    const TOPIC: &str = "watchlist-topic";

    fn snapshot(raw: &str) -> QuoteSnapshot {
        QuoteSnapshot::new(Symbol::parse(raw).unwrap(), 250.12, 255.5, 245.25)
    }

    #[tokio::test]
    async fn enqueue_publishes_json_snapshot() {
        let broker = Arc::new(InMemoryBroker::with_defaults());
        let mut stream = broker.subscribe(TOPIC, "g").await.unwrap();
        let producer = IngestionProducer::new(broker.clone(), TOPIC);

        producer.enqueue(&snapshot("tsla ")).await.unwrap();

        let message = stream.next_message().await.unwrap();
        let decoded = QuoteSnapshot::decode(&message.payload).unwrap();
        assert_eq!(decoded.symbol.as_str(), "TSLA");
        assert_eq!(decoded.price, 250.12);
    }

    #[tokio::test]
    async fn full_topic_times_out_at_deadline() {
        let broker = Arc::new(InMemoryBroker::new(BrokerConfig { topic_capacity: 1 }));
        let _stream = broker.subscribe(TOPIC, "g").await.unwrap();
        let producer =
            IngestionProducer::new(broker.clone(), TOPIC).with_deadline(Duration::from_millis(30));

        producer.enqueue(&snapshot("AAPL")).await.unwrap();
        let started = Instant::now();
        let err = producer.enqueue(&snapshot("MSFT")).await.unwrap_err();

        assert!(matches!(err, BrokerError::Timeout { .. }));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn closed_broker_fails_enqueue() {
        let broker = Arc::new(InMemoryBroker::with_defaults());
        broker.close();
        let producer = IngestionProducer::new(broker, TOPIC);

        assert!(matches!(
            producer.enqueue(&snapshot("AAPL")).await,
            Err(BrokerError::Closed)
        ));
    }

    #[test]
    fn default_deadline_is_two_seconds() {
        let producer = IngestionProducer::new(Arc::new(InMemoryBroker::with_defaults()), TOPIC);
        assert_eq!(producer.deadline, Duration::from_secs(2));
        assert_eq!(producer.topic(), TOPIC);
    }
}

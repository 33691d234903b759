//! Message Broker Port (Driven Port)
//!
//! Topic-keyed, ordered, at-least-once channel between the ingestion
//! producer and a consumer group.

use std::time::Duration;

use async_trait::async_trait;

/// A message read from a topic.
///
/// The payload is opaque to the broker. Partition and offset are delivery
/// metadata used for logging only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    /// Topic the message was read from.
    pub topic: String,
    /// Partition within the topic.
    pub partition: u32,
    /// Offset within the partition.
    pub offset: u64,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// Broker error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BrokerError {
    /// Publish deadline elapsed before the broker accepted the message.
    #[error("publish to {topic} timed out after {}ms", after.as_millis())]
    Timeout {
        /// Target topic.
        topic: String,
        /// Deadline that elapsed.
        after: Duration,
    },

    /// Broker has been shut down.
    #[error("broker is closed")]
    Closed,

    /// Payload could not be serialized.
    #[error("failed to encode payload: {0}")]
    Encode(String),

    /// Transport-level failure.
    #[error("broker transport error: {0}")]
    Transport(String),
}

/// Port for publishing to and subscribing from topics.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publish a payload, waiting at most `deadline` for the broker to accept it.
    ///
    /// `Ok` means the message will be delivered to the consumer group at least
    /// once. An error means delivery is not guaranteed.
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        deadline: Duration,
    ) -> Result<(), BrokerError>;

    /// Join `group_id` on `topic`.
    ///
    /// The returned stream resumes from the group's committed offset.
    async fn subscribe(
        &self,
        topic: &str,
        group_id: &str,
    ) -> Result<Box<dyn MessageStream>, BrokerError>;
}

/// Consumer-group view of a topic.
///
/// Offsets are committed as messages are read, not after the caller
/// finishes processing them.
#[async_trait]
pub trait MessageStream: Send + Sync {
    /// Block until the next message or an error is available.
    ///
    /// Implementations must be cancel safe: dropping the future before it
    /// completes must not consume a message.
    async fn next_message(&mut self) -> Result<BrokerMessage, BrokerError>;
}

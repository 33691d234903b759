//! In-Process Message Broker
//!
//! Implements the `MessageBroker` port with per-topic append-only logs and
//! consumer-group offsets, all inside the current process.
//!
//! # Semantics
//!
//! - Each topic is a single partition (partition 0) with monotonically
//!   increasing offsets, so messages are delivered in publish order.
//! - A consumer group starts at the earliest retained offset the first time
//!   it subscribes. Members of the same group share one committed offset, so
//!   each message goes to exactly one member.
//! - Offsets are committed when a message is read.
//! - Retention is bounded by `topic_capacity`. Messages every known group has
//!   read are discarded; when the log is full, `publish` waits for room until
//!   its deadline and then fails with `BrokerError::Timeout`.
//! - `close()` fails every later publish and wakes blocked readers with
//!   `BrokerError::Closed`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::application::ports::{BrokerError, BrokerMessage, MessageBroker, MessageStream};

/// Partition number used for every in-process topic.
const PARTITION: u32 = 0;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the in-process broker.
#[derive(Debug, Clone, Copy)]
pub struct BrokerConfig {
    /// Maximum retained messages per topic.
    pub topic_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            topic_capacity: 10_000,
        }
    }
}

// =============================================================================
// Topic Log
// =============================================================================

#[derive(Debug, Default)]
struct TopicState {
    /// Retained payloads; `messages[0]` has offset `base_offset`.
    messages: VecDeque<Vec<u8>>,
    base_offset: u64,
    /// Next offset each group will read.
    group_offsets: HashMap<String, u64>,
    published: u64,
    closed: bool,
}

impl TopicState {
    fn next_offset(&self) -> u64 {
        self.base_offset + self.messages.len() as u64
    }

    fn join(&mut self, group: &str) {
        let base = self.base_offset;
        self.group_offsets.entry(group.to_string()).or_insert(base);
    }

    fn append(&mut self, payload: Vec<u8>) -> u64 {
        let offset = self.next_offset();
        self.messages.push_back(payload);
        self.published += 1;
        offset
    }

    fn take_next(&mut self, topic: &str, group: &str) -> Option<BrokerMessage> {
        let next_offset = self.next_offset();
        let base = self.base_offset;
        let committed = self.group_offsets.entry(group.to_string()).or_insert(base);

        if *committed >= next_offset {
            return None;
        }

        let offset = (*committed).max(base);
        let index = usize::try_from(offset - base).ok()?;
        let payload = self.messages.get(index)?.clone();
        *committed = offset + 1;

        self.trim();

        Some(BrokerMessage {
            topic: topic.to_string(),
            partition: PARTITION,
            offset,
            payload,
        })
    }

    /// Drop messages every known group has already read.
    fn trim(&mut self) {
        let Some(&min_committed) = self.group_offsets.values().min() else {
            return;
        };
        while self.base_offset < min_committed && self.messages.pop_front().is_some() {
            self.base_offset += 1;
        }
    }

    fn lag(&self, group: &str) -> u64 {
        let committed = self
            .group_offsets
            .get(group)
            .copied()
            .unwrap_or(self.base_offset);
        self.next_offset().saturating_sub(committed)
    }
}

#[derive(Debug)]
struct Topic {
    name: String,
    state: Mutex<TopicState>,
    /// Woken on every append, read and close.
    changed: Notify,
}

impl Topic {
    fn new(name: &str, closed: bool) -> Self {
        Self {
            name: name.to_string(),
            state: Mutex::new(TopicState {
                closed,
                ..TopicState::default()
            }),
            changed: Notify::new(),
        }
    }
}

// =============================================================================
// Broker
// =============================================================================

/// Point-in-time statistics for one topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicStats {
    /// Messages accepted since the topic was created.
    pub published: u64,
    /// Messages currently retained.
    pub retained: usize,
    /// Unread messages per consumer group.
    pub lag_by_group: HashMap<String, u64>,
}

/// In-process implementation of `MessageBroker`.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use watchlist_service::application::ports::{MessageBroker, MessageStream};
/// use watchlist_service::infrastructure::broker::InMemoryBroker;
///
/// # tokio_test_block(async {
/// let broker = InMemoryBroker::with_defaults();
/// let mut stream = broker.subscribe("watchlist-topic", "persistence-group").await.unwrap();
///
/// broker
///     .publish("watchlist-topic", b"hello".to_vec(), Duration::from_secs(2))
///     .await
///     .unwrap();
///
/// let message = stream.next_message().await.unwrap();
/// assert_eq!(message.offset, 0);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f);
/// # }
/// ```
#[derive(Debug)]
pub struct InMemoryBroker {
    config: BrokerConfig,
    topics: Mutex<HashMap<String, Arc<Topic>>>,
    closed: AtomicBool,
}

impl InMemoryBroker {
    /// Create a new broker with the given configuration.
    ///
    /// A zero `topic_capacity` is raised to one.
    #[must_use]
    pub fn new(config: BrokerConfig) -> Self {
        if config.topic_capacity == 0 {
            tracing::warn!("Broker topic capacity of 0 raised to 1");
        }
        Self {
            config: BrokerConfig {
                topic_capacity: config.topic_capacity.max(1),
            },
            topics: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a new broker with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(BrokerConfig::default())
    }

    /// Shut the broker down.
    ///
    /// Pending and future publishes fail, and blocked readers wake with
    /// `BrokerError::Closed`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let topics: Vec<Arc<Topic>> = self.topics.lock().values().cloned().collect();
        for topic in topics {
            topic.state.lock().closed = true;
            topic.changed.notify_waiters();
        }
        tracing::info!("Broker closed");
    }

    /// Check if the broker has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Statistics for a topic, or `None` if it has never been used.
    #[must_use]
    pub fn stats(&self, topic: &str) -> Option<TopicStats> {
        let topic = self.topics.lock().get(topic).cloned()?;
        let state = topic.state.lock();
        Some(TopicStats {
            published: state.published,
            retained: state.messages.len(),
            lag_by_group: state
                .group_offsets
                .keys()
                .map(|group| (group.clone(), state.lag(group)))
                .collect(),
        })
    }

    fn topic(&self, name: &str) -> Arc<Topic> {
        let mut topics = self.topics.lock();
        Arc::clone(
            topics
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Topic::new(name, self.is_closed()))),
        )
    }

    async fn append_when_room(&self, topic: &Topic, payload: Vec<u8>) -> Result<u64, BrokerError> {
        loop {
            let changed = topic.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            {
                let mut state = topic.state.lock();
                if state.closed {
                    return Err(BrokerError::Closed);
                }
                if state.messages.len() < self.config.topic_capacity {
                    let offset = state.append(payload);
                    drop(state);
                    topic.changed.notify_waiters();
                    return Ok(offset);
                }
            }

            tracing::debug!(topic = %topic.name, "Topic full, waiting for consumers");
            changed.await;
        }
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        deadline: Duration,
    ) -> Result<(), BrokerError> {
        if self.is_closed() {
            return Err(BrokerError::Closed);
        }

        let handle = self.topic(topic);
        let offset = tokio::time::timeout(deadline, self.append_when_room(&handle, payload))
            .await
            .map_err(|_| BrokerError::Timeout {
                topic: topic.to_string(),
                after: deadline,
            })??;

        tracing::trace!(topic, offset, "Message published");
        Ok(())
    }

    async fn subscribe(
        &self,
        topic: &str,
        group_id: &str,
    ) -> Result<Box<dyn MessageStream>, BrokerError> {
        if self.is_closed() {
            return Err(BrokerError::Closed);
        }

        let handle = self.topic(topic);
        handle.state.lock().join(group_id);

        tracing::debug!(topic, group = group_id, "Consumer joined group");
        Ok(Box::new(InMemoryStream {
            topic: handle,
            group: group_id.to_string(),
        }))
    }
}

// =============================================================================
// Consumer Stream
// =============================================================================

/// One consumer-group member's view of a topic.
#[derive(Debug)]
pub struct InMemoryStream {
    topic: Arc<Topic>,
    group: String,
}

#[async_trait]
impl MessageStream for InMemoryStream {
    async fn next_message(&mut self) -> Result<BrokerMessage, BrokerError> {
        loop {
            let changed = self.topic.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            {
                let mut state = self.topic.state.lock();
                if state.closed {
                    return Err(BrokerError::Closed);
                }
                if let Some(message) = state.take_next(&self.topic.name, &self.group) {
                    drop(state);
                    // Room freed for publishers blocked on a full topic.
                    self.topic.changed.notify_waiters();
                    return Ok(message);
                }
            }

            changed.await;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC: &str = "watchlist-topic";
    const GROUP: &str = "persistence-group";
    const DEADLINE: Duration = Duration::from_secs(2);

    async fn publish(broker: &InMemoryBroker, payload: &str) {
        broker
            .publish(TOPIC, payload.as_bytes().to_vec(), DEADLINE)
            .await
            .unwrap();
    }

    async fn next(stream: &mut Box<dyn MessageStream>) -> BrokerMessage {
        tokio::time::timeout(Duration::from_secs(1), stream.next_message())
            .await
            .expect("message expected")
            .unwrap()
    }

    #[tokio::test]
    async fn delivers_in_publish_order() {
        let broker = InMemoryBroker::with_defaults();
        let mut stream = broker.subscribe(TOPIC, GROUP).await.unwrap();

        for payload in ["a", "b", "c"] {
            publish(&broker, payload).await;
        }

        for (expected_offset, expected) in [(0, "a"), (1, "b"), (2, "c")] {
            let message = next(&mut stream).await;
            assert_eq!(message.offset, expected_offset);
            assert_eq!(message.partition, 0);
            assert_eq!(message.topic, TOPIC);
            assert_eq!(message.payload, expected.as_bytes());
        }
    }

    #[tokio::test]
    async fn new_group_reads_retained_backlog() {
        let broker = InMemoryBroker::with_defaults();
        publish(&broker, "early").await;

        let mut stream = broker.subscribe(TOPIC, GROUP).await.unwrap();
        assert_eq!(next(&mut stream).await.payload, b"early");
    }

    #[tokio::test]
    async fn resubscribe_resumes_from_committed_offset() {
        let broker = InMemoryBroker::with_defaults();
        publish(&broker, "one").await;
        publish(&broker, "two").await;

        {
            let mut stream = broker.subscribe(TOPIC, GROUP).await.unwrap();
            assert_eq!(next(&mut stream).await.payload, b"one");
        }

        let mut stream = broker.subscribe(TOPIC, GROUP).await.unwrap();
        let message = next(&mut stream).await;
        assert_eq!(message.payload, b"two");
        assert_eq!(message.offset, 1);
    }

    #[tokio::test]
    async fn group_members_share_offsets() {
        let broker = InMemoryBroker::with_defaults();
        let mut first = broker.subscribe(TOPIC, GROUP).await.unwrap();
        let mut second = broker.subscribe(TOPIC, GROUP).await.unwrap();

        publish(&broker, "x").await;
        publish(&broker, "y").await;

        assert_eq!(next(&mut first).await.payload, b"x");
        assert_eq!(next(&mut second).await.payload, b"y");
    }

    #[tokio::test]
    async fn separate_groups_each_see_every_message() {
        let broker = InMemoryBroker::with_defaults();
        let mut persistence = broker.subscribe(TOPIC, GROUP).await.unwrap();
        let mut audit = broker.subscribe(TOPIC, "audit-group").await.unwrap();

        publish(&broker, "x").await;

        assert_eq!(next(&mut persistence).await.payload, b"x");
        assert_eq!(next(&mut audit).await.payload, b"x");
    }

    #[tokio::test]
    async fn blocked_reader_wakes_on_publish() {
        let broker = Arc::new(InMemoryBroker::with_defaults());
        let mut stream = broker.subscribe(TOPIC, GROUP).await.unwrap();

        let reader = tokio::spawn(async move { stream.next_message().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        publish(&broker, "late").await;

        let message = tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(message.payload, b"late");
    }

    #[tokio::test]
    async fn publish_times_out_when_topic_full() {
        let broker = InMemoryBroker::new(BrokerConfig { topic_capacity: 1 });
        let _stream = broker.subscribe(TOPIC, GROUP).await.unwrap();
        publish(&broker, "fills").await;

        let result = broker
            .publish(TOPIC, b"overflow".to_vec(), Duration::from_millis(50))
            .await;

        assert!(matches!(result, Err(BrokerError::Timeout { .. })));
        assert_eq!(broker.stats(TOPIC).unwrap().published, 1);
    }

    #[tokio::test]
    async fn zero_capacity_still_accepts_one_message() {
        let broker = InMemoryBroker::new(BrokerConfig { topic_capacity: 0 });
        let mut stream = broker.subscribe(TOPIC, GROUP).await.unwrap();

        broker
            .publish(TOPIC, b"only".to_vec(), Duration::from_millis(50))
            .await
            .unwrap();

        assert_eq!(stream.next_message().await.unwrap().payload, b"only");
    }

    #[tokio::test]
    async fn blocked_publish_proceeds_after_read() {
        let broker = Arc::new(InMemoryBroker::new(BrokerConfig { topic_capacity: 1 }));
        let mut stream = broker.subscribe(TOPIC, GROUP).await.unwrap();
        publish(&broker, "first").await;

        let publisher = {
            let broker = Arc::clone(&broker);
            tokio::spawn(async move {
                broker
                    .publish(TOPIC, b"second".to_vec(), Duration::from_secs(1))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(next(&mut stream).await.payload, b"first");

        publisher.await.unwrap().unwrap();
        assert_eq!(next(&mut stream).await.payload, b"second");
    }

    #[tokio::test]
    async fn close_fails_publish_and_wakes_readers() {
        let broker = Arc::new(InMemoryBroker::with_defaults());
        let mut stream = broker.subscribe(TOPIC, GROUP).await.unwrap();

        let reader = tokio::spawn(async move { stream.next_message().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        broker.close();

        let result = tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(BrokerError::Closed)));

        assert!(matches!(
            broker.publish(TOPIC, b"x".to_vec(), DEADLINE).await,
            Err(BrokerError::Closed)
        ));
        assert!(broker.subscribe(TOPIC, GROUP).await.is_err());
    }

    #[tokio::test]
    async fn stats_track_lag_and_trimming() {
        let broker = InMemoryBroker::with_defaults();
        let mut stream = broker.subscribe(TOPIC, GROUP).await.unwrap();

        publish(&broker, "a").await;
        publish(&broker, "b").await;

        let stats = broker.stats(TOPIC).unwrap();
        assert_eq!(stats.published, 2);
        assert_eq!(stats.retained, 2);
        assert_eq!(stats.lag_by_group[GROUP], 2);

        next(&mut stream).await;

        let stats = broker.stats(TOPIC).unwrap();
        assert_eq!(stats.retained, 1);
        assert_eq!(stats.lag_by_group[GROUP], 1);
        assert!(broker.stats("unknown-topic").is_none());
    }
}

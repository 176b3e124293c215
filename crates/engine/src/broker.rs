// SPDX-License-Identifier: Apache-2.0

//! Broker facade: one ring, one registry, no globals.
//!
//! Transports hold a `Broker` (usually behind an `Arc`) and call these
//! methods; nothing here blocks beyond the registry lock. The broker is a
//! constructed object parameterized by ring capacity and consumer-group
//! count, so tests can spin up isolated instances.
//!
//! The topic argument accepted by [`publish`](Broker::publish) and
//! [`consume`](Broker::consume) is metadata: all messages share the one ring
//! and topics do not route. Acknowledge and dead-letter retrieval are wire
//! reservations, accepted but never functional, so clients compiled against
//! the schema keep working.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Error;
use crate::registry::TopicRegistry;
use crate::ring::RingBuffer;
use crate::types::{Message, TopicInfo};

/// The broker core shared by the RPC surface and the HTTP gateway.
pub struct Broker {
    ring: RingBuffer,
    registry: TopicRegistry,
}

impl Broker {
    /// Build a broker with a ring of `capacity` slots and `consumer_groups`
    /// cursor slots.
    pub fn new(capacity: usize, consumer_groups: usize) -> Result<Self, Error> {
        Ok(Self {
            ring: RingBuffer::new(capacity, consumer_groups)?,
            registry: TopicRegistry::new(consumer_groups),
        })
    }

    /// Publish one message. Infallible once called: validation (a present
    /// message, a syntactically valid request) happens at the transport
    /// boundary, and the lossy ring always accepts a write.
    pub fn publish(&self, topic: &str, message: Message) {
        debug!(topic, id = %message.id, "publish");
        self.ring.put(vec![Arc::new(message)]);
    }

    /// Publish a batch under one contiguous sequence reservation.
    pub fn publish_batch(&self, topic: &str, messages: Vec<Message>) {
        debug!(topic, count = messages.len(), "publish batch");
        self.ring.put(messages.into_iter().map(Arc::new).collect());
    }

    /// Read up to `batch_size` messages for the group with index
    /// `group_index`. An empty batch is not an error.
    pub fn consume(
        &self,
        topic: &str,
        group_index: usize,
        batch_size: usize,
    ) -> Result<Vec<Arc<Message>>, Error> {
        let batch = self.ring.get(batch_size, group_index)?;
        debug!(topic, group_index, delivered = batch.len(), "consume");
        Ok(batch)
    }

    /// Accept acknowledgements without acting on them. The core does not
    /// track delivery state, so there is nothing to mark; the method exists
    /// to keep the wire contract intact.
    pub fn acknowledge(&self, message_ids: &[String], consumer_group: &str) {
        debug!(
            consumer_group,
            count = message_ids.len(),
            "acknowledge (no-op)"
        );
    }

    /// Dead-letter queue reservation: always empty.
    #[must_use]
    pub fn dead_letters(&self) -> Vec<Arc<Message>> {
        Vec::new()
    }

    /// Register a consumer group, allocating its cursor index on first
    /// registration. Idempotent.
    pub fn register_consumer_group(&self, name: &str) -> Result<usize, Error> {
        let index = self.registry.register_consumer_group(name)?;
        info!(name, index, "registered consumer group");
        Ok(index)
    }

    /// Create a topic. See [`TopicRegistry::create_topic`] for failure modes.
    pub fn create_topic(&self, name: &str, strategy: &str) -> Result<(), Error> {
        self.registry.create_topic(name, strategy)?;
        info!(name, strategy, "created topic");
        Ok(())
    }

    /// All topics, sorted by name.
    #[must_use]
    pub fn list_topics(&self) -> Vec<TopicInfo> {
        self.registry.list_topics()
    }

    /// Registered consumer-group names in index order.
    #[must_use]
    pub fn list_consumer_groups(&self) -> Vec<Arc<str>> {
        self.registry.list_consumer_groups()
    }

    /// Cursor index for a registered group name.
    #[must_use]
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.registry.group_index(name)
    }

    /// Number of consumer-group cursor slots the ring was built with.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.ring.group_count()
    }
}

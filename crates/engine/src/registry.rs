// SPDX-License-Identifier: Apache-2.0

//! Topic and consumer-group metadata.
//!
//! The registry is metadata only: it does not gate publish/consume, which
//! operate on the shared ring regardless of topic. Consumer groups carry two
//! identities (the registered name used by admin calls and the dense index
//! used by consume and the ring's cursor array), and the registry owns the
//! mapping between them: registration allocates the next free index, and
//! re-registering a name is an idempotent no-op returning the index it
//! already holds.
//!
//! All operations are serialized behind one lock; the registry is small and
//! not latency-critical.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use ringbus_config::TopicName;

use crate::error::Error;
use crate::types::TopicInfo;

/// Topic name → strategy map plus the consumer-group name ↔ index table.
pub struct TopicRegistry {
    inner: RwLock<RegistryInner>,
}

struct RegistryInner {
    topics: HashMap<TopicName, String>,
    /// Group name per allocated index; position is the group index.
    group_names: Vec<Arc<str>>,
    group_index: HashMap<Arc<str>, usize>,
    /// Number of cursor slots the ring was built with.
    group_limit: usize,
}

impl TopicRegistry {
    /// Create an empty registry able to allocate `group_limit` consumer
    /// groups (one per ring cursor slot).
    #[must_use]
    pub fn new(group_limit: usize) -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                topics: HashMap::new(),
                group_names: Vec::with_capacity(group_limit),
                group_index: HashMap::new(),
                group_limit,
            }),
        }
    }

    /// Register a topic. Fails if the name or strategy is empty, or if the
    /// topic already exists (state unchanged in both cases).
    pub fn create_topic(&self, name: &str, strategy: &str) -> Result<(), Error> {
        if strategy.is_empty() {
            return Err(Error::InvalidTopicOrStrategy);
        }
        let name = TopicName::parse(name).map_err(|_| Error::InvalidTopicOrStrategy)?;

        let mut inner = self.inner.write();
        if inner.topics.contains_key(&name) {
            return Err(Error::TopicAlreadyExists { topic: name });
        }
        let _ = inner.topics.insert(name, strategy.to_owned());
        Ok(())
    }

    /// Snapshot of all topics, sorted by name for deterministic listings.
    #[must_use]
    pub fn list_topics(&self) -> Vec<TopicInfo> {
        let inner = self.inner.read();
        let mut topics: Vec<TopicInfo> = inner
            .topics
            .iter()
            .map(|(topic, strategy)| TopicInfo {
                topic: topic.clone(),
                strategy: strategy.clone(),
            })
            .collect();
        topics.sort_by(|a, b| a.topic.cmp(&b.topic));
        topics
    }

    /// Register a consumer group and return its index. Idempotent: an
    /// already-registered name returns the index it was first given. A new
    /// name allocates the next free cursor slot; once every slot is taken,
    /// registration fails.
    pub fn register_consumer_group(&self, name: &str) -> Result<usize, Error> {
        if name.is_empty() {
            return Err(Error::InvalidConsumerGroup);
        }

        let mut inner = self.inner.write();
        if let Some(&index) = inner.group_index.get(name) {
            return Ok(index);
        }
        if inner.group_names.len() == inner.group_limit {
            return Err(Error::ConsumerGroupsExhausted {
                limit: inner.group_limit,
            });
        }
        let index = inner.group_names.len();
        let name: Arc<str> = Arc::from(name);
        inner.group_names.push(name.clone());
        let _ = inner.group_index.insert(name, index);
        Ok(index)
    }

    /// Look up the index a group name was allocated.
    #[must_use]
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.inner.read().group_index.get(name).copied()
    }

    /// Registered consumer-group names in index order.
    #[must_use]
    pub fn list_consumer_groups(&self) -> Vec<Arc<str>> {
        self.inner.read().group_names.to_vec()
    }
}

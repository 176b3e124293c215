// SPDX-License-Identifier: Apache-2.0

use ringbus_config::TopicName;

/// Errors produced by broker core operations.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Ring construction was asked for zero slots.
    #[error("ring capacity must be at least 1 (got {capacity})")]
    InvalidCapacity {
        /// Requested slot count.
        capacity: usize,
    },
    /// Ring construction was asked for zero consumer-group cursors.
    #[error("consumer group count must be at least 1 (got {groups})")]
    InvalidGroupCount {
        /// Requested cursor count.
        groups: usize,
    },
    /// A consume addressed a consumer-group index with no cursor.
    #[error("consumer group index {index} out of range (0..{groups})")]
    ConsumerGroupOutOfRange {
        /// Index supplied by the caller.
        index: usize,
        /// Number of configured cursor slots.
        groups: usize,
    },
    /// Topic creation failed because the topic already exists.
    #[error("topic `{topic}` already exists")]
    TopicAlreadyExists {
        /// Existing topic name.
        topic: TopicName,
    },
    /// Topic creation was given an empty name or an empty strategy tag.
    #[error("invalid topic or strategy")]
    InvalidTopicOrStrategy,
    /// Consumer-group registration was given an empty name.
    #[error("invalid consumer group name")]
    InvalidConsumerGroup,
    /// Every configured cursor slot already has a registered group.
    #[error("all {limit} consumer group slots are registered")]
    ConsumerGroupsExhausted {
        /// Configured cursor count.
        limit: usize,
    },
}

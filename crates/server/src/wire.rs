// SPDX-License-Identifier: Apache-2.0

//! Wire schema for the framed RPC surface and the HTTP gateway.
//!
//! # Framing
//!
//! Each RPC frame is a 4-byte big-endian length prefix followed by a JSON
//! body of at most [`MAX_FRAME_LEN`] bytes. Requests carry an `id`, a
//! `method`, and method-specific `params`; every request gets exactly one
//! reply carrying the same `id` with either a `result` or an `error`.
//! Frames on one connection are answered in order.
//!
//! # Services
//!
//! Methods are namespaced by service: `messaging.*` for the data plane
//! (publish, consume, acknowledge, dead letters, group registration) and
//! `admin.*` for topic metadata. Response bodies mirror the broker's admin
//! semantics: data-plane failures surface as reply errors with a
//! [`code`](ErrorCode), while `admin.create_topic` reports failure inside its
//! result body with the error strings clients already match on.
//!
//! The broker's ring is lossy under overwrite; consumers that must detect
//! gaps should publish monotonic ids and watch for discontinuities.

use ringbus_engine::{Error, Message, TopicInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upper bound on the JSON body of a single frame.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// One RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Caller-chosen correlation id, echoed on the reply.
    pub id: u64,
    /// Method and parameters.
    #[serde(flatten)]
    pub call: Call,
}

/// Method dispatch for both services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum Call {
    /// Publish one message under a topic.
    #[serde(rename = "messaging.publish")]
    Publish {
        /// Topic name (metadata only; not used for routing).
        topic: String,
        /// The message; absent is an invalid-argument error.
        message: Option<Message>,
    },
    /// Read a batch for a consumer group.
    #[serde(rename = "messaging.consume")]
    Consume {
        /// Topic name (metadata only).
        topic: String,
        /// Consumer-group index.
        consumer_group: i32,
        /// Maximum batch size.
        batch_size: i32,
    },
    /// Acknowledge delivered messages. Accepted, never functional.
    #[serde(rename = "messaging.acknowledge")]
    Acknowledge {
        /// Ids being acknowledged.
        message_ids: Vec<String>,
        /// Acknowledging group name.
        consumer_group: String,
    },
    /// Fetch dead letters. Always empty.
    #[serde(rename = "messaging.dead_letters")]
    DeadLetters,
    /// Register a consumer group, allocating its index.
    #[serde(rename = "messaging.register_consumer_group")]
    RegisterConsumerGroup {
        /// Group name.
        consumer_group: String,
    },
    /// Create a topic.
    #[serde(rename = "admin.create_topic")]
    CreateTopic {
        /// Topic name.
        topic: String,
        /// Opaque strategy tag.
        strategy: String,
    },
    /// List all topics.
    #[serde(rename = "admin.list_topics")]
    ListTopics,
    /// List registered consumer groups.
    #[serde(rename = "admin.list_consumers")]
    ListConsumers,
}

/// One RPC reply. Exactly one of `result`/`error` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// Correlation id copied from the request.
    pub id: u64,
    /// Method-specific response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

impl Reply {
    /// Build a success reply from a typed response body.
    pub fn ok(id: u64, body: &impl Serialize) -> serde_json::Result<Self> {
        Ok(Self {
            id,
            result: Some(serde_json::to_value(body)?),
            error: None,
        })
    }

    /// Build an error reply.
    #[must_use]
    pub fn err(id: u64, error: WireError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Machine-readable failure kind carried on error replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Missing message, empty names, out-of-range group index.
    InvalidArgument,
    /// Topic already registered.
    AlreadyExists,
    /// All consumer-group cursor slots are taken.
    ResourceExhausted,
    /// The frame could not be decoded as a request.
    BadRequest,
}

/// Failure description on an error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    /// Failure kind.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}

impl From<&Error> for WireError {
    fn from(err: &Error) -> Self {
        let code = match err {
            Error::TopicAlreadyExists { .. } => ErrorCode::AlreadyExists,
            Error::ConsumerGroupsExhausted { .. } => ErrorCode::ResourceExhausted,
            Error::InvalidCapacity { .. }
            | Error::InvalidGroupCount { .. }
            | Error::ConsumerGroupOutOfRange { .. }
            | Error::InvalidTopicOrStrategy
            | Error::InvalidConsumerGroup => ErrorCode::InvalidArgument,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// `messaging.publish` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    /// Always true on a result reply.
    pub success: bool,
}

/// `messaging.consume` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumeResponse {
    /// Delivered batch, possibly empty.
    pub messages: Vec<Message>,
    /// Always true on a result reply; an empty batch is not a failure.
    pub success: bool,
}

/// `messaging.acknowledge` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    /// Always true; acknowledgement is a no-op reservation.
    pub success: bool,
}

/// `messaging.dead_letters` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterResponse {
    /// Always empty; there is no dead-letter queue in the core.
    pub messages: Vec<Message>,
    /// Always true.
    pub success: bool,
}

/// `messaging.register_consumer_group` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterConsumerResponse {
    /// Always true on a result reply.
    pub success: bool,
    /// The cursor index allocated (or previously allocated) to the group.
    pub consumer_group_index: u64,
}

/// `admin.create_topic` result. Failure is reported in-band, matching the
/// admin contract clients already parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTopicResponse {
    /// Whether the topic was created.
    pub success: bool,
    /// Failure detail when `success` is false, empty otherwise.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl CreateTopicResponse {
    /// Successful creation.
    #[must_use]
    pub fn created() -> Self {
        Self {
            success: true,
            error: String::new(),
        }
    }

    /// Failed creation, carrying the canonical admin error string.
    #[must_use]
    pub fn failed(err: &Error) -> Self {
        let error = match err {
            Error::InvalidTopicOrStrategy => "Invalid topic or strategy".to_owned(),
            Error::TopicAlreadyExists { .. } => "Topic already exists".to_owned(),
            other => other.to_string(),
        };
        Self {
            success: false,
            error,
        }
    }
}

/// `admin.list_topics` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTopicsResponse {
    /// All topics, sorted by name.
    pub topics: Vec<TopicInfo>,
}

/// `admin.list_consumers` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConsumersResponse {
    /// Registered group names in cursor-index order.
    pub consumer_groups: Vec<String>,
}

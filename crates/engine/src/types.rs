// SPDX-License-Identifier: Apache-2.0

//! Core value types shared across the crate.
//!
//! Data definitions and conversions only; no behavior lives here.

use bytes::Bytes;
use ringbus_config::TopicName;
use serde::{Deserialize, Serialize};

/// A published message.
///
/// The id is caller-chosen and opaque to the broker: producers that assign
/// monotonic ids let consumers detect gaps left by lossy overwrite. The
/// broker never inspects the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Message {
    /// Caller-chosen message identifier.
    pub id: String,
    /// Opaque type tag.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Opaque payload bytes.
    #[serde(default)]
    pub payload: Bytes,
}

impl Message {
    /// Convenience constructor used throughout the tests.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            payload: payload.into(),
        }
    }
}

/// One entry of the admin topic listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    /// Topic name.
    pub topic: TopicName,
    /// Opaque strategy tag carried for the admin API; the core does not
    /// interpret it.
    pub strategy: String,
}

// SPDX-License-Identifier: Apache-2.0

//! Settings model for the ringbus broker.
//!
//! Everything here is a process-start constant: the broker sizes its ring and
//! cursor arrays once, at construction, and the listeners bind once. There is
//! no hot reload. Settings come from an optional JSON file with per-field
//! defaults; the binary layers CLI overrides on top.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors produced while loading or validating settings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The settings file could not be read.
    #[error("failed to read settings file `{path}`: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The settings file was not valid JSON for the settings schema.
    #[error("failed to parse settings file `{path}`: {source}")]
    ParseFile {
        /// Path that was attempted.
        path: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// A topic name failed validation.
    #[error("invalid topic name: {reason}")]
    InvalidTopicName {
        /// Validation error details.
        reason: String,
    },
}

/// A validated, cheaply cloneable topic name.
///
/// Topic names are non-empty. No other structure is imposed; the broker
/// treats them as opaque keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicName(Arc<str>);

impl TopicName {
    /// Parse a raw string into a topic name. Rejects the empty string.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        if raw.is_empty() {
            return Err(Error::InvalidTopicName {
                reason: "topic name must not be empty".to_owned(),
            });
        }
        Ok(Self(Arc::from(raw)))
    }

    /// View the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TopicName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Top-level settings: broker sizing plus transport endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Ring and consumer-group sizing.
    #[serde(default)]
    pub broker: BrokerSettings,

    /// Listener addresses and shutdown behavior.
    #[serde(default)]
    pub transport: TransportSettings,
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| Error::ParseFile {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Broker sizing. Both values are fixed for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerSettings {
    /// Number of slots in the ring buffer.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Number of consumer-group cursor slots.
    #[serde(default = "default_consumer_groups")]
    pub consumer_groups: usize,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            consumer_groups: default_consumer_groups(),
        }
    }
}

fn default_capacity() -> usize {
    8
}

fn default_consumer_groups() -> usize {
    3
}

/// Listener addresses and the shutdown grace period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportSettings {
    /// TCP endpoint for the framed RPC listener.
    #[serde(default = "default_rpc_addr")]
    pub rpc_addr: SocketAddr,

    /// TCP endpoint for the read-only HTTP gateway.
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,

    /// How long in-flight HTTP connections may drain after a termination
    /// signal before the process stops waiting.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl TransportSettings {
    /// The shutdown grace period as a [`Duration`].
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            rpc_addr: default_rpc_addr(),
            http_addr: default_http_addr(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_rpc_addr() -> SocketAddr {
    "127.0.0.1:50051".parse().expect("static address")
}

fn default_http_addr() -> SocketAddr {
    "127.0.0.1:8080".parse().expect("static address")
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

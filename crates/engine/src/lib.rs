// SPDX-License-Identifier: Apache-2.0

//! Transport-free core of the ringbus broker.
//!
//! The crate is built around three cooperating pieces:
//!
//! ```text
//!   Broker                      -- publish/consume/admin facade
//!     ├── RingBuffer            -- the message transport plane
//!     └── TopicRegistry         -- topic + consumer-group metadata
//! ```
//!
//! [`RingBuffer`] is the hot path: a fixed-capacity slot array shared by all
//! producers and all consumer groups, synchronized with atomics only. The
//! registry is cold-path metadata behind a lock. [`Broker`] composes the two
//! and is the only type transports need to hold.

mod broker;
mod error;
mod registry;
mod ring;
mod types;

#[cfg(test)]
mod tests;

pub use broker::Broker;
pub use error::Error;
pub use registry::TopicRegistry;
pub use ring::RingBuffer;
pub use types::{Message, TopicInfo};

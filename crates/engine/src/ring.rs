// SPDX-License-Identifier: Apache-2.0

//! Multi-producer ring buffer with per-consumer-group read cursors.
//!
//! # Sequence model
//!
//! Producers reserve absolute sequence numbers with a single `fetch_add` on
//! the write cursor, so sequence assignment is totally ordered across
//! producers with no lock. Sequences never reset; the slot index is derived
//! as `sequence mod capacity` (bitmask when the capacity is a power of two).
//! The first published message takes sequence 0. Each consumer group owns one
//! read cursor holding the highest sequence it has consumed, initialized to
//! −1.
//!
//! # Slot protocol
//!
//! Each slot pairs a payload cell with one availability flag **per consumer
//! group**. `put` stores the payload, then flips every group's flag to FILLED
//! with release stores; `get` acquire-loads its own group's flag, and a FILLED
//! observation therefore happens-after the payload store. A consume clears
//! only its own group's flag, so groups never hide messages from each other;
//! they progress independently over the same sequence stream.
//!
//! # Lossy overwrite
//!
//! A producer that laps a slow group overwrites the slot unconditionally.
//! The lagging group's cursor still advances one sequence at a time, so after
//! a lap it reads the new occupant of each slot; only the last `capacity`
//! messages are reachable. Consumers that need to detect the resulting gaps
//! should publish monotonic ids. There is no blocking mode: `put` and `get`
//! complete in a bounded number of steps and never wait for each other.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Error;
use crate::types::Message;

/// Fixed-capacity, sequence-indexed ring shared by all producers and all
/// consumer groups.
///
/// Payload cells are individually locked; readers hold the lock only long
/// enough to `Arc::clone` the message, so delivered batches stay valid across
/// later slot reuse.
pub struct RingBuffer {
    slots: Box<[Mutex<Option<Arc<Message>>>]>,
    /// Availability flags, one array per consumer group: `available[g][slot]`.
    available: Box<[Box<[AtomicBool]>]>,
    capacity: i64,
    /// Bitmask fast path when the capacity is a power of two.
    index_mask: Option<i64>,
    /// Next sequence to assign; the highest assigned sequence is this − 1.
    write_cursor: AtomicI64,
    /// Highest sequence consumed per group; −1 means nothing consumed yet.
    read_cursors: Box<[AtomicI64]>,
}

impl RingBuffer {
    /// Create a ring with `capacity` slots and `consumer_groups` read
    /// cursors. A power-of-two capacity enables bitmask indexing but is not
    /// required.
    pub fn new(capacity: usize, consumer_groups: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity { capacity });
        }
        if consumer_groups == 0 {
            return Err(Error::InvalidGroupCount {
                groups: consumer_groups,
            });
        }

        let slots = (0..capacity)
            .map(|_| Mutex::new(None))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let available = (0..consumer_groups)
            .map(|_| {
                (0..capacity)
                    .map(|_| AtomicBool::new(false))
                    .collect::<Vec<_>>()
                    .into_boxed_slice()
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let read_cursors = (0..consumer_groups)
            .map(|_| AtomicI64::new(-1))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let capacity_i64 = i64::try_from(capacity).expect("capacity should fit into i64");
        let index_mask = capacity.is_power_of_two().then(|| capacity_i64 - 1);

        Ok(Self {
            slots,
            available,
            capacity: capacity_i64,
            index_mask,
            write_cursor: AtomicI64::new(0),
            read_cursors,
        })
    }

    /// Number of consumer-group cursor slots.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.read_cursors.len()
    }

    /// The next sequence a producer would be assigned. Equals the number of
    /// messages published so far.
    #[must_use]
    pub fn next_sequence(&self) -> i64 {
        self.write_cursor.load(Ordering::Acquire)
    }

    /// Highest sequence consumed by `group`, or −1 before its first consume.
    pub fn read_cursor(&self, group: usize) -> Result<i64, Error> {
        let cursor = self
            .read_cursors
            .get(group)
            .ok_or(Error::ConsumerGroupOutOfRange {
                index: group,
                groups: self.read_cursors.len(),
            })?;
        Ok(cursor.load(Ordering::Acquire))
    }

    /// Publish a batch. Multi-producer safe: the whole batch is assigned one
    /// contiguous sequence range, then written slot by slot. Overwrites
    /// unconsumed slots unconditionally (lossy ring).
    pub fn put(&self, messages: Vec<Arc<Message>>) {
        if messages.is_empty() {
            return;
        }
        let len = i64::try_from(messages.len()).expect("batch length should fit into i64");
        let base = self.write_cursor.fetch_add(len, Ordering::AcqRel);

        for (offset, message) in messages.into_iter().enumerate() {
            let seq = base + offset as i64;
            let slot = self.slot_index(seq);
            *self.slots[slot].lock() = Some(message);
            // Payload is in place; flip every group's flag last so a FILLED
            // observation implies a fully written slot.
            for flags in self.available.iter() {
                flags[slot].store(true, Ordering::Release);
            }
        }
    }

    /// Read up to `batch_size` messages for `group`, advancing its cursor.
    ///
    /// Stops at the first EMPTY slot without blocking or spinning; the batch
    /// may be empty or shorter than requested. Callers must not invoke this
    /// concurrently for the same group (distinct groups are independent and
    /// safe).
    pub fn get(&self, batch_size: usize, group: usize) -> Result<Vec<Arc<Message>>, Error> {
        let flags = self
            .available
            .get(group)
            .ok_or(Error::ConsumerGroupOutOfRange {
                index: group,
                groups: self.available.len(),
            })?;
        let cursor = &self.read_cursors[group];

        let mut batch = Vec::with_capacity(batch_size.min(self.slots.len()));
        let mut next = cursor.load(Ordering::Acquire) + 1;

        while batch.len() < batch_size {
            let slot = self.slot_index(next);
            if !flags[slot].load(Ordering::Acquire) {
                break;
            }
            let message = self.slots[slot].lock().clone();
            let Some(message) = message else {
                // A FILLED flag is only ever set after the payload store, so
                // an empty cell here means the flag raced ahead of a reset
                // that never happens in practice; treat it as EMPTY.
                break;
            };
            batch.push(message);
            flags[slot].store(false, Ordering::Release);
            cursor.store(next, Ordering::Release);
            next += 1;
        }

        Ok(batch)
    }

    fn slot_index(&self, seq: i64) -> usize {
        let index = match self.index_mask {
            Some(mask) => seq & mask,
            None => seq % self.capacity,
        };
        usize::try_from(index).expect("slot index should fit into usize")
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.slots.len())
            .field("groups", &self.read_cursors.len())
            .field("next_sequence", &self.next_sequence())
            .finish()
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Behavior tests for the transport-free core: ring delivery, wrap-around,
//! per-group independence, registry semantics, and multi-threaded put/get.

use std::sync::Arc;
use std::thread;

use crate::error::Error;
use crate::{Broker, Message, RingBuffer, TopicRegistry};

fn msg(id: &str) -> Message {
    Message::new(id, "event", id.as_bytes().to_vec())
}

fn put_one(ring: &RingBuffer, id: &str) {
    ring.put(vec![Arc::new(msg(id))]);
}

fn ids(batch: &[Arc<Message>]) -> Vec<&str> {
    batch.iter().map(|m| m.id.as_str()).collect()
}

// =========================================================================
// Ring – construction
// =========================================================================

// Zero slots or zero cursor slots are rejected at construction, not at first
// use.
#[test]
fn ring_rejects_degenerate_sizing() {
    assert!(matches!(
        RingBuffer::new(0, 1),
        Err(Error::InvalidCapacity { capacity: 0 })
    ));
    assert!(matches!(
        RingBuffer::new(8, 0),
        Err(Error::InvalidGroupCount { groups: 0 })
    ));
}

// Non-power-of-two capacities are legal; indexing falls back to modulo.
#[test]
fn ring_accepts_non_power_of_two_capacity() {
    let ring = RingBuffer::new(3, 1).unwrap();
    for i in 0..7 {
        put_one(&ring, &i.to_string());
        let batch = ring.get(1, 0).unwrap();
        assert_eq!(ids(&batch), vec![i.to_string().as_str()]);
    }
}

// =========================================================================
// Ring – basic delivery
// =========================================================================

// Two published messages come back in publish order; a further read returns
// an empty batch rather than blocking or erroring.
#[test]
fn delivers_in_publish_order_then_runs_dry() {
    let ring = RingBuffer::new(3, 1).unwrap();
    ring.put(vec![Arc::new(msg("1")), Arc::new(msg("2"))]);

    assert_eq!(ids(&ring.get(2, 0).unwrap()), vec!["1", "2"]);
    assert!(ring.get(1, 0).unwrap().is_empty());
}

// A batch request larger than what is buffered returns the short batch
// immediately.
#[test]
fn partial_fill_returns_short_batch() {
    let ring = RingBuffer::new(3, 1).unwrap();
    put_one(&ring, "A");

    assert_eq!(ids(&ring.get(5, 0).unwrap()), vec!["A"]);
}

// A zero-sized batch request is answered with an empty batch without touching
// the cursor.
#[test]
fn zero_batch_size_is_a_no_op() {
    let ring = RingBuffer::new(3, 1).unwrap();
    put_one(&ring, "A");

    assert!(ring.get(0, 0).unwrap().is_empty());
    assert_eq!(ring.read_cursor(0).unwrap(), -1);
    assert_eq!(ids(&ring.get(1, 0).unwrap()), vec!["A"]);
}

// Reading an empty ring returns an empty batch.
#[test]
fn empty_ring_returns_empty_batch() {
    let ring = RingBuffer::new(3, 1).unwrap();
    assert!(ring.get(4, 0).unwrap().is_empty());
}

// A group index with no cursor slot is an error, not a panic.
#[test]
fn out_of_range_group_is_rejected() {
    let ring = RingBuffer::new(3, 2).unwrap();
    assert!(matches!(
        ring.get(1, 2),
        Err(Error::ConsumerGroupOutOfRange {
            index: 2,
            groups: 2
        })
    ));
    assert!(ring.read_cursor(5).is_err());
}

// The cursor reports −1 before the first consume and the consumed sequence
// afterwards; the write cursor counts published messages.
#[test]
fn cursors_track_progress() {
    let ring = RingBuffer::new(4, 1).unwrap();
    assert_eq!(ring.read_cursor(0).unwrap(), -1);
    assert_eq!(ring.next_sequence(), 0);

    ring.put(vec![Arc::new(msg("1")), Arc::new(msg("2"))]);
    assert_eq!(ring.next_sequence(), 2);

    let _ = ring.get(1, 0).unwrap();
    assert_eq!(ring.read_cursor(0).unwrap(), 0);
    let _ = ring.get(1, 0).unwrap();
    assert_eq!(ring.read_cursor(0).unwrap(), 1);
}

// =========================================================================
// Ring – wrap-around and lossy overwrite
// =========================================================================

// Interleaved put/get across the wrap boundary keeps sequence order: after
// draining two of three, one more publish reuses slot 0 and the consumer sees
// the remaining stream in order.
#[test]
fn wrap_around_preserves_order_for_a_keeping_up_consumer() {
    let ring = RingBuffer::new(3, 1).unwrap();
    ring.put(vec![Arc::new(msg("1")), Arc::new(msg("2")), Arc::new(msg("3"))]);

    assert_eq!(ids(&ring.get(2, 0).unwrap()), vec!["1", "2"]);
    put_one(&ring, "4");
    assert_eq!(ids(&ring.get(2, 0).unwrap()), vec!["3", "4"]);
}

// One publish batch larger than the ring overwrites its own head: only the
// last `capacity` messages survive, and the consumer walks them in slot
// order starting from its cursor, not in sequence order. This pins the lossy
// mode; there is no blocking alternative.
#[test]
fn oversized_batch_keeps_only_last_capacity_messages() {
    let ring = RingBuffer::new(3, 1).unwrap();
    ring.put(
        ["1", "2", "3", "4", "5"]
            .into_iter()
            .map(|id| Arc::new(msg(id)))
            .collect(),
    );

    // Sequences 3 and 4 landed on slots 0 and 1; sequence 2 kept slot 2.
    let delivered = ring.get(5, 0).unwrap();
    assert_eq!(ids(&delivered), vec!["4", "5", "3"]);
    assert!(ring.get(1, 0).unwrap().is_empty());
}

// A slow group lapped by producers skips the overwritten occupants: it never
// sees the dropped sequences but still drains what survives.
#[test]
fn lagging_group_loses_overwritten_messages() {
    let ring = RingBuffer::new(2, 1).unwrap();
    ring.put(vec![Arc::new(msg("1")), Arc::new(msg("2"))]);
    // Lap the idle consumer entirely.
    ring.put(vec![Arc::new(msg("3")), Arc::new(msg("4"))]);

    let delivered = ring.get(4, 0).unwrap();
    assert_eq!(ids(&delivered), vec!["3", "4"]);
}

// =========================================================================
// Ring – per-group availability
// =========================================================================

// A consume by one group does not hide messages from another: each group owns
// its availability flags and both observe the full stream.
#[test]
fn groups_do_not_steal_from_each_other() {
    let ring = RingBuffer::new(3, 2).unwrap();
    ring.put(vec![Arc::new(msg("x")), Arc::new(msg("y"))]);

    assert_eq!(ids(&ring.get(2, 0).unwrap()), vec!["x", "y"]);
    assert_eq!(ids(&ring.get(2, 1).unwrap()), vec!["x", "y"]);
}

// Groups progress independently: one group draining ahead leaves the other's
// cursor untouched.
#[test]
fn group_cursors_advance_independently() {
    let ring = RingBuffer::new(8, 2).unwrap();
    for i in 0..5 {
        put_one(&ring, &i.to_string());
    }

    assert_eq!(ring.get(5, 0).unwrap().len(), 5);
    assert_eq!(ring.read_cursor(0).unwrap(), 4);
    assert_eq!(ring.read_cursor(1).unwrap(), -1);

    assert_eq!(ids(&ring.get(2, 1).unwrap()), vec!["0", "1"]);
    assert_eq!(ring.read_cursor(1).unwrap(), 1);
}

// With fewer than `capacity` messages outstanding, every group sees exactly
// the producer's publish order.
#[test]
fn sequence_conservation_without_overwrite() {
    let ring = RingBuffer::new(16, 2).unwrap();
    let expected: Vec<String> = (0..10).map(|i| format!("m{i}")).collect();
    for id in &expected {
        put_one(&ring, id);
    }

    for group in 0..2 {
        let delivered = ring.get(16, group).unwrap();
        let got: Vec<&str> = ids(&delivered);
        assert_eq!(got, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }
}

// =========================================================================
// Ring – multi-threaded
// =========================================================================

// Concurrent producers each keep their own publish order within the merged
// stream, and nothing is lost when the ring never fills.
#[test]
fn concurrent_producers_preserve_per_producer_order() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 250;

    let ring = Arc::new(RingBuffer::new(4096, 1).unwrap());

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    ring.put(vec![Arc::new(msg(&format!("{p}-{i}")))]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let delivered = ring.get(PRODUCERS * PER_PRODUCER + 1, 0).unwrap();
    assert_eq!(delivered.len(), PRODUCERS * PER_PRODUCER);

    // Per producer, the merged stream must contain its ids as an in-order
    // subsequence.
    for p in 0..PRODUCERS {
        let prefix = format!("{p}-");
        let seen: Vec<usize> = delivered
            .iter()
            .filter_map(|m| m.id.strip_prefix(&prefix)?.parse().ok())
            .collect();
        assert_eq!(seen, (0..PER_PRODUCER).collect::<Vec<_>>(), "producer {p}");
    }
}

// Two groups consuming concurrently both observe the complete stream in
// order; neither interferes with the other.
#[test]
fn concurrent_groups_each_see_the_full_stream() {
    const COUNT: usize = 500;

    let ring = Arc::new(RingBuffer::new(1024, 2).unwrap());
    for i in 0..COUNT {
        put_one(&ring, &i.to_string());
    }

    let handles: Vec<_> = (0..2)
        .map(|group| {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut seen = Vec::with_capacity(COUNT);
                while seen.len() < COUNT {
                    let batch = ring.get(32, group).unwrap();
                    seen.extend(batch.iter().map(|m| m.id.parse::<usize>().unwrap()));
                }
                seen
            })
        })
        .collect();

    for handle in handles {
        let seen = handle.join().unwrap();
        assert_eq!(seen, (0..COUNT).collect::<Vec<_>>());
    }
}

// Producers racing a consumer never deliver out of order or duplicate: the
// consumer's view of each publish batch is a prefix-free ascending stream.
#[test]
fn producer_consumer_race_yields_ascending_unique_ids() {
    const COUNT: usize = 2000;

    let ring = Arc::new(RingBuffer::new(4096, 1).unwrap());
    let producer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            for i in 0..COUNT {
                ring.put(vec![Arc::new(msg(&i.to_string()))]);
            }
        })
    };

    let mut seen = Vec::with_capacity(COUNT);
    while seen.len() < COUNT {
        let batch = ring.get(64, 0).unwrap();
        seen.extend(batch.iter().map(|m| m.id.parse::<usize>().unwrap()));
    }
    producer.join().unwrap();

    assert_eq!(seen, (0..COUNT).collect::<Vec<_>>());
}

// =========================================================================
// Registry – topics
// =========================================================================

// First create wins; a second create with the same name fails and leaves the
// original strategy in place.
#[test]
fn topic_names_are_unique() {
    let registry = TopicRegistry::new(1);
    registry.create_topic("t", "fanout").unwrap();

    assert!(matches!(
        registry.create_topic("t", "queue"),
        Err(Error::TopicAlreadyExists { .. })
    ));

    let topics = registry.list_topics();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].topic.as_str(), "t");
    assert_eq!(topics[0].strategy, "fanout");
}

// Empty names and empty strategies are rejected with the invalid-argument
// kind.
#[test]
fn topic_validation_rejects_empty_fields() {
    let registry = TopicRegistry::new(1);
    assert_eq!(
        registry.create_topic("", "queue"),
        Err(Error::InvalidTopicOrStrategy)
    );
    assert_eq!(
        registry.create_topic("t", ""),
        Err(Error::InvalidTopicOrStrategy)
    );
    assert!(registry.list_topics().is_empty());
}

// Listings are sorted by name so clients and tests get deterministic output.
#[test]
fn topic_listing_is_sorted() {
    let registry = TopicRegistry::new(1);
    registry.create_topic("zeta", "fanout").unwrap();
    registry.create_topic("alpha", "queue").unwrap();

    let topics = registry.list_topics();
    let names: Vec<&str> = topics.iter().map(|t| t.topic.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

// =========================================================================
// Registry – consumer groups
// =========================================================================

// Registration allocates dense indices in order and is idempotent: repeating
// a name neither consumes a slot nor changes the listing.
#[test]
fn group_registration_is_idempotent_and_dense() {
    let registry = TopicRegistry::new(3);

    assert_eq!(registry.register_consumer_group("alpha").unwrap(), 0);
    assert_eq!(registry.register_consumer_group("beta").unwrap(), 1);
    assert_eq!(registry.register_consumer_group("alpha").unwrap(), 0);

    let groups = registry.list_consumer_groups();
    let names: Vec<&str> = groups.iter().map(|n| n.as_ref()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    assert_eq!(registry.group_index("beta"), Some(1));
    assert_eq!(registry.group_index("gamma"), None);
}

// Once every cursor slot has a group, further names are refused instead of
// silently registering without a cursor.
#[test]
fn group_registration_stops_at_the_cursor_limit() {
    let registry = TopicRegistry::new(2);
    registry.register_consumer_group("a").unwrap();
    registry.register_consumer_group("b").unwrap();

    assert!(matches!(
        registry.register_consumer_group("c"),
        Err(Error::ConsumerGroupsExhausted { limit: 2 })
    ));
    // Existing names still resolve after exhaustion.
    assert_eq!(registry.register_consumer_group("b").unwrap(), 1);
}

// The empty string is not a group name.
#[test]
fn group_registration_rejects_empty_name() {
    let registry = TopicRegistry::new(1);
    assert_eq!(
        registry.register_consumer_group(""),
        Err(Error::InvalidConsumerGroup)
    );
}

// =========================================================================
// Broker facade
// =========================================================================

// Publish/consume through the broker round-trips full message content, and
// the topic argument is metadata only: consuming under a different topic
// name still reads the shared ring.
#[test]
fn broker_roundtrips_messages_across_topics() {
    let broker = Broker::new(8, 1).unwrap();
    broker.publish(
        "orders",
        Message::new("m1", "created", b"payload-bytes".to_vec()),
    );

    let batch = broker.consume("inventory", 0, 4).unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].id, "m1");
    assert_eq!(batch[0].kind, "created");
    assert_eq!(batch[0].payload.as_ref(), b"payload-bytes");
}

// A batch publish shares one sequence reservation and arrives contiguously.
#[test]
fn broker_batch_publish_is_contiguous() {
    let broker = Broker::new(8, 1).unwrap();
    broker.publish_batch("t", vec![msg("a"), msg("b"), msg("c")]);

    let batch = broker.consume("t", 0, 8).unwrap();
    assert_eq!(ids(&batch), vec!["a", "b", "c"]);
}

// Acknowledge is accepted and does nothing; dead letters are always empty.
#[test]
fn broker_keeps_wire_reservations_inert() {
    let broker = Broker::new(8, 1).unwrap();
    broker.publish("t", msg("1"));

    broker.acknowledge(&["1".to_owned()], "workers");
    assert!(broker.dead_letters().is_empty());

    // The acknowledged message is still delivered exactly as published.
    assert_eq!(ids(&broker.consume("t", 0, 2).unwrap()), vec!["1"]);
}

// Broker-level registration mirrors the registry: idempotent, dense, bounded
// by the ring's group count.
#[test]
fn broker_registration_allocates_consume_indices() {
    let broker = Broker::new(8, 2).unwrap();
    let workers = broker.register_consumer_group("workers").unwrap();
    let audit = broker.register_consumer_group("audit").unwrap();
    assert_eq!((workers, audit), (0, 1));
    assert_eq!(broker.group_count(), 2);

    broker.publish("t", msg("1"));
    assert_eq!(ids(&broker.consume("t", workers, 1).unwrap()), vec!["1"]);
    assert_eq!(ids(&broker.consume("t", audit, 1).unwrap()), vec!["1"]);

    assert!(matches!(
        broker.consume("t", 2, 1),
        Err(Error::ConsumerGroupOutOfRange { .. })
    ));
}

//! Property-based test generators using proptest.
//!
//! Provides strategies for generating replica set inputs.

use proptest::prelude::*;
use replifile_core::REPLICA_CAPACITY;

/// Strategy for payloads written through a replica set.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..4096)
}

/// Strategy for a legal replica count, 0 through the capacity.
pub fn replica_count_strategy() -> impl Strategy<Value = usize> {
    0..=REPLICA_CAPACITY
}

/// Strategy for a non-empty payload plus an offset inside it.
pub fn payload_with_offset_strategy() -> impl Strategy<Value = (Vec<u8>, usize)> {
    payload_strategy().prop_flat_map(|payload| {
        let len = payload.len();
        (Just(payload), 0..len)
    })
}

/// Strategy for a batch of writes that are applied in sequence.
pub fn write_batch_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 1..16)
}

//! Property-Based Tests for the Striped Codec
//!
//! Uses proptest to systematically verify `Session` encode/decode
//! correctness across a wide range of inputs and erasure patterns.
//!
//! # Test Properties
//!
//! 1. **Roundtrip correctness**: `encode(data)` then `decode` with nothing
//!    erased returns the original data.
//! 2. **Fault tolerance**: any erasure pattern of up to `M_PARITY` nodes
//!    decodes back to the original data.
//! 3. **Single-node repair**: losing exactly one data node decodes via the
//!    cheaper repair path and still returns the original data.

#![cfg(test)]

use crate::session::Session;
use crate::{K, M_PARITY};
use proptest::prelude::*;

fn data_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..4000)
}

fn erasure_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..(K + M_PARITY), 0..=M_PARITY).prop_map(|mut v| {
        v.sort_unstable();
        v.dedup();
        v
    })
}

fn single_data_node_strategy() -> impl Strategy<Value = usize> {
    0..K
}

fn streams_with_erasures(encoded: &crate::session::EncodedStripes, erased: &[usize]) -> [Option<Vec<u8>>; K + M_PARITY] {
    std::array::from_fn(|i| {
        if erased.contains(&i) {
            None
        } else if i < K {
            Some(encoded.data_streams[i].clone())
        } else {
            Some(encoded.coding_streams[i - K].clone())
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_roundtrip_no_loss(data in data_strategy()) {
        let session = Session::new(Session::blocksize_for(data.len())).unwrap();
        let encoded = session.encode(&data).unwrap();
        let streams = streams_with_erasures(&encoded, &[]);
        let decoded = session.decode(streams, data.len()).unwrap();
        prop_assert_eq!(decoded, data);
    }

    #[test]
    fn prop_tolerates_up_to_m_erasures(data in data_strategy(), erased in erasure_strategy()) {
        let session = Session::new(Session::blocksize_for(data.len())).unwrap();
        let encoded = session.encode(&data).unwrap();
        let streams = streams_with_erasures(&encoded, &erased);
        let decoded = session.decode(streams, data.len()).unwrap();
        prop_assert_eq!(decoded, data);
    }

    #[test]
    fn prop_single_data_node_repairs_correctly(data in data_strategy(), lost in single_data_node_strategy()) {
        let session = Session::new(Session::blocksize_for(data.len())).unwrap();
        let encoded = session.encode(&data).unwrap();
        let streams = streams_with_erasures(&encoded, &[lost]);
        let decoded = session.decode(streams, data.len()).unwrap();
        prop_assert_eq!(decoded, data);
    }
}

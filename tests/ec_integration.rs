//! End-to-end integration tests for the striped erasure-coding codec.

use pairwise_ec::session::Session;
use pairwise_ec::{Error, K, M_PARITY};

fn sample_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 131 + 7) % 256) as u8).collect()
}

fn streams_missing(encoded: &pairwise_ec::session::EncodedStripes, missing: &[usize]) -> [Option<Vec<u8>>; K + M_PARITY] {
    std::array::from_fn(|i| {
        if missing.contains(&i) {
            None
        } else if i < K {
            Some(encoded.data_streams[i].clone())
        } else {
            Some(encoded.coding_streams[i - K].clone())
        }
    })
}

#[test]
fn test_encode_decode_full_pipeline() {
    let original_data = b"This is test data for the full EC pipeline integration test. It should be long enough to span multiple sub-stripes worth of bytes across all ten data nodes.";
    let original_len = original_data.len();

    let session = Session::new(Session::blocksize_for(original_len)).unwrap();
    let encoded = session.encode(original_data).unwrap();
    assert_eq!(encoded.data_streams.len(), K);
    assert_eq!(encoded.coding_streams.len(), M_PARITY);

    let streams = streams_missing(&encoded, &[]);
    let recovered = session.decode(streams, original_len).unwrap();
    assert_eq!(recovered, original_data);
}

#[test]
fn test_decode_survives_every_single_data_node_loss() {
    let data = sample_data(9000);
    let session = Session::new(Session::blocksize_for(data.len())).unwrap();
    let encoded = session.encode(&data).unwrap();

    for lost in 0..K {
        let streams = streams_missing(&encoded, &[lost]);
        let recovered = session.decode(streams, data.len()).unwrap();
        assert_eq!(recovered, data, "node k{lost:02} failed to repair");
    }
}

#[test]
fn test_decode_survives_every_single_parity_node_loss() {
    let data = sample_data(3000);
    let session = Session::new(Session::blocksize_for(data.len())).unwrap();
    let encoded = session.encode(&data).unwrap();

    for lost in K..K + M_PARITY {
        let streams = streams_missing(&encoded, &[lost]);
        let recovered = session.decode(streams, data.len()).unwrap();
        assert_eq!(recovered, data, "node m{:02} failed to repair", lost - K);
    }
}

#[test]
fn test_decode_tolerates_max_mixed_erasures() {
    let data = sample_data(6000);
    let session = Session::new(Session::blocksize_for(data.len())).unwrap();
    let encoded = session.encode(&data).unwrap();

    let mixed = [1usize, 4, K, K + 2];
    let streams = streams_missing(&encoded, &mixed);
    let recovered = session.decode(streams, data.len()).unwrap();
    assert_eq!(recovered, data);
}

#[test]
fn test_decode_rejects_more_than_max_erasures() {
    let data = sample_data(2000);
    let session = Session::new(Session::blocksize_for(data.len())).unwrap();
    let encoded = session.encode(&data).unwrap();

    let too_many = [0usize, 1, 2, 3, 4];
    let streams = streams_missing(&encoded, &too_many);
    let err = session.decode(streams, data.len()).unwrap_err();
    assert!(matches!(err, Error::DecodeInfeasible { erasures: 5, max: 4 }));
}

#[test]
fn test_empty_input_round_trips() {
    let data: Vec<u8> = Vec::new();
    let session = Session::new(Session::blocksize_for(1)).unwrap();
    let encoded = session.encode(&data).unwrap();
    let streams = streams_missing(&encoded, &[]);
    let recovered = session.decode(streams, 0).unwrap();
    assert!(recovered.is_empty());
}

#[test]
fn test_single_byte_input_round_trips_with_a_repair() {
    let data = vec![0x42u8];
    let session = Session::new(Session::blocksize_for(data.len())).unwrap();
    let encoded = session.encode(&data).unwrap();
    let streams = streams_missing(&encoded, &[0]);
    let recovered = session.decode(streams, data.len()).unwrap();
    assert_eq!(recovered, data);
}

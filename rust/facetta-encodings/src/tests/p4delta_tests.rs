use itertools::Itertools;

use crate::p4delta::{P4DeltaCodec, P4DeltaParams, header_b};

fn random_deltas(len: usize, max_gap: u32, outlier_every: usize) -> Vec<u32> {
    (0..len)
        .map(|i| {
            if outlier_every != 0 && i % outlier_every == outlier_every - 1 {
                fastrand::u32(1 << 20..1 << 28)
            } else {
                fastrand::u32(..=max_gap)
            }
        })
        .collect()
}

fn prefix_sums(base: u32, deltas: &[u32]) -> Vec<u32> {
    deltas
        .iter()
        .scan(base, |acc, &delta| {
            *acc = acc.wrapping_add(delta);
            Some(*acc)
        })
        .collect()
}

#[test]
fn test_random_round_trip() {
    fastrand::seed(90210);
    for _ in 0..200 {
        let len = fastrand::usize(1..300);
        let deltas = random_deltas(len, fastrand::u32(0..5000), fastrand::usize(0..20));
        let base = fastrand::u32(..1_000_000);

        let params = P4DeltaParams::estimate(base, &deltas).unwrap();
        let codec = P4DeltaCodec::with_params(params);
        let packed = codec.compress(&deltas).unwrap();
        assert_eq!(packed.len(), params.packed_bits());
        assert_eq!(header_b(packed.words()), Some(params.b));
        assert_eq!(codec.decompress(&packed).unwrap(), prefix_sums(base, &deltas));
    }
}

#[test]
fn test_compress_alt_is_bit_identical() {
    fastrand::seed(4242);
    for b in 1..=32u32 {
        let deltas = random_deltas(97, 1 << (b - 1).min(20), 7);
        let inline_max = ((1u64 << (b - 1)) - 1) as u32;
        let exceptions = deltas.iter().filter(|&&d| d > inline_max).count();

        let mut codec = P4DeltaCodec::new();
        codec.set_param(7, b, deltas.len(), exceptions).unwrap();
        let bits = codec.compress(&deltas).unwrap();
        let words = codec.compress_alt(&deltas).unwrap();
        assert_eq!(bits.words(), words.as_slice(), "b = {b}");
        assert_eq!(
            codec.decompress_words(&words).unwrap(),
            codec.decompress(&bits).unwrap()
        );
    }
}

#[test]
fn test_every_width_round_trips_ascending_docs() {
    fastrand::seed(31337);
    let docs = (0..128)
        .map(|_| fastrand::u32(..10_000_000))
        .sorted()
        .dedup()
        .collect_vec();
    let deltas = docs
        .iter()
        .scan(0u32, |prev, &doc| {
            let delta = doc - *prev;
            *prev = doc;
            Some(delta)
        })
        .collect_vec();

    for b in 1..=32u32 {
        let inline_max = ((1u64 << (b - 1)) - 1) as u32;
        let exceptions = deltas.iter().filter(|&&d| d > inline_max).count();
        let params = P4DeltaParams::new(0, b, deltas.len(), exceptions).unwrap();
        let codec = P4DeltaCodec::with_params(params);
        let packed = codec.compress_alt(&deltas).unwrap();
        assert_eq!(codec.decompress_words(&packed).unwrap(), docs, "b = {b}");
    }
}

#[test]
fn test_exception_count_mismatch() {
    let mut codec = P4DeltaCodec::new();
    codec.set_param(0, 3, 4, 2).unwrap();
    assert!(codec.compress(&[1, 2, 3, 100]).is_err());
    assert!(codec.compress(&[1, 50, 3, 100]).is_ok());
}

#[test]
fn test_update_params_reconfigures() {
    let mut codec = P4DeltaCodec::new();
    codec.set_param(0, 8, 2, 0).unwrap();
    let packed = codec.compress_alt(&[5, 6]).unwrap();

    let params = P4DeltaParams::new(1000, 8, 2, 0).unwrap();
    codec.update_params(params).unwrap();
    assert_eq!(codec.params(), Some(&params));
    assert_eq!(codec.decompress_words(&packed).unwrap(), vec![1005, 1011]);
}

#[test]
fn test_decompress_into_checks_output_len() {
    let codec = P4DeltaCodec::with_params(P4DeltaParams::new(0, 4, 3, 0).unwrap());
    let packed = codec.compress_alt(&[1, 1, 1]).unwrap();
    let mut out = vec![0u32; 2];
    assert!(codec.decompress_into(&packed, &mut out).is_err());
    let mut out = vec![0u32; 3];
    codec.decompress_into(&packed, &mut out).unwrap();
    assert_eq!(out, vec![1, 2, 3]);
}

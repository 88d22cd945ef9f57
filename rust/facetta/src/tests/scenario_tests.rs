use crate::{
    encodings::P4DeltaCodec,
    facets::{
        BrowseFacet, FacetCountAggregator, FacetDataCache, FacetSortOrder, FacetSpec,
        StringTermList,
    },
    support::{arrays::IntSegmentedArray, bits::BitSet},
};

#[test]
fn test_dictionary_of_five() {
    let terms = StringTermList::from_values(["a", "b", "c", "d"]);
    let values = [1u32, 2, 1, 3];
    let cache =
        FacetDataCache::from_indices(Box::new(terms), values.len(), |doc| values[doc as usize])
            .unwrap();
    let spec = FacetSpec::default()
        .with_order(FacetSortOrder::Hits)
        .with_min_hit_count(1)
        .with_max_count(10);
    let mut aggregator = FacetCountAggregator::new("letter", &cache, spec);
    for doc in [3, 1, 0, 2] {
        aggregator.collect(doc);
    }
    assert_eq!(aggregator.count_distribution(), &[0, 2, 1, 1, 0]);
    assert_eq!(
        aggregator.get_facets(),
        &[
            BrowseFacet::new("a", 2),
            BrowseFacet::new("b", 1),
            BrowseFacet::new("c", 1),
        ]
    );
}

#[test]
fn test_p4delta_batch_with_exception() {
    let mut codec = P4DeltaCodec::new();
    codec.set_param(100, 4, 4, 1).unwrap();
    let deltas = [1, 2, 9, 1];

    let packed = codec.compress(&deltas).unwrap();
    let words = codec.compress_alt(&deltas).unwrap();
    assert_eq!(packed.words(), words.as_slice());

    assert_eq!(codec.decompress(&packed).unwrap(), vec![101, 103, 112, 113]);
    assert_eq!(codec.decompress_words(&words).unwrap(), vec![101, 103, 112, 113]);
}

#[test]
fn test_uninitialized_codec_is_rejected() {
    let codec = P4DeltaCodec::new();
    assert!(codec.compress(&[1, 2, 3]).is_err());
    assert!(codec.decompress(&BitSet::new(64)).is_err());
}

#[test]
fn test_segmented_scan_after_fill() {
    let mut array = IntSegmentedArray::new(100);
    array.fill(7);
    array.add(0, 1);
    array.add(1, 2);
    assert_eq!(array.find_value(7, 0, 99), Some(2));
    assert_eq!(array.find_value(5, 0, 99), None);

    array.ensure_capacity(300);
    assert!((2..100).all(|doc| array.get(doc) == 7));
    assert!((100..300).all(|doc| array.get(doc) == 0));
}

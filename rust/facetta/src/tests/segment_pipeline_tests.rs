use itertools::Itertools;

use crate::{
    common::DocId,
    encodings::{DocSetAdvisor, DocSetKind},
    facets::{
        FacetCountAggregator, FacetData, FacetDataCache, FacetIterator, FacetSortOrder, FacetSpec,
        MultiValueFacetDataCache, ValueDocIterator, merge_counts, merge_facets,
    },
};

const COLORS: [&str; 4] = ["blue", "green", "red", "white"];

fn segment(rng: &mut fastrand::Rng, docs: usize) -> Vec<Option<&'static str>> {
    (0..docs)
        .map(|_| match rng.usize(0..10) {
            0 => None,
            n => Some(COLORS[n % COLORS.len()]),
        })
        .collect()
}

fn scan_counts(values: &[Option<&str>], matches: &[DocId]) -> Vec<(String, u32)> {
    let counts = matches
        .iter()
        .filter_map(|&doc| values[doc as usize])
        .counts();
    counts
        .into_iter()
        .map(|(value, hits)| (value.to_string(), hits as u32))
        .sorted()
        .collect()
}

#[test]
fn test_segments_count_and_merge() {
    let mut rng = fastrand::Rng::with_seed(7);
    let mut advisor = DocSetAdvisor::default();
    let segments = [segment(&mut rng, 1200), segment(&mut rng, 700)];

    let caches = segments
        .iter()
        .map(|values| {
            FacetDataCache::build_strings(values.len(), |doc| values[doc as usize]).unwrap()
        })
        .collect_vec();

    let mut expected = Vec::new();
    let mut aggregators = Vec::new();
    for (values, cache) in segments.iter().zip(&caches) {
        let matches = (0..values.len() as DocId)
            .filter(|_| rng.bool())
            .collect_vec();
        let set = advisor.build(&matches, values.len()).unwrap();
        assert_eq!(set.len(), matches.len());

        let mut aggregator = FacetCountAggregator::new("color", cache, FacetSpec::default());
        aggregator.collect_set(&set);
        expected.extend(scan_counts(values, &matches));
        aggregators.push(aggregator);
    }
    assert_eq!(advisor.observed_sets(), 2);

    let merged = merge_facets(
        aggregators.iter().map(|a| a.iter()).collect(),
        &FacetSpec::default(),
    );
    let expected = expected
        .into_iter()
        .into_grouping_map()
        .sum()
        .into_iter()
        .sorted()
        .collect_vec();
    let merged = merged
        .into_iter()
        .map(|facet| (facet.value, facet.hit_count))
        .collect_vec();
    assert_eq!(merged, expected);
}

#[test]
fn test_shared_dictionary_counts_add_up() {
    let values = ["x", "y", "x", "z", "y", "x"];
    let cache = FacetDataCache::build_strings(values.len(), |doc| Some(values[doc as usize]))
        .unwrap();
    let mut first = FacetCountAggregator::new("f", &cache, FacetSpec::default());
    let mut second = FacetCountAggregator::new("f", &cache, FacetSpec::default());
    first.collect_docs(0..3);
    second.collect_docs(3..6);

    let merged = merge_counts(&[first.count_distribution(), second.count_distribution()]).unwrap();
    let mut all = FacetCountAggregator::new("f", &cache, FacetSpec::default());
    all.collect_all();
    assert_eq!(merged, all.count_distribution());

    let facets = FacetIterator::new(&merged, cache.term_list())
        .map(|facet| facet.hit_count)
        .collect_vec();
    assert_eq!(facets, vec![3, 2, 1]);
}

#[test]
fn test_filter_feeds_aggregator() {
    let brands = ["acme", "bolt", "acme", "core", "acme", "bolt"];
    let tags: [&[&str]; 6] = [
        &["new"],
        &["new", "sale"],
        &[],
        &["sale"],
        &["sale", "new", "eco"],
        &["eco"],
    ];
    let brand_cache =
        FacetDataCache::build_strings(brands.len(), |doc| Some(brands[doc as usize])).unwrap();
    let tag_cache =
        MultiValueFacetDataCache::build_strings(tags.len(), 8, |doc| tags[doc as usize].iter().copied())
            .unwrap();

    let acme = ValueDocIterator::for_value(&brand_cache, "acme").collect_vec();
    assert_eq!(acme, vec![0, 2, 4]);

    let mut advisor = DocSetAdvisor::default();
    assert_eq!(advisor.suggest(acme.len(), brands.len()), DocSetKind::IntArray);
    let set = advisor.build(&acme, brands.len()).unwrap();

    let spec = FacetSpec::default().with_order(FacetSortOrder::Hits);
    let mut aggregator = FacetCountAggregator::new("tag", &tag_cache, spec);
    aggregator.collect_set(&set);
    let facets = aggregator
        .get_facets()
        .iter()
        .map(|facet| (facet.value.as_str(), facet.hit_count))
        .collect_vec();
    assert_eq!(facets, vec![("new", 2), ("eco", 1), ("sale", 1)]);
    assert_eq!(aggregator.count_distribution()[0], 1);
}

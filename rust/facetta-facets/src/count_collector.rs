//! Per-segment facet counting.

use std::cell::OnceCell;

use facetta_common::DocId;
use facetta_encodings::DocIdSet;

use crate::{
    browse_facet::BrowseFacet,
    data_cache::FacetData,
    facet_iterator::FacetIterator,
    facet_spec::{FacetSpec, select_facets},
};

/// Counts facet values over a stream of matching documents of one segment.
///
/// The aggregator keeps one counter per dictionary index of the field.
/// Documents are fed through [`collect`](Self::collect) (or in bulk with
/// [`collect_all`](Self::collect_all) when no selection narrows the document
/// set), after which the counts are turned into ordered facets.
///
/// Slot 0 counts documents without a value. It is kept in the raw
/// distribution but never reported as a facet.
///
/// [`get_facets`](Self::get_facets) is computed once and cached until the next
/// document is collected, so repeated calls return the same list.
pub struct FacetCountAggregator<'a, D: FacetData + ?Sized> {
    name: String,
    data: &'a D,
    spec: FacetSpec,
    counts: Vec<u32>,
    facets: OnceCell<Vec<BrowseFacet>>,
}

impl<'a, D: FacetData + ?Sized> FacetCountAggregator<'a, D> {
    pub fn new(name: impl Into<String>, data: &'a D, spec: FacetSpec) -> Self {
        FacetCountAggregator {
            name: name.into(),
            data,
            spec,
            counts: vec![0; data.term_list().len()],
            facets: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &FacetSpec {
        &self.spec
    }

    pub fn data(&self) -> &'a D {
        self.data
    }

    /// Counts the values of `doc`.
    #[inline]
    pub fn collect(&mut self, doc: DocId) {
        self.facets.take();
        self.data.count_doc(doc, &mut self.counts);
    }

    /// Counts the values of every document yielded by `docs`.
    pub fn collect_docs(&mut self, docs: impl IntoIterator<Item = DocId>) {
        self.facets.take();
        for doc in docs {
            self.data.count_doc(doc, &mut self.counts);
        }
    }

    /// Counts the values of every document in `set`.
    pub fn collect_set(&mut self, set: &DocIdSet) {
        self.collect_docs(set.iter());
    }

    /// Replaces the counts with the segment-wide value frequencies.
    ///
    /// Equivalent to collecting every document of the segment.
    pub fn collect_all(&mut self) {
        self.facets.take();
        self.counts.copy_from_slice(self.data.freqs());
    }

    /// Facets ordered and limited by the aggregator's spec.
    pub fn get_facets(&self) -> &[BrowseFacet] {
        self.facets.get_or_init(|| {
            let facets = self.facets_with_spec(&self.spec);
            log::trace!("facet {}: {} facets", self.name, facets.len());
            facets
        })
    }

    /// Facets ordered and limited by `spec` instead of the aggregator's own
    /// spec. Not cached.
    pub fn facets_with_spec(&self, spec: &FacetSpec) -> Vec<BrowseFacet> {
        let terms = self.data.term_list();
        let min_hits = spec.min_hit_count;
        let candidates = self
            .counts
            .iter()
            .enumerate()
            .skip(1)
            .filter(|&(_, &hits)| hits >= min_hits)
            .map(|(index, &hits)| (index, hits));
        select_facets(candidates, spec, |index, hits| {
            BrowseFacet::new(terms.get(index), hits)
        })
    }

    /// The facet of `value`, whatever its hit count; `None` for values missing
    /// from the dictionary.
    pub fn get_facet(&self, value: &str) -> Option<BrowseFacet> {
        let terms = self.data.term_list();
        let index = terms.index_of(value).ok()?;
        Some(BrowseFacet::new(terms.get(index), self.counts[index]))
    }

    /// Hit count of `value`; 0 for values missing from the dictionary.
    pub fn facet_hit_count(&self, value: &str) -> u32 {
        self.data
            .term_list()
            .index_of(value)
            .map_or(0, |index| self.counts[index])
    }

    /// Iterates all values in value order with their counts.
    pub fn iter(&self) -> FacetIterator<'_> {
        FacetIterator::new(&self.counts, self.data.term_list())
    }

    /// Raw counts indexed by dictionary index.
    pub fn count_distribution(&self) -> &[u32] {
        &self.counts
    }

    pub fn into_counts(self) -> Vec<u32> {
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::FacetCountAggregator;
    use crate::{
        browse_facet::BrowseFacet,
        data_cache::FacetDataCache,
        facet_spec::{FacetSortOrder, FacetSpec},
        term_list::StringTermList,
    };

    fn cache() -> FacetDataCache {
        let terms = StringTermList::from_values(["apple", "kiwi", "pear", "plum"]);
        let values = [1u32, 2, 1, 3];
        FacetDataCache::from_indices(Box::new(terms), values.len(), |doc| values[doc as usize])
            .unwrap()
    }

    #[test]
    fn test_dictionary_of_five() {
        let cache = cache();
        let spec = FacetSpec::default()
            .with_order(FacetSortOrder::Hits)
            .with_min_hit_count(1)
            .with_max_count(10);
        let mut aggregator = FacetCountAggregator::new("fruit", &cache, spec);
        for doc in 0..4 {
            aggregator.collect(doc);
        }
        assert_eq!(aggregator.count_distribution(), &[0, 2, 1, 1, 0]);
        assert_eq!(
            aggregator.get_facets(),
            &[
                BrowseFacet::new("apple", 2),
                BrowseFacet::new("kiwi", 1),
                BrowseFacet::new("pear", 1),
            ]
        );
    }

    #[test]
    fn test_lookup_by_value() {
        let cache = cache();
        let mut aggregator = FacetCountAggregator::new("fruit", &cache, FacetSpec::default());
        aggregator.collect_all();
        assert_eq!(aggregator.facet_hit_count("apple"), 2);
        assert_eq!(aggregator.facet_hit_count("mango"), 0);
        assert_eq!(aggregator.get_facet("plum"), Some(BrowseFacet::new("plum", 0)));
        assert_eq!(aggregator.get_facet("mango"), None);
    }

    #[test]
    fn test_cache_invalidated_by_collect() {
        let cache = cache();
        let mut aggregator = FacetCountAggregator::new("fruit", &cache, FacetSpec::default());
        aggregator.collect(1);
        assert_eq!(aggregator.get_facets(), &[BrowseFacet::new("kiwi", 1)]);
        aggregator.collect(3);
        assert_eq!(
            aggregator.get_facets(),
            &[BrowseFacet::new("kiwi", 1), BrowseFacet::new("pear", 1)]
        );
        assert_eq!(aggregator.into_counts(), vec![0, 0, 1, 1, 0]);
    }
}

//! Combining facet counts of several segments.
//!
//! Merging happens after every per-segment aggregator has finished collecting.
//! Segments sharing one dictionary merge their raw count arrays with
//! [`merge_counts`]; segments with their own dictionaries merge value-ordered
//! [`FacetIterator`]s with [`CombinedFacetIterator`] or [`merge_facets`].

use facetta_common::{Result, error::Error};
use itertools::Itertools;

use crate::{
    browse_facet::BrowseFacet,
    facet_iterator::FacetIterator,
    facet_spec::{FacetSpec, select_facets},
    term_list::TermList,
};

/// Sums count arrays indexed by the same dictionary.
pub fn merge_counts(segments: &[&[u32]]) -> Result<Vec<u32>> {
    let Some(first) = segments.first() else {
        return Ok(Vec::new());
    };
    if let Some(other) = segments.iter().find(|counts| counts.len() != first.len()) {
        return Err(Error::invalid_arg(
            "segments",
            format!(
                "count arrays differ in length ({} and {}), dictionaries are not aligned",
                first.len(),
                other.len()
            ),
        ));
    }
    let mut merged = first.to_vec();
    for counts in &segments[1..] {
        for (total, &hits) in merged.iter_mut().zip(counts.iter()) {
            *total = total.saturating_add(hits);
        }
    }
    Ok(merged)
}

/// Merges value-ordered facet iterators, summing the hits of equal values.
///
/// Values are compared in the natural order of the first iterator's term
/// list, so all segments must share the value type.
pub struct CombinedFacetIterator<'a> {
    iters: Vec<FacetIterator<'a>>,
    heads: Vec<Option<BrowseFacet>>,
    terms: Option<&'a dyn TermList>,
}

impl<'a> CombinedFacetIterator<'a> {
    pub fn new(iters: Vec<FacetIterator<'a>>) -> CombinedFacetIterator<'a> {
        let terms = iters.first().map(|iter| iter.term_list());
        let mut iters = iters;
        let heads = iters.iter_mut().map(Iterator::next).collect();
        CombinedFacetIterator {
            iters,
            heads,
            terms,
        }
    }

    /// Returns the next merged facet with at least `min_hits` hits.
    pub fn next_with_min_hits(&mut self, min_hits: u32) -> Option<BrowseFacet> {
        self.find(|facet| facet.hit_count >= min_hits)
    }
}

impl Iterator for CombinedFacetIterator<'_> {
    type Item = BrowseFacet;

    fn next(&mut self) -> Option<BrowseFacet> {
        let terms = self.terms?;
        let value = self
            .heads
            .iter()
            .flatten()
            .map(|facet| facet.value.as_str())
            .min_by(|a, b| terms.compare(a, b))?
            .to_string();

        let mut hits = 0u32;
        for (head, iter) in self.heads.iter_mut().zip(self.iters.iter_mut()) {
            let matched = match head {
                Some(facet) if terms.compare(&facet.value, &value).is_eq() => facet.hit_count,
                _ => continue,
            };
            hits = hits.saturating_add(matched);
            *head = iter.next();
        }
        Some(BrowseFacet::new(value, hits))
    }
}

/// Merges per-segment facets into the final list ordered and limited by
/// `spec`.
pub fn merge_facets(iters: Vec<FacetIterator<'_>>, spec: &FacetSpec) -> Vec<BrowseFacet> {
    let segments = iters.len();
    let merged = CombinedFacetIterator::new(iters)
        .filter(|facet| facet.hit_count >= spec.min_hit_count)
        .collect_vec();
    log::trace!(
        "merged {} facet values from {segments} segments",
        merged.len()
    );
    let candidates = merged
        .iter()
        .enumerate()
        .map(|(rank, facet)| (rank, facet.hit_count));
    select_facets(candidates, spec, |rank, _| merged[rank].clone())
}

#[cfg(test)]
mod tests {
    use super::{CombinedFacetIterator, merge_counts, merge_facets};
    use crate::{
        browse_facet::BrowseFacet,
        facet_iterator::FacetIterator,
        facet_spec::{FacetSortOrder, FacetSpec},
        term_list::{IntTermList, StringTermList},
    };

    #[test]
    fn test_merge_counts() {
        let merged = merge_counts(&[&[1, 2, 3], &[0, 5, 1]]).unwrap();
        assert_eq!(merged, vec![1, 7, 4]);
        assert!(merge_counts(&[&[1, 2], &[1]]).is_err());
        assert!(merge_counts(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_combined_iterator_aligns_values() {
        let left = StringTermList::from_values(["a", "c", "d"]);
        let right = StringTermList::from_values(["b", "c"]);
        let left_counts = [0, 1, 2, 3];
        let right_counts = [4, 5, 6];
        let combined = CombinedFacetIterator::new(vec![
            FacetIterator::new(&left_counts, &left),
            FacetIterator::new(&right_counts, &right),
        ]);
        assert_eq!(
            combined.collect::<Vec<_>>(),
            vec![
                BrowseFacet::new("a", 1),
                BrowseFacet::new("b", 5),
                BrowseFacet::new("c", 8),
                BrowseFacet::new("d", 3),
            ]
        );
    }

    #[test]
    fn test_numeric_values_merge_in_numeric_order() {
        let left = IntTermList::from_values([9, 100]);
        let right = IntTermList::from_values([10, 100]);
        let left_counts = [0, 1, 1];
        let right_counts = [0, 2, 2];
        let mut combined = CombinedFacetIterator::new(vec![
            FacetIterator::new(&left_counts, &left),
            FacetIterator::new(&right_counts, &right),
        ]);
        assert_eq!(combined.next(), Some(BrowseFacet::new("9", 1)));
        assert_eq!(combined.next_with_min_hits(3), Some(BrowseFacet::new("100", 3)));
        assert_eq!(combined.next(), None);
    }

    #[test]
    fn test_merge_facets_by_hits() {
        let left = StringTermList::from_values(["x", "y"]);
        let right = StringTermList::from_values(["y", "z"]);
        let left_counts = [0, 3, 1];
        let right_counts = [0, 2, 3];
        let spec = FacetSpec::default()
            .with_order(FacetSortOrder::Hits)
            .with_max_count(2);
        let facets = merge_facets(
            vec![
                FacetIterator::new(&left_counts, &left),
                FacetIterator::new(&right_counts, &right),
            ],
            &spec,
        );
        assert_eq!(facets, vec![BrowseFacet::new("x", 3), BrowseFacet::new("y", 3)]);
        assert!(merge_facets(Vec::new(), &spec).is_empty());
    }
}

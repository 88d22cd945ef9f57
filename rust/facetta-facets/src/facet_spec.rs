//! Output options of a facet: ordering, thresholds and limits.

use std::{cmp::Ordering, cmp::Reverse, fmt, sync::Arc};

use facetta_common::{Result, error::Error};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::browse_facet::BrowseFacet;

/// Caller-supplied ordering of facets.
#[derive(Clone)]
pub struct FacetComparator(Arc<dyn Fn(&BrowseFacet, &BrowseFacet) -> Ordering + Send + Sync>);

impl FacetComparator {
    pub fn new<F>(compare: F) -> FacetComparator
    where
        F: Fn(&BrowseFacet, &BrowseFacet) -> Ordering + Send + Sync + 'static,
    {
        FacetComparator(Arc::new(compare))
    }

    #[inline]
    pub fn compare(&self, a: &BrowseFacet, b: &BrowseFacet) -> Ordering {
        (self.0)(a, b)
    }
}

impl fmt::Debug for FacetComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FacetComparator(..)")
    }
}

/// Order of the facets returned for a field.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetSortOrder {
    /// Natural value order.
    #[default]
    Value,
    /// Hit count descending; equal counts in value order.
    Hits,
    /// Caller-defined order; entries the comparator considers equal stay in
    /// value order. Not serializable.
    #[serde(skip)]
    Custom(FacetComparator),
}

/// Output options of a facet.
///
/// ```
/// use facetta_facets::{FacetSortOrder, FacetSpec};
///
/// let spec = FacetSpec::default()
///     .with_order(FacetSortOrder::Hits)
///     .with_max_count(10);
/// assert_eq!(spec.min_hit_count, 1);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetSpec {
    pub order_by: FacetSortOrder,
    /// Values with fewer hits are left out.
    pub min_hit_count: u32,
    /// Maximum number of facets returned; 0 returns all of them.
    pub max_count: usize,
    /// Whether the host computes this facet's counts without the field's own
    /// selection applied, so that sibling values of a selection stay visible.
    pub expand_selection: bool,
}

impl Default for FacetSpec {
    fn default() -> Self {
        FacetSpec {
            order_by: FacetSortOrder::Value,
            min_hit_count: 1,
            max_count: 0,
            expand_selection: false,
        }
    }
}

impl FacetSpec {
    pub fn with_order(mut self, order_by: FacetSortOrder) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_min_hit_count(mut self, min_hit_count: u32) -> Self {
        self.min_hit_count = min_hit_count;
        self
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    pub fn with_expand_selection(mut self, expand_selection: bool) -> Self {
        self.expand_selection = expand_selection;
        self
    }

    pub fn with_comparator(self, comparator: FacetComparator) -> Self {
        self.with_order(FacetSortOrder::Custom(comparator))
    }

    /// Reads a spec from JSON; missing fields take their default values.
    pub fn from_json(json: &str) -> Result<FacetSpec> {
        serde_json::from_str(json).map_err(|e| Error::deserialize("FacetSpec", e))
    }

    /// `max_count` with 0 resolved to "unlimited".
    #[inline]
    pub fn limit(&self) -> usize {
        if self.max_count == 0 {
            usize::MAX
        } else {
            self.max_count
        }
    }
}

/// Orders and truncates facet candidates according to `spec`.
///
/// Candidates are `(rank, hits)` pairs in ascending value order, where `rank`
/// identifies the value and orders values naturally. `facet_at` materializes
/// the facet of a rank; it is only called for candidates that make it into the
/// result, except with a custom comparator, which needs every candidate.
/// Candidates are expected to be filtered by `min_hit_count` already.
pub(crate) fn select_facets<I, F>(candidates: I, spec: &FacetSpec, facet_at: F) -> Vec<BrowseFacet>
where
    I: Iterator<Item = (usize, u32)>,
    F: Fn(usize, u32) -> BrowseFacet,
{
    let limit = spec.limit();
    match &spec.order_by {
        FacetSortOrder::Value => candidates
            .take(limit)
            .map(|(rank, hits)| facet_at(rank, hits))
            .collect(),
        FacetSortOrder::Hits if limit == usize::MAX => candidates
            .sorted_unstable_by_key(|&(rank, hits)| (Reverse(hits), rank))
            .map(|(rank, hits)| facet_at(rank, hits))
            .collect(),
        FacetSortOrder::Hits => candidates
            .k_smallest_by_key(limit, |&(rank, hits)| (Reverse(hits), rank))
            .map(|(rank, hits)| facet_at(rank, hits))
            .collect(),
        FacetSortOrder::Custom(comparator) => {
            let mut facets = candidates
                .map(|(rank, hits)| (rank, facet_at(rank, hits)))
                .collect_vec();
            facets.sort_by(|a, b| comparator.compare(&a.1, &b.1).then(a.0.cmp(&b.0)));
            facets.truncate(limit);
            facets.into_iter().map(|(_, facet)| facet).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use facetta_common::error::ErrorKind;

    use super::{FacetComparator, FacetSortOrder, FacetSpec, select_facets};
    use crate::browse_facet::BrowseFacet;

    fn facet(rank: usize, hits: u32) -> BrowseFacet {
        BrowseFacet::new(format!("v{rank}"), hits)
    }

    fn candidates() -> Vec<(usize, u32)> {
        vec![(1, 3), (2, 7), (3, 3), (4, 1), (5, 7)]
    }

    #[test]
    fn test_value_order_truncates() {
        let spec = FacetSpec::default().with_max_count(2);
        let facets = select_facets(candidates().into_iter(), &spec, facet);
        assert_eq!(facets, vec![facet(1, 3), facet(2, 7)]);
    }

    #[test]
    fn test_hits_order_ties_by_value() {
        let spec = FacetSpec::default().with_order(FacetSortOrder::Hits);
        let all = select_facets(candidates().into_iter(), &spec, facet);
        assert_eq!(
            all,
            vec![facet(2, 7), facet(5, 7), facet(1, 3), facet(3, 3), facet(4, 1)]
        );
        let top = select_facets(candidates().into_iter(), &spec.with_max_count(3), facet);
        assert_eq!(top, all[..3]);
    }

    #[test]
    fn test_custom_comparator() {
        let by_hits_asc = FacetComparator::new(|a, b| a.hit_count.cmp(&b.hit_count));
        let spec = FacetSpec::default()
            .with_comparator(by_hits_asc)
            .with_max_count(4);
        let facets = select_facets(candidates().into_iter(), &spec, facet);
        assert_eq!(facets, vec![facet(4, 1), facet(1, 3), facet(3, 3), facet(2, 7)]);
    }

    #[test]
    fn test_from_json() {
        let spec = FacetSpec::from_json(r#"{"order_by": "hits", "max_count": 5}"#).unwrap();
        assert!(matches!(spec.order_by, FacetSortOrder::Hits));
        assert_eq!(spec.max_count, 5);
        assert_eq!(spec.min_hit_count, 1);
        assert!(!spec.expand_selection);

        let err = FacetSpec::from_json(r#"{"order_by": "sideways"}"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Deserialize { .. }));
    }

    #[test]
    fn test_json_round_trip() {
        let spec = FacetSpec::default()
            .with_order(FacetSortOrder::Hits)
            .with_min_hit_count(2)
            .with_expand_selection(true);
        let json = serde_json::to_string(&spec).unwrap();
        let back = FacetSpec::from_json(&json).unwrap();
        assert!(matches!(back.order_by, FacetSortOrder::Hits));
        assert_eq!(back.min_hit_count, 2);
        assert!(back.expand_selection);
        assert_eq!(back.limit(), usize::MAX);
    }
}

//! Attribute facets: values of the form `key<separator>value`.
//!
//! Attribute fields pack many logical facets into one field, e.g. `color=red`,
//! `size=xl`. After the regular count, sort and limit pipeline, the facets are
//! grouped by key and each key is capped to a number of values, optionally
//! keeping only the keys that are part of the current selection.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::{
    browse_facet::BrowseFacet,
    count_collector::FacetCountAggregator,
    data_cache::FacetData,
    facet_spec::FacetSpec,
};

/// Factor applied to `max_count` for the intermediate facet list, so that
/// capping values per key does not starve the final result.
pub const MAX_COUNT_INFLATION: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeFacetConfig {
    /// Separates the key from the value.
    pub separator: char,
    /// Maximum number of values surfaced per key; 0 keeps all of them.
    pub max_facets_per_key: usize,
}

impl Default for AttributeFacetConfig {
    fn default() -> Self {
        AttributeFacetConfig {
            separator: '=',
            max_facets_per_key: 0,
        }
    }
}

impl AttributeFacetConfig {
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_max_facets_per_key(mut self, max_facets_per_key: usize) -> Self {
        self.max_facets_per_key = max_facets_per_key;
        self
    }
}

/// Post-filter applied to the facets of an attribute field.
#[derive(Clone, Debug, Default)]
pub struct AttributeFacetFilter {
    config: AttributeFacetConfig,
    selected_keys: Option<AHashSet<String>>,
}

impl AttributeFacetFilter {
    pub fn new(config: AttributeFacetConfig) -> AttributeFacetFilter {
        AttributeFacetFilter {
            config,
            selected_keys: None,
        }
    }

    /// Restricts the output to the keys of the selected `key=value` entries.
    pub fn with_selection<S: AsRef<str>>(mut self, selection: impl IntoIterator<Item = S>) -> Self {
        let keys = selection
            .into_iter()
            .map(|value| self.key_of(value.as_ref()).to_string())
            .collect();
        self.selected_keys = Some(keys);
        self
    }

    pub fn config(&self) -> &AttributeFacetConfig {
        &self.config
    }

    /// Key part of `value`; the whole value when it has no separator.
    pub fn key_of<'v>(&self, value: &'v str) -> &'v str {
        value
            .split_once(self.config.separator)
            .map_or(value, |(key, _)| key)
    }

    /// The [`FacetSpec`] used for the intermediate facet list.
    ///
    /// Restricting to selected keys may discard any share of the facets, so it
    /// lifts the limit entirely.
    pub fn inflated_spec(&self, spec: &FacetSpec) -> FacetSpec {
        let max_count = if self.selected_keys.is_some() || spec.max_count == 0 {
            0
        } else {
            spec.max_count.saturating_mul(MAX_COUNT_INFLATION)
        };
        spec.clone().with_max_count(max_count)
    }

    /// Applies the per-key cap and the key restriction to already ordered
    /// facets, then truncates to `max_count` (0 keeps all).
    pub fn filter(&self, facets: &[BrowseFacet], max_count: usize) -> Vec<BrowseFacet> {
        let limit = if max_count == 0 { usize::MAX } else { max_count };
        let per_key = match self.config.max_facets_per_key {
            0 => usize::MAX,
            n => n,
        };
        let mut per_key_counts = AHashMap::<&str, usize>::new();
        let mut result = Vec::new();
        for facet in facets {
            if result.len() >= limit {
                break;
            }
            let key = self.key_of(&facet.value);
            if let Some(selected) = &self.selected_keys {
                if !selected.contains(key) {
                    continue;
                }
            }
            let seen = per_key_counts.entry(key).or_default();
            if *seen < per_key {
                *seen += 1;
                result.push(facet.clone());
            }
        }
        result
    }

    /// Runs the full attribute pipeline on a finished aggregator.
    pub fn get_facets<D: FacetData + ?Sized>(
        &self,
        aggregator: &FacetCountAggregator<'_, D>,
        spec: &FacetSpec,
    ) -> Vec<BrowseFacet> {
        let inflated = self.inflated_spec(spec);
        let facets = aggregator.facets_with_spec(&inflated);
        let filtered = self.filter(&facets, spec.max_count);
        log::trace!(
            "attribute facet {}: {} of {} intermediate facets kept",
            aggregator.name(),
            filtered.len(),
            facets.len()
        );
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeFacetConfig, AttributeFacetFilter};
    use crate::{browse_facet::BrowseFacet, facet_spec::FacetSpec};

    fn facets() -> Vec<BrowseFacet> {
        vec![
            BrowseFacet::new("color=red", 9),
            BrowseFacet::new("color=blue", 8),
            BrowseFacet::new("size=xl", 7),
            BrowseFacet::new("color=green", 6),
            BrowseFacet::new("size=s", 5),
            BrowseFacet::new("brand", 4),
        ]
    }

    #[test]
    fn test_cap_per_key() {
        let filter = AttributeFacetFilter::new(
            AttributeFacetConfig::default().with_max_facets_per_key(1),
        );
        let kept = filter.filter(&facets(), 0);
        let values = kept.iter().map(|f| f.value.as_str()).collect::<Vec<_>>();
        assert_eq!(values, vec!["color=red", "size=xl", "brand"]);
    }

    #[test]
    fn test_selection_restricts_keys() {
        let filter = AttributeFacetFilter::new(AttributeFacetConfig::default())
            .with_selection(["size=xl"]);
        let kept = filter.filter(&facets(), 1);
        assert_eq!(kept, vec![BrowseFacet::new("size=xl", 7)]);
    }

    #[test]
    fn test_custom_separator() {
        let filter = AttributeFacetFilter::new(AttributeFacetConfig::default().with_separator(':'));
        assert_eq!(filter.key_of("color:red"), "color");
        assert_eq!(filter.key_of("color=red"), "color=red");
    }

    #[test]
    fn test_inflated_spec() {
        let spec = FacetSpec::default().with_max_count(4);
        let filter = AttributeFacetFilter::default();
        assert_eq!(filter.inflated_spec(&spec).max_count, 20);
        assert_eq!(filter.inflated_spec(&FacetSpec::default()).max_count, 0);
        let filter = filter.with_selection(["color=red"]);
        assert_eq!(filter.inflated_spec(&spec).max_count, 0);
    }
}

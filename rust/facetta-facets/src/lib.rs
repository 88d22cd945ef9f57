//! Facet counting over per-document field values.
//!
//! A field's values are loaded once per index segment into a
//! [`FacetDataCache`] (single-valued) or [`MultiValueFacetDataCache`]
//! (multi-valued), which pairs the document values with their dictionary, a
//! [`TermList`]. At query time a [`FacetCountAggregator`] counts the values of
//! the matching documents and turns the counts into ordered
//! [`BrowseFacet`]s according to a [`FacetSpec`]. Counts of several segments
//! are combined with the functions in [`merge`].
//!
//! The [`filter`] module provides the reverse direction: iterators over the
//! documents carrying selected values.

pub mod attribute;
pub mod browse_facet;
pub mod count_collector;
pub mod data_cache;
pub mod facet_iterator;
pub mod facet_spec;
pub mod filter;
pub mod merge;
pub mod term_list;

pub use attribute::{AttributeFacetConfig, AttributeFacetFilter};
pub use browse_facet::BrowseFacet;
pub use count_collector::FacetCountAggregator;
pub use data_cache::{FacetData, FacetDataCache, MultiValueFacetDataCache};
pub use facet_iterator::FacetIterator;
pub use facet_spec::{FacetComparator, FacetSortOrder, FacetSpec};
pub use filter::{
    BitsDocIterator, RangeDocIterator, SelectionDocIterator, ValueDocIterator, selection_bits,
};
pub use merge::{CombinedFacetIterator, merge_counts, merge_facets};
pub use term_list::{
    IntTermList, LongTermList, NumericTerm, NumericTermList, StringTermList, TermList,
};

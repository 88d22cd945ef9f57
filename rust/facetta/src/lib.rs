//! # Facetta: faceted counting over document segments
//!
//! Facetta computes facet counts for the documents matching a query inside one
//! index segment, and combines the counts of several segments into the final
//! facet list. It also provides the compressed document id sets used to hold
//! match results and the packed integer containers backing the per-field
//! value caches.
//!
//! ## Module Organization
//!
//! * [`common`] - Document ids, the skipping iterator trait, errors
//! * [`encodings`] - P4-delta codec and document id sets
//! * [`facets`] - Dictionaries, value caches, counting, ordering, merging
//!
//! ### Support Modules
//!
//! * [`support::arrays`] - Segmented, order and nested integer arrays
//! * [`support::bits`] - Bit sets and bit field packing
//!
//! ## Typical Flow
//!
//! 1. Build a [`facets::FacetDataCache`] (or a multi-valued one) per field and
//!    segment.
//! 2. Feed the matching documents of the segment to a
//!    [`facets::FacetCountAggregator`].
//! 3. Read the ordered facets, or merge the per-segment results with
//!    [`facets::merge_facets`].

pub use facetta_common as common;
pub use facetta_encodings as encodings;
pub use facetta_facets as facets;

pub mod support {
    pub use facetta_arrays as arrays;
    pub use facetta_bits as bits;
}

#[cfg(test)]
mod tests;

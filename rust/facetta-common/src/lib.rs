//! Core definitions (error handling and shared primitive types), relied upon
//! by all facetta-* crates.

pub mod doc_iter;
pub mod error;
pub mod result;

pub use doc_iter::DocIdIterator;
pub use result::Result;

/// Dense document identifier within a single index segment.
///
/// Document ids are assigned by the index reader collaborator and range
/// over `0..max_doc`.
pub type DocId = u32;

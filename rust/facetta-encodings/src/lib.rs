//! Compressed representations of integer sets.
//!
//! - [`p4delta`]: the P4-delta batch codec, bit-packing delta batches into a
//!   [`BitSet`](facetta_bits::BitSet) or raw word array with an exception area
//!   for outliers.
//! - [`doc_id_set`]: document id sets backed by a plain sorted array, P4-delta
//!   batches, or a bitmap.
//! - [`advisor`]: picks a document id set representation from expected size
//!   and the statistics of previously built sets.

pub mod advisor;
pub mod doc_id_set;
pub mod p4delta;

pub use advisor::{BucketStats, DocSetAdvisor, DocSetAdvisorConfig};
pub use doc_id_set::{DocIdSet, DocSetKind, IntArrayDocIdSet, P4DeltaDocIdSet};
pub use p4delta::{P4DeltaCodec, P4DeltaParams};

#[cfg(test)]
mod tests;

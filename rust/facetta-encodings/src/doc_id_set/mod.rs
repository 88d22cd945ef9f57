//! Document id sets with interchangeable representations.

use facetta_bits::BitSet;
use facetta_common::{DocId, DocIdIterator, Result, verify_arg};

mod int_array;
mod p4delta_set;

pub use int_array::{IntArrayDocIdSet, IntArrayDocIdSetIter};
pub use p4delta_set::{DEFAULT_BATCH_SIZE, P4DeltaDocIdSet, P4DeltaDocIdSetIter};

/// Representation of a [`DocIdSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocSetKind {
    IntArray,
    P4Delta,
    Bits,
}

/// A set of document ids in one of the supported representations.
#[derive(Clone, Debug)]
pub enum DocIdSet {
    IntArray(IntArrayDocIdSet),
    P4Delta(P4DeltaDocIdSet),
    /// One bit per document of the segment.
    Bits(BitSet),
}

impl DocIdSet {
    /// Builds a set of the requested kind from strictly ascending documents.
    ///
    /// `max_doc` bounds the document ids and sizes the bitmap representation.
    pub fn from_sorted(kind: DocSetKind, docs: &[DocId], max_doc: usize) -> Result<DocIdSet> {
        verify_arg!(docs, docs.last().is_none_or(|&last| (last as usize) < max_doc));
        match kind {
            DocSetKind::IntArray => Ok(DocIdSet::IntArray(IntArrayDocIdSet::from_sorted(
                docs.to_vec(),
            )?)),
            DocSetKind::P4Delta => Ok(DocIdSet::P4Delta(P4DeltaDocIdSet::from_sorted(
                docs,
                DEFAULT_BATCH_SIZE,
            )?)),
            DocSetKind::Bits => {
                verify_arg!(docs, docs.windows(2).all(|pair| pair[0] < pair[1]));
                Ok(DocIdSet::Bits(BitSet::from_positions(
                    docs.iter().map(|&doc| doc as usize),
                    max_doc,
                )))
            }
        }
    }

    pub fn kind(&self) -> DocSetKind {
        match self {
            DocIdSet::IntArray(_) => DocSetKind::IntArray,
            DocIdSet::P4Delta(_) => DocSetKind::P4Delta,
            DocIdSet::Bits(_) => DocSetKind::Bits,
        }
    }

    /// Number of documents in the set.
    pub fn len(&self) -> usize {
        match self {
            DocIdSet::IntArray(set) => set.len(),
            DocIdSet::P4Delta(set) => set.len(),
            DocIdSet::Bits(bits) => bits.count_ones(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, doc: DocId) -> bool {
        match self {
            DocIdSet::IntArray(set) => set.contains(doc),
            DocIdSet::P4Delta(set) => set.contains(doc),
            DocIdSet::Bits(bits) => bits.get(doc as usize),
        }
    }

    pub fn iter(&self) -> DocIdSetIter<'_> {
        match self {
            DocIdSet::IntArray(set) => DocIdSetIter::IntArray(set.iter()),
            DocIdSet::P4Delta(set) => DocIdSetIter::P4Delta(set.iter()),
            DocIdSet::Bits(bits) => DocIdSetIter::Bits { bits, next: 0 },
        }
    }

    pub fn heap_size_bytes(&self) -> usize {
        match self {
            DocIdSet::IntArray(set) => set.heap_size_bytes(),
            DocIdSet::P4Delta(set) => set.heap_size_bytes(),
            DocIdSet::Bits(bits) => bits.heap_size_bytes(),
        }
    }
}

pub enum DocIdSetIter<'a> {
    IntArray(IntArrayDocIdSetIter<'a>),
    P4Delta(P4DeltaDocIdSetIter<'a>),
    Bits { bits: &'a BitSet, next: usize },
}

impl Iterator for DocIdSetIter<'_> {
    type Item = DocId;

    fn next(&mut self) -> Option<DocId> {
        match self {
            DocIdSetIter::IntArray(iter) => iter.next(),
            DocIdSetIter::P4Delta(iter) => iter.next(),
            DocIdSetIter::Bits { bits, next } => {
                let doc = bits.next_set_bit(*next)?;
                *next = doc + 1;
                Some(doc as DocId)
            }
        }
    }
}

impl DocIdIterator for DocIdSetIter<'_> {
    fn advance(&mut self, target: DocId) -> Option<DocId> {
        match self {
            DocIdSetIter::IntArray(iter) => iter.advance(target),
            DocIdSetIter::P4Delta(iter) => iter.advance(target),
            DocIdSetIter::Bits { next, .. } => {
                *next = (*next).max(target as usize);
                self.next()
            }
        }
    }
}

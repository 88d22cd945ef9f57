//! Document → dictionary index mapping with a storage width chosen up front.

use facetta_common::DocId;

use crate::segmented_array::{SegmentElement, SegmentedArray};

/// Storage width of an [`OrderArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderArrayKind {
    Byte,
    Short,
    Int,
}

impl OrderArrayKind {
    /// Picks the narrowest width able to hold every index in `0..cardinality`.
    ///
    /// An index equal to the width's maximum value is treated as not fitting,
    /// so a byte array serves dictionaries of up to 127 entries.
    pub fn for_cardinality(cardinality: usize) -> OrderArrayKind {
        if cardinality <= i8::MAX as usize {
            OrderArrayKind::Byte
        } else if cardinality <= i16::MAX as usize {
            OrderArrayKind::Short
        } else {
            OrderArrayKind::Int
        }
    }
}

/// A [`SegmentedArray`] of dictionary indices whose width is selected from the
/// value cardinality.
///
/// All accessors exchange indices as `u32`; the stored representation is a
/// signed `i8`/`i16`/`i32`, and indices are always non-negative.
#[derive(Clone, Debug)]
pub enum OrderArray {
    Byte(SegmentedArray<i8>),
    Short(SegmentedArray<i16>),
    Int(SegmentedArray<i32>),
}

macro_rules! dispatch {
    ($self:expr, $array:ident => $body:expr) => {
        match $self {
            OrderArray::Byte($array) => $body,
            OrderArray::Short($array) => $body,
            OrderArray::Int($array) => $body,
        }
    };
}

impl OrderArray {
    /// Creates a zeroed order array of `len` documents for a dictionary with
    /// `cardinality` entries.
    pub fn new(len: usize, cardinality: usize) -> OrderArray {
        Self::with_kind(len, OrderArrayKind::for_cardinality(cardinality))
    }

    pub fn with_kind(len: usize, kind: OrderArrayKind) -> OrderArray {
        match kind {
            OrderArrayKind::Byte => OrderArray::Byte(SegmentedArray::new(len)),
            OrderArrayKind::Short => OrderArray::Short(SegmentedArray::new(len)),
            OrderArrayKind::Int => OrderArray::Int(SegmentedArray::new(len)),
        }
    }

    pub fn kind(&self) -> OrderArrayKind {
        match self {
            OrderArray::Byte(_) => OrderArrayKind::Byte,
            OrderArray::Short(_) => OrderArrayKind::Short,
            OrderArray::Int(_) => OrderArrayKind::Int,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        dispatch!(self, a => a.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest index the current width can hold.
    pub fn max_value(&self) -> u32 {
        dispatch!(self, a => max_of(a) as u32)
    }

    #[inline]
    pub fn get(&self, doc: DocId) -> u32 {
        dispatch!(self, a => widen(a.get(doc)) as u32)
    }

    /// Stores `index` for `doc`, truncated to the storage width.
    #[inline]
    pub fn add(&mut self, doc: DocId, index: u32) {
        dispatch!(self, a => a.add_truncated(doc, index as i32))
    }

    pub fn fill(&mut self, index: u32) {
        dispatch!(self, a => {
            let value = narrow(a, index);
            a.fill(value)
        })
    }

    pub fn ensure_capacity(&mut self, size: usize) {
        dispatch!(self, a => a.ensure_capacity(size))
    }

    /// Returns the first doc in `from..=max_doc` holding `index`; `None` when
    /// `index` does not fit the storage width.
    pub fn find_value(&self, index: u32, from: DocId, max_doc: DocId) -> Option<DocId> {
        dispatch!(self, a => {
            if index > max_of(a) as u32 {
                None
            } else {
                a.find_value(narrow(a, index), from, max_doc)
            }
        })
    }

    pub fn find_value_range(&self, min: u32, max: u32, from: DocId, max_doc: DocId) -> Option<DocId> {
        if min > max {
            return None;
        }
        dispatch!(self, a => {
            let upper = max.min(max_of(a) as u32);
            if min > upper {
                None
            } else {
                a.find_value_range(narrow(a, min), narrow(a, upper), from, max_doc)
            }
        })
    }

    pub fn find_bits(&self, bits: u32, from: DocId, max_doc: DocId) -> Option<DocId> {
        dispatch!(self, a => a.find_bits(narrow(a, bits), from, max_doc))
    }

    pub fn heap_size_bytes(&self) -> usize {
        dispatch!(self, a => a.heap_size_bytes())
    }
}

#[inline]
fn max_of<T: SegmentElement>(_: &SegmentedArray<T>) -> i32 {
    T::MAX_VALUE.as_()
}

#[inline]
fn widen<T: SegmentElement>(value: T) -> i32 {
    value.as_()
}

#[inline]
fn narrow<T: SegmentElement>(_: &SegmentedArray<T>, value: u32) -> T {
    T::truncate_from(value as i32)
}

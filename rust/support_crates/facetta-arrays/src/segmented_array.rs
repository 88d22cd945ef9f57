//! Block-segmented fixed-width integer array indexed by document id.

use facetta_common::{DocId, Result, error::Error, verify_arg};
use num_traits::{AsPrimitive, PrimInt};

/// Storage element of a [`SegmentedArray`].
///
/// Implemented for `i8`, `i16` and `i32`. Values are written through
/// [`SegmentElement::truncate_from`], which keeps the low bits of an `i32`
/// the same way a narrowing `as` cast does.
pub trait SegmentElement:
    PrimInt + Default + AsPrimitive<i32> + std::fmt::Debug + Send + Sync + 'static + sealed::Sealed
{
    /// Largest value representable by the storage width.
    ///
    /// Dictionary indices at or above this threshold must be kept in a wider
    /// array; callers use it to choose the width up front.
    const MAX_VALUE: Self;

    /// Width of the element in bits.
    const BITS: u32;

    fn truncate_from(value: i32) -> Self;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! impl_segment_element {
    ($T:ty) => {
        impl sealed::Sealed for $T {}

        impl SegmentElement for $T {
            const MAX_VALUE: $T = <$T>::MAX;
            const BITS: u32 = <$T>::BITS;

            #[inline]
            fn truncate_from(value: i32) -> $T {
                value as $T
            }
        }
    };
}

impl_segment_element!(i8);
impl_segment_element!(i16);
impl_segment_element!(i32);

pub type ByteSegmentedArray = SegmentedArray<i8>;
pub type ShortSegmentedArray = SegmentedArray<i16>;
pub type IntSegmentedArray = SegmentedArray<i32>;

/// A fixed-width array of small integers split into equally sized blocks.
///
/// Index `i` lives in block `i >> shift` at offset `i & mask`, where the block
/// size `B = 1 << shift`. The array holds `ceil(len / B)` blocks; slots that
/// were never written read as zero.
///
/// Growth via [`SegmentedArray::ensure_capacity`] appends zeroed blocks and never
/// moves or copies the blocks that already hold data, so the array can be
/// extended while an index is being built. Growth and reads are not expected
/// to overlap: the array is built first and read-only afterwards.
///
/// `get`/`add` are the hot-path accessors. They do not check `doc` against
/// `len()`; an index past the allocated blocks panics through slice indexing.
/// `try_get`/`try_add` check the logical length and report
/// [`OutOfRange`](facetta_common::error::ErrorKind::OutOfRange).
#[derive(Clone)]
pub struct SegmentedArray<T> {
    len: usize,
    shift: u32,
    mask: usize,
    blocks: Vec<Box<[T]>>,
}

impl<T: SegmentElement> SegmentedArray<T> {
    /// Default block size is 1024 elements.
    pub const DEFAULT_BLOCK_SHIFT: u32 = 10;

    /// Largest accepted block shift (1M elements per block).
    pub const MAX_BLOCK_SHIFT: u32 = 20;

    /// Creates an array of `len` zeroed elements with the default block size.
    pub fn new(len: usize) -> SegmentedArray<T> {
        Self::with_shift(len, Self::DEFAULT_BLOCK_SHIFT)
    }

    /// Creates an array of `len` zeroed elements with blocks of `block_size`
    /// elements.
    ///
    /// `block_size` must be a power of two between 2 and `1 << MAX_BLOCK_SHIFT`.
    pub fn with_block_size(len: usize, block_size: usize) -> Result<SegmentedArray<T>> {
        verify_arg!(block_size, block_size.is_power_of_two());
        let shift = block_size.trailing_zeros();
        verify_arg!(block_size, shift >= 1 && shift <= Self::MAX_BLOCK_SHIFT);
        Ok(Self::with_shift(len, shift))
    }

    fn with_shift(len: usize, shift: u32) -> SegmentedArray<T> {
        let block_size = 1usize << shift;
        let blocks = (0..len.div_ceil(block_size))
            .map(|_| Self::zeroed_block(block_size))
            .collect();
        SegmentedArray {
            len,
            shift,
            mask: block_size - 1,
            blocks,
        }
    }

    /// Logical number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements in a block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.mask + 1
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of allocated slots (`block_count * block_size`).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.blocks.len() << self.shift
    }

    /// Largest value representable by the storage width.
    #[inline]
    pub fn max_value(&self) -> T {
        T::MAX_VALUE
    }

    /// Returns the value stored for `doc`.
    #[inline]
    pub fn get(&self, doc: DocId) -> T {
        let doc = doc as usize;
        self.blocks[doc >> self.shift][doc & self.mask]
    }

    /// Stores `value` for `doc`, replacing the previous value.
    #[inline]
    pub fn add(&mut self, doc: DocId, value: T) {
        let doc = doc as usize;
        self.blocks[doc >> self.shift][doc & self.mask] = value;
    }

    /// Stores the low bits of `value` for `doc`, truncated to the storage width.
    #[inline]
    pub fn add_truncated(&mut self, doc: DocId, value: i32) {
        self.add(doc, T::truncate_from(value));
    }

    pub fn try_get(&self, doc: DocId) -> Result<T> {
        self.check_range(doc)?;
        Ok(self.get(doc))
    }

    pub fn try_add(&mut self, doc: DocId, value: T) -> Result<()> {
        self.check_range(doc)?;
        self.add(doc, value);
        Ok(())
    }

    /// Overwrites every slot of every block with `value`.
    pub fn fill(&mut self, value: T) {
        for block in self.blocks.iter_mut() {
            block.fill(value);
        }
    }

    /// Grows the array to cover at least `size` elements.
    ///
    /// New blocks are appended zeroed; existing blocks are left in place.
    /// A `size` not larger than `len()` is a no-op.
    pub fn ensure_capacity(&mut self, size: usize) {
        if size <= self.len {
            return;
        }
        // Slack of the last block may hold values written by `fill`.
        let reclaimed = size.min(self.capacity());
        for doc in self.len..reclaimed {
            self.blocks[doc >> self.shift][doc & self.mask] = T::zero();
        }
        let required_blocks = size.div_ceil(self.block_size());
        if required_blocks > self.blocks.len() {
            log::trace!(
                "growing segmented array from {} to {} blocks",
                self.blocks.len(),
                required_blocks
            );
            let block_size = self.block_size();
            self.blocks
                .resize_with(required_blocks, || Self::zeroed_block(block_size));
        }
        self.len = size;
    }

    /// Returns the first doc in `from..=max_doc` whose value equals `value`.
    ///
    /// `max_doc` is clamped to `len() - 1`.
    pub fn find_value(&self, value: T, from: DocId, max_doc: DocId) -> Option<DocId> {
        self.scan(from, max_doc, |v| v == value)
    }

    /// Returns the first doc in `from..=max_doc` whose value lies in `min..=max`.
    pub fn find_value_range(&self, min: T, max: T, from: DocId, max_doc: DocId) -> Option<DocId> {
        self.scan(from, max_doc, |v| v >= min && v <= max)
    }

    /// Returns the first doc in `from..=max_doc` whose value shares at least one
    /// bit with `bits`.
    pub fn find_bits(&self, bits: T, from: DocId, max_doc: DocId) -> Option<DocId> {
        let zero = T::zero();
        self.scan(from, max_doc, |v| (v & bits) != zero)
    }

    /// Iterates all `len()` values in document order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.blocks.iter().flat_map(|b| b.iter().copied()).take(self.len)
    }

    pub fn heap_size_bytes(&self) -> usize {
        self.capacity() * std::mem::size_of::<T>()
    }
}

impl<T: SegmentElement> SegmentedArray<T> {
    fn zeroed_block(block_size: usize) -> Box<[T]> {
        vec![T::zero(); block_size].into_boxed_slice()
    }

    #[inline]
    fn check_range(&self, doc: DocId) -> Result<()> {
        if (doc as usize) < self.len {
            Ok(())
        } else {
            Err(Error::out_of_range(doc as usize, self.len))
        }
    }

    /// Block-wise linear scan; the predicate runs over contiguous slices so the
    /// inner loop stays free of index arithmetic.
    #[inline]
    fn scan(&self, from: DocId, max_doc: DocId, pred: impl Fn(T) -> bool) -> Option<DocId> {
        if self.len == 0 {
            return None;
        }
        let end = (max_doc as usize).min(self.len - 1);
        let mut doc = from as usize;
        while doc <= end {
            let block = &self.blocks[doc >> self.shift];
            let start = doc & self.mask;
            let stop = (start + (end - doc)).min(self.mask);
            if let Some(pos) = block[start..=stop].iter().position(|&v| pred(v)) {
                return Some((doc + pos) as DocId);
            }
            doc += stop - start + 1;
        }
        None
    }
}

impl<T: SegmentElement> std::fmt::Debug for SegmentedArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentedArray")
            .field("len", &self.len)
            .field("block_size", &self.block_size())
            .field("block_count", &self.block_count())
            .finish()
    }
}

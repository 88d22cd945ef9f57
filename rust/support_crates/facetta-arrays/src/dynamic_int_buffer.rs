//! Append-only paged buffer of `i32` values used while building per-document
//! value lists.

use facetta_common::{Result, error::Error};

/// Append-only buffer of `i32` slots backed by fixed-size pages.
///
/// A pointer returned by [`DynamicIntBuffer::alloc`] addresses page
/// `ptr >> PAGE_SHIFT` at offset `ptr & PAGE_MASK`. An allocation never
/// straddles two pages: when the current page cannot hold the request the
/// cursor skips to the start of the next page, so a single allocation is
/// always readable as one contiguous slice via [`DynamicIntBuffer::slice`].
///
/// [`DynamicIntBuffer::reset`] rewinds the cursor and keeps the pages for the
/// next build pass. Reused pages keep their previous contents; every slot handed
/// out by `alloc` is expected to be written before it is read.
#[derive(Clone, Default)]
pub struct DynamicIntBuffer {
    pages: Vec<Box<[i32]>>,
    mark: usize,
}

impl DynamicIntBuffer {
    pub const PAGE_SHIFT: u32 = 10;
    pub const PAGE_SIZE: usize = 1 << Self::PAGE_SHIFT;
    pub const PAGE_MASK: usize = Self::PAGE_SIZE - 1;

    pub fn new() -> DynamicIntBuffer {
        DynamicIntBuffer::default()
    }

    /// Reserves `size` contiguous slots and returns the pointer to the first one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `size` exceeds [`Self::PAGE_SIZE`].
    pub fn alloc(&mut self, size: usize) -> Result<usize> {
        if size > Self::PAGE_SIZE {
            return Err(Error::invalid_arg(
                "size",
                format!(
                    "allocation of {size} slots exceeds the page size of {}",
                    Self::PAGE_SIZE
                ),
            ));
        }
        if size == 0 {
            return Ok(self.mark);
        }
        if (self.mark & Self::PAGE_MASK) + size > Self::PAGE_SIZE {
            self.mark = ((self.mark >> Self::PAGE_SHIFT) + 1) << Self::PAGE_SHIFT;
        }
        let ptr = self.mark;
        let last_page = (ptr + size - 1) >> Self::PAGE_SHIFT;
        while self.pages.len() <= last_page {
            self.pages
                .push(vec![0i32; Self::PAGE_SIZE].into_boxed_slice());
        }
        self.mark += size;
        Ok(ptr)
    }

    #[inline]
    pub fn set(&mut self, ptr: usize, value: i32) {
        self.pages[ptr >> Self::PAGE_SHIFT][ptr & Self::PAGE_MASK] = value;
    }

    #[inline]
    pub fn get(&self, ptr: usize) -> i32 {
        self.pages[ptr >> Self::PAGE_SHIFT][ptr & Self::PAGE_MASK]
    }

    /// Returns the `len` slots of an allocation starting at `ptr`.
    #[inline]
    pub fn slice(&self, ptr: usize, len: usize) -> &[i32] {
        if len == 0 {
            return &[];
        }
        let offset = ptr & Self::PAGE_MASK;
        &self.pages[ptr >> Self::PAGE_SHIFT][offset..offset + len]
    }

    #[inline]
    pub fn slice_mut(&mut self, ptr: usize, len: usize) -> &mut [i32] {
        if len == 0 {
            return &mut [];
        }
        let offset = ptr & Self::PAGE_MASK;
        &mut self.pages[ptr >> Self::PAGE_SHIFT][offset..offset + len]
    }

    /// Rewinds the allocation cursor without releasing pages.
    pub fn reset(&mut self) {
        self.mark = 0;
    }

    /// Position of the next allocation.
    #[inline]
    pub fn mark(&self) -> usize {
        self.mark
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn capacity(&self) -> usize {
        self.pages.len() * Self::PAGE_SIZE
    }
}

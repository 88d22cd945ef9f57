//! Per-document lists of dictionary indices for multi-valued facets.

use facetta_common::{DocId, Result, verify_arg};

use crate::dynamic_int_buffer::DynamicIntBuffer;

/// Frozen per-document value lists.
///
/// Each document owns a sorted, duplicate-free slice of dictionary indices.
/// The lists are stored back to back in one values buffer, delimited by
/// `len() + 1` offsets, so the values of document `d` are
/// `values[offsets[d]..offsets[d + 1]]`.
///
/// Every list holds at most [`NestedIntArray::max_items`] values. Lists longer
/// than that were truncated when the array was built (see
/// [`NestedIntArrayBuilder::add_values`]); the dropped values are not
/// recoverable from the array.
#[derive(Clone, Debug)]
pub struct NestedIntArray {
    offsets: Box<[u32]>,
    values: Box<[u32]>,
    max_items: usize,
}

impl NestedIntArray {
    /// Number of documents.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cap on the number of values kept per document.
    #[inline]
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Total number of stored values across all documents.
    #[inline]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Values of `doc` in ascending order; empty for documents without values.
    #[inline]
    pub fn values(&self, doc: DocId) -> &[u32] {
        let doc = doc as usize;
        &self.values[self.offsets[doc] as usize..self.offsets[doc + 1] as usize]
    }

    #[inline]
    pub fn count(&self, doc: DocId) -> usize {
        let doc = doc as usize;
        (self.offsets[doc + 1] - self.offsets[doc]) as usize
    }

    #[inline]
    pub fn contains(&self, doc: DocId, value: u32) -> bool {
        self.values(doc).binary_search(&value).is_ok()
    }

    /// Returns the first doc in `from..=max_doc` carrying `value`.
    pub fn find_value(&self, value: u32, from: DocId, max_doc: DocId) -> Option<DocId> {
        self.scan(from, max_doc, |values| values.binary_search(&value).is_ok())
    }

    /// Returns the first doc in `from..=max_doc` carrying any value in `min..=max`.
    pub fn find_value_range(&self, min: u32, max: u32, from: DocId, max_doc: DocId) -> Option<DocId> {
        self.scan(from, max_doc, |values| {
            let start = values.partition_point(|&v| v < min);
            start < values.len() && values[start] <= max
        })
    }

    pub fn heap_size_bytes(&self) -> usize {
        (self.offsets.len() + self.values.len()) * std::mem::size_of::<u32>()
    }

    fn scan(&self, from: DocId, max_doc: DocId, pred: impl Fn(&[u32]) -> bool) -> Option<DocId> {
        if self.is_empty() {
            return None;
        }
        let end = max_doc.min(self.len() as DocId - 1);
        (from..=end).find(|&doc| pred(self.values(doc)))
    }
}

/// Collects per-document value lists in a [`DynamicIntBuffer`] and freezes them
/// into a [`NestedIntArray`].
///
/// Documents may be added in any order; adding the same document again
/// replaces its list. The builder can be reused after [`Self::build`].
pub struct NestedIntArrayBuilder {
    buffer: DynamicIntBuffer,
    entries: Vec<(u32, u32)>,
    max_items: usize,
    dropped: usize,
    scratch: Vec<u32>,
}

impl NestedIntArrayBuilder {
    /// Default cap on values kept per document.
    pub const DEFAULT_MAX_ITEMS: usize = 1024;

    /// Creates a builder for `max_doc` documents keeping at most `max_items`
    /// values per document.
    ///
    /// `max_items` must be in `1..=DynamicIntBuffer::PAGE_SIZE`, since one
    /// document's list is a single buffer allocation.
    pub fn new(max_doc: usize, max_items: usize) -> Result<NestedIntArrayBuilder> {
        verify_arg!(max_items, max_items >= 1);
        verify_arg!(max_items, max_items <= DynamicIntBuffer::PAGE_SIZE);
        Ok(NestedIntArrayBuilder {
            buffer: DynamicIntBuffer::new(),
            entries: vec![(0, 0); max_doc],
            max_items,
            dropped: 0,
            scratch: Vec::new(),
        })
    }

    /// Sets the value list of `doc`.
    ///
    /// Values are sorted and deduplicated. When more than `max_items` distinct
    /// values remain, only the `max_items` smallest are kept and the rest are
    /// silently dropped; [`Self::dropped_values`] reports how many.
    pub fn add_values(&mut self, doc: DocId, values: &[u32]) -> Result<()> {
        let doc = doc as usize;
        if doc >= self.entries.len() {
            self.entries.resize(doc + 1, (0, 0));
        }
        self.scratch.clear();
        self.scratch.extend_from_slice(values);
        self.scratch.sort_unstable();
        self.scratch.dedup();
        let kept = self.scratch.len().min(self.max_items);
        self.dropped += self.scratch.len() - kept;

        let ptr = self.buffer.alloc(kept)?;
        for (slot, &value) in self
            .buffer
            .slice_mut(ptr, kept)
            .iter_mut()
            .zip(&self.scratch[..kept])
        {
            *slot = value as i32;
        }
        self.entries[doc] = (ptr as u32, kept as u32);
        Ok(())
    }

    /// Number of values dropped so far because of the per-document cap.
    pub fn dropped_values(&self) -> usize {
        self.dropped
    }

    /// Freezes the collected lists and resets the builder for another pass.
    pub fn build(&mut self) -> NestedIntArray {
        let total: usize = self.entries.iter().map(|&(_, len)| len as usize).sum();
        let mut offsets = Vec::with_capacity(self.entries.len() + 1);
        let mut values = Vec::with_capacity(total);
        offsets.push(0u32);
        for &(ptr, len) in &self.entries {
            values.extend(
                self.buffer
                    .slice(ptr as usize, len as usize)
                    .iter()
                    .map(|&v| v as u32),
            );
            offsets.push(values.len() as u32);
        }
        if self.dropped > 0 {
            log::debug!(
                "nested array build truncated {} values above the cap of {} per document",
                self.dropped,
                self.max_items
            );
        }

        let max_doc = self.entries.len();
        self.entries.clear();
        self.entries.resize(max_doc, (0, 0));
        self.buffer.reset();
        self.dropped = 0;

        NestedIntArray {
            offsets: offsets.into_boxed_slice(),
            values: values.into_boxed_slice(),
            max_items: self.max_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NestedIntArrayBuilder;

    #[test]
    fn test_build_and_read() {
        let mut builder = NestedIntArrayBuilder::new(4, 8).unwrap();
        builder.add_values(0, &[3, 1, 2]).unwrap();
        builder.add_values(2, &[5]).unwrap();
        builder.add_values(3, &[4, 4, 1]).unwrap();
        let array = builder.build();

        assert_eq!(array.len(), 4);
        assert_eq!(array.values(0), &[1, 2, 3]);
        assert!(array.values(1).is_empty());
        assert_eq!(array.values(2), &[5]);
        assert_eq!(array.values(3), &[1, 4]);
        assert_eq!(array.value_count(), 6);
        assert!(array.contains(3, 4));
        assert!(!array.contains(3, 3));
    }

    #[test]
    fn test_cap_truncates_silently() {
        let mut builder = NestedIntArrayBuilder::new(2, 2).unwrap();
        builder.add_values(0, &[9, 7, 8, 6]).unwrap();
        builder.add_values(1, &[1]).unwrap();
        assert_eq!(builder.dropped_values(), 2);
        let array = builder.build();
        assert_eq!(array.values(0), &[6, 7]);
        assert_eq!(array.count(0), 2);
        assert_eq!(array.max_items(), 2);
        assert_eq!(builder.dropped_values(), 0);
    }

    #[test]
    fn test_invalid_cap() {
        assert!(NestedIntArrayBuilder::new(1, 0).is_err());
        assert!(NestedIntArrayBuilder::new(1, 5000).is_err());
    }

    #[test]
    fn test_out_of_order_docs_and_growth() {
        let mut builder = NestedIntArrayBuilder::new(0, 4).unwrap();
        builder.add_values(5, &[2]).unwrap();
        builder.add_values(1, &[1, 2]).unwrap();
        builder.add_values(5, &[3]).unwrap();
        let array = builder.build();
        assert_eq!(array.len(), 6);
        assert_eq!(array.values(5), &[3]);
        assert_eq!(array.values(1), &[1, 2]);
    }

    #[test]
    fn test_scans() {
        let mut builder = NestedIntArrayBuilder::new(6, 4).unwrap();
        builder.add_values(1, &[2, 9]).unwrap();
        builder.add_values(3, &[4]).unwrap();
        builder.add_values(4, &[2]).unwrap();
        let array = builder.build();
        assert_eq!(array.find_value(2, 0, 5), Some(1));
        assert_eq!(array.find_value(2, 2, 5), Some(4));
        assert_eq!(array.find_value(7, 0, 5), None);
        assert_eq!(array.find_value_range(3, 8, 0, 5), Some(3));
        assert_eq!(array.find_value_range(5, 8, 0, 5), None);
        assert_eq!(array.find_value_range(9, 9, 0, 100), Some(1));
    }

    #[test]
    fn test_builder_reuse() {
        let mut builder = NestedIntArrayBuilder::new(2, 4).unwrap();
        builder.add_values(0, &[1, 2, 3]).unwrap();
        let first = builder.build();
        builder.add_values(1, &[7]).unwrap();
        let second = builder.build();
        assert_eq!(first.values(0), &[1, 2, 3]);
        assert!(second.values(0).is_empty());
        assert_eq!(second.values(1), &[7]);
    }
}

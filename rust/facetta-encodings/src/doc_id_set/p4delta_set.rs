use facetta_common::{DocId, DocIdIterator, Result, error::Error, verify_arg};

use crate::p4delta::{P4DeltaCodec, P4DeltaParams, contains_trusted, unpack_trusted};

/// Number of documents per packed batch unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// An append-only set of ascending document ids compressed in P4-delta batches.
///
/// Every full batch is packed independently with the slot width that minimizes
/// its size. The deltas of a batch are taken against the last document of the
/// previous batch (0 for the first one), so the first document of the set is
/// stored as its own value. Documents of the trailing, not yet full batch are
/// kept uncompressed.
#[derive(Clone, Debug)]
pub struct P4DeltaDocIdSet {
    batch_size: usize,
    batches: Vec<PackedBatch>,
    tail: Vec<DocId>,
    len: usize,
}

#[derive(Clone, Debug)]
struct PackedBatch {
    params: P4DeltaParams,
    words: Box<[u64]>,
    last: DocId,
}

impl P4DeltaDocIdSet {
    pub fn new(batch_size: usize) -> Result<P4DeltaDocIdSet> {
        verify_arg!(batch_size, batch_size >= 1);
        Ok(P4DeltaDocIdSet {
            batch_size,
            batches: Vec::new(),
            tail: Vec::with_capacity(batch_size),
            len: 0,
        })
    }

    /// Builds a set from strictly ascending documents.
    pub fn from_sorted(docs: &[DocId], batch_size: usize) -> Result<P4DeltaDocIdSet> {
        let mut set = P4DeltaDocIdSet::new(batch_size)?;
        for &doc in docs {
            set.add_doc(doc)?;
        }
        Ok(set)
    }

    /// Appends `doc`, which must be greater than every document added before.
    pub fn add_doc(&mut self, doc: DocId) -> Result<()> {
        if let Some(last) = self.last_doc() {
            if doc <= last {
                return Err(Error::invalid_arg(
                    "doc",
                    format!("document {doc} is not greater than the last document {last}"),
                ));
            }
        }
        self.tail.push(doc);
        self.len += 1;
        if self.tail.len() == self.batch_size {
            self.pack_tail()?;
        }
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of packed batches; the uncompressed tail is not counted.
    pub fn packed_batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn last_doc(&self) -> Option<DocId> {
        self.tail
            .last()
            .copied()
            .or_else(|| self.batches.last().map(|batch| batch.last))
    }

    pub fn contains(&self, doc: DocId) -> bool {
        let block = self.batches.partition_point(|batch| batch.last < doc);
        match self.batches.get(block) {
            Some(batch) => contains_trusted(&batch.params, &batch.words, doc),
            None => self.tail.binary_search(&doc).is_ok(),
        }
    }

    pub fn iter(&self) -> P4DeltaDocIdSetIter<'_> {
        P4DeltaDocIdSetIter {
            set: self,
            next_block: 0,
            buffer: Vec::with_capacity(self.batch_size),
            pos: 0,
        }
    }

    pub fn heap_size_bytes(&self) -> usize {
        self.batches
            .iter()
            .map(|batch| batch.words.len() * std::mem::size_of::<u64>())
            .sum::<usize>()
            + self.batches.capacity() * std::mem::size_of::<PackedBatch>()
            + self.tail.capacity() * std::mem::size_of::<DocId>()
    }

    fn pack_tail(&mut self) -> Result<()> {
        let base = self.batches.last().map_or(0, |batch| batch.last);
        let mut prev = base;
        let deltas = self
            .tail
            .iter()
            .map(|&doc| {
                let delta = doc - prev;
                prev = doc;
                delta
            })
            .collect::<Vec<_>>();
        let params = P4DeltaParams::estimate(base, &deltas)?;
        let words = P4DeltaCodec::with_params(params).compress_alt(&deltas)?;
        log::trace!(
            "packed doc batch #{}: b = {}, exceptions = {}, {} words",
            self.batches.len(),
            params.b,
            params.exception_count,
            words.len()
        );
        self.batches.push(PackedBatch {
            params,
            words: words.into_boxed_slice(),
            last: prev,
        });
        self.tail.clear();
        Ok(())
    }
}

/// Iterator over a [`P4DeltaDocIdSet`], decoding one batch at a time.
///
/// [`DocIdIterator::advance`] skips whole batches without decoding them.
pub struct P4DeltaDocIdSetIter<'a> {
    set: &'a P4DeltaDocIdSet,
    next_block: usize,
    buffer: Vec<DocId>,
    pos: usize,
}

impl P4DeltaDocIdSetIter<'_> {
    /// Decodes block `block` into the buffer; the block after the last packed
    /// batch is the tail.
    fn load(&mut self, block: usize) -> bool {
        let batches = &self.set.batches;
        if let Some(batch) = batches.get(block) {
            self.buffer.resize(self.set.batch_size, 0);
            unpack_trusted(&batch.params, &batch.words, &mut self.buffer);
        } else if block == batches.len() {
            self.buffer.clear();
            self.buffer.extend_from_slice(&self.set.tail);
        } else {
            self.pos = self.buffer.len();
            return false;
        }
        self.next_block = block + 1;
        self.pos = 0;
        true
    }
}

impl Iterator for P4DeltaDocIdSetIter<'_> {
    type Item = DocId;

    fn next(&mut self) -> Option<DocId> {
        loop {
            if let Some(&doc) = self.buffer.get(self.pos) {
                self.pos += 1;
                return Some(doc);
            }
            if !self.load(self.next_block) {
                return None;
            }
        }
    }
}

impl DocIdIterator for P4DeltaDocIdSetIter<'_> {
    fn advance(&mut self, target: DocId) -> Option<DocId> {
        let buffered = self.buffer.last().is_some_and(|&last| last >= target);
        if !buffered || self.pos >= self.buffer.len() {
            let batches = &self.set.batches;
            let from = self.next_block.min(batches.len());
            let block = from + batches[from..].partition_point(|batch| batch.last < target);
            let block = block.max(self.next_block);
            if !self.load(block) {
                return None;
            }
        }
        self.pos += self.buffer[self.pos..].partition_point(|&doc| doc < target);
        self.next()
    }
}

#[cfg(test)]
mod tests {
    use facetta_common::DocIdIterator;
    use itertools::Itertools;

    use super::P4DeltaDocIdSet;

    #[test]
    fn test_iterate_across_batches() {
        let docs = (0..50u32).map(|i| i * i).collect_vec();
        let set = P4DeltaDocIdSet::from_sorted(&docs, 8).unwrap();
        assert_eq!(set.len(), 50);
        assert_eq!(set.packed_batch_count(), 6);
        assert_eq!(set.iter().collect_vec(), docs);
        assert_eq!(set.last_doc(), Some(49 * 49));
    }

    #[test]
    fn test_rejects_unordered_docs() {
        let mut set = P4DeltaDocIdSet::new(4).unwrap();
        set.add_doc(5).unwrap();
        assert!(set.add_doc(5).is_err());
        assert!(set.add_doc(3).is_err());
        assert_eq!(set.len(), 1);
        assert!(P4DeltaDocIdSet::new(0).is_err());
    }

    #[test]
    fn test_advance_skips_batches() {
        let docs = (0..100u32).map(|i| i * 10).collect_vec();
        let set = P4DeltaDocIdSet::from_sorted(&docs, 16).unwrap();
        let mut iter = set.iter();
        assert_eq!(iter.advance(0), Some(0));
        assert_eq!(iter.advance(5), Some(10));
        assert_eq!(iter.advance(500), Some(500));
        assert_eq!(iter.next(), Some(510));
        assert_eq!(iter.advance(991), None);
        assert_eq!(iter.next(), None);

        let mut iter = set.iter();
        assert_eq!(iter.advance(985), Some(990));
        assert_eq!(iter.advance(10), None);
    }

    #[test]
    fn test_contains() {
        let docs = [1u32, 3, 1000, 1001, 70_000, 70_002, 9_000_000];
        let set = P4DeltaDocIdSet::from_sorted(&docs, 2).unwrap();
        for doc in docs {
            assert!(set.contains(doc));
        }
        assert!(!set.contains(0));
        assert!(!set.contains(2));
        assert!(!set.contains(70_001));
        assert!(!set.contains(9_000_001));
    }
}

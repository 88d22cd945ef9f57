//! Representation choice for document id sets.

use facetta_common::{DocId, Result, verify_arg};

use crate::doc_id_set::{DEFAULT_BATCH_SIZE, DocIdSet, DocSetKind, P4DeltaDocIdSet};
use crate::p4delta::{EXCEPTION_BITS, HEADER_BITS};

/// Thresholds used by [`DocSetAdvisor`].
#[derive(Debug, Clone, PartialEq)]
pub struct DocSetAdvisorConfig {
    /// Sets with at most this many documents are always stored as plain arrays.
    pub small_set_len: usize,
    /// Documents per packed batch of P4-delta sets.
    pub batch_size: usize,
    /// Share of P4-delta slots assumed to become exceptions until sets of a
    /// similar size have been observed.
    pub exception_ratio: f64,
}

impl Default for DocSetAdvisorConfig {
    fn default() -> Self {
        DocSetAdvisorConfig {
            small_set_len: 32,
            batch_size: DEFAULT_BATCH_SIZE,
            exception_ratio: 0.05,
        }
    }
}

impl DocSetAdvisorConfig {
    pub fn with_small_set_len(mut self, small_set_len: usize) -> Self {
        self.small_set_len = small_set_len;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_exception_ratio(mut self, exception_ratio: f64) -> Self {
        self.exception_ratio = exception_ratio;
        self
    }
}

/// Statistics of the sets observed in one size bucket.
///
/// Bucket `k` holds sets whose length `n` satisfies `floor(log2(n)) == k`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketStats {
    pub sets: u64,
    pub total_len: u64,
    pub min_len: usize,
    pub max_len: usize,
    /// Documents held by observed P4-delta sets.
    pub p4_docs: u64,
    /// Heap bytes of observed P4-delta sets.
    pub p4_bytes: u64,
}

impl BucketStats {
    fn record(&mut self, len: usize) {
        if self.sets == 0 {
            self.min_len = len;
            self.max_len = len;
        } else {
            self.min_len = self.min_len.min(len);
            self.max_len = self.max_len.max(len);
        }
        self.sets += 1;
        self.total_len += len as u64;
    }

    /// Observed P4-delta cost per document in bits, if any P4-delta set was seen.
    pub fn p4_bits_per_doc(&self) -> Option<f64> {
        (self.p4_docs > 0).then(|| self.p4_bytes as f64 * 8.0 / self.p4_docs as f64)
    }
}

const BUCKET_COUNT: usize = usize::BITS as usize;

/// Chooses the cheapest [`DocSetKind`] for a new document id set.
///
/// Candidate sizes are a bitmap of `max_doc` bits, a plain array of four bytes
/// per document, and a P4-delta estimate. The P4-delta estimate comes from the
/// average document gap unless sets of the same size bucket have already been
/// built, in which case their measured cost is used. Among equally sized
/// candidates the plain array wins over P4-delta, and P4-delta over the bitmap.
///
/// The advisor keeps its statistics per instance; each owner (typically one
/// facet handler per index segment) decides how long they live.
#[derive(Debug, Clone)]
pub struct DocSetAdvisor {
    config: DocSetAdvisorConfig,
    buckets: Box<[BucketStats]>,
}

impl Default for DocSetAdvisor {
    fn default() -> Self {
        DocSetAdvisor::new(DocSetAdvisorConfig::default())
    }
}

impl DocSetAdvisor {
    pub fn new(config: DocSetAdvisorConfig) -> DocSetAdvisor {
        DocSetAdvisor {
            config,
            buckets: vec![BucketStats::default(); BUCKET_COUNT].into_boxed_slice(),
        }
    }

    pub fn config(&self) -> &DocSetAdvisorConfig {
        &self.config
    }

    /// Statistics of the bucket that sets of `len` documents fall into.
    pub fn bucket_stats(&self, len: usize) -> Option<&BucketStats> {
        self.buckets
            .get(Self::bucket_of(len))
            .filter(|stats| stats.sets > 0)
    }

    /// Total number of observed sets.
    pub fn observed_sets(&self) -> u64 {
        self.buckets.iter().map(|stats| stats.sets).sum()
    }

    /// Forgets all observed statistics.
    pub fn reset(&mut self) {
        self.buckets.fill(BucketStats::default());
    }

    /// Suggests a representation for a set of `expected_len` documents drawn
    /// from `0..max_doc`.
    pub fn suggest(&self, expected_len: usize, max_doc: usize) -> DocSetKind {
        if expected_len <= self.config.small_set_len {
            return DocSetKind::IntArray;
        }
        if expected_len >= max_doc {
            return DocSetKind::Bits;
        }

        let bits_size = max_doc.div_ceil(8) as f64;
        let list_size = 4.0 * expected_len as f64;
        let p4_size = self.estimate_p4_bytes(expected_len, max_doc);
        let min_size = bits_size.min(list_size).min(p4_size);

        if list_size == min_size {
            DocSetKind::IntArray
        } else if p4_size == min_size {
            DocSetKind::P4Delta
        } else {
            DocSetKind::Bits
        }
    }

    /// Builds a set from strictly ascending `docs` in the suggested
    /// representation and records its statistics.
    pub fn build(&mut self, docs: &[DocId], max_doc: usize) -> Result<DocIdSet> {
        verify_arg!(batch_size, self.config.batch_size >= 1);
        let kind = self.suggest(docs.len(), max_doc);
        let set = match kind {
            DocSetKind::P4Delta => {
                verify_arg!(docs, docs.last().is_none_or(|&last| (last as usize) < max_doc));
                DocIdSet::P4Delta(P4DeltaDocIdSet::from_sorted(docs, self.config.batch_size)?)
            }
            kind => DocIdSet::from_sorted(kind, docs, max_doc)?,
        };
        log::debug!(
            "doc set of {} docs (max_doc {max_doc}) built as {kind:?}, {} bytes",
            docs.len(),
            set.heap_size_bytes()
        );
        self.observe(&set);
        Ok(set)
    }

    /// Records the statistics of a built set.
    pub fn observe(&mut self, set: &DocIdSet) {
        let len = set.len();
        if len == 0 {
            return;
        }
        let stats = &mut self.buckets[Self::bucket_of(len)];
        stats.record(len);
        if let DocIdSet::P4Delta(p4) = set {
            stats.p4_docs += len as u64;
            stats.p4_bytes += p4.heap_size_bytes() as u64;
        }
    }

    fn estimate_p4_bytes(&self, len: usize, max_doc: usize) -> f64 {
        if let Some(bits_per_doc) = self
            .bucket_stats(len)
            .and_then(BucketStats::p4_bits_per_doc)
        {
            return bits_per_doc * len as f64 / 8.0;
        }
        let gap = (max_doc / len.max(1)).max(1) as f64;
        // One flag bit on top of the bits of an average gap.
        let slot_bits = gap.log2().ceil() + 1.0;
        let exception_bits = self.config.exception_ratio * EXCEPTION_BITS as f64;
        let batches = len.div_ceil(self.config.batch_size.max(1)) as f64;
        (len as f64 * (slot_bits + exception_bits) + batches * HEADER_BITS as f64) / 8.0
    }

    fn bucket_of(len: usize) -> usize {
        len.max(1).ilog2() as usize
    }
}

//! Per-field facet data: document values, their dictionary and per-value
//! statistics.

use facetta_arrays::{NestedIntArray, NestedIntArrayBuilder, OrderArray};
use facetta_common::{DocId, Result, error::Error, verify_arg};

use crate::term_list::{NumericTerm, NumericTermList, StringTermList, TermList};

/// Facet data of one field in one index segment, as consumed by the count
/// aggregator and the scan filters.
pub trait FacetData: Send + Sync {
    fn term_list(&self) -> &dyn TermList;

    /// Number of documents carrying each value over the whole segment.
    ///
    /// Slot 0 counts documents without a value.
    fn freqs(&self) -> &[u32];

    /// Number of documents in the segment.
    fn doc_count(&self) -> usize;

    fn is_multi_valued(&self) -> bool;

    /// Increments the count of every value of `doc`, or slot 0 when `doc` has
    /// no value.
    fn count_doc(&self, doc: DocId, counts: &mut [u32]);

    /// Calls `f` with every value index of `doc`, or with 0 when `doc` has no
    /// value.
    fn for_each_value(&self, doc: DocId, f: &mut dyn FnMut(u32));

    /// Smallest document carrying the value at `index`.
    fn min_doc_id(&self, index: usize) -> Option<DocId>;

    /// Largest document carrying the value at `index`.
    fn max_doc_id(&self, index: usize) -> Option<DocId>;

    /// Returns the first doc in `from..=max_doc` carrying the value at `index`.
    fn find_value(&self, index: u32, from: DocId, max_doc: DocId) -> Option<DocId>;

    /// Returns the first doc in `from..=max_doc` carrying a value with an index
    /// in `min..=max`.
    fn find_value_range(&self, min: u32, max: u32, from: DocId, max_doc: DocId) -> Option<DocId>;
}

/// Frequencies and doc id bounds per dictionary index.
#[derive(Clone, Debug)]
struct ValueStats {
    freqs: Vec<u32>,
    min_ids: Vec<DocId>,
    max_ids: Vec<DocId>,
}

impl ValueStats {
    fn new(cardinality: usize) -> ValueStats {
        ValueStats {
            freqs: vec![0; cardinality],
            min_ids: vec![DocId::MAX; cardinality],
            max_ids: vec![0; cardinality],
        }
    }

    #[inline]
    fn record(&mut self, index: usize, doc: DocId) {
        self.freqs[index] += 1;
        self.min_ids[index] = self.min_ids[index].min(doc);
        self.max_ids[index] = self.max_ids[index].max(doc);
    }

    fn min_doc_id(&self, index: usize) -> Option<DocId> {
        (self.freqs.get(index).copied().unwrap_or(0) > 0).then(|| self.min_ids[index])
    }

    fn max_doc_id(&self, index: usize) -> Option<DocId> {
        (self.freqs.get(index).copied().unwrap_or(0) > 0).then(|| self.max_ids[index])
    }

    fn heap_size_bytes(&self) -> usize {
        (self.freqs.len() + self.min_ids.len() + self.max_ids.len()) * std::mem::size_of::<u32>()
    }
}

fn verify_doc_count(max_doc: usize) -> Result<()> {
    verify_arg!(max_doc, max_doc <= DocId::MAX as usize);
    Ok(())
}

fn check_index(index: usize, cardinality: usize, doc: DocId) -> Result<usize> {
    if index >= cardinality {
        return Err(Error::invalid_arg(
            "index",
            format!("value index {index} of document {doc} exceeds the dictionary size {cardinality}"),
        ));
    }
    Ok(index)
}

/// Facet data of a single-valued field.
///
/// Values live in an [`OrderArray`] whose width fits the dictionary size.
pub struct FacetDataCache {
    order: OrderArray,
    terms: Box<dyn TermList>,
    stats: ValueStats,
}

impl FacetDataCache {
    /// Builds the cache from dictionary indices supplied per document.
    ///
    /// `index_of` is called once for every document in `0..max_doc`, and must
    /// return an index below `terms.len()`; 0 marks a document without value.
    pub fn from_indices<F>(terms: Box<dyn TermList>, max_doc: usize, index_of: F) -> Result<Self>
    where
        F: Fn(DocId) -> u32,
    {
        verify_doc_count(max_doc)?;
        let cardinality = terms.len();
        let mut order = OrderArray::new(max_doc, cardinality);
        let mut stats = ValueStats::new(cardinality);
        for doc in 0..max_doc as DocId {
            let index = check_index(index_of(doc) as usize, cardinality, doc)?;
            if index != 0 {
                order.add(doc, index as u32);
            }
            stats.record(index, doc);
        }
        log::debug!(
            "facet data built: {max_doc} docs, {cardinality} terms, {:?} order array",
            order.kind()
        );
        Ok(FacetDataCache {
            order,
            terms,
            stats,
        })
    }

    /// Builds the dictionary and the cache from raw string values.
    pub fn build_strings<'v, F>(max_doc: usize, value_of: F) -> Result<Self>
    where
        F: Fn(DocId) -> Option<&'v str>,
    {
        verify_doc_count(max_doc)?;
        let mut builder = StringTermList::builder();
        for doc in 0..max_doc as DocId {
            if let Some(value) = value_of(doc) {
                builder.add(value);
            }
        }
        let terms = builder.freeze();
        let indices = (0..max_doc as DocId)
            .map(|doc| value_of(doc).map_or(0, |value| terms.index_of(value).unwrap_or(0)))
            .collect::<Vec<_>>();
        Self::from_indices(Box::new(terms), max_doc, |doc| indices[doc as usize] as u32)
    }

    /// Builds the dictionary and the cache from raw integer values.
    pub fn build_numeric<T, F>(max_doc: usize, padding: usize, value_of: F) -> Result<Self>
    where
        T: NumericTerm,
        F: Fn(DocId) -> Option<T>,
    {
        verify_doc_count(max_doc)?;
        let mut builder = NumericTermList::<T>::builder().with_padding(padding);
        builder.extend((0..max_doc as DocId).filter_map(&value_of));
        let terms = builder.freeze();
        let indices = (0..max_doc as DocId)
            .map(|doc| value_of(doc).map_or(0, |value| terms.index_of_value(value).unwrap_or(0)))
            .collect::<Vec<_>>();
        Self::from_indices(Box::new(terms), max_doc, |doc| indices[doc as usize] as u32)
    }

    pub fn order_array(&self) -> &OrderArray {
        &self.order
    }

    /// Dictionary index of the value of `doc`.
    #[inline]
    pub fn value_index(&self, doc: DocId) -> u32 {
        self.order.get(doc)
    }

    /// Display value of `doc`; empty when the document has no value.
    pub fn value(&self, doc: DocId) -> String {
        self.terms.get(self.value_index(doc) as usize)
    }

    /// Returns the first doc in `from..=max_doc` whose value index shares a
    /// bit with `bits`.
    pub fn find_bits(&self, bits: u32, from: DocId, max_doc: DocId) -> Option<DocId> {
        self.order.find_bits(bits, from, max_doc)
    }

    pub fn heap_size_bytes(&self) -> usize {
        self.order.heap_size_bytes() + self.stats.heap_size_bytes()
    }
}

impl FacetData for FacetDataCache {
    fn term_list(&self) -> &dyn TermList {
        self.terms.as_ref()
    }

    fn freqs(&self) -> &[u32] {
        &self.stats.freqs
    }

    fn doc_count(&self) -> usize {
        self.order.len()
    }

    fn is_multi_valued(&self) -> bool {
        false
    }

    #[inline]
    fn count_doc(&self, doc: DocId, counts: &mut [u32]) {
        counts[self.order.get(doc) as usize] += 1;
    }

    fn for_each_value(&self, doc: DocId, f: &mut dyn FnMut(u32)) {
        f(self.order.get(doc));
    }

    fn min_doc_id(&self, index: usize) -> Option<DocId> {
        self.stats.min_doc_id(index)
    }

    fn max_doc_id(&self, index: usize) -> Option<DocId> {
        self.stats.max_doc_id(index)
    }

    fn find_value(&self, index: u32, from: DocId, max_doc: DocId) -> Option<DocId> {
        self.order.find_value(index, from, max_doc)
    }

    fn find_value_range(&self, min: u32, max: u32, from: DocId, max_doc: DocId) -> Option<DocId> {
        self.order.find_value_range(min, max, from, max_doc)
    }
}

/// Facet data of a multi-valued field.
///
/// Each document keeps at most `max_items` distinct values; the smallest
/// indices win and the rest are dropped at build time.
pub struct MultiValueFacetDataCache {
    nested: NestedIntArray,
    terms: Box<dyn TermList>,
    stats: ValueStats,
}

impl MultiValueFacetDataCache {
    /// Builds the cache from dictionary indices supplied per document.
    ///
    /// `values_of` appends the indices of a document to the provided buffer.
    /// Index 0 stands for no value and is not stored.
    pub fn from_indices<F>(
        terms: Box<dyn TermList>,
        max_doc: usize,
        max_items: usize,
        mut values_of: F,
    ) -> Result<Self>
    where
        F: FnMut(DocId, &mut Vec<u32>),
    {
        verify_doc_count(max_doc)?;
        let cardinality = terms.len();
        let mut builder = NestedIntArrayBuilder::new(max_doc, max_items)?;
        let mut scratch = Vec::new();
        for doc in 0..max_doc as DocId {
            scratch.clear();
            values_of(doc, &mut scratch);
            for &index in &scratch {
                check_index(index as usize, cardinality, doc)?;
            }
            scratch.retain(|&index| index != 0);
            builder.add_values(doc, &scratch)?;
        }
        let dropped = builder.dropped_values();
        let nested = builder.build();

        let mut stats = ValueStats::new(cardinality);
        for doc in 0..max_doc as DocId {
            let values = nested.values(doc);
            if values.is_empty() {
                stats.record(0, doc);
            }
            for &index in values {
                stats.record(index as usize, doc);
            }
        }
        log::debug!(
            "multi-value facet data built: {max_doc} docs, {cardinality} terms, {} values, {dropped} dropped above {max_items} per doc",
            nested.value_count()
        );
        Ok(MultiValueFacetDataCache {
            nested,
            terms,
            stats,
        })
    }

    /// Builds the dictionary and the cache from raw string values.
    pub fn build_strings<'v, F, I>(max_doc: usize, max_items: usize, values_of: F) -> Result<Self>
    where
        F: Fn(DocId) -> I,
        I: IntoIterator<Item = &'v str>,
    {
        verify_doc_count(max_doc)?;
        let mut builder = StringTermList::builder();
        for doc in 0..max_doc as DocId {
            for value in values_of(doc) {
                builder.add(value);
            }
        }
        let terms = builder.freeze();
        let mut indices = Vec::with_capacity(max_doc);
        for doc in 0..max_doc as DocId {
            indices.push(
                values_of(doc)
                    .into_iter()
                    .filter_map(|value| terms.index_of(value).ok())
                    .map(|index| index as u32)
                    .collect::<Vec<_>>(),
            );
        }
        Self::from_indices(Box::new(terms), max_doc, max_items, |doc, out| {
            out.extend_from_slice(&indices[doc as usize])
        })
    }

    /// Builds the dictionary and the cache from raw integer values.
    pub fn build_numeric<T, F, I>(
        max_doc: usize,
        max_items: usize,
        padding: usize,
        values_of: F,
    ) -> Result<Self>
    where
        T: NumericTerm,
        F: Fn(DocId) -> I,
        I: IntoIterator<Item = T>,
    {
        verify_doc_count(max_doc)?;
        let mut builder = NumericTermList::<T>::builder().with_padding(padding);
        for doc in 0..max_doc as DocId {
            builder.extend(values_of(doc));
        }
        let terms = builder.freeze();
        let mut indices = Vec::with_capacity(max_doc);
        for doc in 0..max_doc as DocId {
            indices.push(
                values_of(doc)
                    .into_iter()
                    .filter_map(|value| terms.index_of_value(value).ok())
                    .map(|index| index as u32)
                    .collect::<Vec<_>>(),
            );
        }
        Self::from_indices(Box::new(terms), max_doc, max_items, |doc, out| {
            out.extend_from_slice(&indices[doc as usize])
        })
    }

    pub fn nested_array(&self) -> &NestedIntArray {
        &self.nested
    }

    /// Dictionary indices of `doc` in ascending order.
    #[inline]
    pub fn value_indices(&self, doc: DocId) -> &[u32] {
        self.nested.values(doc)
    }

    /// Display values of `doc` in dictionary order.
    pub fn values(&self, doc: DocId) -> Vec<String> {
        self.value_indices(doc)
            .iter()
            .map(|&index| self.terms.get(index as usize))
            .collect()
    }

    pub fn max_items(&self) -> usize {
        self.nested.max_items()
    }

    pub fn heap_size_bytes(&self) -> usize {
        self.nested.heap_size_bytes() + self.stats.heap_size_bytes()
    }
}

impl FacetData for MultiValueFacetDataCache {
    fn term_list(&self) -> &dyn TermList {
        self.terms.as_ref()
    }

    fn freqs(&self) -> &[u32] {
        &self.stats.freqs
    }

    fn doc_count(&self) -> usize {
        self.nested.len()
    }

    fn is_multi_valued(&self) -> bool {
        true
    }

    #[inline]
    fn count_doc(&self, doc: DocId, counts: &mut [u32]) {
        let values = self.nested.values(doc);
        if values.is_empty() {
            counts[0] += 1;
        }
        for &index in values {
            counts[index as usize] += 1;
        }
    }

    fn for_each_value(&self, doc: DocId, f: &mut dyn FnMut(u32)) {
        let values = self.nested.values(doc);
        if values.is_empty() {
            f(0);
        }
        for &index in values {
            f(index);
        }
    }

    fn min_doc_id(&self, index: usize) -> Option<DocId> {
        self.stats.min_doc_id(index)
    }

    fn max_doc_id(&self, index: usize) -> Option<DocId> {
        self.stats.max_doc_id(index)
    }

    fn find_value(&self, index: u32, from: DocId, max_doc: DocId) -> Option<DocId> {
        self.nested.find_value(index, from, max_doc)
    }

    fn find_value_range(&self, min: u32, max: u32, from: DocId, max_doc: DocId) -> Option<DocId> {
        self.nested.find_value_range(min, max, from, max_doc)
    }
}

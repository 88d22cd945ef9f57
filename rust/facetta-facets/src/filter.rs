//! Document iterators selecting the documents of facet values.
//!
//! Each iterator scans the field's document values directly, bounded by the
//! smallest and largest document of the selected values, and yields matching
//! documents in ascending order.

use facetta_bits::BitSet;
use facetta_common::{DocId, DocIdIterator};

use crate::{
    data_cache::{FacetData, FacetDataCache},
    term_list::TermList,
};

/// Doc id bounds of a scan; `None` when nothing can match.
fn bounds<D: FacetData + ?Sized>(
    data: &D,
    indices: impl Iterator<Item = usize>,
) -> Option<(DocId, DocId)> {
    indices
        .filter_map(|index| Some((data.min_doc_id(index)?, data.max_doc_id(index)?)))
        .reduce(|(lo, hi), (min, max)| (lo.min(min), hi.max(max)))
}

/// Shared cursor state of the scan iterators.
#[derive(Clone, Copy, Debug)]
struct Cursor {
    next: DocId,
    max_doc: DocId,
    done: bool,
}

impl Cursor {
    fn new(bounds: Option<(DocId, DocId)>) -> Cursor {
        match bounds {
            Some((min, max)) => Cursor {
                next: min,
                max_doc: max,
                done: false,
            },
            None => Cursor {
                next: 0,
                max_doc: 0,
                done: true,
            },
        }
    }

    #[inline]
    fn step(&mut self, find: impl FnOnce(DocId, DocId) -> Option<DocId>) -> Option<DocId> {
        if self.done || self.next > self.max_doc {
            self.done = true;
            return None;
        }
        match find(self.next, self.max_doc) {
            Some(doc) => {
                match doc.checked_add(1) {
                    Some(next) => self.next = next,
                    None => self.done = true,
                }
                Some(doc)
            }
            None => {
                self.done = true;
                None
            }
        }
    }

    #[inline]
    fn skip_to(&mut self, target: DocId) {
        self.next = self.next.max(target);
    }
}

/// Documents carrying one value.
pub struct ValueDocIterator<'a, D: FacetData + ?Sized> {
    data: &'a D,
    index: u32,
    cursor: Cursor,
}

impl<'a, D: FacetData + ?Sized> ValueDocIterator<'a, D> {
    pub fn new(data: &'a D, index: u32) -> Self {
        let cursor = Cursor::new(bounds(data, std::iter::once(index as usize)));
        ValueDocIterator {
            data,
            index,
            cursor,
        }
    }

    /// Iterator over the documents of the display value `value`; empty when the
    /// value is not in the dictionary.
    pub fn for_value(data: &'a D, value: &str) -> Self {
        match data.term_list().index_of(value) {
            Ok(index) => Self::new(data, index as u32),
            Err(_) => ValueDocIterator {
                data,
                index: 0,
                cursor: Cursor::new(None),
            },
        }
    }
}

impl<D: FacetData + ?Sized> Iterator for ValueDocIterator<'_, D> {
    type Item = DocId;

    fn next(&mut self) -> Option<DocId> {
        let (data, index) = (self.data, self.index);
        self.cursor
            .step(|from, max_doc| data.find_value(index, from, max_doc))
    }
}

impl<D: FacetData + ?Sized> DocIdIterator for ValueDocIterator<'_, D> {
    fn advance(&mut self, target: DocId) -> Option<DocId> {
        self.cursor.skip_to(target);
        self.next()
    }
}

/// Documents carrying a value with an index in `min..=max`.
pub struct RangeDocIterator<'a, D: FacetData + ?Sized> {
    data: &'a D,
    min: u32,
    max: u32,
    cursor: Cursor,
}

impl<'a, D: FacetData + ?Sized> RangeDocIterator<'a, D> {
    /// `max` past the end of the dictionary is clamped to its last index.
    pub fn new(data: &'a D, min: u32, max: u32) -> Self {
        let last = data.term_list().len().saturating_sub(1);
        let max = (max as usize).min(last) as u32;
        let indices = if min <= max {
            min as usize..max as usize + 1
        } else {
            0..0
        };
        let cursor = Cursor::new(bounds(data, indices));
        RangeDocIterator {
            data,
            min,
            max,
            cursor,
        }
    }

    /// Iterator over the documents whose display value lies in `from..=to` in
    /// the natural order of the dictionary.
    pub fn for_values(data: &'a D, from: &str, to: &str) -> Self {
        let terms = data.term_list();
        let min = terms.index_of(from).unwrap_or_else(|i| i).max(1);
        let max = match terms.index_of(to) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        if min > max {
            return RangeDocIterator {
                data,
                min: 1,
                max: 0,
                cursor: Cursor::new(None),
            };
        }
        Self::new(data, min as u32, max as u32)
    }
}

impl<D: FacetData + ?Sized> Iterator for RangeDocIterator<'_, D> {
    type Item = DocId;

    fn next(&mut self) -> Option<DocId> {
        let (data, min, max) = (self.data, self.min, self.max);
        self.cursor
            .step(|from, max_doc| data.find_value_range(min, max, from, max_doc))
    }
}

impl<D: FacetData + ?Sized> DocIdIterator for RangeDocIterator<'_, D> {
    fn advance(&mut self, target: DocId) -> Option<DocId> {
        self.cursor.skip_to(target);
        self.next()
    }
}

/// Documents of a single-valued field whose value index shares a bit with a
/// mask, for fields whose dictionary indices encode flags.
pub struct BitsDocIterator<'a> {
    cache: &'a FacetDataCache,
    bits: u32,
    cursor: Cursor,
}

impl<'a> BitsDocIterator<'a> {
    pub fn new(cache: &'a FacetDataCache, bits: u32) -> Self {
        let len = cache.order_array().len();
        let bounds = (bits != 0 && len > 0).then(|| (0, (len - 1) as DocId));
        BitsDocIterator {
            cache,
            bits,
            cursor: Cursor::new(bounds),
        }
    }
}

impl Iterator for BitsDocIterator<'_> {
    type Item = DocId;

    fn next(&mut self) -> Option<DocId> {
        let (cache, bits) = (self.cache, self.bits);
        self.cursor
            .step(|from, max_doc| cache.find_bits(bits, from, max_doc))
    }
}

impl DocIdIterator for BitsDocIterator<'_> {
    fn advance(&mut self, target: DocId) -> Option<DocId> {
        self.cursor.skip_to(target);
        self.next()
    }
}

/// Builds the selection bitmap of `values` over the dictionary of `terms`.
///
/// Values missing from the dictionary are ignored.
pub fn selection_bits<S: AsRef<str>>(
    terms: &dyn TermList,
    values: impl IntoIterator<Item = S>,
) -> BitSet {
    let mut selected = BitSet::new(terms.len());
    for value in values {
        if let Ok(index) = terms.index_of(value.as_ref()) {
            selected.set(index);
        }
    }
    selected
}

/// Documents carrying any of the values selected in a bitmap over the
/// dictionary.
pub struct SelectionDocIterator<'a, D: FacetData + ?Sized> {
    data: &'a D,
    selected: &'a BitSet,
    doc_count: DocId,
    cursor: Cursor,
}

impl<'a, D: FacetData + ?Sized> SelectionDocIterator<'a, D> {
    pub fn new(data: &'a D, selected: &'a BitSet) -> Self {
        let cursor = Cursor::new(bounds(data, selected.iter()));
        SelectionDocIterator {
            data,
            selected,
            doc_count: data.doc_count() as DocId,
            cursor,
        }
    }
}

impl<D: FacetData + ?Sized> Iterator for SelectionDocIterator<'_, D> {
    type Item = DocId;

    fn next(&mut self) -> Option<DocId> {
        let (data, selected) = (self.data, self.selected);
        let last = self.doc_count.saturating_sub(1);
        self.cursor.step(|from, max_doc| {
            (from..=max_doc.min(last)).find(|&doc| {
                let mut hit = false;
                data.for_each_value(doc, &mut |index| hit |= selected.get(index as usize));
                hit
            })
        })
    }
}

impl<D: FacetData + ?Sized> DocIdIterator for SelectionDocIterator<'_, D> {
    fn advance(&mut self, target: DocId) -> Option<DocId> {
        self.cursor.skip_to(target);
        self.next()
    }
}

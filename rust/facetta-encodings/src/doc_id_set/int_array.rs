use facetta_common::{DocId, DocIdIterator, Result, error::Error};

/// Uncompressed set of ascending document ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntArrayDocIdSet {
    docs: Vec<DocId>,
}

impl IntArrayDocIdSet {
    pub fn new() -> IntArrayDocIdSet {
        IntArrayDocIdSet::default()
    }

    pub fn with_capacity(capacity: usize) -> IntArrayDocIdSet {
        IntArrayDocIdSet {
            docs: Vec::with_capacity(capacity),
        }
    }

    pub fn from_sorted(docs: Vec<DocId>) -> Result<IntArrayDocIdSet> {
        if let Some(pos) = docs.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(Error::invalid_arg(
                "docs",
                format!("documents are not strictly ascending at position {}", pos + 1),
            ));
        }
        Ok(IntArrayDocIdSet { docs })
    }

    /// Appends `doc`, which must be greater than every document added before.
    pub fn add_doc(&mut self, doc: DocId) -> Result<()> {
        if let Some(&last) = self.docs.last() {
            if doc <= last {
                return Err(Error::invalid_arg(
                    "doc",
                    format!("document {doc} is not greater than the last document {last}"),
                ));
            }
        }
        self.docs.push(doc);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn as_slice(&self) -> &[DocId] {
        &self.docs
    }

    pub fn contains(&self, doc: DocId) -> bool {
        self.docs.binary_search(&doc).is_ok()
    }

    pub fn iter(&self) -> IntArrayDocIdSetIter<'_> {
        IntArrayDocIdSetIter {
            docs: &self.docs,
            pos: 0,
        }
    }

    pub fn heap_size_bytes(&self) -> usize {
        self.docs.capacity() * std::mem::size_of::<DocId>()
    }
}

pub struct IntArrayDocIdSetIter<'a> {
    docs: &'a [DocId],
    pos: usize,
}

impl Iterator for IntArrayDocIdSetIter<'_> {
    type Item = DocId;

    #[inline]
    fn next(&mut self) -> Option<DocId> {
        let doc = *self.docs.get(self.pos)?;
        self.pos += 1;
        Some(doc)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.docs.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl DocIdIterator for IntArrayDocIdSetIter<'_> {
    fn advance(&mut self, target: DocId) -> Option<DocId> {
        let rest = self.docs.get(self.pos..).unwrap_or_default();
        self.pos += rest.partition_point(|&doc| doc < target);
        self.next()
    }
}

use crate::{browse_facet::BrowseFacet, term_list::TermList};

/// Walks a count array in value order, skipping the null slot.
///
/// Every value of the dictionary is visited, including values without hits;
/// [`FacetIterator::next_with_min_hits`] skips over entries below a threshold
/// without materializing them.
#[derive(Clone)]
pub struct FacetIterator<'a> {
    counts: &'a [u32],
    terms: &'a dyn TermList,
    pos: usize,
}

impl<'a> FacetIterator<'a> {
    /// Creates an iterator over `counts`, whose slots are indices into `terms`.
    pub fn new(counts: &'a [u32], terms: &'a dyn TermList) -> FacetIterator<'a> {
        debug_assert!(counts.len() <= terms.len());
        FacetIterator {
            counts,
            terms,
            pos: 1,
        }
    }

    pub fn term_list(&self) -> &'a dyn TermList {
        self.terms
    }

    /// Returns the next facet with at least `min_hits` hits.
    pub fn next_with_min_hits(&mut self, min_hits: u32) -> Option<BrowseFacet> {
        let skip = self
            .counts
            .get(self.pos..)?
            .iter()
            .position(|&hits| hits >= min_hits);
        match skip {
            Some(skip) => {
                self.pos += skip;
                self.next()
            }
            None => {
                self.pos = self.counts.len();
                None
            }
        }
    }
}

impl Iterator for FacetIterator<'_> {
    type Item = BrowseFacet;

    fn next(&mut self) -> Option<BrowseFacet> {
        let hits = *self.counts.get(self.pos)?;
        let facet = BrowseFacet::new(self.terms.get(self.pos), hits);
        self.pos += 1;
        Some(facet)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.counts.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FacetIterator<'_> {}

//! Forward-only iteration over ascending document ids.

use crate::DocId;

/// An iterator over strictly ascending document ids that can skip ahead.
///
/// Implementors yield each matching document once, in increasing order.
pub trait DocIdIterator: Iterator<Item = DocId> {
    /// Advances to the first document `>= target` and returns it.
    ///
    /// Documents skipped over are consumed. The default implementation steps
    /// through `next()`; implementors with block structure override it.
    fn advance(&mut self, target: DocId) -> Option<DocId> {
        while let Some(doc) = self.next() {
            if doc >= target {
                return Some(doc);
            }
        }
        None
    }
}

impl<I: DocIdIterator + ?Sized> DocIdIterator for Box<I> {
    fn advance(&mut self, target: DocId) -> Option<DocId> {
        (**self).advance(target)
    }
}

#[cfg(test)]
mod tests {
    use super::DocIdIterator;
    use crate::DocId;

    struct Evens(std::ops::Range<DocId>);

    impl Iterator for Evens {
        type Item = DocId;

        fn next(&mut self) -> Option<DocId> {
            self.0.by_ref().find(|doc| doc % 2 == 0)
        }
    }

    impl DocIdIterator for Evens {}

    #[test]
    fn test_default_advance() {
        let mut docs = Evens(0..20);
        assert_eq!(docs.next(), Some(0));
        assert_eq!(docs.advance(5), Some(6));
        assert_eq!(docs.advance(6), Some(8));
        assert_eq!(docs.next(), Some(10));
        assert_eq!(docs.advance(100), None);
    }

    #[test]
    fn test_boxed_advance() {
        let mut docs: Box<dyn DocIdIterator> = Box::new(Evens(0..20));
        assert_eq!(docs.advance(7), Some(8));
        assert_eq!(docs.next(), Some(10));
        assert_eq!(docs.advance(19), None);
    }
}

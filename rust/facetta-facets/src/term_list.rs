//! Value dictionaries mapping dense indices to display values.
//!
//! Index 0 of every term list is the null term, displayed as an empty string.
//! Documents without a value are mapped to it. The remaining entries are
//! sorted in the natural order of the value type: lexicographic for strings,
//! numeric for integers. An index therefore orders values the same way as the
//! values themselves, which lets counts be walked in value order by index.

use std::{cmp::Ordering, fmt, str::FromStr};

use num_traits::PrimInt;

/// Read access to a frozen value dictionary.
pub trait TermList: Send + Sync + fmt::Debug {
    /// Number of entries, including the null term at index 0.
    fn len(&self) -> usize;

    /// Whether the list holds nothing but the null term.
    fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Display form of the value at `index`; empty for the null term.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    fn get(&self, index: usize) -> String;

    /// Looks up a value by its display form.
    ///
    /// Returns `Ok(index)` when present and `Err(insertion_index)` otherwise,
    /// like `slice::binary_search`. The empty string resolves to the null term.
    fn index_of(&self, value: &str) -> Result<usize, usize>;

    /// Compares two display values in the natural order of this list.
    ///
    /// The empty string (null) sorts before everything else.
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Term list of string values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringTermList {
    terms: Vec<String>,
}

impl Default for StringTermList {
    fn default() -> Self {
        StringTermList {
            terms: vec![String::new()],
        }
    }
}

impl StringTermList {
    pub fn builder() -> StringTermListBuilder {
        StringTermListBuilder::default()
    }

    pub fn from_values<S: AsRef<str>>(values: impl IntoIterator<Item = S>) -> StringTermList {
        let mut builder = Self::builder();
        for value in values {
            builder.add(value.as_ref());
        }
        builder.freeze()
    }

    /// All terms, starting with the null term.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn term(&self, index: usize) -> &str {
        &self.terms[index]
    }
}

impl TermList for StringTermList {
    fn len(&self) -> usize {
        self.terms.len()
    }

    fn get(&self, index: usize) -> String {
        self.terms[index].clone()
    }

    fn index_of(&self, value: &str) -> Result<usize, usize> {
        if value.is_empty() {
            return Ok(0);
        }
        self.terms[1..]
            .binary_search_by(|term| term.as_str().cmp(value))
            .map(|i| i + 1)
            .map_err(|i| i + 1)
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

/// Collects raw string values for a [`StringTermList`].
#[derive(Clone, Debug, Default)]
pub struct StringTermListBuilder {
    values: Vec<String>,
}

impl StringTermListBuilder {
    /// Adds a value; empty strings stand for null and are ignored.
    pub fn add(&mut self, value: &str) {
        if !value.is_empty() {
            self.values.push(value.to_string());
        }
    }

    /// Sorts and deduplicates the collected values.
    pub fn freeze(mut self) -> StringTermList {
        self.values.sort_unstable();
        self.values.dedup();
        let mut terms = Vec::with_capacity(self.values.len() + 1);
        terms.push(String::new());
        terms.append(&mut self.values);
        StringTermList { terms }
    }
}

/// Integer types usable as numeric term values.
pub trait NumericTerm: PrimInt + fmt::Display + FromStr + fmt::Debug + Send + Sync + 'static {}

impl<T> NumericTerm for T where T: PrimInt + fmt::Display + FromStr + fmt::Debug + Send + Sync + 'static {}

/// Term list of integer values in numeric order.
///
/// A non-zero padding renders values zero-padded to that many characters, so
/// their display forms also sort lexicographically in numeric order (for
/// non-negative values).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumericTermList<T> {
    values: Vec<T>,
    padding: usize,
}

pub type IntTermList = NumericTermList<i32>;
pub type LongTermList = NumericTermList<i64>;

impl<T: NumericTerm> Default for NumericTermList<T> {
    fn default() -> Self {
        NumericTermList {
            values: Vec::new(),
            padding: 0,
        }
    }
}

impl<T: NumericTerm> NumericTermList<T> {
    pub fn builder() -> NumericTermListBuilder<T> {
        NumericTermListBuilder {
            values: Vec::new(),
            padding: 0,
        }
    }

    pub fn from_values(values: impl IntoIterator<Item = T>) -> NumericTermList<T> {
        let mut builder = Self::builder();
        builder.extend(values);
        builder.freeze()
    }

    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Typed value at `index`; `None` for the null term.
    pub fn value(&self, index: usize) -> Option<T> {
        index.checked_sub(1).map(|i| self.values[i])
    }

    pub fn index_of_value(&self, value: T) -> Result<usize, usize> {
        self.values
            .binary_search(&value)
            .map(|i| i + 1)
            .map_err(|i| i + 1)
    }

    /// Display form of `value` honoring the padding.
    pub fn format(&self, value: T) -> String {
        let width = self.padding;
        format!("{value:0width$}")
    }

    fn parse(value: &str) -> Option<T> {
        value.trim().parse::<T>().ok()
    }
}

impl<T: NumericTerm> TermList for NumericTermList<T> {
    fn len(&self) -> usize {
        self.values.len() + 1
    }

    fn get(&self, index: usize) -> String {
        match self.value(index) {
            Some(value) => self.format(value),
            None => String::new(),
        }
    }

    /// Unparsable values are reported as absent with an insertion index past
    /// the end of the list.
    fn index_of(&self, value: &str) -> Result<usize, usize> {
        if value.is_empty() {
            return Ok(0);
        }
        match Self::parse(value) {
            Some(value) => self.index_of_value(value),
            None => Err(self.len()),
        }
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        match (Self::parse(a), Self::parse(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}

/// Collects raw integer values for a [`NumericTermList`].
#[derive(Clone, Debug)]
pub struct NumericTermListBuilder<T> {
    values: Vec<T>,
    padding: usize,
}

impl<T: NumericTerm> NumericTermListBuilder<T> {
    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn add(&mut self, value: T) {
        self.values.push(value);
    }

    /// Sorts numerically and deduplicates the collected values.
    pub fn freeze(mut self) -> NumericTermList<T> {
        self.values.sort_unstable();
        self.values.dedup();
        NumericTermList {
            values: self.values,
            padding: self.padding,
        }
    }
}

impl<T: NumericTerm> Extend<T> for NumericTermListBuilder<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

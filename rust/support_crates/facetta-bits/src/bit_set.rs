//! A fixed-capacity set of bits.

use std::ops::{BitAndAssign, BitOrAssign};

use facetta_common::{Result, error::Error};

/// A fixed-capacity bit vector with `[u64]` storage.
///
/// `BitSet` serves two roles: it accumulates facet selections (one bit per
/// dictionary value) and it is the backing buffer of the P4-delta codec, which
/// packs fields directly into [`BitSet::words_mut`].
///
/// # Storage Format
///
/// Bits are stored LSB-first within `u64` words: bit `i` lives in word `i >> 6`
/// at position `i & 63`. The number of words is `len.div_ceil(64)`, and bits
/// beyond `len` in the final word are kept at zero by every mutating operation
/// that works on whole words.
///
/// # Checked and fast access
///
/// [`BitSet::set`], [`BitSet::flip`] and [`BitSet::reset`] assert that the index
/// is below `len`, and [`BitSet::get`] returns `false` for such an index. The
/// `fast_*` variants skip the logical length check; they are meant for hot loops
/// where the caller already guarantees the index is in range.
#[derive(Clone, PartialEq, Eq)]
pub struct BitSet {
    len: usize,
    words: Box<[u64]>,
}

impl BitSet {
    /// Creates a bit set of `len` bits, all cleared.
    pub fn new(len: usize) -> BitSet {
        BitSet {
            len,
            words: vec![0u64; len.div_ceil(64)].into_boxed_slice(),
        }
    }

    /// Creates a bit set of `len` bits, all set.
    pub fn full(len: usize) -> BitSet {
        let mut words = vec![u64::MAX; len.div_ceil(64)].into_boxed_slice();
        Self::mask_tail(&mut words, len);
        BitSet { len, words }
    }

    /// Wraps existing LSB-ordered words.
    ///
    /// Only the first `len.div_ceil(64)` words are kept; the tail of the last
    /// word beyond `len` is cleared.
    ///
    /// # Panics
    ///
    /// Panics if `words` holds fewer than `len` bits.
    pub fn from_words(mut words: Vec<u64>, len: usize) -> BitSet {
        assert!(
            len <= words.len() * 64,
            "{} words cannot hold {len} bits",
            words.len()
        );
        words.truncate(len.div_ceil(64));
        let mut words = words.into_boxed_slice();
        Self::mask_tail(&mut words, len);
        BitSet { len, words }
    }

    /// Creates a bit set with the given positions set.
    pub fn from_positions(positions: impl IntoIterator<Item = usize>, len: usize) -> BitSet {
        let mut bits = BitSet::new(len);
        for pos in positions {
            bits.set(pos);
        }
        bits
    }

    /// Creates a bit set from LSB-ordered bytes.
    pub fn from_lsb_bytes(bytes: &[u8], len: usize) -> BitSet {
        let mut bits = BitSet::new(len);
        let byte_len = len.div_ceil(8).min(bytes.len());
        if byte_len != 0 {
            bytemuck::cast_slice_mut::<u64, u8>(&mut bits.words[..])[..byte_len]
                .copy_from_slice(&bytes[..byte_len]);
        }
        Self::mask_tail(&mut bits.words, len);
        bits
    }

    /// Returns the logical number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sets bit `index` to 1.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn set(&mut self, index: usize) {
        assert!(index < self.len, "Index {index} out of bounds (len: {})", self.len);
        self.fast_set(index);
    }

    /// Sets bit `index`, returning an error instead of panicking when the index
    /// is out of range.
    pub fn try_set(&mut self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(Error::out_of_range(index, self.len));
        }
        self.fast_set(index);
        Ok(())
    }

    /// Returns whether bit `index` is set; `false` for indices beyond `len()`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        index < self.len && self.fast_get(index)
    }

    /// Toggles bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn flip(&mut self, index: usize) {
        assert!(index < self.len, "Index {index} out of bounds (len: {})", self.len);
        self.fast_flip(index);
    }

    /// Clears bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        assert!(index < self.len, "Index {index} out of bounds (len: {})", self.len);
        let (word, bit) = Self::bit_position(index);
        self.words[word] &= !(1u64 << bit);
    }

    #[inline]
    pub fn fast_set(&mut self, index: usize) {
        debug_assert!(index < self.len);
        let (word, bit) = Self::bit_position(index);
        self.words[word] |= 1u64 << bit;
    }

    #[inline]
    pub fn fast_get(&self, index: usize) -> bool {
        debug_assert!(index < self.len);
        let (word, bit) = Self::bit_position(index);
        (self.words[word] >> bit) & 1 != 0
    }

    #[inline]
    pub fn fast_flip(&mut self, index: usize) {
        debug_assert!(index < self.len);
        let (word, bit) = Self::bit_position(index);
        self.words[word] ^= 1u64 << bit;
    }

    /// Sets bit `index` to exactly `bit`, which must be 0 or 1.
    #[inline]
    pub fn set_bit_value(&mut self, index: usize, bit: u64) {
        debug_assert!(bit <= 1, "bit value must be 0 or 1, got {bit}");
        debug_assert!(index < self.len);
        let (word, pos) = Self::bit_position(index);
        let cell = &mut self.words[word];
        *cell = (*cell & !(1u64 << pos)) | (bit << pos);
    }

    /// Clears all bits.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Counts the set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns the smallest set bit at or after `from`.
    pub fn next_set_bit(&self, from: usize) -> Option<usize> {
        if from >= self.len {
            return None;
        }
        let (mut word_index, bit) = Self::bit_position(from);
        let mut word = self.words[word_index] & (u64::MAX << bit);
        loop {
            if word != 0 {
                let index = word_index * 64 + word.trailing_zeros() as usize;
                return (index < self.len).then_some(index);
            }
            word_index += 1;
            if word_index >= self.words.len() {
                return None;
            }
            word = self.words[word_index];
        }
    }

    /// Iterates positions of the set bits in ascending order.
    pub fn iter(&self) -> BitSetIter<'_> {
        BitSetIter {
            words: self.words.iter(),
            current_word: 0,
            base_index: 0,
            next_base: 0,
            len: self.len,
        }
    }

    /// Read-only view of the backing words.
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Mutable view of the backing words.
    ///
    /// Writers are responsible for leaving bits beyond `len()` cleared.
    #[inline]
    pub fn words_mut(&mut self) -> &mut [u64] {
        &mut self.words
    }

    pub fn into_words(self) -> Vec<u64> {
        self.words.into_vec()
    }

    pub fn heap_size_bytes(&self) -> usize {
        self.words.len() * std::mem::size_of::<u64>()
    }
}

impl BitSet {
    #[inline]
    fn bit_position(index: usize) -> (usize, usize) {
        (index >> 6, index & 63)
    }

    #[inline]
    fn mask_tail(words: &mut [u64], len: usize) {
        let partial = len & 63;
        if partial != 0 {
            if let Some(last) = words.last_mut() {
                *last &= (1u64 << partial) - 1;
            }
        }
    }
}

impl std::fmt::Debug for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitSet")
            .field("len", &self.len)
            .field("ones", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl BitOrAssign<&BitSet> for BitSet {
    fn bitor_assign(&mut self, rhs: &BitSet) {
        assert_eq!(self.len, rhs.len, "BitSets must have the same length");
        for (left, right) in self.words.iter_mut().zip(rhs.words.iter()) {
            *left |= right;
        }
    }
}

impl BitAndAssign<&BitSet> for BitSet {
    fn bitand_assign(&mut self, rhs: &BitSet) {
        assert_eq!(self.len, rhs.len, "BitSets must have the same length");
        for (left, right) in self.words.iter_mut().zip(rhs.words.iter()) {
            *left &= right;
        }
    }
}

/// Iterator over the positions of set bits in a [`BitSet`].
#[derive(Clone)]
pub struct BitSetIter<'a> {
    words: std::slice::Iter<'a, u64>,
    current_word: u64,
    base_index: usize,
    next_base: usize,
    len: usize,
}

impl Iterator for BitSetIter<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current_word != 0 {
                let index = self.base_index + self.current_word.trailing_zeros() as usize;
                if index >= self.len {
                    return None;
                }
                self.current_word &= self.current_word - 1;
                return Some(index);
            }
            self.current_word = *self.words.next()?;
            self.base_index = self.next_base;
            self.next_base += 64;
        }
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::BitSet;
    use facetta_common::error::ErrorKind;

    #[test]
    fn test_set_get_flip() {
        let mut bits = BitSet::new(130);
        assert_eq!(bits.words().len(), 3);
        bits.set(0);
        bits.set(64);
        bits.set(129);
        assert!(bits.get(0) && bits.get(64) && bits.get(129));
        assert!(!bits.get(1));
        assert!(!bits.get(1000));

        bits.flip(64);
        assert!(!bits.get(64));
        bits.flip(65);
        assert!(bits.get(65));
        bits.reset(129);
        assert_eq!(bits.iter().collect_vec(), vec![0, 65]);
    }

    #[test]
    fn test_fast_variants_agree() {
        let mut checked = BitSet::new(300);
        let mut fast = BitSet::new(300);
        fastrand::seed(1129);
        for _ in 0..1000 {
            let i = fastrand::usize(..300);
            if fastrand::bool() {
                checked.flip(i);
                fast.fast_flip(i);
            } else {
                checked.set(i);
                fast.fast_set(i);
            }
        }
        assert_eq!(checked, fast);
        for i in 0..300 {
            assert_eq!(checked.get(i), fast.fast_get(i));
        }
    }

    #[test]
    fn test_set_bit_value() {
        let mut bits = BitSet::full(10);
        bits.set_bit_value(3, 0);
        bits.set_bit_value(4, 1);
        assert!(!bits.get(3));
        assert!(bits.get(4));
        assert_eq!(bits.count_ones(), 9);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut original = BitSet::from_positions([1, 5, 70], 100);
        let mut copy = original.clone();
        copy.set(2);
        original.reset(5);
        assert_eq!(original.iter().collect_vec(), vec![1, 70]);
        assert_eq!(copy.iter().collect_vec(), vec![1, 2, 5, 70]);
    }

    #[test]
    fn test_try_set_out_of_range() {
        let mut bits = BitSet::new(8);
        let err = bits.try_set(8).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::OutOfRange { index: 8, len: 8 }));
        bits.try_set(7).unwrap();
        assert!(bits.get(7));
    }

    #[test]
    fn test_full_masks_tail() {
        let bits = BitSet::full(70);
        assert_eq!(bits.count_ones(), 70);
        assert_eq!(bits.words()[1], (1u64 << 6) - 1);
    }

    #[test]
    fn test_from_words_and_bytes() {
        let bits = BitSet::from_words(vec![0b1011, u64::MAX, 7], 66);
        assert_eq!(bits.words().len(), 2);
        assert_eq!(bits.iter().take(3).collect_vec(), vec![0, 1, 3]);
        assert_eq!(bits.count_ones(), 3 + 2);

        let bits = BitSet::from_lsb_bytes(&[0b0000_0101, 0b1000_0000], 16);
        assert_eq!(bits.iter().collect_vec(), vec![0, 2, 15]);
    }

    #[test]
    fn test_next_set_bit() {
        let bits = BitSet::from_positions([3, 64, 199], 200);
        assert_eq!(bits.next_set_bit(0), Some(3));
        assert_eq!(bits.next_set_bit(3), Some(3));
        assert_eq!(bits.next_set_bit(4), Some(64));
        assert_eq!(bits.next_set_bit(65), Some(199));
        assert_eq!(bits.next_set_bit(200), None);
        assert_eq!(BitSet::new(10).next_set_bit(0), None);
    }

    #[test]
    fn test_union_and_intersection() {
        let mut left = BitSet::from_positions([1, 2, 3], 10);
        let right = BitSet::from_positions([3, 4], 10);
        let mut both = left.clone();
        both &= &right;
        left |= &right;
        assert_eq!(left.iter().collect_vec(), vec![1, 2, 3, 4]);
        assert_eq!(both.iter().collect_vec(), vec![3]);
    }
}

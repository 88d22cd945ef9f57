//! Fixed-width bit field access over LSB-ordered `u64` words.
//!
//! Bit `i` of the stream lives in word `i >> 6` at bit position `i & 63`, the same
//! layout used by [`BitSet`](crate::BitSet). A field of `width` bits starting at
//! `offset` may straddle two adjacent words.

/// Maximum width of a single field handled by [`read_bits`] and [`write_bits`].
pub const MAX_FIELD_WIDTH: u32 = 32;

/// Returns the number of `u64` words needed to hold `bit_len` bits.
#[inline]
pub const fn words_for_bits(bit_len: usize) -> usize {
    bit_len.div_ceil(64)
}

/// Reads a `width`-bit field starting at bit `offset`.
///
/// `width` must be in `1..=32`. The caller guarantees that
/// `offset + width <= words.len() * 64`.
#[inline]
pub fn read_bits(words: &[u64], offset: usize, width: u32) -> u32 {
    debug_assert!(width >= 1 && width <= MAX_FIELD_WIDTH);
    let mask = (1u64 << width) - 1;
    let word_index = offset >> 6;
    let shift = (offset & 63) as u32;
    let mut value = words[word_index] >> shift;
    if shift + width > 64 {
        value |= words[word_index + 1] << (64 - shift);
    }
    (value & mask) as u32
}

/// Writes the low `width` bits of `value` at bit `offset`, replacing whatever
/// was stored there.
///
/// `width` must be in `1..=32`. The caller guarantees that
/// `offset + width <= words.len() * 64`.
#[inline]
pub fn write_bits(words: &mut [u64], offset: usize, width: u32, value: u32) {
    debug_assert!(width >= 1 && width <= MAX_FIELD_WIDTH);
    let mask = (1u64 << width) - 1;
    let value = value as u64 & mask;
    let word_index = offset >> 6;
    let shift = (offset & 63) as u32;
    let word = &mut words[word_index];
    *word = (*word & !(mask << shift)) | (value << shift);
    if shift + width > 64 {
        let spill = 64 - shift;
        let next = &mut words[word_index + 1];
        *next = (*next & !(mask >> spill)) | (value >> spill);
    }
}

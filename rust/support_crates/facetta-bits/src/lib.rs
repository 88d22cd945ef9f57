//! Bit-level building blocks: a fixed-capacity [`BitSet`](bit_set::BitSet) and
//! word-level packing helpers used by the integer codecs.

pub mod bit_set;
pub mod packing;

pub use bit_set::BitSet;

//! Dense per-document value storage.
//!
//! The structures here map document ids to small integer codes (dictionary
//! indices) with O(1) access and support linear scans over value, value range
//! and bit flags without materializing postings.
//!
//! - [`SegmentedArray`]: block-segmented fixed-width array, generic over the
//!   storage width.
//! - [`OrderArray`]: a [`SegmentedArray`] whose width is picked from the value
//!   cardinality at construction time.
//! - [`DynamicIntBuffer`]: paged build-time scratch buffer.
//! - [`NestedIntArray`]: frozen per-document value lists for multi-valued facets.

pub mod dynamic_int_buffer;
pub mod nested_int_array;
pub mod order_array;
pub mod segmented_array;

pub use dynamic_int_buffer::DynamicIntBuffer;
pub use nested_int_array::{NestedIntArray, NestedIntArrayBuilder};
pub use order_array::{OrderArray, OrderArrayKind};
pub use segmented_array::{
    ByteSegmentedArray, IntSegmentedArray, SegmentElement, SegmentedArray, ShortSegmentedArray,
};

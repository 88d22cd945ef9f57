//! P4-delta: patched bit-packing of delta batches.
//!
//! A batch of `batch_size` deltas is packed into a single LSB-first bit stream:
//!
//! ```text
//! | b (8 bits) | slot 0 (b bits) | ... | slot n-1 (b bits) | exc 0 (32 bits) | ... |
//! ^0           ^HEADER_BITS                                ^exception_offset
//! ```
//!
//! A slot whose low bit is 0 holds the delta itself in its upper `b - 1` bits,
//! so inline deltas are limited to `0..=2^(b-1) - 1`. A slot whose low bit is 1
//! marks an exception: the delta is stored as a full 32-bit value in the
//! exception area. Exceptions are written and read in encounter order; the
//! exception index kept in the upper slot bits is truncated to `b - 1` bits
//! and is not needed for decoding.
//!
//! Decoding restores absolute values by a running sum seeded with `base`:
//! `out[0] = base + delta[0]`, `out[i] = out[i - 1] + delta[i]`.

use facetta_bits::{
    BitSet,
    packing::{MAX_FIELD_WIDTH, read_bits, words_for_bits, write_bits},
};
use facetta_common::{Result, error::Error, verify_arg};

/// Width of the header holding `b`.
pub const HEADER_BITS: usize = 8;

/// Width of a single exception value.
pub const EXCEPTION_BITS: usize = 32;

/// Parameters of one packed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct P4DeltaParams {
    /// Anchor the first delta is added to.
    pub base: u32,
    /// Bits per slot, including the exception flag bit.
    pub b: u32,
    /// Number of values in the batch.
    pub batch_size: usize,
    /// Number of slots stored in the exception area.
    pub exception_count: usize,
}

impl P4DeltaParams {
    pub fn new(base: u32, b: u32, batch_size: usize, exception_count: usize) -> Result<Self> {
        verify_arg!(b, b >= 1 && b <= MAX_FIELD_WIDTH);
        verify_arg!(batch_size, batch_size >= 1);
        verify_arg!(exception_count, exception_count <= batch_size);
        Ok(P4DeltaParams {
            base,
            b,
            batch_size,
            exception_count,
        })
    }

    /// Picks the slot width that minimizes the packed size of `deltas`.
    ///
    /// Ties go to the narrower width.
    pub fn estimate(base: u32, deltas: &[u32]) -> Result<Self> {
        verify_arg!(deltas, !deltas.is_empty());
        let (_, b, exception_count) = (1..=MAX_FIELD_WIDTH)
            .map(|b| {
                let inline_max = Self::inline_max_for(b);
                let exceptions = deltas.iter().filter(|&&d| d > inline_max).count();
                let size = HEADER_BITS + b as usize * deltas.len() + EXCEPTION_BITS * exceptions;
                (size, b, exceptions)
            })
            .min_by_key(|&(size, b, _)| (size, b))
            .unwrap_or((0, MAX_FIELD_WIDTH, 0));
        Self::new(base, b, deltas.len(), exception_count)
    }

    /// Bit offset of the exception area.
    #[inline]
    pub fn exception_offset(&self) -> usize {
        HEADER_BITS + self.b as usize * self.batch_size
    }

    /// Total number of bits in the packed batch.
    #[inline]
    pub fn packed_bits(&self) -> usize {
        self.exception_offset() + EXCEPTION_BITS * self.exception_count
    }

    /// Largest delta stored inline.
    #[inline]
    pub fn inline_max(&self) -> u32 {
        Self::inline_max_for(self.b)
    }

    #[inline]
    fn inline_max_for(b: u32) -> u32 {
        ((1u64 << (b - 1)) - 1) as u32
    }
}

/// Packs and unpacks delta batches for one configured set of parameters.
///
/// [`P4DeltaCodec::set_param`] (or [`P4DeltaCodec::update_params`]) must be
/// called before compressing or decompressing; otherwise both report a
/// configuration error. Choosing `b` is up to the caller:
/// [`P4DeltaParams::estimate`] minimizes the packed size, but any width in
/// `1..=32` is accepted, however many exceptions it produces.
#[derive(Debug, Clone, Default)]
pub struct P4DeltaCodec {
    params: Option<P4DeltaParams>,
}

impl P4DeltaCodec {
    pub fn new() -> P4DeltaCodec {
        P4DeltaCodec::default()
    }

    pub fn with_params(params: P4DeltaParams) -> P4DeltaCodec {
        P4DeltaCodec {
            params: Some(params),
        }
    }

    /// Configures the codec for batches of `batch_size` values packed with `b`
    /// bits per slot and exactly `exception_count` exceptions.
    pub fn set_param(
        &mut self,
        base: u32,
        b: u32,
        batch_size: usize,
        exception_count: usize,
    ) -> Result<()> {
        let params = P4DeltaParams::new(base, b, batch_size, exception_count)?;
        log::trace!("p4delta params: {params:?}");
        self.params = Some(params);
        Ok(())
    }

    /// Replaces the current parameters.
    pub fn update_params(&mut self, params: P4DeltaParams) -> Result<()> {
        self.set_param(params.base, params.b, params.batch_size, params.exception_count)
    }

    pub fn params(&self) -> Option<&P4DeltaParams> {
        self.params.as_ref()
    }

    /// Packs `deltas` into a [`BitSet`] of exactly `packed_bits()` bits.
    pub fn compress(&self, deltas: &[u32]) -> Result<BitSet> {
        let params = self.configured()?;
        let mut bits = BitSet::new(params.packed_bits());
        pack(params, deltas, bits.words_mut())?;
        Ok(bits)
    }

    /// Packs `deltas` into a raw word array.
    ///
    /// The words are bit-for-bit identical to those of [`Self::compress`].
    pub fn compress_alt(&self, deltas: &[u32]) -> Result<Vec<u64>> {
        let params = self.configured()?;
        let mut words = vec![0u64; words_for_bits(params.packed_bits())];
        pack(params, deltas, &mut words)?;
        Ok(words)
    }

    /// Restores the values of a batch packed by [`Self::compress`].
    pub fn decompress(&self, packed: &BitSet) -> Result<Vec<u32>> {
        self.decompress_words(packed.words())
    }

    /// Restores the values of a batch packed by [`Self::compress_alt`].
    pub fn decompress_words(&self, packed: &[u64]) -> Result<Vec<u32>> {
        let params = self.configured()?;
        let mut out = vec![0u32; params.batch_size];
        self.decompress_into(packed, &mut out)?;
        Ok(out)
    }

    /// Restores a batch into `out`, which must hold `batch_size` values.
    pub fn decompress_into(&self, packed: &[u64], out: &mut [u32]) -> Result<()> {
        let params = self.configured()?;
        verify_arg!(out, out.len() == params.batch_size);
        if packed.len() * 64 < params.packed_bits() {
            return Err(Error::invalid_format(
                "p4delta batch",
                format!(
                    "{} words hold fewer than the {} packed bits",
                    packed.len(),
                    params.packed_bits()
                ),
            ));
        }
        let header = read_bits(packed, 0, HEADER_BITS as u32);
        if header != params.b {
            return Err(Error::invalid_format(
                "p4delta header",
                format!("width {header} does not match configured width {}", params.b),
            ));
        }
        let exceptions = unpack(params, packed, out);
        if exceptions != params.exception_count {
            return Err(Error::invalid_format(
                "p4delta batch",
                format!(
                    "{exceptions} exception slots, expected {}",
                    params.exception_count
                ),
            ));
        }
        Ok(())
    }

    fn configured(&self) -> Result<&P4DeltaParams> {
        self.params.as_ref().ok_or_else(|| {
            Error::configuration(
                "P4DeltaCodec",
                "set_param must be called before compressing or decompressing",
            )
        })
    }
}

/// Reads the slot width stored in the header of a packed batch.
pub fn header_b(packed: &[u64]) -> Option<u32> {
    (!packed.is_empty()).then(|| read_bits(packed, 0, HEADER_BITS as u32))
}

/// Writes the header, slots and exception area of one batch into `words`,
/// which must be zeroed and at least `packed_bits()` long.
fn pack(params: &P4DeltaParams, deltas: &[u32], words: &mut [u64]) -> Result<()> {
    if deltas.len() != params.batch_size {
        return Err(Error::invalid_arg(
            "deltas",
            format!(
                "expected a batch of {} values, got {}",
                params.batch_size,
                deltas.len()
            ),
        ));
    }
    let inline_max = params.inline_max();
    let exceptions = deltas.iter().filter(|&&d| d > inline_max).count();
    if exceptions != params.exception_count {
        return Err(Error::invalid_arg(
            "exception_count",
            format!(
                "batch needs {exceptions} exceptions at b = {}, configured {}",
                params.b, params.exception_count
            ),
        ));
    }

    let b = params.b;
    let exception_offset = params.exception_offset();
    write_bits(words, 0, HEADER_BITS as u32, b);
    let mut exception = 0usize;
    for (i, &delta) in deltas.iter().enumerate() {
        let slot = HEADER_BITS + i * b as usize;
        if delta <= inline_max {
            write_bits(words, slot, b, delta << 1);
        } else {
            write_bits(words, slot, b, ((exception as u32) << 1) | 1);
            write_bits(
                words,
                exception_offset + exception * EXCEPTION_BITS,
                EXCEPTION_BITS as u32,
                delta,
            );
            exception += 1;
        }
    }
    Ok(())
}

/// Lazily decodes the running values of one batch.
///
/// Stops consuming the exception area once `exception_count` values were
/// read, so a corrupted batch cannot read past its own bounds.
struct Decoder<'a> {
    params: &'a P4DeltaParams,
    packed: &'a [u64],
    pos: usize,
    exceptions: usize,
    acc: u32,
}

impl<'a> Decoder<'a> {
    fn new(params: &'a P4DeltaParams, packed: &'a [u64]) -> Decoder<'a> {
        Decoder {
            params,
            packed,
            pos: 0,
            exceptions: 0,
            acc: params.base,
        }
    }
}

impl Iterator for Decoder<'_> {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.pos == self.params.batch_size {
            return None;
        }
        let b = self.params.b;
        let slot = read_bits(self.packed, HEADER_BITS + self.pos * b as usize, b);
        let delta = if slot & 1 == 0 {
            slot >> 1
        } else {
            let delta = if self.exceptions < self.params.exception_count {
                read_bits(
                    self.packed,
                    self.params.exception_offset() + self.exceptions * EXCEPTION_BITS,
                    EXCEPTION_BITS as u32,
                )
            } else {
                0
            };
            self.exceptions += 1;
            delta
        };
        self.pos += 1;
        self.acc = self.acc.wrapping_add(delta);
        Some(self.acc)
    }
}

/// Decodes one batch into `out` and returns the number of exception slots
/// encountered.
fn unpack(params: &P4DeltaParams, packed: &[u64], out: &mut [u32]) -> usize {
    let mut decoder = Decoder::new(params, packed);
    for (value, decoded) in out.iter_mut().zip(decoder.by_ref()) {
        *value = decoded;
    }
    decoder.exceptions
}

/// Whether an ascending batch produced by this crate's own builders holds
/// `target`. Decoding stops at the first value not below `target`.
pub(crate) fn contains_trusted(params: &P4DeltaParams, packed: &[u64], target: u32) -> bool {
    Decoder::new(params, packed)
        .find(|&value| value >= target)
        .is_some_and(|value| value == target)
}

/// Unpacks a batch whose parameters were produced by this crate's own
/// builders and need no validation.
pub(crate) fn unpack_trusted(params: &P4DeltaParams, packed: &[u64], out: &mut [u32]) {
    debug_assert!(packed.len() * 64 >= params.packed_bits());
    let exceptions = unpack(params, packed, out);
    debug_assert_eq!(exceptions, params.exception_count);
}

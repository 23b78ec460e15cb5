//! Skylink bitfield: version, offset and fetch size packed into 16 bits.
//!
//! # Layout (low bit first)
//! ```text
//! [ mode : 2 ][ mode bits : unary, n ones + terminating zero ][ size : 3 ][ offset : rest ]
//! ```
//! Only mode `00` (version 1) is defined.  Modes `01`, `10` and `11` are
//! reserved and always rejected.
//!
//! The unary prefix `n` scales the alignment of both fields:
//!   - fetch size alignment: `4096`, or `4096 << (n - 1)` when `n > 0`
//!   - fetch size: `(size + 1) * align`, plus `align << 3` when `n > 0`
//!   - offset alignment: `4096 << n`
//!
//! A bitfield is valid only when `offset + fetch_size <= 4 MiB`.
//!
//! The raw value is kept verbatim; every derived field is recomputed from it.

use std::fmt;
use thiserror::Error;

/// Encoded size of a bitfield on the wire.
pub const BITFIELD_SIZE: usize = 2;
/// Upper bound for `offset + fetch_size`.
pub const MAX_FETCH_SIZE: u64 = 1 << 22;

const MODE_MASK: u16 = 0b11;
const MODE_V1:   u16 = 0b00;
const BASE_ALIGN: u64 = 4096;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitfieldError {
    #[error("Unsupported bitfield mode {0:#04b} (only version 1 is defined)")]
    UnsupportedMode(u8),
    #[error("Reserved bitfield pattern {0:#06x}")]
    ReservedPattern(u16),
    #[error("Bitfield range out of bounds: offset {offset} + fetch size {fetch_size} exceeds {MAX_FETCH_SIZE}")]
    OutOfRange { offset: u64, fetch_size: u64 },
}

/// Fields decoded from a version 1 bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    mode_bits:  u32,
    fetch_size: u64,
    offset:     u64,
}

/// A validated bitfield.  Equality and hashing use the raw value.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Bitfield(u16);

impl Bitfield {
    /// Validate `raw`, returning the error that rejected it.
    pub fn new(raw: u16) -> Result<Self, BitfieldError> {
        decode(raw).map(|_| Self(raw))
    }

    /// Validate `raw`.  Returns `None` for every invalid pattern.
    pub fn validate(raw: u16) -> Option<Self> {
        Self::new(raw).ok()
    }

    /// The raw 16-bit value, bit-for-bit as constructed.
    #[inline]
    pub fn raw(self) -> u16 {
        self.0
    }

    /// Skylink format version: `mode + 1`.
    #[inline]
    pub fn version(self) -> u8 {
        (self.0 & MODE_MASK) as u8 + 1
    }

    /// Length of the unary alignment prefix.
    pub fn mode_bits(self) -> u32 {
        self.layout().mode_bits
    }

    /// Size in bytes of the addressed sub-region.
    pub fn fetch_size(self) -> u64 {
        self.layout().fetch_size
    }

    /// Start in bytes of the addressed sub-region.
    pub fn offset(self) -> u64 {
        self.layout().offset
    }

    pub fn to_le_bytes(self) -> [u8; BITFIELD_SIZE] {
        self.0.to_le_bytes()
    }

    fn layout(self) -> Layout {
        // A Bitfield only exists for values that decoded successfully.
        decode(self.0).unwrap_or(Layout { mode_bits: 0, fetch_size: BASE_ALIGN, offset: 0 })
    }
}

impl fmt::Debug for Bitfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitfield({:#06x})", self.0)
    }
}

impl fmt::Display for Bitfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Bitfield> for u16 {
    fn from(bitfield: Bitfield) -> u16 {
        bitfield.0
    }
}

impl TryFrom<u16> for Bitfield {
    type Error = BitfieldError;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl PartialEq<u16> for Bitfield {
    fn eq(&self, other: &u16) -> bool {
        self.0 == *other
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────────

fn decode(raw: u16) -> Result<Layout, BitfieldError> {
    match raw & MODE_MASK {
        MODE_V1 => decode_v1(raw),
        mode    => Err(BitfieldError::UnsupportedMode(mode as u8)),
    }
}

fn decode_v1(raw: u16) -> Result<Layout, BitfieldError> {
    let mut bits = raw >> 2;

    if bits & 0xff == 0xff {
        return Err(BitfieldError::ReservedPattern(raw));
    }

    let mode_bits = trailing_ones(bits);
    bits >>= mode_bits + 1;

    let mut fetch_align = BASE_ALIGN;
    if mode_bits > 0 {
        fetch_align <<= mode_bits - 1;
    }
    let mut fetch_size = (u64::from(bits & 0b111) + 1) * fetch_align;
    if mode_bits > 0 {
        fetch_size += fetch_align << 3;
    }

    bits >>= 3;

    let offset = u64::from(bits) * (BASE_ALIGN << mode_bits);
    if offset + fetch_size > MAX_FETCH_SIZE {
        return Err(BitfieldError::OutOfRange { offset, fetch_size });
    }

    Ok(Layout { mode_bits, fetch_size, offset })
}

/// Length of the run of one-bits starting at bit 0.
fn trailing_ones(mut bits: u16) -> u32 {
    let mut count = 0;
    while bits & 1 == 1 {
        count += 1;
        bits >>= 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_reserved_modes() {
        for raw in [
            0b0000_0000_0000_0001u16, 0b0000_0000_0000_0101, 0b1000_0000_0000_0001,
            0b0000_0000_0000_0010, 0b0000_0000_0000_0110, 0b1000_0000_0000_0010,
            0b0000_0000_0000_0011, 0b0000_0000_0000_0111, 0b1000_0000_0000_0011,
        ] {
            assert!(Bitfield::validate(raw).is_none(), "{raw:#018b}");
            assert_eq!(
                Bitfield::new(raw),
                Err(BitfieldError::UnsupportedMode((raw & 0b11) as u8))
            );
        }
    }

    #[test]
    fn rejects_reserved_mode_bits_pattern() {
        for raw in [0b0000_0011_1111_1100u16, 0b1000_0111_1111_1100] {
            assert_eq!(Bitfield::new(raw), Err(BitfieldError::ReservedPattern(raw)));
        }
    }

    #[test]
    fn rejects_out_of_range_fetch() {
        for raw in [0b1111_1101_1111_1100u16, 0b1111_1001_1011_1100] {
            assert!(matches!(Bitfield::new(raw), Err(BitfieldError::OutOfRange { .. })));
        }
    }

    #[test]
    fn accepts_valid_v1() {
        for raw in [0u16, 0b0001_1101_1111_1100, 0b1101_1001_1011_1100] {
            let bitfield = Bitfield::validate(raw).unwrap();
            assert_eq!(bitfield, raw);
            assert_eq!(u16::from(bitfield), raw);
            assert_eq!(bitfield.version(), 1);
        }
    }

    #[test]
    fn derived_fields() {
        // (raw, mode_bits, fetch_size, offset)
        let table: &[(u16, u32, u64, u64)] = &[
            (0,      0, 4096,      0),
            (8,      0, 8192,      0),
            (16,     0, 12288,     0),
            (256,    0, 4096,      16384),
            (4,      1, 36864,     0),
            (284,    3, 212992,    0),
            (7676,   7, 4194304,   0),
            (55740,  4, 393216,    3538944),
        ];
        for &(raw, mode_bits, fetch_size, offset) in table {
            let bitfield = Bitfield::new(raw).unwrap();
            assert_eq!(bitfield.mode_bits(), mode_bits, "mode bits of {raw}");
            assert_eq!(bitfield.fetch_size(), fetch_size, "fetch size of {raw}");
            assert_eq!(bitfield.offset(), offset, "offset of {raw}");
        }
    }

    #[test]
    fn full_range_is_accepted_at_the_boundary() {
        let bitfield = Bitfield::new(7676).unwrap();
        assert_eq!(bitfield.offset() + bitfield.fetch_size(), MAX_FETCH_SIZE);
    }

    #[test]
    fn equality_by_raw_value() {
        let a = Bitfield::new(0b0001_1101_1111_1100).unwrap();
        let b = Bitfield::new(0b0001_1101_1111_1100).unwrap();
        let c = Bitfield::new(0b1101_1001_1011_1100).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a != !0b0001_1101_1111_1100u16);
    }

    #[test]
    fn trailing_ones_counts_from_bit_zero() {
        assert_eq!(trailing_ones(0), 0);
        assert_eq!(trailing_ones(0b0111), 3);
        assert_eq!(trailing_ones(0b1011), 2);
        assert_eq!(trailing_ones(0x3fff), 14);
    }
}

//! Right-aligned codewords and the sign code appended to non-zero values.

use cfhd_common::bit::{BitWriter, bit_mask};

/// Number of bits in the word used to accumulate composite codewords.
pub const BITSTREAM_LONG_SIZE: u8 = 32;
/// Maximum size of a composite codeword. The top bit is reserved for the sign.
pub const CODEWORD_BUDGET: u8 = BITSTREAM_LONG_SIZE - 1;

/// Sign code following the magnitude of a positive value.
pub const POSITIVE_CODE: u32 = 0b10;
/// Size of [`POSITIVE_CODE`] in bits.
pub const POSITIVE_SIZE: u8 = 2;
/// Sign code following the magnitude of a negative value.
pub const NEGATIVE_CODE: u32 = 0b11;
/// Size of [`NEGATIVE_CODE`] in bits.
pub const NEGATIVE_SIZE: u8 = 2;
/// Size of either sign code.
pub const SIGN_SIZE: u8 = POSITIVE_SIZE;

// The lookup builders read the sign with a single fixed-width peek.
const _: () = assert!(POSITIVE_SIZE == NEGATIVE_SIZE);

/// A codeword stored right-aligned in a 32-bit word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Codeword {
    /// The code bits, right-aligned.
    pub bits: u32,
    /// The number of bits in the code.
    pub size: u8,
}

impl Codeword {
    /// The empty codeword.
    pub const EMPTY: Self = Self::new(0, 0);

    /// Create a new codeword.
    pub const fn new(bits: u32, size: u8) -> Self {
        Self { bits, size }
    }

    /// Append `other` after this codeword.
    ///
    /// Returns `None` if the result would not fit into 32 bits.
    #[inline]
    pub fn append(self, other: Self) -> Option<Self> {
        let size = self.size.checked_add(other.size)?;

        if size > BITSTREAM_LONG_SIZE {
            return None;
        }

        let bits = if other.size == BITSTREAM_LONG_SIZE {
            other.bits
        } else {
            (self.bits << other.size) | (other.bits & bit_mask(other.size))
        };

        Some(Self { bits, size })
    }

    /// Append the sign code for `value`. Zero carries no sign.
    #[inline]
    pub fn with_sign(self, value: i32) -> Option<Self> {
        match value.signum() {
            0 => Some(self),
            1 => self.append(Self::new(POSITIVE_CODE, POSITIVE_SIZE)),
            _ => self.append(Self::new(NEGATIVE_CODE, NEGATIVE_SIZE)),
        }
    }

    /// Whether the size lies in `1..=CODEWORD_BUDGET`.
    #[inline]
    pub fn has_valid_size(&self) -> bool {
        (1..=CODEWORD_BUDGET).contains(&self.size)
    }

    /// The leading `width` bits of the codeword, or `None` if it is shorter.
    #[inline]
    pub fn prefix(&self, width: u8) -> Option<u32> {
        if width > self.size {
            return None;
        }

        Some(self.bits.checked_shr((self.size - width) as u32).unwrap_or(0) & bit_mask(width))
    }

    /// Write the codeword into a bit stream.
    #[inline]
    pub fn write(&self, writer: &mut BitWriter) -> Option<()> {
        writer.write(self.bits, self.size)
    }
}

/// Decode a sign code. Returns `None` for unused sign patterns.
#[inline]
pub fn decode_sign(code: u32) -> Option<i32> {
    match code {
        POSITIVE_CODE => Some(1),
        NEGATIVE_CODE => Some(-1),
        _ => None,
    }
}

//! The signed value table used by the encoder.
//!
//! The table is indexed directly by a signed coefficient folded into
//! `[0, 2^size)` as two's complement, and yields the complete codeword for
//! the value: the magnitude code of the companded magnitude followed by the
//! sign code.

use crate::codeword::{BITSTREAM_LONG_SIZE, Codeword, SIGN_SIZE};
use crate::companding::{Companding, Compressor};
use crate::error::{CodebookError, Result, SettingsError, TableKind, bail};
use crate::log::ldebug;
use crate::settings::VALUE_TABLE_SIZES;
use crate::util::try_alloc;

/// The signed value table of a codeset.
#[derive(Debug, Clone)]
pub struct ValueTable {
    size: u8,
    entries: Vec<Codeword>,
}

impl ValueTable {
    /// Build the table for `size`-bit signed values.
    ///
    /// `magnitudes` is indexed by companded magnitude; larger magnitudes are
    /// clamped to its last entry. `size` must lie in `2..=16`.
    pub fn build(magnitudes: &[Codeword], size: u8, companding: Companding) -> Result<Self> {
        if !VALUE_TABLE_SIZES.contains(&size) {
            bail!(SettingsError::ValueTableSize);
        }

        let Some(max_magnitude) = magnitudes.len().checked_sub(1) else {
            bail!(CodebookError::EmptyMagnitudes);
        };

        if magnitudes.iter().any(|c| !c.has_valid_size()) {
            bail!(CodebookError::InvalidCodewordSize);
        }

        if magnitudes
            .iter()
            .any(|c| c.size + SIGN_SIZE > BITSTREAM_LONG_SIZE)
        {
            bail!(CodebookError::CodewordTooLong);
        }

        let compressor = Compressor::new(companding);
        let len = 1usize << size;
        let mut entries = try_alloc(len, TableKind::Values)?;

        for index in 0..len as u32 {
            let value = unfold(index, size);
            let magnitude = compressor.compress(value.unsigned_abs()) as usize;
            let code = magnitudes[magnitude.min(max_magnitude)];

            // Sizes were checked above, so the sign always fits.
            entries.push(code.with_sign(value).unwrap_or(code));
        }

        ldebug!(
            "built value table: {} entries, {:?} companding",
            len,
            companding
        );

        Ok(Self { size, entries })
    }

    /// The width of the folded index in bits.
    #[inline]
    pub fn size(&self) -> u8 {
        self.size
    }

    /// The smallest value in the domain of the table.
    #[inline]
    pub fn min_value(&self) -> i32 {
        -(1 << (self.size - 1))
    }

    /// The largest value in the domain of the table.
    #[inline]
    pub fn max_value(&self) -> i32 {
        (1 << (self.size - 1)) - 1
    }

    /// The codeword for a value. Values outside of the domain saturate.
    #[inline]
    pub fn get(&self, value: i32) -> Codeword {
        let value = value.clamp(self.min_value(), self.max_value());
        self.entries[fold(value, self.size) as usize]
    }

    /// All entries, indexed by folded value.
    pub fn entries(&self) -> &[Codeword] {
        &self.entries
    }
}

/// Fold a signed value into a `size`-bit two's-complement index.
///
/// Widths above 32 behave like 32, a width of zero folds everything to zero.
#[inline]
pub fn fold(value: i32, size: u8) -> u32 {
    if size == 0 {
        return 0;
    }

    let shift = 32 - u32::from(size.min(32));
    ((value as u32) << shift) >> shift
}

/// Recover the signed value from a `size`-bit two's-complement index.
///
/// Bits above `size` are ignored. Widths above 32 behave like 32, a width of
/// zero always yields zero.
#[inline]
pub fn unfold(index: u32, size: u8) -> i32 {
    if size == 0 {
        return 0;
    }

    let shift = 32 - u32::from(size.min(32));
    ((index << shift) as i32) >> shift
}

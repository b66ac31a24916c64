//! Table construction settings.

use core::ops::RangeInclusive;

use crate::companding::COMPANDING_THRESHOLD;
use crate::error::{Result, SettingsError, bail};

/// Default width of the fast lookup window in bits.
pub const LOOKUP_TABLE_SIZE: u8 = 12;
/// Default width of the folded signed index of the value table in bits.
pub const VALUE_TABLE_SIZE: u8 = 13;
/// Default number of run lengths covered by the dense run-length table.
pub const NEW_CODEBOOK_LENGTH: usize = 3072;
/// Default threshold of the second legacy companding stage.
pub const COMPANDING_MORE: u16 = 56;

/// Supported widths of the fast lookup window.
pub(crate) const LOOKUP_TABLE_SIZES: RangeInclusive<u8> = 1..=16;
/// Supported widths of the folded value table index.
pub(crate) const VALUE_TABLE_SIZES: RangeInclusive<u8> = 2..=16;

/// Sizes and thresholds used while building the derived tables.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Width of the bit window indexing the fast lookup table.
    pub lookup_table_size: u8,
    /// Width of the two's-complement index of the value table.
    pub value_table_size: u8,
    /// Number of entries of the dense run-length table.
    pub run_table_length: usize,
    /// Threshold of the second legacy companding stage. Only used by codesets
    /// that set [`CodesetFlags::COMPANDING_MORE`](crate::CodesetFlags::COMPANDING_MORE).
    pub companding_more: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lookup_table_size: LOOKUP_TABLE_SIZE,
            value_table_size: VALUE_TABLE_SIZE,
            run_table_length: NEW_CODEBOOK_LENGTH,
            companding_more: COMPANDING_MORE,
        }
    }
}

impl Settings {
    /// Check that all sizes are in range.
    pub fn validate(&self) -> Result<()> {
        if !LOOKUP_TABLE_SIZES.contains(&self.lookup_table_size) {
            bail!(SettingsError::LookupTableSize);
        }

        if !VALUE_TABLE_SIZES.contains(&self.value_table_size) {
            bail!(SettingsError::ValueTableSize);
        }

        if self.run_table_length < 2 {
            bail!(SettingsError::RunTableLength);
        }

        if self.companding_more <= COMPANDING_THRESHOLD {
            bail!(SettingsError::CompandingThreshold);
        }

        Ok(())
    }
}

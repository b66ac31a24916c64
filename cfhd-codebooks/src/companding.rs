//! Companding of coefficient magnitudes.
//!
//! Magnitudes are compressed before they are looked up in the magnitude
//! codebook, so that a short codebook still covers a large dynamic range.
//! The decoder side expands the pre-decoded values stored in the FSM table
//! back into the linear domain.

use crate::codeset::CodesetFlags;
use crate::error::{CodebookError, Result, bail};
use crate::settings::Settings;

/// Magnitudes below this value are never companded.
pub const COMPANDING_THRESHOLD: u16 = 40;
/// FSM values at or above this magnitude are already linear.
pub const COMPANDED_CEILING: i32 = 264;
/// Number of entries of the cubic decompanding table.
pub const CUBIC_TABLE_LENGTH: usize = 1025;

const CUBIC_SCALE: u64 = 768;
const CUBIC_RANGE: u64 = 256;
const CUBIC_MAX: u32 = 1023;

/// The cubic companding curve: `m + floor(768 * m³ / 256³)`.
#[inline]
pub fn cubic_expand(magnitude: u32) -> u32 {
    let m = magnitude as u64;
    let cube = CUBIC_SCALE * m * m * m / (CUBIC_RANGE * CUBIC_RANGE * CUBIC_RANGE);
    (m + cube).min(u32::MAX as u64) as u32
}

/// Maps a linear magnitude back to the largest companded magnitude whose
/// expansion does not exceed it.
#[derive(Clone)]
pub struct CubicTable {
    entries: [u16; CUBIC_TABLE_LENGTH],
}

impl CubicTable {
    /// Build the table.
    pub fn new() -> Self {
        let mut entries = [0u16; CUBIC_TABLE_LENGTH];

        for m in 1..CUBIC_RANGE as u32 {
            let mag = cubic_expand(m).min(CUBIC_MAX);
            entries[mag as usize] = m as u16;
        }

        // Fill the gaps so that the table is monotone.
        let mut last = 0;
        for entry in &mut entries {
            if *entry == 0 {
                *entry = last;
            } else {
                last = *entry;
            }
        }

        Self { entries }
    }

    /// Look up a linear magnitude. Magnitudes past the end of the table
    /// saturate.
    #[inline]
    pub fn get(&self, magnitude: u32) -> u16 {
        self.entries[(magnitude as usize).min(CUBIC_TABLE_LENGTH - 1)]
    }

    /// All entries of the table.
    pub fn as_slice(&self) -> &[u16] {
        &self.entries
    }
}

impl Default for CubicTable {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for CubicTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CubicTable").finish_non_exhaustive()
    }
}

/// The companding law of a codeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Companding {
    /// Magnitudes are coded linearly.
    NotNeeded,
    /// The cubic law.
    Cubic,
    /// Piecewise linear: magnitudes from 40 on are coded at a quarter of their
    /// resolution, optionally followed by a second, steeper stage.
    Legacy {
        /// Threshold of the second stage.
        more: Option<u16>,
    },
}

impl Companding {
    /// Resolve the companding law from the flags of a codeset.
    pub fn from_flags(flags: CodesetFlags, settings: &Settings) -> Result<Self> {
        let cubic = flags.contains(CodesetFlags::COMPANDING_CUBIC);
        let not_needed = flags.contains(CodesetFlags::COMPANDING_NOT_NEEDED);

        Ok(match (cubic, not_needed) {
            (true, true) => bail!(CodebookError::ConflictingCompanding),
            (true, false) => Self::Cubic,
            (false, true) => Self::NotNeeded,
            (false, false) => Self::Legacy {
                more: flags
                    .contains(CodesetFlags::COMPANDING_MORE)
                    .then_some(settings.companding_more),
            },
        })
    }

    /// Expand a companded FSM value into the linear domain.
    ///
    /// Values whose magnitude is at or above [`COMPANDED_CEILING`] are
    /// assumed to be linear already and are returned unchanged.
    pub fn expand(&self, value: i16) -> i16 {
        let magnitude = (value as i32).abs();

        if magnitude >= COMPANDED_CEILING {
            return value;
        }

        let expanded = match *self {
            Self::NotNeeded => return value,
            Self::Cubic => cubic_expand(magnitude as u32) as i32,
            Self::Legacy { more } => {
                if magnitude < COMPANDING_THRESHOLD as i32 {
                    return value;
                }

                let mut m = magnitude;

                if let Some(more) = more.map(i32::from)
                    && m >= more
                {
                    m = (m - more) * 4 + more;
                }

                let threshold = COMPANDING_THRESHOLD as i32;
                (m - threshold) * 4 + threshold
            }
        };

        let expanded = expanded.min(i16::MAX as i32);

        if value < 0 {
            -expanded as i16
        } else {
            expanded as i16
        }
    }
}

/// The compression side of a companding law, with its lookup table built.
#[derive(Debug, Clone)]
pub(crate) enum Compressor {
    NotNeeded,
    Cubic(Box<CubicTable>),
    Legacy { more: Option<u16> },
}

impl Compressor {
    pub(crate) fn new(companding: Companding) -> Self {
        match companding {
            Companding::NotNeeded => Self::NotNeeded,
            Companding::Cubic => Self::Cubic(Box::new(CubicTable::new())),
            Companding::Legacy { more } => Self::Legacy { more },
        }
    }

    /// Compress a linear magnitude.
    #[inline]
    pub(crate) fn compress(&self, magnitude: u32) -> u32 {
        match self {
            Self::NotNeeded => magnitude,
            Self::Cubic(table) => table.get(magnitude) as u32,
            Self::Legacy { more } => {
                let threshold = COMPANDING_THRESHOLD as u32;
                let mut c = if magnitude >= threshold {
                    ((magnitude - threshold + 2) >> 2) + threshold
                } else {
                    magnitude
                };

                if let Some(more) = more.map(u32::from)
                    && c >= more
                {
                    c = ((c - more + 2) >> 2) + more;
                }

                c
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_curve() {
        assert_eq!(cubic_expand(0), 0);
        assert_eq!(cubic_expand(1), 1);
        assert_eq!(cubic_expand(128), 128 + 96);
        assert_eq!(cubic_expand(255), 255 + 759);
        assert_eq!(cubic_expand(263), 263 + 832);
    }

    #[test]
    fn cubic_table_is_monotone() {
        let table = CubicTable::new();
        let entries = table.as_slice();

        assert_eq!(entries.len(), CUBIC_TABLE_LENGTH);
        assert_eq!(entries[0], 0);
        assert!(entries.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(entries[CUBIC_TABLE_LENGTH - 1], 255);
    }

    #[test]
    fn cubic_table_inverts_the_curve() {
        let table = CubicTable::new();

        for m in 1..256 {
            let linear = cubic_expand(m);
            assert_eq!(table.get(linear) as u32, m);
            // Between two curve points the smaller companded value wins.
            if m < 255 {
                let next = cubic_expand(m + 1);
                for l in linear..next {
                    assert_eq!(table.get(l) as u32, m);
                }
            }
        }

        assert_eq!(table.get(5000), 255);
    }

    #[test]
    fn legacy_compression() {
        let c = Compressor::new(Companding::Legacy { more: None });
        assert_eq!(c.compress(0), 0);
        assert_eq!(c.compress(39), 39);
        assert_eq!(c.compress(40), 40);
        assert_eq!(c.compress(41), 40);
        assert_eq!(c.compress(42), 41);
        assert_eq!(c.compress(44), 41);
        assert_eq!(c.compress(46), 42);
        assert_eq!(c.compress(280), 100);
    }

    #[test]
    fn legacy_round_trip_stays_close() {
        let law = Companding::Legacy { more: None };
        let c = Compressor::new(law);

        for m in 0..900u32 {
            let companded = c.compress(m);
            assert!(companded < COMPANDED_CEILING as u32);
            let back = law.expand(companded as i16) as i32;
            assert!((back - m as i32).abs() <= 2, "{m} -> {companded} -> {back}");
        }
    }

    #[test]
    fn legacy_second_stage() {
        let law = Companding::Legacy { more: Some(56) };
        let c = Compressor::new(law);

        // 40 + (240 - 38) / 4 = 90, then 56 + (90 - 54) / 4 = 65.
        assert_eq!(c.compress(240), 65);
        assert_eq!(c.compress(100), 55);
        assert_eq!(law.expand(65), (((65 - 56) * 4 + 56) - 40) * 4 + 40);
        assert_eq!(law.expand(55), (55 - 40) * 4 + 40);
    }

    #[test]
    fn expansion_guards() {
        let legacy = Companding::Legacy { more: None };
        assert_eq!(legacy.expand(0), 0);
        assert_eq!(legacy.expand(39), 39);
        assert_eq!(legacy.expand(-39), -39);
        assert_eq!(legacy.expand(40), 40);
        assert_eq!(legacy.expand(100), 280);
        assert_eq!(legacy.expand(-100), -280);
        assert_eq!(legacy.expand(263), 932);
        assert_eq!(legacy.expand(264), 264);
        assert_eq!(legacy.expand(-264), -264);

        let cubic = Companding::Cubic;
        assert_eq!(cubic.expand(128), 224);
        assert_eq!(cubic.expand(-128), -224);
        assert_eq!(cubic.expand(300), 300);

        assert_eq!(Companding::NotNeeded.expand(100), 100);
    }

    #[test]
    fn policy_from_flags() {
        let settings = Settings::default();

        assert_eq!(
            Companding::from_flags(CodesetFlags::COMPANDING_CUBIC, &settings),
            Ok(Companding::Cubic)
        );
        assert_eq!(
            Companding::from_flags(CodesetFlags::COMPANDING_NOT_NEEDED, &settings),
            Ok(Companding::NotNeeded)
        );
        assert_eq!(
            Companding::from_flags(CodesetFlags::empty(), &settings),
            Ok(Companding::Legacy { more: None })
        );
        assert_eq!(
            Companding::from_flags(CodesetFlags::COMPANDING_MORE, &settings),
            Ok(Companding::Legacy {
                more: Some(settings.companding_more)
            })
        );
        assert!(
            Companding::from_flags(
                CodesetFlags::COMPANDING_CUBIC | CodesetFlags::COMPANDING_NOT_NEEDED,
                &settings
            )
            .is_err()
        );
    }
}

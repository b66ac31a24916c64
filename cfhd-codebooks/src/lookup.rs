//! The fast lookup table.
//!
//! The table is indexed by the next `N` bits of the bitstream. Each entry
//! tells the band decoder how many zeros and which signed value those bits
//! decode to and how many bits to consume, so that the common short
//! codewords are decoded with a single table access. Several zero runs are
//! folded into one entry. Windows that only hold the beginning of a longer
//! codeword point back into the run-value codebook instead.

use smallvec::SmallVec;

use crate::codebook::RlvEntry;
use crate::codeword::{BITSTREAM_LONG_SIZE, SIGN_SIZE, decode_sign};
use crate::error::{CodebookError, Result, SettingsError, TableKind, bail};
use crate::log::ldebug;
use crate::settings::LOOKUP_TABLE_SIZES;
use crate::util::try_alloc;
use cfhd_common::bit::bit_mask;

/// A run-value codebook prepared for bit pattern matching.
#[derive(Debug, Clone)]
pub struct RunValueBook<'a> {
    entries: &'a [RlvEntry],
    /// Entry indices ordered by codeword size.
    by_size: SmallVec<[u16; 64]>,
}

impl<'a> RunValueBook<'a> {
    /// Validate a run-value codebook and order it for matching.
    pub fn new(entries: &'a [RlvEntry]) -> Result<Self> {
        if entries.len() > u16::MAX as usize {
            bail!(CodebookError::InvalidRunValue);
        }

        for entry in entries {
            if !entry.codeword().has_valid_size() {
                bail!(CodebookError::InvalidCodewordSize);
            }

            if entry.value == 0 {
                if entry.count == 0 {
                    bail!(CodebookError::InvalidRunValue);
                }
            } else {
                if entry.value < 0 || entry.count != 1 {
                    bail!(CodebookError::InvalidRunValue);
                }

                if entry.size + SIGN_SIZE > BITSTREAM_LONG_SIZE {
                    bail!(CodebookError::CodewordTooLong);
                }
            }
        }

        let mut by_size: SmallVec<[u16; 64]> = (0..entries.len() as u16).collect();
        by_size.sort_by_key(|&i| entries[i as usize].size);

        Ok(Self { entries, by_size })
    }

    /// The entries in the order they were given.
    pub fn entries(&self) -> &'a [RlvEntry] {
        self.entries
    }
}

/// The result of matching one codeword against a bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    /// The number of coefficients the codeword stands for.
    pub count: u32,
    /// The signed value, or zero for a run of zeros.
    pub value: i32,
    /// The number of bits consumed, including the sign code.
    pub shift: u8,
}

/// Match the shortest codeword at the start of a `width`-bit pattern.
///
/// The pattern is right-justified in `word`. Non-zero values also consume
/// their sign code. Returns `None` if no complete codeword fits into the
/// pattern, if the sign code is not a valid one or if `width` exceeds 32.
pub fn match_bit_pattern(book: &RunValueBook<'_>, word: u32, width: u8) -> Option<PatternMatch> {
    if width > BITSTREAM_LONG_SIZE {
        return None;
    }

    let word = word & bit_mask(width);

    for &index in &book.by_size {
        let entry = &book.entries[index as usize];

        if entry.size > width {
            break;
        }

        if word >> (width - entry.size) != entry.bits {
            continue;
        }

        if entry.value == 0 {
            return Some(PatternMatch {
                count: entry.count,
                value: 0,
                shift: entry.size,
            });
        }

        let shift = entry.size + SIGN_SIZE;

        if shift > width {
            return None;
        }

        let sign = decode_sign((word >> (width - shift)) & bit_mask(SIGN_SIZE))?;

        return Some(PatternMatch {
            count: entry.count,
            value: sign * entry.value,
            shift,
        });
    }

    None
}

/// One entry of the fast lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastEntry {
    /// The window starts with `count` zeros followed by `value` (if non-zero),
    /// which together take up `shift` bits.
    Decoded {
        /// The number of zeros.
        count: u32,
        /// The value after the zeros, or zero.
        value: i32,
        /// The number of bits consumed.
        shift: u8,
    },
    /// The window holds the beginning of a codeword longer than the window.
    /// The decoder has to continue with more bits.
    Continue {
        /// Index of the codeword in the run-value codebook.
        entry: u16,
    },
    /// No valid codeword starts with this window.
    Invalid,
}

/// The fast lookup table of a codeset.
#[derive(Debug, Clone)]
pub struct FastLookupTable {
    bits: u8,
    entries: Vec<FastEntry>,
}

impl FastLookupTable {
    /// Build the table for `bits`-bit windows by scanning each window with
    /// [`match_bit_pattern`]. `bits` must lie in `1..=16`.
    pub fn build(book: &RunValueBook<'_>, bits: u8) -> Result<Self> {
        if !LOOKUP_TABLE_SIZES.contains(&bits) {
            bail!(SettingsError::LookupTableSize);
        }

        let len = 1usize << bits;
        let mut entries = try_alloc(len, TableKind::FastLookup)?;
        let mut continued = 0;
        let mut invalid = 0;

        for index in 0..len as u32 {
            let entry = scan_window(book, index, bits);

            match entry {
                FastEntry::Continue { .. } => continued += 1,
                FastEntry::Invalid => invalid += 1,
                FastEntry::Decoded { .. } => {}
            }

            entries.push(entry);
        }

        ldebug!(
            "built fast lookup table: {} entries, {} continued, {} invalid",
            len,
            continued,
            invalid
        );

        Ok(Self { bits, entries })
    }

    /// The width of the window in bits.
    #[inline]
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Look up a right-justified window. Bits above the window are ignored.
    #[inline]
    pub fn lookup(&self, window: u32) -> FastEntry {
        self.entries[(window & bit_mask(self.bits)) as usize]
    }

    /// The number of bits the decoder consumes for an entry. Continuation
    /// markers consume the whole window.
    #[inline]
    pub fn shift(&self, entry: &FastEntry) -> u8 {
        match entry {
            FastEntry::Decoded { shift, .. } => *shift,
            FastEntry::Continue { .. } => self.bits,
            FastEntry::Invalid => 0,
        }
    }

    /// All entries, indexed by window.
    pub fn entries(&self) -> &[FastEntry] {
        &self.entries
    }
}

fn scan_window(book: &RunValueBook<'_>, index: u32, bits: u8) -> FastEntry {
    let mut count = 0u32;
    let mut value = 0;
    let mut shift = 0;

    // Fold as many zero runs as fit, then at most one value.
    while shift < bits {
        let Some(m) = match_bit_pattern(book, index, bits - shift) else {
            break;
        };

        shift += m.shift;

        if m.value != 0 {
            value = m.value;
            break;
        }

        count = count.saturating_add(m.count);
    }

    if shift > 0 {
        return FastEntry::Decoded {
            count,
            value,
            shift,
        };
    }

    match continuation(book, index, bits) {
        Some(entry) => FastEntry::Continue { entry },
        None => FastEntry::Invalid,
    }
}

/// Find the codeword that begins with the window but does not fit into it,
/// either on its own or together with one of the sign codes.
fn continuation(book: &RunValueBook<'_>, index: u32, bits: u8) -> Option<u16> {
    for (i, entry) in book.entries.iter().enumerate() {
        let code = entry.codeword();

        if code.size > bits {
            if code.prefix(bits) == Some(index) {
                return Some(i as u16);
            }

            continue;
        }

        if entry.value != 0 && code.size + SIGN_SIZE > bits {
            let signed = [code.with_sign(1), code.with_sign(-1)];

            if signed
                .iter()
                .flatten()
                .any(|c| c.prefix(bits) == Some(index))
            {
                return Some(i as u16);
            }
        }
    }

    None
}

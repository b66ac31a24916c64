//! Run-length codebooks and the dense run-length code table.
//!
//! A codeset ships a sparse run-length codebook: a handful of codewords, each
//! standing for a run of `count` zeros. Encoding an arbitrary run would need a
//! search over combinations of those codewords, so the table built here
//! precomputes, for every run length up to a fixed maximum, the composite
//! codeword made of the largest runs first.

use smallvec::SmallVec;

use crate::codeword::{CODEWORD_BUDGET, Codeword};
use crate::error::{CodebookError, Result, TableKind, bail};
use crate::log::{ldebug, ltrace};
use crate::util::try_alloc;

/// A run-length codeword covering a run of `count` zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RlcEntry {
    /// The code bits, right-aligned.
    pub bits: u32,
    /// The number of bits in the code.
    pub size: u8,
    /// The length of the run.
    pub count: u32,
}

impl RlcEntry {
    /// Create a new entry.
    pub const fn new(bits: u32, size: u8, count: u32) -> Self {
        Self { bits, size, count }
    }

    /// The codeword of the entry.
    #[inline]
    pub fn codeword(&self) -> Codeword {
        Codeword::new(self.bits, self.size)
    }
}

/// A run-value codeword: either a run of `count` zeros (`value == 0`) or a
/// single magnitude that is followed by a sign code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RlvEntry {
    /// The code bits, right-aligned.
    pub bits: u32,
    /// The number of bits in the code, without the sign.
    pub size: u8,
    /// The number of coefficients the codeword stands for.
    pub count: u32,
    /// The magnitude, or zero for a run of zeros.
    pub value: i32,
}

impl RlvEntry {
    /// Create a new entry.
    pub const fn new(bits: u32, size: u8, count: u32, value: i32) -> Self {
        Self {
            bits,
            size,
            count,
            value,
        }
    }

    /// The codeword of the entry, without the sign.
    #[inline]
    pub fn codeword(&self) -> Codeword {
        Codeword::new(self.bits, self.size)
    }
}

/// Sort run-length entries by decreasing count.
///
/// Afterwards the counts are strictly decreasing and the last entry covers a
/// run of one; anything else is reported as an invalid codebook.
pub fn sort_decreasing_run_length(codebook: &mut [RlcEntry]) -> Result<()> {
    codebook.sort_by(|a, b| b.count.cmp(&a.count));

    if codebook.windows(2).any(|w| w[0].count == w[1].count) {
        bail!(CodebookError::DuplicateCount);
    }

    match codebook.last() {
        Some(last) if last.count == 0 => bail!(CodebookError::ZeroCount),
        Some(last) if last.count == 1 => Ok(()),
        _ => bail!(CodebookError::MissingSingleRun),
    }
}

/// Compute the dense run-length code table.
///
/// Entry `L` holds the shortest composite codeword for a run of `L` zeros
/// built greedily from the largest runs down, and the length it actually
/// covers. The composite never exceeds [`CODEWORD_BUDGET`] bits, so long
/// runs may be covered only partially. `zero` is the codeword of an isolated
/// zero, used as the single-run entry when the codebook has none.
pub fn compute_run_length_code_table(
    codebook: &[RlcEntry],
    zero: Codeword,
    length: usize,
) -> Result<Vec<RlcEntry>> {
    let mut book: SmallVec<[RlcEntry; 32]> = codebook.iter().copied().collect();

    if !book.iter().any(|e| e.count == 1) {
        book.push(RlcEntry::new(zero.bits, zero.size, 1));
    }

    if book.iter().any(|e| !e.codeword().has_valid_size()) {
        bail!(CodebookError::InvalidCodewordSize);
    }

    sort_decreasing_run_length(&mut book)?;

    let mut table = try_alloc(length, TableKind::RunLength)?;
    let mut truncated = 0;

    for run in 0..length {
        let entry = run_length_code(&book, run);

        if entry.count as usize != run {
            ltrace!("run of {} covered only up to {}", run, entry.count);
            truncated += 1;
        }

        table.push(entry);
    }

    ldebug!(
        "built run-length table: {} entries, {} truncated by the bit budget",
        length,
        truncated
    );

    Ok(table)
}

/// Greedily compose the codeword for one run from a sorted codebook.
fn run_length_code(book: &[RlcEntry], run: usize) -> RlcEntry {
    let mut remaining = run as u64;
    let mut code = Codeword::EMPTY;

    for entry in book {
        let count = entry.count as u64;

        if remaining < count {
            continue;
        }

        let repetitions = remaining / count;
        let mut written = 0;

        while written < repetitions {
            if code.size + entry.size > CODEWORD_BUDGET {
                // Stop with this run class. Smaller leftover pieces of it are
                // not retried, the smaller classes below may still fit.
                break;
            }

            code = Codeword::new((code.bits << entry.size) | entry.bits, code.size + entry.size);
            written += 1;
        }

        remaining -= written * count;
    }

    RlcEntry::new(code.bits, code.size, (run as u64 - remaining) as u32)
}

/// The dense run-length code table of a codeset.
#[derive(Debug, Clone)]
pub struct RunLengthTable {
    entries: Vec<RlcEntry>,
}

impl RunLengthTable {
    /// Build the table from a sparse codebook.
    pub fn build(codebook: &[RlcEntry], zero: Codeword, length: usize) -> Result<Self> {
        Ok(Self {
            entries: compute_run_length_code_table(codebook, zero, length)?,
        })
    }

    /// The entry for a run of `run` zeros.
    #[inline]
    pub fn get(&self, run: usize) -> Option<&RlcEntry> {
        self.entries.get(run)
    }

    /// The number of run lengths covered by the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, indexed by run length.
    pub fn entries(&self) -> &[RlcEntry] {
        &self.entries
    }
}

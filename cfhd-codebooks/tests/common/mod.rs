//! A small synthetic codeset shared by the integration tests and benchmarks.
//!
//! All codebooks are complete prefix codes that are easy to decode by hand:
//! magnitudes use the Elias gamma code of `m + 1`, zero runs of `2^k` are `k`
//! zeros followed by a one, and the run-value book is a unary code.

#![allow(dead_code)]

use std::sync::LazyLock;

use cfhd_codebooks::{
    Codeset, CodesetFlags, Codeword, FSM_INDEX_ENTRIES, FsmArray, FsmEntry, RlcEntry, RlvEntry,
};
use cfhd_common::bit::BitReader;

/// Number of entries of the magnitude codebook.
pub const MAGNITUDE_COUNT: u32 = 300;
/// Largest run covered by a single run-length codeword.
pub const LARGEST_RUN_EXPONENT: u8 = 10;

pub static MAGNITUDES: LazyLock<Vec<Codeword>> = LazyLock::new(|| {
    (0..MAGNITUDE_COUNT)
        .map(|m| {
            let n = m + 1;
            let bits = 32 - n.leading_zeros();
            Codeword::new(n, (2 * bits - 1) as u8)
        })
        .collect()
});

// The single run is left out on purpose, it is synthesized from the zero
// magnitude codeword "1".
pub static RUNS: LazyLock<Vec<RlcEntry>> = LazyLock::new(|| {
    (1..=LARGEST_RUN_EXPONENT)
        .rev()
        .map(|k| RlcEntry::new(1, k + 1, 1 << k))
        .collect()
});

/// `(count, value)` of the unary codewords `0`, `10`, `110`, ... A value of
/// zero marks a run of `count` zeros.
const RUN_VALUE_SHAPES: [(u32, i32); 14] = [
    (1, 0),
    (1, 1),
    (1, 2),
    (8, 0),
    (1, 3),
    (1, 4),
    (32, 0),
    (1, 5),
    (1, 6),
    (1, 7),
    (1, 8),
    (128, 0),
    (1, 9),
    (256, 0),
];

pub static RUN_VALUES: LazyLock<Vec<RlvEntry>> = LazyLock::new(|| {
    let last = RUN_VALUE_SHAPES.len() - 1;

    RUN_VALUE_SHAPES
        .iter()
        .enumerate()
        .map(|(i, &(count, value))| {
            if i == last {
                // All ones, without the terminating zero.
                RlvEntry::new((1 << i) - 1, i as u8, count, value)
            } else {
                RlvEntry::new(((1 << i) - 1) << 1, i as u8 + 1, count, value)
            }
        })
        .collect()
});

pub const BAND_END: Codeword = Codeword::new(0b0000_0000_0000_01, 14);

pub static TAGS: [Codeword; 3] = [
    Codeword::new(0b0000_0000_0000_0011, 16),
    Codeword::new(0b0000_0000_0000_0010, 16),
    BAND_END,
];

/// Pre-decoded FSM values around the companding thresholds.
pub const FSM_VALUES: [i16; 16] = [
    0, 5, -5, 39, -39, 40, -40, 100, -100, 263, -263, 264, -264, 300, -300, 1000,
];

pub static FSM: LazyLock<Vec<FsmEntry>> = LazyLock::new(|| {
    let mut entries = Vec::with_capacity(2 * FSM_INDEX_ENTRIES);

    for state in 0..2u16 {
        for (index, &value) in FSM_VALUES.iter().enumerate() {
            let next_state = (index as u16 + state) % 2;
            entries.push(FsmEntry::new(next_state, state, index as u16 % 3, value, -value));
        }
    }

    entries
});

pub fn codeset(flags: CodesetFlags) -> Codeset<'static> {
    Codeset {
        description: "synthetic",
        magnitudes: &MAGNITUDES,
        runs: &RUNS,
        run_values: &RUN_VALUES,
        tags: &TAGS,
        fsm: FsmArray {
            num_states: 2,
            entries: &FSM,
        },
        flags,
    }
}

/// Read one Elias gamma coded magnitude.
pub fn read_magnitude(reader: &mut BitReader<'_>) -> Option<u32> {
    let mut zeros = 0;

    while reader.read_bit()? == 0 {
        zeros += 1;
    }

    let rest = reader.read(zeros)?;

    Some(((1 << zeros) | rest) - 1)
}

/// Read one run-length codeword and return the run it covers.
pub fn read_run(reader: &mut BitReader<'_>) -> Option<u32> {
    let mut zeros = 0;

    while reader.read_bit()? == 0 {
        zeros += 1;
    }

    Some(1 << zeros)
}

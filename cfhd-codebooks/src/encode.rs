//! Writing coefficients with the derived encoder tables.

use cfhd_common::bit::BitWriter;

use crate::codebook::RunLengthTable;
use crate::codeword::Codeword;
use crate::value_table::ValueTable;

/// Write a signed coefficient. Values outside of the domain of the table are
/// saturated to its edge.
#[inline]
pub fn put_value(writer: &mut BitWriter, values: &ValueTable, value: i32) -> Option<()> {
    values.get(value).write(writer)
}

/// Write a run of zero coefficients.
///
/// Runs longer than the table are split into pieces, each coded with the
/// longest entry of the table. Returns `None` if the table cannot code a
/// run, which never happens for a table built from a valid codebook.
pub fn put_zero_run(writer: &mut BitWriter, runs: &RunLengthTable, mut run: usize) -> Option<()> {
    let longest = runs.len().checked_sub(1)?;

    while run > 0 {
        let entry = runs.get(run.min(longest))?;

        if entry.count == 0 {
            return None;
        }

        entry.codeword().write(writer)?;
        run -= entry.count as usize;
    }

    Some(())
}

/// Write the codeword that terminates a band.
#[inline]
pub fn put_band_end(writer: &mut BitWriter, band_end: Codeword) -> Option<()> {
    band_end.write(writer)
}

use crate::error::{BuildError, Result, TableKind};

/// Allocate an empty vector with room for `len` entries, reporting allocation
/// failure instead of aborting.
pub(crate) fn try_alloc<T>(len: usize, table: TableKind) -> Result<Vec<T>> {
    let mut entries = Vec::new();
    entries
        .try_reserve_exact(len)
        .map_err(|_| BuildError::OutOfMemory(table))?;

    Ok(entries)
}

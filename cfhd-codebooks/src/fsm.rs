//! Finite-state-machine tables for the coefficient decoder.
//!
//! The band decoder consumes the bitstream `FSM_INDEX_SIZE` bits at a time.
//! The current state stands for the bits of a codeword that are still
//! pending, and each lookahead index selects the entry that says which
//! coefficients were completed and which state follows. Every codeset ships
//! its machine as a flat array of `num_states << FSM_INDEX_SIZE` entries.

use crate::codeset::CodesetFlags;
use crate::companding::Companding;
use crate::error::{FsmError, Result, bail};
use crate::log::ldebug;

/// Number of bitstream bits that index one state.
pub const FSM_INDEX_SIZE: u8 = 4;
/// Number of entries of one state.
pub const FSM_INDEX_ENTRIES: usize = 1 << FSM_INDEX_SIZE;

/// One transition of the state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsmEntry {
    /// The state used for the next lookahead index.
    pub next_state: u16,
    /// Zeros to skip before `value0`.
    pub pre_skip: u16,
    /// Zeros to skip after `value0`.
    pub post_skip: u16,
    /// The first decoded coefficient.
    pub value0: i16,
    /// The second decoded coefficient.
    pub value1: i16,
}

impl FsmEntry {
    /// Create a new entry.
    pub const fn new(
        next_state: u16,
        pre_skip: u16,
        post_skip: u16,
        value0: i16,
        value1: i16,
    ) -> Self {
        Self {
            next_state,
            pre_skip,
            post_skip,
            value0,
            value1,
        }
    }
}

/// The shipped initialization data of a state machine.
#[derive(Debug, Clone, Copy)]
pub struct FsmArray<'a> {
    /// The number of states.
    pub num_states: usize,
    /// All entries, state after state.
    pub entries: &'a [FsmEntry],
}

/// A runtime state machine table.
#[derive(Debug, Clone)]
pub struct FsmTable {
    flags: CodesetFlags,
    companding: Companding,
    num_states: usize,
    entries: Vec<FsmEntry>,
}

impl FsmTable {
    /// Copy a shipped state machine into a runtime table.
    ///
    /// The companding bits of `flags` are kept with the table and it is marked
    /// as initialized.
    pub fn load(
        array: &FsmArray<'_>,
        flags: CodesetFlags,
        companding: Companding,
    ) -> Result<Self> {
        let len = array
            .num_states
            .checked_mul(FSM_INDEX_ENTRIES)
            .ok_or(FsmError::SizeMismatch)?;

        if array.num_states == 0 || array.entries.len() != len {
            bail!(FsmError::SizeMismatch);
        }

        if array
            .entries
            .iter()
            .any(|e| e.next_state as usize >= array.num_states)
        {
            bail!(FsmError::InvalidNextState);
        }

        let mut entries = Vec::new();
        entries
            .try_reserve_exact(len)
            .map_err(|_| FsmError::OutOfMemory)?;
        entries.extend_from_slice(array.entries);

        ldebug!("loaded FSM table with {} states", array.num_states);

        Ok(Self {
            flags: (flags & CodesetFlags::COMPANDING) | CodesetFlags::INITIALIZED,
            companding,
            num_states: array.num_states,
            entries,
        })
    }

    /// Expand the companded `value0` of every entry into the linear domain.
    ///
    /// The pass runs at most once per table. Tables of codesets without
    /// companding are left untouched.
    pub fn scale(&mut self) {
        if self.flags.contains(CodesetFlags::COMPANDING_DONE) {
            return;
        }

        if !self.flags.contains(CodesetFlags::COMPANDING_NOT_NEEDED) {
            for entry in &mut self.entries {
                entry.value0 = self.companding.expand(entry.value0);
            }
        }

        self.flags |= CodesetFlags::COMPANDING_DONE;
    }

    /// The flags of the table.
    #[inline]
    pub fn flags(&self) -> CodesetFlags {
        self.flags
    }

    /// The number of states.
    #[inline]
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// The entries of one state, indexed by lookahead.
    #[inline]
    pub fn state(&self, state: usize) -> Option<&[FsmEntry]> {
        let start = state.checked_mul(FSM_INDEX_ENTRIES)?;
        self.entries.get(start..start.checked_add(FSM_INDEX_ENTRIES)?)
    }

    /// The entry for a state and a lookahead index.
    #[inline]
    pub fn entry(&self, state: usize, index: usize) -> Option<&FsmEntry> {
        if index >= FSM_INDEX_ENTRIES {
            return None;
        }

        let pos = state.checked_mul(FSM_INDEX_ENTRIES)?.checked_add(index)?;
        self.entries.get(pos)
    }

    /// All entries, state after state.
    pub fn entries(&self) -> &[FsmEntry] {
        &self.entries
    }
}

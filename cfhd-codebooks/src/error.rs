//! Error types for building codebook and FSM tables.

use core::fmt;

/// The main error type for table construction.
///
/// All of these are fatal to codec initialization: the tables are required by
/// every subsequent decode, so nothing is built in a degraded form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// The authored codebook data violates a structural invariant.
    Codebook(CodebookError),
    /// A derived table could not be allocated.
    OutOfMemory(TableKind),
    /// The FSM table could not be initialized.
    InitFsm(FsmError),
    /// The table settings are out of range.
    Settings(SettingsError),
}

/// Errors related to the authored codebooks of a codeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodebookError {
    /// Two run-length entries share the same count.
    DuplicateCount,
    /// A run-length entry has a count of zero.
    ZeroCount,
    /// No entry covers a run of exactly one after synthesis.
    MissingSingleRun,
    /// A codeword size is outside `1..=31`.
    InvalidCodewordSize,
    /// A codeword does not leave room for the sign code.
    CodewordTooLong,
    /// The magnitude codebook has no entries.
    EmptyMagnitudes,
    /// A run-value entry is neither a zero run nor a single signed value.
    InvalidRunValue,
    /// The tag table has no band-end codeword.
    MissingBandEnd,
    /// Both the cubic and the "not needed" companding flags are set.
    ConflictingCompanding,
}

/// The derived tables a codeset owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// The dense run-length code table.
    RunLength,
    /// The fast bit-window lookup table.
    FastLookup,
    /// The signed value table.
    Values,
}

/// Errors related to loading a finite-state-machine table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmError {
    /// The FSM table could not be allocated.
    OutOfMemory,
    /// The init array does not hold `num_states` full states.
    SizeMismatch,
    /// An entry points at a state outside of the table.
    InvalidNextState,
}

/// Errors related to table settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// The lookup window width is outside `1..=16`.
    LookupTableSize,
    /// The value table index width is outside `2..=16`.
    ValueTableSize,
    /// The run-length table must cover at least runs of zero and one.
    RunTableLength,
    /// The second companding threshold must lie above the first.
    CompandingThreshold,
    /// The tables were already built with different settings.
    Mismatch,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codebook(e) => write!(f, "{e}"),
            Self::OutOfMemory(t) => write!(f, "out of memory while allocating the {t} table"),
            Self::InitFsm(e) => write!(f, "failed to initialize FSM table: {e}"),
            Self::Settings(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for CodebookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateCount => write!(f, "run-length codebook has duplicate counts"),
            Self::ZeroCount => write!(f, "run-length codebook has an entry with count zero"),
            Self::MissingSingleRun => write!(f, "run-length codebook has no single-run entry"),
            Self::InvalidCodewordSize => write!(f, "codeword size out of range"),
            Self::CodewordTooLong => write!(f, "codeword leaves no room for the sign code"),
            Self::EmptyMagnitudes => write!(f, "magnitude codebook is empty"),
            Self::InvalidRunValue => write!(f, "invalid run-value codebook entry"),
            Self::MissingBandEnd => write!(f, "tag table has no band-end codeword"),
            Self::ConflictingCompanding => write!(f, "conflicting companding flags"),
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunLength => write!(f, "run-length"),
            Self::FastLookup => write!(f, "fast lookup"),
            Self::Values => write!(f, "value"),
        }
    }
}

impl fmt::Display for FsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::SizeMismatch => write!(f, "entry count does not match the number of states"),
            Self::InvalidNextState => write!(f, "next state out of range"),
        }
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LookupTableSize => write!(f, "lookup table size out of range"),
            Self::ValueTableSize => write!(f, "value table size out of range"),
            Self::RunTableLength => write!(f, "run-length table too short"),
            Self::CompandingThreshold => write!(f, "invalid second companding threshold"),
            Self::Mismatch => write!(f, "tables were already built with different settings"),
        }
    }
}

impl core::error::Error for BuildError {}
impl core::error::Error for CodebookError {}
impl core::error::Error for FsmError {}
impl core::error::Error for SettingsError {}

impl From<CodebookError> for BuildError {
    fn from(e: CodebookError) -> Self {
        Self::Codebook(e)
    }
}

impl From<FsmError> for BuildError {
    fn from(e: FsmError) -> Self {
        Self::InitFsm(e)
    }
}

impl From<SettingsError> for BuildError {
    fn from(e: SettingsError) -> Self {
        Self::Settings(e)
    }
}

/// Result type for table construction.
pub type Result<T> = core::result::Result<T, BuildError>;

macro_rules! bail {
    ($err:expr) => {
        return Err($err.into())
    };
}

pub(crate) use bail;

//! Codesets and the tables derived from them.
//!
//! A codeset bundles the authored codebooks and the FSM of one entropy coding
//! variant. It is never mutated: the derived tables are returned as separate
//! values and can be shared by any number of decoders.

use std::sync::{Mutex, OnceLock, PoisonError};

use bitflags::bitflags;

use crate::codebook::{RlcEntry, RlvEntry, RunLengthTable};
use crate::codeword::Codeword;
use crate::companding::Companding;
use crate::error::{CodebookError, Result, SettingsError, bail};
use crate::fsm::{FsmArray, FsmTable};
use crate::log::{ldebug, lwarn};
use crate::lookup::{FastLookupTable, RunValueBook};
use crate::settings::Settings;
use crate::value_table::ValueTable;

bitflags! {
    /// Flags of a codeset and of the FSM tables loaded from it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CodesetFlags: u32 {
        /// The FSM table has been loaded.
        const INITIALIZED = 1 << 0;
        /// The FSM values have been expanded into the linear domain.
        const COMPANDING_DONE = 1 << 1;
        /// Magnitudes are coded linearly.
        const COMPANDING_NOT_NEEDED = 1 << 2;
        /// Magnitudes use the cubic companding law.
        const COMPANDING_CUBIC = 1 << 3;
        /// The legacy companding law has a second stage.
        const COMPANDING_MORE = 1 << 4;
        /// All bits selecting the companding law.
        const COMPANDING = Self::COMPANDING_NOT_NEEDED.bits()
            | Self::COMPANDING_CUBIC.bits()
            | Self::COMPANDING_MORE.bits();
    }
}

/// The authored data of one entropy coding variant.
#[derive(Debug, Clone, Copy)]
pub struct Codeset<'a> {
    /// A short human-readable name.
    pub description: &'a str,
    /// The magnitude codebook, indexed by companded magnitude.
    pub magnitudes: &'a [Codeword],
    /// The sparse run-length codebook.
    pub runs: &'a [RlcEntry],
    /// The run-value codebook used by the fast lookup table.
    pub run_values: &'a [RlvEntry],
    /// The tag codewords. The last one terminates a band.
    pub tags: &'a [Codeword],
    /// The shipped state machine.
    pub fsm: FsmArray<'a>,
    /// The companding flags.
    pub flags: CodesetFlags,
}

impl Codeset<'_> {
    /// The codeword that marks the end of a coefficient band.
    pub fn band_end(&self) -> Result<Codeword> {
        let Some(code) = self.tags.last().copied() else {
            bail!(CodebookError::MissingBandEnd);
        };

        if !code.has_valid_size() {
            bail!(CodebookError::InvalidCodewordSize);
        }

        Ok(code)
    }

    /// The codeword of an isolated zero coefficient.
    pub fn zero_code(&self) -> Result<Codeword> {
        match self.magnitudes.first() {
            Some(code) => Ok(*code),
            None => bail!(CodebookError::EmptyMagnitudes),
        }
    }

    /// The companding law selected by the flags.
    pub fn companding(&self, settings: &Settings) -> Result<Companding> {
        let companding = Companding::from_flags(self.flags, settings)?;

        if self.flags.contains(CodesetFlags::COMPANDING_MORE) {
            lwarn!(
                "codeset '{}' uses the second legacy companding stage",
                self.description
            );
        }

        Ok(companding)
    }
}

/// The encoder and lookup tables derived from the codebooks of a codeset.
#[derive(Debug, Clone)]
pub struct CodebookTables {
    settings: Settings,
    companding: Companding,
    runs: RunLengthTable,
    fast: FastLookupTable,
    values: ValueTable,
}

impl CodebookTables {
    /// Build all tables of a codeset.
    pub fn build(codeset: &Codeset<'_>, settings: &Settings) -> Result<Self> {
        settings.validate()?;

        let companding = codeset.companding(settings)?;
        let runs = RunLengthTable::build(
            codeset.runs,
            codeset.zero_code()?,
            settings.run_table_length,
        )?;
        let book = RunValueBook::new(codeset.run_values)?;
        let fast = FastLookupTable::build(&book, settings.lookup_table_size)?;
        let values =
            ValueTable::build(codeset.magnitudes, settings.value_table_size, companding)?;

        ldebug!("built codebook tables for '{}'", codeset.description);

        Ok(Self {
            settings: *settings,
            companding,
            runs,
            fast,
            values,
        })
    }

    /// The settings the tables were built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The companding law the value table was built with.
    pub fn companding(&self) -> Companding {
        self.companding
    }

    /// The dense run-length table.
    pub fn runs(&self) -> &RunLengthTable {
        &self.runs
    }

    /// The fast lookup table.
    pub fn fast(&self) -> &FastLookupTable {
        &self.fast
    }

    /// The signed value table.
    pub fn values(&self) -> &ValueTable {
        &self.values
    }
}

/// A codeset together with its lazily built tables.
///
/// The tables are built on the first call to [`Codebooks::init`]. Concurrent
/// first calls are serialized and every later call returns the same tables.
#[derive(Debug)]
pub struct Codebooks<'a> {
    codeset: Codeset<'a>,
    tables: OnceLock<CodebookTables>,
    lock: Mutex<()>,
}

impl<'a> Codebooks<'a> {
    /// Wrap a codeset without building anything yet.
    pub fn new(codeset: Codeset<'a>) -> Self {
        Self {
            codeset,
            tables: OnceLock::new(),
            lock: Mutex::new(()),
        }
    }

    /// Build the tables if that has not happened yet.
    ///
    /// Once built, the tables are returned as long as `settings` matches the
    /// settings of the first successful call. Different settings are reported
    /// as [`SettingsError::Mismatch`]. A failed build leaves the codebooks
    /// uninitialized, so it can be retried.
    pub fn init(&self, settings: &Settings) -> Result<&CodebookTables> {
        if let Some(tables) = self.tables.get() {
            return Self::matching(tables, settings);
        }

        // The guard only protects construction, so a poisoned lock is harmless.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(tables) = self.tables.get() {
            return Self::matching(tables, settings);
        }

        let tables = CodebookTables::build(&self.codeset, settings)?;

        Ok(self.tables.get_or_init(|| tables))
    }

    fn matching<'t>(
        tables: &'t CodebookTables,
        settings: &Settings,
    ) -> Result<&'t CodebookTables> {
        if tables.settings != *settings {
            bail!(SettingsError::Mismatch);
        }

        Ok(tables)
    }

    /// The tables, if they have been built.
    pub fn get(&self) -> Option<&CodebookTables> {
        self.tables.get()
    }

    /// The wrapped codeset.
    pub fn codeset(&self) -> &Codeset<'a> {
        &self.codeset
    }
}

/// The per-codeset FSM tables and band-end codewords of a decoder.
#[derive(Debug, Clone)]
pub struct DecoderTables {
    fsm: Vec<FsmTable>,
    band_end: Vec<Codeword>,
}

impl DecoderTables {
    /// Load and scale the FSM of every codeset and extract its band-end
    /// codeword.
    pub fn new(codesets: &[Codeset<'_>], settings: &Settings) -> Result<Self> {
        settings.validate()?;

        let mut fsm = Vec::with_capacity(codesets.len());
        let mut band_end = Vec::with_capacity(codesets.len());

        for codeset in codesets {
            let companding = codeset.companding(settings)?;
            let mut table = FsmTable::load(&codeset.fsm, codeset.flags, companding)?;
            table.scale();

            fsm.push(table);
            band_end.push(codeset.band_end()?);
        }

        ldebug!("initialized {} decoder FSM tables", fsm.len());

        Ok(Self { fsm, band_end })
    }

    /// The number of codesets.
    pub fn len(&self) -> usize {
        self.fsm.len()
    }

    /// Whether there are no codesets.
    pub fn is_empty(&self) -> bool {
        self.fsm.is_empty()
    }

    /// The FSM table of a codeset.
    pub fn fsm(&self, index: usize) -> Option<&FsmTable> {
        self.fsm.get(index)
    }

    /// The band-end codeword of a codeset.
    pub fn band_end_code(&self, index: usize) -> Option<Codeword> {
        self.band_end.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BuildError, FsmError};
    use crate::fsm::{FSM_INDEX_ENTRIES, FsmEntry};
    use crate::lookup::FastEntry;

    const MAGNITUDES: [Codeword; 4] = [
        Codeword::new(0b1, 1),
        Codeword::new(0b01, 2),
        Codeword::new(0b001, 3),
        Codeword::new(0b000, 3),
    ];
    const RUNS: [RlcEntry; 2] = [RlcEntry::new(0b1, 1, 1), RlcEntry::new(0b01, 2, 2)];
    const RUN_VALUES: [RlvEntry; 4] = [
        RlvEntry::new(0b0, 1, 1, 0),
        RlvEntry::new(0b10, 2, 1, 1),
        RlvEntry::new(0b110, 3, 1, 2),
        RlvEntry::new(0b111, 3, 4, 0),
    ];
    const TAGS: [Codeword; 2] = [Codeword::new(0b1111, 4), Codeword::new(0b1_1100, 5)];
    const FSM: [FsmEntry; FSM_INDEX_ENTRIES] = {
        let mut entries = [FsmEntry::new(0, 0, 0, 0, 0); FSM_INDEX_ENTRIES];
        entries[1] = FsmEntry::new(0, 1, 0, 100, 3);
        entries
    };

    fn codeset(flags: CodesetFlags) -> Codeset<'static> {
        Codeset {
            description: "test",
            magnitudes: &MAGNITUDES,
            runs: &RUNS,
            run_values: &RUN_VALUES,
            tags: &TAGS,
            fsm: FsmArray {
                num_states: 1,
                entries: &FSM,
            },
            flags,
        }
    }

    fn small_settings() -> Settings {
        Settings {
            lookup_table_size: 6,
            value_table_size: 4,
            run_table_length: 16,
            ..Settings::default()
        }
    }

    #[test]
    fn builds_all_tables() {
        let tables =
            CodebookTables::build(&codeset(CodesetFlags::COMPANDING_NOT_NEEDED), &small_settings())
                .unwrap();

        assert_eq!(tables.companding(), Companding::NotNeeded);
        assert_eq!(tables.runs().len(), 16);
        assert_eq!(tables.runs().get(3), Some(&RlcEntry::new(0b011, 3, 3)));
        assert_eq!(tables.fast().entries().len(), 64);
        assert_eq!(
            tables.fast().lookup(0b10_10_00),
            FastEntry::Decoded {
                count: 0,
                value: 1,
                shift: 4
            }
        );
        assert_eq!(tables.values().get(-2), Codeword::new(0b001_11, 5));
    }

    #[test]
    fn init_is_idempotent() {
        let codebooks = Codebooks::new(codeset(CodesetFlags::COMPANDING_CUBIC));
        assert!(codebooks.get().is_none());

        let first = codebooks.init(&small_settings()).unwrap();
        let second = codebooks.init(&small_settings()).unwrap();

        assert!(std::ptr::eq(first, second));
        assert!(std::ptr::eq(
            first.runs().entries().as_ptr(),
            second.runs().entries().as_ptr()
        ));
        assert_eq!(codebooks.codeset().description, "test");
    }

    #[test]
    fn init_rejects_different_settings() {
        let codebooks = Codebooks::new(codeset(CodesetFlags::empty()));
        let tables = codebooks.init(&small_settings()).unwrap();
        assert_eq!(tables.settings(), &small_settings());

        let other = Settings {
            lookup_table_size: 7,
            ..small_settings()
        };
        assert_eq!(
            codebooks.init(&other).unwrap_err(),
            BuildError::Settings(SettingsError::Mismatch)
        );
        assert!(std::ptr::eq(codebooks.init(&small_settings()).unwrap(), tables));
    }

    #[test]
    fn failed_init_can_be_retried() {
        let codebooks = Codebooks::new(codeset(CodesetFlags::empty()));
        let bad = Settings {
            lookup_table_size: 0,
            ..small_settings()
        };

        assert!(codebooks.init(&bad).is_err());
        assert!(codebooks.get().is_none());
        assert!(codebooks.init(&small_settings()).is_ok());
    }

    #[test]
    fn decoder_tables() {
        let codesets = [
            codeset(CodesetFlags::empty()),
            codeset(CodesetFlags::COMPANDING_NOT_NEEDED),
        ];
        let decoder = DecoderTables::new(&codesets, &Settings::default()).unwrap();

        assert_eq!(decoder.len(), 2);
        assert_eq!(decoder.fsm(0).unwrap().entry(0, 1).unwrap().value0, 280);
        assert_eq!(decoder.fsm(1).unwrap().entry(0, 1).unwrap().value0, 100);
        assert_eq!(decoder.band_end_code(1), Some(Codeword::new(0b1_1100, 5)));
        assert_eq!(decoder.band_end_code(2), None);
        assert!(
            decoder
                .fsm(0)
                .unwrap()
                .flags()
                .contains(CodesetFlags::INITIALIZED | CodesetFlags::COMPANDING_DONE)
        );
    }

    #[test]
    fn decoder_tables_report_bad_codesets() {
        let mut missing_tags = codeset(CodesetFlags::empty());
        missing_tags.tags = &[];
        assert_eq!(
            DecoderTables::new(&[missing_tags], &Settings::default()).unwrap_err(),
            BuildError::Codebook(CodebookError::MissingBandEnd)
        );

        let mut short_fsm = codeset(CodesetFlags::empty());
        short_fsm.fsm.num_states = 2;
        assert_eq!(
            DecoderTables::new(&[short_fsm], &Settings::default()).unwrap_err(),
            BuildError::InitFsm(FsmError::SizeMismatch)
        );
    }
}

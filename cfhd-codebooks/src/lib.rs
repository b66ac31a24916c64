/*!
Entropy codebook tables for a wavelet video codec.

`cfhd-codebooks` turns the hand-authored codebooks of a codeset into the dense
tables that the band encoder and decoder work with:

- a run-length table giving the composite codeword for every zero run up to a
  fixed length,
- a fast lookup table decoding a whole bit window with a single access,
- a signed value table mapping coefficients to codewords after companding,
- the decoder FSM table, with its pre-decoded values expanded into the linear
  domain, and the codeword that terminates a band.

All tables are built once and are immutable afterwards, so they can be shared
freely between threads.

# Example
```rust,ignore
use cfhd_codebooks::{Codebooks, Settings};

let codebooks = Codebooks::new(codeset);
let tables = codebooks.init(&Settings::default())?;

let entry = tables.fast().lookup(window);
```

# Cargo features
- `logging`: Log table construction via the `log` crate.

# Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]

mod codebook;
mod codeset;
mod codeword;
mod companding;
mod encode;
mod error;
mod fsm;
mod log;
mod lookup;
mod settings;
mod util;
mod value_table;

pub use codebook::{
    RlcEntry, RlvEntry, RunLengthTable, compute_run_length_code_table, sort_decreasing_run_length,
};
pub use codeset::{CodebookTables, Codebooks, Codeset, CodesetFlags, DecoderTables};
pub use codeword::{
    BITSTREAM_LONG_SIZE, CODEWORD_BUDGET, Codeword, NEGATIVE_CODE, NEGATIVE_SIZE, POSITIVE_CODE,
    POSITIVE_SIZE, SIGN_SIZE, decode_sign,
};
pub use companding::{
    COMPANDED_CEILING, COMPANDING_THRESHOLD, CUBIC_TABLE_LENGTH, Companding, CubicTable,
    cubic_expand,
};
pub use encode::{put_band_end, put_value, put_zero_run};
pub use error::{BuildError, CodebookError, FsmError, Result, SettingsError, TableKind};
pub use fsm::{FSM_INDEX_ENTRIES, FSM_INDEX_SIZE, FsmArray, FsmEntry, FsmTable};
pub use lookup::{FastEntry, FastLookupTable, PatternMatch, RunValueBook, match_bit_pattern};
pub use settings::{
    COMPANDING_MORE, LOOKUP_TABLE_SIZE, NEW_CODEBOOK_LENGTH, Settings, VALUE_TABLE_SIZE,
};
pub use value_table::{ValueTable, fold, unfold};

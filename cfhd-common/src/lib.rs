//! An internal crate containing utility functions and structs reused across the
//! cfhd codec crates.
//!
//! This crate is not meant for external consumption.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bit;

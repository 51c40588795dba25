//! Field file format.
//!
//! A field file is opaque header text ending with an `internalField` line,
//! a point-count line, a parenthesized payload (text or binary) closed by
//! `);`, and opaque trailer text. Header and trailer are round-tripped
//! byte-for-byte; only the payload is decoded.

pub mod format;
pub mod codec;
mod reader;
mod writer;

pub use reader::*;
pub use writer::*;

use crate::field::{Encoding, Payload};

/// The three regions of a field file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRegions {
    /// Every line up to and including the `internalField` line.
    pub header: Vec<u8>,
    /// Encoding declared in the header.
    pub encoding: Encoding,
    /// Decoded payload.
    pub payload: Payload,
    /// Everything after the closing `);`.
    pub trailer: Vec<u8>,
}

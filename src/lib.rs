//! # foam-average
//!
//! Time-averages internal fields of a simulation case.
//!
//! Each time-step directory of a case holds one file per field. A field file
//! carries free-form header text, a point count, a parenthesized payload of
//! scalars or 3-vectors (text or binary), and free-form trailer text. This
//! crate sums the payloads of one field over many time steps and writes the
//! mean back out with the header and trailer of the first file untouched.
//!
//! ## Modules
//!
//! - [`util`] - Errors
//! - [`field`] - Field kinds, encodings, payloads and the field table
//! - [`foam`] - Field file codec, reader and writer
//! - [`core`] - Running-sum accumulator
//! - [`case`] - Case validation and time-step discovery
//! - [`average`] - Averaging runs
//! - [`config`] - Run configuration
//!
//! ## Example
//!
//! ```ignore
//! use foam_average::prelude::*;
//!
//! let case = Case::open(".")?;
//! let averager = FieldAverager::new(case, FieldTable::default());
//! let report = averager.average_range("U", Some(300.0), Some(350.0))?;
//! println!("{} samples -> {}", report.samples, report.output.display());
//! ```

pub mod util;
pub mod field;
pub mod foam;
pub mod core;
pub mod case;
pub mod average;
pub mod config;

// Re-export commonly used types
pub use util::{Error, Result};
pub use average::{AverageReport, FieldAverager};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::field::{Encoding, FieldKind, FieldTable, Payload};
    pub use crate::foam::{read_field_file, write_field_file, FileRegions};
    pub use crate::core::Accumulator;
    pub use crate::case::{filter_by_time_range, Case, TimeStep};
    pub use crate::average::{run, AverageReport, FieldAverager};
    pub use crate::config::RunConfig;
}

//! Core layer - accumulation of field payloads across time steps.
//!
//! This module provides:
//! - [`Accumulator`] - Per-field running sum and sample count
//! - [`Snapshot`] - Header/trailer retained from the first file of a field

mod accumulator;

pub use accumulator::{Accumulator, Snapshot};

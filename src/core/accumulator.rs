//! Running sums of field payloads.
//!
//! An [`Accumulator`] keeps, per field name, the element-wise sum of every
//! payload added so far, the number of payloads, and the header/trailer of
//! the first file seen. Only the sum is retained, never the individual
//! payloads, so memory stays at one payload per field regardless of how many
//! time steps are averaged.

use std::collections::HashMap;

use crate::field::{Encoding, Payload};
use crate::foam::FileRegions;
use crate::util::{Error, Result};

/// Header, trailer and encoding retained from the first file of a field.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub header: Vec<u8>,
    pub trailer: Vec<u8>,
    pub encoding: Encoding,
}

#[derive(Debug)]
struct FieldState {
    sum: Payload,
    count: usize,
    snapshot: Option<Snapshot>,
}

/// Per-field running sum and sample count.
#[derive(Debug, Default)]
pub struct Accumulator {
    fields: HashMap<String, FieldState>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a payload to the running sum of `name`.
    ///
    /// The first payload for a name is copied and fixes the shape; later ones
    /// must match it or `ShapeMismatch` is returned with the state untouched.
    pub fn add(&mut self, name: &str, payload: &Payload) -> Result<()> {
        match self.fields.get_mut(name) {
            Some(state) => {
                state.sum.add_assign(payload)?;
                state.count += 1;
            }
            None => {
                self.fields.insert(
                    name.to_string(),
                    FieldState { sum: payload.clone(), count: 1, snapshot: None },
                );
            }
        }
        Ok(())
    }

    /// Add a whole field file: its payload is summed and, if this is the
    /// first file for `name`, its header/trailer/encoding are retained.
    pub fn add_file(&mut self, name: &str, regions: FileRegions) -> Result<()> {
        self.add(name, &regions.payload)?;
        if let Some(state) = self.fields.get_mut(name) {
            if state.snapshot.is_none() {
                state.snapshot = Some(Snapshot {
                    header: regions.header,
                    trailer: regions.trailer,
                    encoding: regions.encoding,
                });
            }
        }
        Ok(())
    }

    /// Element-wise mean of everything added for `name`.
    pub fn mean(&self, name: &str) -> Result<Payload> {
        let state = self.state(name)?;
        Ok(state.sum.divided_by(state.count as f64))
    }

    /// Header/trailer retained from the first file added for `name`.
    pub fn snapshot(&self, name: &str) -> Result<&Snapshot> {
        self.state(name)?
            .snapshot
            .as_ref()
            .ok_or_else(|| Error::NoData(format!("{} (no file header retained)", name)))
    }

    /// Number of payloads added for `name` (0 if none).
    pub fn count(&self, name: &str) -> usize {
        self.fields.get(name).map_or(0, |s| s.count)
    }

    /// Discard all state for `name`.
    pub fn clear(&mut self, name: &str) -> Result<()> {
        self.fields
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::NoData(name.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn state(&self, name: &str) -> Result<&FieldState> {
        self.fields.get(name).ok_or_else(|| Error::NoData(name.to_string()))
    }
}

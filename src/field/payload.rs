//! Numeric payload of a field file.

use std::fmt;

use super::FieldKind;
use crate::util::{Error, Result};

/// Shape of a payload: entry kind and number of entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    pub kind: FieldKind,
    pub points: usize,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.points, self.kind)
    }
}

/// Ordered numeric entries, stored flat and component-major within an entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Payload {
    kind: FieldKind,
    values: Vec<f64>,
}

impl Payload {
    /// Build a payload from flat values. The length must be a multiple of the
    /// entry width.
    pub fn new(kind: FieldKind, values: Vec<f64>) -> Result<Self> {
        if values.len() % kind.components() != 0 {
            return Err(Error::payload(format!(
                "{} values do not form whole {} entries",
                values.len(),
                kind
            )));
        }
        Ok(Self { kind, values })
    }

    /// Scalar payload.
    pub fn from_scalars(values: Vec<f64>) -> Self {
        Self { kind: FieldKind::Scalar, values }
    }

    /// Vector payload.
    pub fn from_vectors(vectors: &[[f64; 3]]) -> Self {
        Self {
            kind: FieldKind::Vector3,
            values: vectors.iter().flatten().copied().collect(),
        }
    }

    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Number of entries (mesh points).
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len() / self.kind.components()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        Shape { kind: self.kind, points: self.len() }
    }

    /// Flat values in entry order.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate entries; each slice has `kind.components()` values.
    pub fn entries(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.kind.components())
    }

    /// Element-wise `self += other`. Leaves `self` untouched on shape mismatch.
    pub fn add_assign(&mut self, other: &Payload) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape().to_string(),
                actual: other.shape().to_string(),
            });
        }
        for (acc, v) in self.values.iter_mut().zip(&other.values) {
            *acc += v;
        }
        Ok(())
    }

    /// Element-wise division by `divisor`.
    pub fn divided_by(&self, divisor: f64) -> Payload {
        Self {
            kind: self.kind,
            values: self.values.iter().map(|v| v / divisor).collect(),
        }
    }
}

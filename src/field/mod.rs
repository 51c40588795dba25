//! Field data model.
//!
//! - [`FieldKind`] - Scalar or three-component vector entries
//! - [`Encoding`] - Text or binary payload representation
//! - [`Payload`] - Decoded numeric entries of one field file
//! - [`FieldTable`] - Field name to kind lookup

mod payload;
mod table;

pub use payload::*;
pub use table::*;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::foam::format::{ASCII_TOKEN, BINARY_TOKEN};

/// Kind of value stored per mesh point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FieldKind {
    /// One double per entry
    #[serde(rename = "scalar")]
    Scalar,
    /// Three doubles per entry (x, y, z)
    #[serde(rename = "vector")]
    Vector3,
}

impl FieldKind {
    /// Number of doubles making up one entry.
    #[inline]
    pub const fn components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector3 => 3,
        }
    }

    /// Parse a kind name as used in field table files. Case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "scalar" => Some(Self::Scalar),
            "vector" | "vector3" => Some(Self::Vector3),
            _ => None,
        }
    }
}

impl TryFrom<String> for FieldKind {
    type Error = String;

    fn try_from(name: String) -> std::result::Result<Self, Self::Error> {
        Self::from_name(&name)
            .ok_or_else(|| format!("unknown field kind `{}` (expected scalar or vector)", name))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Vector3 => write!(f, "vector"),
        }
    }
}

/// Payload representation declared by a file's `format` header line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    /// Whitespace-separated decimal literals
    #[serde(rename = "ascii")]
    Text,
    /// Fixed-width 8-byte doubles
    #[serde(rename = "binary")]
    Binary,
}

impl Encoding {
    /// Map a `format` token to an encoding. Anything but the binary marker is text.
    pub fn from_token(token: &str) -> Self {
        if token == BINARY_TOKEN {
            Self::Binary
        } else {
            Self::Text
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str(ASCII_TOKEN),
            Self::Binary => f.write_str(BINARY_TOKEN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components() {
        assert_eq!(FieldKind::Scalar.components(), 1);
        assert_eq!(FieldKind::Vector3.components(), 3);
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!(FieldKind::from_name("scalar"), Some(FieldKind::Scalar));
        assert_eq!(FieldKind::from_name(" Vector "), Some(FieldKind::Vector3));
        assert_eq!(FieldKind::from_name("tensor"), None);
    }

    #[test]
    fn test_encoding_from_token() {
        assert_eq!(Encoding::from_token("binary"), Encoding::Binary);
        assert_eq!(Encoding::from_token("ascii"), Encoding::Text);
        assert_eq!(Encoding::from_token("whatever"), Encoding::Text);
    }
}

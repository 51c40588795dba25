//! Field name to kind lookup.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use super::FieldKind;
use crate::util::{Error, Result};

/// Built-in field kinds.
const DEFAULT_FIELDS: &[(&str, FieldKind)] = &[
    ("U", FieldKind::Vector3),
    ("T", FieldKind::Vector3),
    ("phi", FieldKind::Scalar),
    ("p", FieldKind::Scalar),
    ("nut", FieldKind::Scalar),
    ("omega", FieldKind::Scalar),
];

/// On-disk form of a field table: `{"fields": {"k": "scalar"}}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FieldTableFile {
    fields: BTreeMap<String, FieldKind>,
}

/// Maps field names to the kind of entry their files hold.
#[derive(Debug, Clone)]
pub struct FieldTable {
    kinds: HashMap<String, FieldKind>,
}

impl Default for FieldTable {
    fn default() -> Self {
        Self {
            kinds: DEFAULT_FIELDS
                .iter()
                .map(|(name, kind)| (name.to_string(), *kind))
                .collect(),
        }
    }
}

impl FieldTable {
    /// Table with no entries.
    pub fn empty() -> Self {
        Self { kinds: HashMap::new() }
    }

    /// Kind of a field, or `UnknownField`.
    pub fn lookup(&self, name: &str) -> Result<FieldKind> {
        self.kinds
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, kind: FieldKind) {
        self.kinds.insert(name.into(), kind);
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Merge entries from a JSON document over this table.
    pub fn merge_json(&mut self, json: &str) -> Result<()> {
        let file: FieldTableFile = serde_json::from_str(json)?;
        for (name, kind) in file.fields {
            if name.trim().is_empty() {
                return Err(Error::InvalidConfig("empty field name in field table".into()));
            }
            self.kinds.insert(name, kind);
        }
        Ok(())
    }

    /// Default table with entries from a JSON file merged over it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        let mut table = Self::default();
        table.merge_json(&json)?;
        Ok(table)
    }
}

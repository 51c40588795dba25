//! Run configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::field::FieldTable;
use crate::util::{Error, Result};

/// Settings for one averaging invocation.
///
/// Can be loaded from a JSON file; command-line flags override loaded values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Case directory holding `system/`, `constant/` and the time directories.
    pub case_dir: PathBuf,
    /// Fields to average.
    pub fields: Vec<String>,
    /// Earliest time step to include (inclusive).
    pub t_start: Option<f64>,
    /// Latest time step to include (inclusive).
    pub t_end: Option<f64>,
    /// Memory-map input files (only with the `mmap` feature).
    pub use_mmap: bool,
    /// JSON file with extra field kinds, merged over the built-in table.
    pub field_table: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            case_dir: PathBuf::from("."),
            fields: Vec::new(),
            t_start: None,
            t_end: None,
            use_mmap: true,
            field_table: None,
        }
    }
}

impl RunConfig {
    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Check settings that do not need the filesystem.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::InvalidConfig("no fields to average".into()));
        }
        if let Some(name) = self.fields.iter().find(|f| f.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!("invalid field name `{}`", name)));
        }
        if let (Some(start), Some(end)) = (self.t_start, self.t_end) {
            if start > end {
                return Err(Error::InvalidConfig(format!(
                    "start time {} is after end time {}",
                    start, end
                )));
            }
        }
        Ok(())
    }

    /// Field table: built-in defaults, plus the configured file if any.
    pub fn field_table(&self) -> Result<FieldTable> {
        match &self.field_table {
            Some(path) => FieldTable::load(path),
            None => Ok(FieldTable::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.case_dir, PathBuf::from("."));
        assert!(config.use_mmap);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_time_range() {
        let config = RunConfig {
            fields: vec!["U".into()],
            t_start: Some(350.0),
            t_end: Some(300.0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = RunConfig { t_start: Some(300.0), t_end: Some(350.0), ..config };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_json() -> crate::util::Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, r#"{{"fields": ["U", "p"], "t_start": 300}}"#)?;

        let config = RunConfig::load(file.path())?;
        assert_eq!(config.fields, vec!["U", "p"]);
        assert_eq!(config.t_start, Some(300.0));
        assert_eq!(config.t_end, None);
        assert!(config.use_mmap);
        Ok(())
    }

    #[test]
    fn test_field_table_from_file() -> crate::util::Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, r#"{{"fields": {{"k": "scalar"}}}}"#)?;

        let config = RunConfig { field_table: Some(file.path().to_path_buf()), ..Default::default() };
        let table = config.field_table()?;
        assert!(table.lookup("k").is_ok());
        assert!(table.lookup("U").is_ok());
        Ok(())
    }
}

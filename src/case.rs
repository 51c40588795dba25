//! Simulation case layout.
//!
//! A case directory holds `system/` and `constant/` plus one directory per
//! written time step, named by its time value (`0`, `0.5`, `100`, ...).
//! Each time directory holds one file per field.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::foam::format::mean_file_name;
use crate::util::{Error, Result};

/// Subdirectories every case must have.
const REQUIRED_DIRS: &[&str] = &["system", "constant"];

/// One time-step directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStep {
    /// Directory name, kept verbatim (`0.50` stays `0.50`).
    pub name: String,
    /// Parsed time value.
    pub value: f64,
}

impl TimeStep {
    /// Parse a directory name as a time step. Names must start with a digit.
    pub fn parse(name: &str) -> Option<Self> {
        if !name.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        let value: f64 = name.parse().ok()?;
        value.is_finite().then(|| Self { name: name.to_string(), value })
    }
}

/// A validated case directory.
#[derive(Debug, Clone)]
pub struct Case {
    root: PathBuf,
}

impl Case {
    /// Open a case, failing with `NotACase` if `system/` or `constant/` is missing.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !REQUIRED_DIRS.iter().all(|d| root.join(d).is_dir()) {
            return Err(Error::NotACase(root.to_path_buf()));
        }
        Ok(Self { root: root.to_path_buf() })
    }

    /// All time-step directories, sorted numerically ascending.
    pub fn time_directories(&self) -> Result<Vec<TimeStep>> {
        let mut steps = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            match name.to_str().and_then(TimeStep::parse) {
                Some(step) => steps.push(step),
                None => debug!(name = ?name, "skipping non-time directory"),
            }
        }
        steps.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));
        Ok(steps)
    }

    /// Path of `field` under time step `time`.
    pub fn field_path(&self, time: &str, field: &str) -> PathBuf {
        self.root.join(time).join(field)
    }

    /// Path of the averaged output for `field`.
    pub fn mean_path(&self, field: &str) -> PathBuf {
        self.root.join(mean_file_name(field))
    }
}

/// Keep time steps within `[t_start, t_end]`. Either bound may be omitted.
pub fn filter_by_time_range(
    steps: Vec<TimeStep>,
    t_start: Option<f64>,
    t_end: Option<f64>,
) -> Vec<TimeStep> {
    steps
        .into_iter()
        .filter(|s| t_start.map_or(true, |t| s.value >= t))
        .filter(|s| t_end.map_or(true, |t| s.value <= t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_case(times: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("system")).unwrap();
        fs::create_dir(dir.path().join("constant")).unwrap();
        for t in times {
            fs::create_dir(dir.path().join(t)).unwrap();
        }
        dir
    }

    fn names(steps: &[TimeStep]) -> Vec<&str> {
        steps.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_parse_time_step() {
        assert_eq!(TimeStep::parse("0.5").map(|s| s.value), Some(0.5));
        assert_eq!(TimeStep::parse("100").map(|s| s.value), Some(100.0));
        assert!(TimeStep::parse("system").is_none());
        assert!(TimeStep::parse("0.orig").is_none());
        assert!(TimeStep::parse("-1").is_none());
    }

    #[test]
    fn test_not_a_case() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("system")).unwrap();
        let err = Case::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NotACase(_)));
    }

    #[test]
    fn test_time_directories_sorted_numerically() {
        let dir = make_case(&["10", "2", "0.5", "0", "100"]);
        fs::write(dir.path().join("5"), b"not a directory").unwrap();
        fs::create_dir(dir.path().join("0.orig")).unwrap();

        let case = Case::open(dir.path()).unwrap();
        let steps = case.time_directories().unwrap();
        assert_eq!(names(&steps), vec!["0", "0.5", "2", "10", "100"]);
    }

    #[test]
    fn test_filter_by_time_range_inclusive() {
        let steps: Vec<TimeStep> = ["0", "0.5", "1", "1.5", "2"]
            .iter()
            .filter_map(|n| TimeStep::parse(n))
            .collect();

        let all = filter_by_time_range(steps.clone(), None, None);
        assert_eq!(all.len(), 5);

        let mid = filter_by_time_range(steps.clone(), Some(0.5), Some(1.5));
        assert_eq!(names(&mid), vec!["0.5", "1", "1.5"]);

        let tail = filter_by_time_range(steps.clone(), Some(1.5), None);
        assert_eq!(names(&tail), vec!["1.5", "2"]);

        let head = filter_by_time_range(steps, None, Some(0.0));
        assert_eq!(names(&head), vec!["0"]);
    }

    #[test]
    fn test_paths() {
        let dir = make_case(&[]);
        let case = Case::open(dir.path()).unwrap();
        assert_eq!(case.field_path("0.5", "U"), dir.path().join("0.5").join("U"));
        assert_eq!(case.mean_path("U"), dir.path().join("UMean"));
    }
}

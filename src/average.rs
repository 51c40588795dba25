//! Time averaging of field files.
//!
//! [`FieldAverager`] reads one field across a list of time steps, sums the
//! payloads in an [`Accumulator`] owned by the run, and writes the mean to
//! `{field}Mean` in the case directory using the first file's header,
//! trailer and encoding. Any failure aborts the run before output is written.

use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::case::{filter_by_time_range, Case, TimeStep};
use crate::config::RunConfig;
use crate::core::Accumulator;
use crate::field::{Encoding, FieldKind, FieldTable};
use crate::foam::{read_field_file_opts, write_field_file};
use crate::util::Result;

/// Summary of one finished averaging run.
#[derive(Debug, Clone, Serialize)]
pub struct AverageReport {
    pub field: String,
    pub kind: FieldKind,
    pub encoding: Encoding,
    /// Number of time steps averaged.
    pub samples: usize,
    /// Entries per file.
    pub points: usize,
    pub output: PathBuf,
    /// Time steps averaged, in order.
    pub times: Vec<String>,
}

/// Averages fields of one case.
#[derive(Debug, Clone)]
pub struct FieldAverager {
    case: Case,
    table: FieldTable,
    use_mmap: bool,
}

impl FieldAverager {
    pub fn new(case: Case, table: FieldTable) -> Self {
        Self { case, table, use_mmap: true }
    }

    /// Enable or disable memory-mapped input.
    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    #[inline]
    pub fn case(&self) -> &Case {
        &self.case
    }

    /// Average `name` over `time_steps` (in the given order) and write `{name}Mean`.
    ///
    /// Fails with `UnknownField` before any file is opened, with the offending
    /// time step attached for read or shape errors, and with `NoData` when
    /// `time_steps` is empty. No output is written on failure.
    pub fn average_field(&self, name: &str, time_steps: &[TimeStep]) -> Result<AverageReport> {
        let kind = self.table.lookup(name)?;
        let mut acc = Accumulator::new();

        for step in time_steps {
            info!("Processing {} for {} ...", step.name, name);
            let path = self.case.field_path(&step.name, name);
            let regions = read_field_file_opts(&path, kind, self.use_mmap)
                .map_err(|e| e.at_time_step(name, &step.name))?;
            acc.add_file(name, regions)
                .map_err(|e| e.at_time_step(name, &step.name))?;
        }

        let mean = acc.mean(name)?;
        let snapshot = acc.snapshot(name)?;
        let output = self.case.mean_path(name);
        write_field_file(&output, &snapshot.header, &mean, &snapshot.trailer, snapshot.encoding)?;

        let report = AverageReport {
            field: name.to_string(),
            kind,
            encoding: snapshot.encoding,
            samples: acc.count(name),
            points: mean.len(),
            output,
            times: time_steps.iter().map(|s| s.name.clone()).collect(),
        };
        acc.clear(name)?;

        info!(
            field = name,
            samples = report.samples,
            points = report.points,
            "wrote {}",
            report.output.display()
        );
        Ok(report)
    }

    /// Average `name` over the case's time steps within `[t_start, t_end]`.
    pub fn average_range(
        &self,
        name: &str,
        t_start: Option<f64>,
        t_end: Option<f64>,
    ) -> Result<AverageReport> {
        let steps = self.select_time_steps(t_start, t_end)?;
        self.average_field(name, &steps)
    }

    /// Time steps of the case within `[t_start, t_end]`, ascending.
    pub fn select_time_steps(&self, t_start: Option<f64>, t_end: Option<f64>) -> Result<Vec<TimeStep>> {
        let all = self.case.time_directories()?;
        let steps = filter_by_time_range(all, t_start, t_end);
        debug!(count = steps.len(), ?t_start, ?t_end, "selected time steps");
        Ok(steps)
    }

    /// Average several fields in parallel, each with its own accumulator.
    ///
    /// Results come back in the order of `names`; one field failing does not
    /// affect the others.
    pub fn average_fields(
        &self,
        names: &[String],
        time_steps: &[TimeStep],
    ) -> Vec<(String, Result<AverageReport>)> {
        names
            .par_iter()
            .map(|name| (name.clone(), self.average_field(name, time_steps)))
            .collect()
    }
}

/// Validate `config`, open the case, check every field name, then average
/// all configured fields.
///
/// Configuration, case and field-name errors are returned before any field
/// file is read. Per-field failures are reported in the returned list.
pub fn run(config: &RunConfig) -> Result<Vec<(String, Result<AverageReport>)>> {
    config.validate()?;
    let case = Case::open(&config.case_dir)?;
    let table = config.field_table()?;
    for name in &config.fields {
        table.lookup(name)?;
    }

    let averager = FieldAverager::new(case, table).with_mmap(config.use_mmap);
    let steps = averager.select_time_steps(config.t_start, config.t_end)?;
    Ok(averager.average_fields(&config.fields, &steps))
}

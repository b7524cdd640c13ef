//! # Stage History
//!
//! Theoretical stress and strain at every gauge of every pier across a list
//! of construction stages. Rows are ordered stage-major, then by pier in
//! configuration order, then by gauge.
//!
//! A (stage, pier) pair with no load row, or one that cannot be evaluated,
//! contributes no rows and is listed in [`HistoryReport::skipped`] instead.
//! For every pair exactly one of those two things happens, so
//!
//! ```text
//! rows.len() == Σ over evaluated pairs of the pier's gauge count
//! evaluated pairs + skipped pairs == stages × piers
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::{theoretical_readings, PierModel};
use crate::errors::{MonitorError, MonitorResult};
use crate::loads::{LoadCase, LoadTable};
use crate::materials::StrainConverter;

/// One exported history row.
///
/// Field names follow the export's column headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    #[serde(rename = "Stage")]
    pub stage: String,
    #[serde(rename = "Pier")]
    pub pier: String,
    #[serde(rename = "SG")]
    pub sensor: String,
    #[serde(rename = "Stress (MPa)")]
    pub stress_mpa: f64,
    #[serde(rename = "Strain (με)")]
    pub strain_ue: f64,
}

/// Why a (stage, pier) pair produced no rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No load row for the pier's part at this stage
    MissingLoad,
    /// The load row or section could not be evaluated
    EvaluationFailed { error: MonitorError },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPair {
    pub stage: String,
    pub pier: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Aggregated history with its skip list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    pub rows: Vec<HistoryRow>,
    pub skipped: Vec<SkippedPair>,
}

impl HistoryReport {
    /// Rows of one gauge in stage order, for plotting a single series
    pub fn series<'a>(&'a self, pier: &'a str, sensor: &'a str) -> impl Iterator<Item = &'a HistoryRow> + 'a {
        self.rows
            .iter()
            .filter(move |r| r.pier == pier && r.sensor == sensor)
    }

    /// Distinct stages that produced at least one row, in row order
    pub fn stages(&self) -> Vec<&str> {
        let mut stages: Vec<&str> = Vec::new();
        for row in &self.rows {
            if stages.last() != Some(&row.stage.as_str()) {
                stages.push(&row.stage);
            }
        }
        stages
    }

    /// Write the rows as CSV with a header line.
    pub fn write_csv<W: Write>(&self, writer: W, destination: &str) -> MonitorResult<()> {
        let csv_err = |e: csv::Error| MonitorError::csv_error(destination, e.to_string());

        let mut wtr = csv::Writer::from_writer(writer);
        if self.rows.is_empty() {
            wtr.write_record(["Stage", "Pier", "SG", "Stress (MPa)", "Strain (με)"])
                .map_err(csv_err)?;
        }
        for row in &self.rows {
            wtr.serialize(row).map_err(csv_err)?;
        }
        wtr.flush()
            .map_err(|e| MonitorError::file_error("write", destination, e.to_string()))?;
        Ok(())
    }
}

/// Evaluate every (stage, pier) pair.
pub fn aggregate(
    stages: &[String],
    piers: &[PierModel],
    loads: &LoadTable,
    converter: &StrainConverter,
) -> HistoryReport {
    let mut report = HistoryReport::default();

    for stage in stages {
        for pier in piers {
            let Some(record) = loads.find(&pier.config.part_id, stage) else {
                report.skipped.push(SkippedPair {
                    stage: stage.clone(),
                    pier: pier.config.name.clone(),
                    reason: SkipReason::MissingLoad,
                });
                continue;
            };

            let readings = LoadCase::from_record(record)
                .and_then(|case| theoretical_readings(pier, &case, converter));

            match readings {
                Ok(readings) => {
                    report.rows.extend(readings.into_iter().map(|r| HistoryRow {
                        stage: stage.clone(),
                        pier: pier.config.name.clone(),
                        sensor: r.sensor,
                        stress_mpa: r.stress_mpa,
                        strain_ue: r.strain_ue,
                    }));
                }
                Err(error) => {
                    debug!(%stage, pier = %pier.config.name, %error, "history pair skipped");
                    report.skipped.push(SkippedPair {
                        stage: stage.clone(),
                        pier: pier.config.name.clone(),
                        reason: SkipReason::EvaluationFailed { error },
                    });
                }
            }
        }
    }

    info!(
        rows = report.rows.len(),
        skipped = report.skipped.len(),
        "stage history aggregated"
    );
    report
}

/// Identity of one aggregation run.
///
/// The load table and pier set are fixed for the lifetime of the owning
/// session, so the stage list and the numeric settings fully determine the
/// result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    stages: Vec<String>,
    modulus_bits: u64,
    coarseness_bits: u64,
}

impl HistoryKey {
    pub fn new(stages: &[String], modulus_mpa: f64, coarseness: f64) -> Self {
        HistoryKey {
            stages: stages.to_vec(),
            modulus_bits: modulus_mpa.to_bits(),
            coarseness_bits: coarseness.to_bits(),
        }
    }
}

/// Memoized history reports.
#[derive(Debug, Default)]
pub struct HistoryCache {
    reports: HashMap<HistoryKey, Rc<HistoryReport>>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert_with<F>(&mut self, key: HistoryKey, build: F) -> Rc<HistoryReport>
    where
        F: FnOnce() -> HistoryReport,
    {
        Rc::clone(self.reports.entry(key).or_insert_with(|| Rc::new(build())))
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

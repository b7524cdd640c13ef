//! # Actual Strain-Gauge Readings
//!
//! Raw logger output per pier and timestamp, mapped onto named gauges and
//! zeroed against each gauge's baseline.
//!
//! ## CSV Format
//!
//! ```csv
//! PIER,DATE,SGA,SGB,SGC,SGD
//! P3A,01/15/2025 08:00,1850.0,2010.5,1799.2,2201.0
//! ```
//!
//! Dates are read month-first. Rows with an unreadable date are dropped when
//! the table is loaded; unreadable channel cells become missing values.
//! Every column other than `PIER` and `DATE` is treated as a channel.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{validate_channel_map, MonitorConfig, PierConfig};
use crate::errors::{MonitorError, MonitorResult};
use crate::materials::StrainConverter;
use crate::units::Microstrain;

pub const COL_PIER: &str = "PIER";
pub const COL_DATE: &str = "DATE";

const DATETIME_FORMATS: [&str; 12] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a reading timestamp, month-first for slash-separated dates.
///
/// Date-only values are taken at midnight.
///
/// # Example
///
/// ```rust
/// use pier_core::actual::parse_timestamp;
///
/// let ts = parse_timestamp("01/02/2025 08:30").unwrap();
/// assert_eq!(ts.to_string(), "2025-01-02 08:30:00");
/// assert!(parse_timestamp("not a date").is_none());
/// ```
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// One logger row: a pier, a timestamp and raw channel values (με).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualRow {
    pub pier: String,
    pub timestamp: NaiveDateTime,
    pub channels: BTreeMap<String, Option<f64>>,
}

impl ActualRow {
    /// Raw value of a channel; `None` if the column is absent or the cell was unreadable
    pub fn channel(&self, column: &str) -> Option<f64> {
        self.channels.get(column).copied().flatten()
    }
}

/// Measured value of one gauge at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualSensorReading {
    pub sensor: String,
    pub timestamp: NaiveDateTime,
    /// Logger value (με)
    pub raw_ue: Option<f64>,
    /// Calibration offset (με)
    pub baseline_ue: Option<f64>,
    /// raw − baseline (με)
    pub strain_ue: Option<f64>,
    /// Adjusted strain expressed as stress at the session modulus (MPa)
    pub stress_mpa: Option<f64>,
}

/// All gauges of one pier at one timestamp, in channel order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualSnapshot {
    pub pier: String,
    pub timestamp: NaiveDateTime,
    pub readings: Vec<ActualSensorReading>,
}

impl ActualSnapshot {
    pub fn reading(&self, sensor: &str) -> Option<&ActualSensorReading> {
        self.readings.iter().find(|r| r.sensor == sensor)
    }
}

/// The actual-readings table.
#[derive(Debug, Clone, Default)]
pub struct ActualReadings {
    rows: Vec<ActualRow>,
    dropped_rows: usize,
}

impl ActualReadings {
    /// An empty table (no readings file available)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_path(path: &Path) -> MonitorResult<Self> {
        let file = File::open(path).map_err(|e| {
            MonitorError::file_error(
                "open actual readings",
                path.display().to_string(),
                e.to_string(),
            )
        })?;
        Self::from_reader(file, &path.display().to_string())
    }

    pub fn from_reader<R: Read>(reader: R, source: &str) -> MonitorResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| MonitorError::csv_error(source, e.to_string()))?
            .clone();
        let pier_idx = headers
            .iter()
            .position(|h| h == COL_PIER)
            .ok_or_else(|| MonitorError::missing_field(COL_PIER))?;
        let date_idx = headers
            .iter()
            .position(|h| h == COL_DATE)
            .ok_or_else(|| MonitorError::missing_field(COL_DATE))?;
        let channel_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != pier_idx && *i != date_idx)
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        let mut rows = Vec::new();
        let mut dropped_rows = 0usize;
        for result in rdr.records() {
            let record = result.map_err(|e| MonitorError::csv_error(source, e.to_string()))?;

            let timestamp = match record.get(date_idx).and_then(parse_timestamp) {
                Some(ts) => ts,
                None => {
                    dropped_rows += 1;
                    continue;
                }
            };

            let channels = channel_columns
                .iter()
                .map(|(i, name)| {
                    let value = record
                        .get(*i)
                        .and_then(|v| v.parse::<f64>().ok())
                        .filter(|v| v.is_finite());
                    (name.clone(), value)
                })
                .collect();

            rows.push(ActualRow {
                pier: record.get(pier_idx).unwrap_or_default().to_string(),
                timestamp,
                channels,
            });
        }

        if dropped_rows > 0 {
            warn!(dropped_rows, source, "dropped readings with an unreadable DATE");
        }
        debug!(rows = rows.len(), source, "loaded actual readings");

        Ok(ActualReadings { rows, dropped_rows })
    }

    pub fn rows(&self) -> &[ActualRow] {
        &self.rows
    }

    /// Rows discarded at load time because their timestamp did not parse
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct timestamps, newest first
    pub fn available_timestamps(&self) -> Vec<NaiveDateTime> {
        let mut stamps: Vec<NaiveDateTime> = self.rows.iter().map(|r| r.timestamp).collect();
        stamps.sort_unstable_by(|a, b| b.cmp(a));
        stamps.dedup();
        stamps
    }

    /// First row for a pier at a timestamp
    pub fn find_row(&self, short_name: &str, timestamp: NaiveDateTime) -> Option<&ActualRow> {
        let mut matches = self
            .rows
            .iter()
            .filter(|r| r.pier == short_name && r.timestamp == timestamp);
        let first = matches.next();
        if first.is_some() && matches.next().is_some() {
            warn!(pier = short_name, %timestamp, "several readings share this timestamp; using the first");
        }
        first
    }

    /// Baseline-adjusted readings for every gauge of `pier` at `timestamp`.
    ///
    /// Returns `Ok(None)` when there is no row for that pier and timestamp, or
    /// when the pier has no channel map: both mean "no data" rather than
    /// failure.
    ///
    /// # Errors
    /// `Configuration` if the pier's channel map does not match its gauges.
    pub fn snapshot(
        &self,
        config: &MonitorConfig,
        pier: &PierConfig,
        timestamp: NaiveDateTime,
        converter: &StrainConverter,
    ) -> MonitorResult<Option<ActualSnapshot>> {
        let Some(bindings) = config.channel_map(&pier.short_name) else {
            debug!(pier = %pier.short_name, "no channel map; actual readings unavailable");
            return Ok(None);
        };
        validate_channel_map(pier, bindings)?;

        let Some(row) = self.find_row(&pier.short_name, timestamp) else {
            return Ok(None);
        };

        let readings = bindings
            .iter()
            .map(|binding| {
                let raw_ue = row.channel(&binding.column);
                let baseline_ue = config.baseline(&pier.short_name, &binding.sensor);
                let strain_ue = match (raw_ue, baseline_ue) {
                    (Some(raw), Some(base)) => Some(raw - base),
                    _ => None,
                };
                ActualSensorReading {
                    sensor: binding.sensor.clone(),
                    timestamp,
                    raw_ue,
                    baseline_ue,
                    strain_ue,
                    stress_mpa: strain_ue.map(|e| converter.stress(Microstrain(e)).0),
                }
            })
            .collect();

        Ok(Some(ActualSnapshot {
            pier: pier.short_name.clone(),
            timestamp,
            readings,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::ConcreteMaterial;

    const SAMPLE: &str = "\
PIER,DATE,SGA,SGB,SGC,SGD
P3A,01/15/2025 08:00,1850.0,2010.5,1799.2,2201.0
P3B,01/15/2025 08:00,1500.0,n/a,1740.0,1850.0
P3A,not-a-date,1.0,2.0,3.0,4.0
P3A,2025-01-16 08:00:00,1860.0,2011.0,1800.0,2200.0
";

    fn table() -> ActualReadings {
        ActualReadings::from_reader(SAMPLE.as_bytes(), "sample").unwrap()
    }

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn test_bad_dates_dropped() {
        let t = table();
        assert_eq!(t.rows().len(), 3);
        assert_eq!(t.dropped_rows(), 1);
    }

    #[test]
    fn test_timestamps_newest_first() {
        let stamps = table().available_timestamps();
        assert_eq!(stamps, vec![ts("2025-01-16 08:00"), ts("2025-01-15 08:00")]);
    }

    #[test]
    fn test_month_first_parsing() {
        assert_eq!(ts("03/04/2025"), ts("2025-03-04 00:00"));
        assert_eq!(ts("12/31/2024 23:59:59"), ts("2024-12-31T23:59:59"));
        assert!(parse_timestamp("31/12/2024").is_none());

        assert_eq!(ts("1/15/2025 8:00 AM"), ts("2025-01-15 08:00"));
        assert_eq!(ts("1/15/2025 8:30 PM"), ts("2025-01-15 20:30"));
        assert_eq!(ts("2025-01-15T08:00"), ts("2025-01-15 08:00"));
        assert_eq!(ts("2025/01/15 08:00"), ts("2025-01-15 08:00"));
        assert_eq!(ts("2025/01/15 08:00:30"), ts("2025-01-15 08:00:30"));
        assert_eq!(ts("2025/01/15"), ts("2025-01-15 00:00"));
    }

    #[test]
    fn test_twelve_hour_rows_kept() {
        let csv = "PIER,DATE,SGA,SGB,SGC,SGD\nP3A,1/15/2025 8:00 AM,1850.0,2010.5,1799.2,2201.0\n";
        let t = ActualReadings::from_reader(csv.as_bytes(), "inline").unwrap();
        assert_eq!(t.rows().len(), 1);
        assert_eq!(t.dropped_rows(), 0);
        assert_eq!(t.available_timestamps(), vec![ts("2025-01-15 08:00")]);
    }

    #[test]
    fn test_adjusted_strain_is_raw_minus_baseline() {
        let config = MonitorConfig::default();
        let pier = config.find_pier("P3A").unwrap();
        let conv = ConcreteMaterial::default().strain_converter();

        let snap = table()
            .snapshot(&config, pier, ts("01/15/2025 08:00"), &conv)
            .unwrap()
            .unwrap();

        let sg1 = snap.reading("SG-1").unwrap();
        assert_eq!(sg1.raw_ue, Some(1850.0));
        assert_eq!(sg1.baseline_ue, Some(1826.46));
        assert_eq!(sg1.strain_ue, Some(1850.0 - 1826.46));
        assert!((sg1.strain_ue.unwrap() - 23.54).abs() < 1e-9);

        let stress = sg1.stress_mpa.unwrap();
        assert!((stress - 23.54e-6 * conv.modulus_mpa).abs() < 1e-9);

        let names: Vec<&str> = snap.readings.iter().map(|r| r.sensor.as_str()).collect();
        assert_eq!(names, ["SG-1", "SG-2", "SG-3", "SG-4"]);
    }

    #[test]
    fn test_unreadable_channel_is_missing() {
        let config = MonitorConfig::default();
        let pier = config.find_pier("P3B").unwrap();
        let conv = ConcreteMaterial::default().strain_converter();

        let snap = table()
            .snapshot(&config, pier, ts("01/15/2025 08:00"), &conv)
            .unwrap()
            .unwrap();
        let sg6 = snap.reading("SG-6").unwrap();
        assert_eq!(sg6.raw_ue, None);
        assert_eq!(sg6.strain_ue, None);
        assert_eq!(sg6.stress_mpa, None);
        assert!(snap.reading("SG-5").unwrap().strain_ue.is_some());
    }

    #[test]
    fn test_no_row_means_no_data() {
        let config = MonitorConfig::default();
        let pier = config.find_pier("P4A").unwrap();
        let conv = ConcreteMaterial::default().strain_converter();

        let snap = table()
            .snapshot(&config, pier, ts("01/15/2025 08:00"), &conv)
            .unwrap();
        assert!(snap.is_none());

        let empty = ActualReadings::empty()
            .snapshot(&config, pier, ts("01/15/2025 08:00"), &conv)
            .unwrap();
        assert!(empty.is_none());
    }

    #[test]
    fn test_missing_baseline_yields_no_value() {
        let mut config = MonitorConfig::default();
        config.baselines.get_mut("P3A").unwrap().remove("SG-2");
        let pier = config.find_pier("P3A").unwrap().clone();
        let conv = ConcreteMaterial::default().strain_converter();

        let snap = table()
            .snapshot(&config, &pier, ts("01/15/2025 08:00"), &conv)
            .unwrap()
            .unwrap();
        let sg2 = snap.reading("SG-2").unwrap();
        assert_eq!(sg2.raw_ue, Some(2010.5));
        assert_eq!(sg2.strain_ue, None);
    }

    #[test]
    fn test_bad_channel_map_is_configuration_error() {
        let mut config = MonitorConfig::default();
        config.channel_maps.get_mut("P3A").unwrap().truncate(3);
        let pier = config.find_pier("P3A").unwrap().clone();
        let conv = ConcreteMaterial::default().strain_converter();

        let err = table()
            .snapshot(&config, &pier, ts("01/15/2025 08:00"), &conv)
            .unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION");
    }

    #[test]
    fn test_missing_date_column() {
        let err = ActualReadings::from_reader("PIER,SGA\nP3A,1\n".as_bytes(), "inline").unwrap_err();
        assert_eq!(err, MonitorError::missing_field(COL_DATE));
    }
}

//! Load table: one row of internal forces per (part, stage).
//!
//! ## CSV Format
//!
//! ```csv
//! Part,Stage,Axial (kN),Moment-y (kN·m),Moment-z (kN·m)
//! I[3111],S01,-15234.5,120.4,-880.2
//! ```
//!
//! Numeric cells that do not parse are kept as missing values; the row still
//! exists, but a load case cannot be built from it. Short rows are read the
//! same way, with their absent trailing cells missing. A row that cannot be
//! read at all is dropped and counted.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{MonitorError, MonitorResult};

pub const COL_PART: &str = "Part";
pub const COL_STAGE: &str = "Stage";
pub const COL_AXIAL: &str = "Axial (kN)";
pub const COL_MOMENT_Y: &str = "Moment-y (kN·m)";
pub const COL_MOMENT_Z: &str = "Moment-z (kN·m)";

const REQUIRED_COLUMNS: [&str; 5] = [COL_PART, COL_STAGE, COL_AXIAL, COL_MOMENT_Y, COL_MOMENT_Z];

/// Forces for one part at one construction stage, in source units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRecord {
    #[serde(rename = "Part")]
    pub part: String,
    #[serde(rename = "Stage")]
    pub stage: String,
    /// Axial force (kN)
    #[serde(rename = "Axial (kN)", default, deserialize_with = "csv::invalid_option")]
    pub axial_kn: Option<f64>,
    /// Moment about y (kN·m)
    #[serde(rename = "Moment-y (kN·m)", default, deserialize_with = "csv::invalid_option")]
    pub moment_y_knm: Option<f64>,
    /// Moment about z (kN·m)
    #[serde(rename = "Moment-z (kN·m)", default, deserialize_with = "csv::invalid_option")]
    pub moment_z_knm: Option<f64>,
}

/// All load records plus a (part, stage) index.
#[derive(Debug, Clone, Default)]
pub struct LoadTable {
    records: Vec<LoadRecord>,
    index: HashMap<(String, String), usize>,
    stages: Vec<String>,
    dropped_rows: usize,
}

impl LoadTable {
    /// Build a table from records. The first record wins for duplicate (part, stage) pairs.
    pub fn from_records(records: Vec<LoadRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        let mut stages: Vec<String> = Vec::new();
        let mut duplicates = 0usize;

        for (i, record) in records.iter().enumerate() {
            if !stages.contains(&record.stage) {
                stages.push(record.stage.clone());
            }
            let key = (record.part.clone(), record.stage.clone());
            if index.contains_key(&key) {
                duplicates += 1;
                continue;
            }
            index.insert(key, i);
        }

        if duplicates > 0 {
            warn!(duplicates, "load table has repeated (part, stage) rows; using the first");
        }

        LoadTable {
            records,
            index,
            stages,
            dropped_rows: 0,
        }
    }

    /// Read a load table CSV from disk.
    ///
    /// A missing file is a `FileError`; the caller treats it as fatal.
    pub fn from_path(path: &Path) -> MonitorResult<Self> {
        let file = File::open(path).map_err(|e| {
            MonitorError::file_error("open load table", path.display().to_string(), e.to_string())
        })?;
        Self::from_reader(file, &path.display().to_string())
    }

    /// Read a load table from any CSV source. `source` names it in error messages.
    pub fn from_reader<R: Read>(reader: R, source: &str) -> MonitorResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| MonitorError::csv_error(source, e.to_string()))?
            .clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(MonitorError::missing_field(column));
            }
        }

        let mut records = Vec::new();
        let mut dropped_rows = 0usize;
        for (line, result) in rdr.deserialize::<LoadRecord>().enumerate() {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(row = line + 1, source, error = %e, "dropped unreadable load row");
                    dropped_rows += 1;
                }
            }
        }

        debug!(rows = records.len(), dropped_rows, source, "loaded load table");
        let mut table = Self::from_records(records);
        table.dropped_rows = dropped_rows;
        Ok(table)
    }

    /// Record for a part at a stage, if present
    pub fn find(&self, part: &str, stage: &str) -> Option<&LoadRecord> {
        self.index
            .get(&(part.to_string(), stage.to_string()))
            .map(|&i| &self.records[i])
    }

    /// Distinct stages in order of first appearance
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    /// Rows discarded at load time because they could not be read
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn records(&self) -> &[LoadRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Part,Stage,Axial (kN),Moment-y (kN·m),Moment-z (kN·m)
I[3111],S01,-100,10,50
I[3211],S01,-200,0,0
I[3111],S02,-150,abc,25
I[3111],S01,-999,0,0
";

    #[test]
    fn test_parse_sample() {
        let table = LoadTable::from_reader(SAMPLE.as_bytes(), "sample").unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.stages(), &["S01".to_string(), "S02".to_string()]);

        let rec = table.find("I[3111]", "S01").unwrap();
        assert_eq!(rec.axial_kn, Some(-100.0));
        assert_eq!(rec.moment_y_knm, Some(10.0));
        assert_eq!(rec.moment_z_knm, Some(50.0));
    }

    #[test]
    fn test_malformed_cell_is_missing() {
        let table = LoadTable::from_reader(SAMPLE.as_bytes(), "sample").unwrap();
        let rec = table.find("I[3111]", "S02").unwrap();
        assert_eq!(rec.moment_y_knm, None);
        assert_eq!(rec.moment_z_knm, Some(25.0));
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let table = LoadTable::from_reader(SAMPLE.as_bytes(), "sample").unwrap();
        assert_eq!(table.find("I[3111]", "S01").unwrap().axial_kn, Some(-100.0));
    }

    #[test]
    fn test_absent_pair() {
        let table = LoadTable::from_reader(SAMPLE.as_bytes(), "sample").unwrap();
        assert!(table.find("I[3211]", "S02").is_none());
        assert!(table.find("I[9999]", "S01").is_none());
    }

    #[test]
    fn test_numeric_stage_kept_as_text() {
        let csv = "Part,Stage,Axial (kN),Moment-y (kN·m),Moment-z (kN·m)\nI[4110],59,-1,0,0\n";
        let table = LoadTable::from_reader(csv.as_bytes(), "inline").unwrap();
        assert!(table.find("I[4110]", "59").is_some());
    }

    #[test]
    fn test_short_row_keeps_table() {
        let csv = "\
Part,Stage,Axial (kN),Moment-y (kN·m),Moment-z (kN·m)
I[3111],S1,-100,0,0
I[3211],S1,-100,0
I[4110],S1
I[4210]
I[4210],S1,-100,5,5
";
        let table = LoadTable::from_reader(csv.as_bytes(), "inline").unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.dropped_rows(), 1);

        let short = table.find("I[3211]", "S1").unwrap();
        assert_eq!(short.axial_kn, Some(-100.0));
        assert_eq!(short.moment_y_knm, Some(0.0));
        assert_eq!(short.moment_z_knm, None);
        assert_eq!(table.find("I[4110]", "S1").unwrap().axial_kn, None);
        assert_eq!(table.find("I[4210]", "S1").unwrap().moment_z_knm, Some(5.0));
    }

    #[test]
    fn test_missing_column() {
        let csv = "Part,Stage,Axial (kN),Moment-y (kN·m)\nI[3111],S01,1,2\n";
        let err = LoadTable::from_reader(csv.as_bytes(), "inline").unwrap_err();
        assert_eq!(err, MonitorError::missing_field(COL_MOMENT_Z));
    }

    #[test]
    fn test_missing_file_is_file_error() {
        let err = LoadTable::from_path(Path::new("/nonexistent/data_gaya.csv")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
        assert!(!err.is_recoverable());
    }
}

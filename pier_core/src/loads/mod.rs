//! Internal forces per construction stage.
//!
//! # Overview
//!
//! - [`LoadTable`] - The source table of forces per (part, stage)
//! - [`LoadRecord`] - One row of that table, in kN and kN·m
//! - [`LoadCase`] - A record converted to N and N·mm, ready for stress evaluation
//! - [`StageSelection`] - Policy for the default construction stage
//!
//! # Example
//!
//! ```
//! use pier_core::loads::{LoadCase, LoadRecord};
//!
//! let record = LoadRecord {
//!     part: "I[3111]".to_string(),
//!     stage: "S59".to_string(),
//!     axial_kn: Some(100.0),
//!     moment_y_knm: Some(0.0),
//!     moment_z_knm: Some(50.0),
//! };
//!
//! let case = LoadCase::from_record(&record).unwrap();
//! assert_eq!(case.n.0, 100_000.0);
//! assert_eq!(case.mxx.0, 50_000_000.0);
//! ```

pub mod stage;
pub mod table;

pub use stage::{StageSelection, DEFAULT_STAGE_INDEX};
pub use table::{LoadRecord, LoadTable};

use serde::{Deserialize, Serialize};

use crate::errors::{MonitorError, MonitorResult};
use crate::units::{KiloNewtonMeters, KiloNewtons, NewtonMillimeters, Newtons};

/// Axial force and bi-axial bending in section units (N, N·mm).
///
/// Moment naming follows the section's local axes: `mxx` bends about x
/// (taken from the table's Moment-z) and `myy` bends about y (the table's
/// Moment-y).
///
/// # JSON Format
/// ```json
/// { "n": 100000.0, "mxx": 50000000.0, "myy": 0.0 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadCase {
    /// Axial force (N), tension positive
    pub n: Newtons,
    /// Bending moment about the section x axis (N·mm)
    pub mxx: NewtonMillimeters,
    /// Bending moment about the section y axis (N·mm)
    pub myy: NewtonMillimeters,
}

impl LoadCase {
    /// Pure axial load case
    pub fn axial(n: Newtons) -> Self {
        LoadCase {
            n,
            ..Default::default()
        }
    }

    /// Convert a table record into section units.
    ///
    /// # Errors
    /// `MissingLoadValue` if any force or moment cell is empty, malformed or not finite.
    pub fn from_record(record: &LoadRecord) -> MonitorResult<Self> {
        let require = |value: Option<f64>, column: &str| -> MonitorResult<f64> {
            value.filter(|v| v.is_finite()).ok_or_else(|| {
                MonitorError::missing_load_value(&record.part, &record.stage, column)
            })
        };

        let axial = require(record.axial_kn, table::COL_AXIAL)?;
        let moment_y = require(record.moment_y_knm, table::COL_MOMENT_Y)?;
        let moment_z = require(record.moment_z_knm, table::COL_MOMENT_Z)?;

        Ok(LoadCase {
            n: KiloNewtons(axial).into(),
            mxx: KiloNewtonMeters(moment_z).into(),
            myy: KiloNewtonMeters(moment_y).into(),
        })
    }
}

//! # Monitoring Configuration
//!
//! Static description of the monitored piers: section geometry, the load-table
//! part each pier maps to, strain-gauge positions, per-gauge baselines and the
//! mapping from raw logger channels to named gauges.
//!
//! ## Structure
//!
//! ```text
//! MonitorConfig
//! ├── piers: [PierConfig]            (geometry, part id, ordered gauges)
//! ├── baselines: short → gauge → με  (calibration offsets)
//! ├── channel_maps: short → [channel → gauge]
//! └── settings: Settings             (f'c, mesh coarseness, stage policy)
//! ```
//!
//! The built-in default describes piers P3A, P3B, P4A and P4B. A JSON file
//! with the same shape replaces it entirely.
//!
//! ## Example
//!
//! ```rust
//! use pier_core::config::MonitorConfig;
//!
//! let config = MonitorConfig::default();
//! config.validate().unwrap();
//! assert_eq!(config.piers.len(), 4);
//! assert_eq!(config.baseline("P3A", "SG-1"), Some(1826.46));
//! ```

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{MonitorError, MonitorResult};
use crate::loads::StageSelection;
use crate::materials::DEFAULT_COMPRESSIVE_STRENGTH_MPA;
use crate::section::{Vertex, DEFAULT_MESH_COARSENESS};

/// Current schema version for configuration files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Raw channel columns of the actual-readings table, in logger order
pub const DEFAULT_CHANNEL_COLUMNS: [&str; 4] = ["SGA", "SGB", "SGC", "SGD"];

/// A strain gauge at a fixed local coordinate of its pier's section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Gauge name (e.g., "SG-1")
    pub name: String,
    /// Local x (mm), across the width
    pub x: f64,
    /// Local y (mm), along the length
    pub y: f64,
}

impl SensorConfig {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        SensorConfig {
            name: name.into(),
            x,
            y,
        }
    }

    pub fn position(&self) -> Vertex {
        Vertex::new(self.x, self.y)
    }
}

/// One monitored pier.
///
/// ## JSON Example
///
/// ```json
/// {
///   "name": "Pier 3A",
///   "short_name": "P3A",
///   "length_mm": 5000.0,
///   "width_mm": 2000.0,
///   "part_id": "I[3111]",
///   "sensors": [{ "name": "SG-1", "x": 0.0, "y": 2500.0 }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PierConfig {
    /// Display name (e.g., "Pier 3A")
    pub name: String,
    /// Code used by the actual-readings table and baselines (e.g., "P3A")
    pub short_name: String,
    /// Section dimension along y (mm)
    pub length_mm: f64,
    /// Section dimension along x (mm)
    pub width_mm: f64,
    /// Part identifier in the load table
    pub part_id: String,
    /// Gauges in display order
    pub sensors: Vec<SensorConfig>,
}

impl PierConfig {
    pub fn sensor(&self, name: &str) -> Option<&SensorConfig> {
        self.sensors.iter().find(|s| s.name == name)
    }

    pub fn sensor_positions(&self) -> Vec<Vertex> {
        self.sensors.iter().map(SensorConfig::position).collect()
    }

    fn validate(&self) -> MonitorResult<()> {
        for (field, value) in [("length_mm", self.length_mm), ("width_mm", self.width_mm)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(MonitorError::invalid_input(
                    format!("{}.{}", self.name, field),
                    value.to_string(),
                    "Section dimensions must be positive",
                ));
            }
        }

        let mut seen = HashSet::new();
        for sensor in &self.sensors {
            if !seen.insert(sensor.name.as_str()) {
                return Err(MonitorError::configuration(format!(
                    "{}: gauge {} listed twice",
                    self.name, sensor.name
                )));
            }
            let inside = (0.0..=self.width_mm).contains(&sensor.x)
                && (0.0..=self.length_mm).contains(&sensor.y);
            if !inside {
                return Err(MonitorError::configuration(format!(
                    "{}: gauge {} at ({}, {}) is outside [0, {}] x [0, {}]",
                    self.name, sensor.name, sensor.x, sensor.y, self.width_mm, self.length_mm
                )));
            }
        }
        Ok(())
    }
}

/// A raw logger channel bound to a named gauge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBinding {
    /// Column in the actual-readings table (e.g., "SGA")
    pub column: String,
    /// Gauge name (e.g., "SG-1")
    pub sensor: String,
}

impl ChannelBinding {
    pub fn new(column: impl Into<String>, sensor: impl Into<String>) -> Self {
        ChannelBinding {
            column: column.into(),
            sensor: sensor.into(),
        }
    }
}

/// User-adjustable analysis inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Concrete compressive strength f'c (MPa)
    pub compressive_strength_mpa: f64,
    /// Mesh coarseness (max element area = length × coarseness)
    pub mesh_coarseness: f64,
    /// Default stage when none is requested
    pub stage_selection: StageSelection,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            compressive_strength_mpa: DEFAULT_COMPRESSIVE_STRENGTH_MPA,
            mesh_coarseness: DEFAULT_MESH_COARSENESS,
            stage_selection: StageSelection::default(),
        }
    }
}

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Schema version
    pub version: String,
    pub piers: Vec<PierConfig>,
    /// Baselines (με) keyed by pier short name, then gauge name
    #[serde(default)]
    pub baselines: BTreeMap<String, BTreeMap<String, f64>>,
    /// Channel → gauge bindings keyed by pier short name
    #[serde(default)]
    pub channel_maps: BTreeMap<String, Vec<ChannelBinding>>,
    #[serde(default)]
    pub settings: Settings,
}

static DEFAULT_CONFIG: Lazy<MonitorConfig> = Lazy::new(|| {
    // (name, short, part, gauge names, baselines)
    let piers: [(&str, &str, &str, [&str; 4], [f64; 4]); 4] = [
        (
            "Pier 3A",
            "P3A",
            "I[3111]",
            ["SG-1", "SG-2", "SG-3", "SG-4"],
            [1826.46, 2007.78, 1814.90, 2196.52],
        ),
        (
            "Pier 3B",
            "P3B",
            "I[3211]",
            ["SG-5", "SG-6", "SG-7", "SG-8"],
            [1505.90, 1709.25, 1735.80, 1852.26],
        ),
        (
            "Pier 4A",
            "P4A",
            "I[4110]",
            ["SG-25", "SG-26", "SG-27", "SG-28"],
            [3005.54, 2546.30, 2785.18, 2580.93],
        ),
        (
            "Pier 4B",
            "P4B",
            "I[4210]",
            ["SG-29", "SG-30", "SG-31", "SG-32"],
            [2861.34, 2740.62, 3150.29, 2920.12],
        ),
    ];

    // Gauges sit mid-face: left, top, right, bottom of a 2000 x 5000 section
    let positions = [(0.0, 2500.0), (1000.0, 5000.0), (2000.0, 2500.0), (1000.0, 0.0)];

    let mut config = MonitorConfig {
        version: SCHEMA_VERSION.to_string(),
        piers: Vec::new(),
        baselines: BTreeMap::new(),
        channel_maps: BTreeMap::new(),
        settings: Settings::default(),
    };

    for (name, short, part, gauges, baselines) in piers {
        config.piers.push(PierConfig {
            name: name.to_string(),
            short_name: short.to_string(),
            length_mm: 5000.0,
            width_mm: 2000.0,
            part_id: part.to_string(),
            sensors: gauges
                .iter()
                .zip(positions)
                .map(|(g, (x, y))| SensorConfig::new(*g, x, y))
                .collect(),
        });
        config.baselines.insert(
            short.to_string(),
            gauges
                .iter()
                .zip(baselines)
                .map(|(g, b)| (g.to_string(), b))
                .collect(),
        );
        config.channel_maps.insert(
            short.to_string(),
            DEFAULT_CHANNEL_COLUMNS
                .iter()
                .zip(gauges)
                .map(|(c, g)| ChannelBinding::new(*c, g))
                .collect(),
        );
    }

    config
});

impl Default for MonitorConfig {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}

impl MonitorConfig {
    /// Look up a pier by display name or short name
    pub fn find_pier(&self, name_or_short: &str) -> Option<&PierConfig> {
        self.piers
            .iter()
            .find(|p| p.name == name_or_short || p.short_name == name_or_short)
    }

    /// Baseline (με) for a gauge, if configured
    pub fn baseline(&self, short_name: &str, sensor: &str) -> Option<f64> {
        self.baselines.get(short_name)?.get(sensor).copied()
    }

    /// Channel bindings for a pier, if configured
    pub fn channel_map(&self, short_name: &str) -> Option<&[ChannelBinding]> {
        self.channel_maps.get(short_name).map(Vec::as_slice)
    }

    /// Gauges that have no baseline, as (short name, gauge) pairs
    pub fn missing_baselines(&self) -> Vec<(String, String)> {
        self.piers
            .iter()
            .flat_map(|p| {
                p.sensors
                    .iter()
                    .filter(|s| self.baseline(&p.short_name, &s.name).is_none())
                    .map(|s| (p.short_name.clone(), s.name.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Check geometry, gauge placement, channel maps and settings.
    ///
    /// Missing baselines are not an error: those gauges simply report no
    /// actual value. They are logged as warnings.
    pub fn validate(&self) -> MonitorResult<()> {
        if self.piers.is_empty() {
            return Err(MonitorError::configuration("no piers configured"));
        }

        let mut names = HashSet::new();
        let mut shorts = HashSet::new();
        for pier in &self.piers {
            if !names.insert(pier.name.as_str()) || !shorts.insert(pier.short_name.as_str()) {
                return Err(MonitorError::configuration(format!(
                    "pier {} ({}) is configured twice",
                    pier.name, pier.short_name
                )));
            }
            pier.validate()?;
        }

        for (short, bindings) in &self.channel_maps {
            let pier = self
                .piers
                .iter()
                .find(|p| &p.short_name == short)
                .ok_or_else(|| {
                    MonitorError::configuration(format!("channel map for unknown pier {}", short))
                })?;
            validate_channel_map(pier, bindings)?;
        }

        for (short, sensor) in self.missing_baselines() {
            warn!(pier = %short, sensor = %sensor, "no baseline configured; actual value unavailable");
        }

        if !self.settings.compressive_strength_mpa.is_finite()
            || self.settings.compressive_strength_mpa <= 0.0
        {
            return Err(MonitorError::invalid_input(
                "settings.compressive_strength_mpa",
                self.settings.compressive_strength_mpa.to_string(),
                "Compressive strength must be positive",
            ));
        }
        if !self.settings.mesh_coarseness.is_finite() || self.settings.mesh_coarseness <= 0.0 {
            return Err(MonitorError::invalid_input(
                "settings.mesh_coarseness",
                self.settings.mesh_coarseness.to_string(),
                "Mesh coarseness must be positive",
            ));
        }

        Ok(())
    }
}

/// One binding per gauge, every gauge belongs to the pier, no column or gauge reused.
pub fn validate_channel_map(pier: &PierConfig, bindings: &[ChannelBinding]) -> MonitorResult<()> {
    if bindings.len() != pier.sensors.len() {
        return Err(MonitorError::configuration(format!(
            "{}: {} channels mapped but {} gauges configured",
            pier.short_name,
            bindings.len(),
            pier.sensors.len()
        )));
    }

    let mut columns = HashSet::new();
    let mut sensors = HashSet::new();
    for binding in bindings {
        if pier.sensor(&binding.sensor).is_none() {
            return Err(MonitorError::configuration(format!(
                "{}: channel {} mapped to unknown gauge {}",
                pier.short_name, binding.column, binding.sensor
            )));
        }
        if !columns.insert(binding.column.as_str()) || !sensors.insert(binding.sensor.as_str()) {
            return Err(MonitorError::configuration(format!(
                "{}: channel {} / gauge {} mapped twice",
                pier.short_name, binding.column, binding.sensor
            )));
        }
    }
    Ok(())
}

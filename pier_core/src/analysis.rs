//! # Per-Pier Analysis
//!
//! Everything known about one pier at one construction stage: the load that
//! acts on it, the theoretical stress/strain field over its section, the
//! theoretical values at each gauge and, when a reading timestamp is chosen,
//! the measured values and their deviation from theory.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use pier_core::analysis::{theoretical_readings, PierModel};
//! use pier_core::config::MonitorConfig;
//! use pier_core::loads::LoadCase;
//! use pier_core::materials::ConcreteMaterial;
//! use pier_core::section::SectionModel;
//! use pier_core::units::Newtons;
//!
//! let config = MonitorConfig::default();
//! let pier = config.piers[0].clone();
//! let section = Rc::new(SectionModel::rectangular(pier.length_mm, pier.width_mm, 50.0).unwrap());
//! let model = PierModel::new(pier, Ok(section));
//!
//! let conv = ConcreteMaterial::default().strain_converter();
//! let readings = theoretical_readings(&model, &LoadCase::axial(Newtons(-1.0e7)), &conv).unwrap();
//! assert_eq!(readings.len(), 4);
//! ```

use std::rc::Rc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::actual::{ActualReadings, ActualSnapshot};
use crate::config::{MonitorConfig, PierConfig};
use crate::errors::{MonitorError, MonitorResult};
use crate::loads::{LoadCase, LoadRecord, LoadTable};
use crate::materials::StrainConverter;
use crate::section::{SectionModel, Triangle, Vertex};
use crate::stress::{FieldStats, StressEvaluator};
use crate::units::{KiloNewtonMeters, KiloNewtons, MegaPascals};

/// A configured pier paired with its meshed section.
///
/// The section is a `Result` because meshing can fail for one pier without
/// affecting the others.
#[derive(Debug, Clone)]
pub struct PierModel {
    pub config: PierConfig,
    pub section: MonitorResult<Rc<SectionModel>>,
}

impl PierModel {
    pub fn new(config: PierConfig, section: MonitorResult<Rc<SectionModel>>) -> Self {
        PierModel { config, section }
    }

    pub fn section(&self) -> MonitorResult<&SectionModel> {
        self.section.as_deref().map_err(Clone::clone)
    }
}

/// Theoretical value at one gauge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor: String,
    pub x: f64,
    pub y: f64,
    pub stress_mpa: f64,
    pub strain_ue: f64,
}

/// σ_zz and ε at each of the pier's gauges, in configuration order.
///
/// # Errors
/// The pier's section error, or `EvaluationFailed` if a gauge lies outside the section.
pub fn theoretical_readings(
    pier: &PierModel,
    load: &LoadCase,
    converter: &StrainConverter,
) -> MonitorResult<Vec<SensorReading>> {
    let section = pier.section()?;
    let stresses = StressEvaluator::new(section, load).at_points(&pier.config.sensor_positions())?;

    Ok(pier
        .config
        .sensors
        .iter()
        .zip(stresses)
        .map(|(sensor, stress)| SensorReading {
            sensor: sensor.name.clone(),
            x: sensor.x,
            y: sensor.y,
            stress_mpa: stress,
            strain_ue: converter.strain(MegaPascals(stress)).0,
        })
        .collect())
}

/// Load-table values for the analyzed stage, in source units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub stage: String,
    pub part: String,
    pub axial_kn: f64,
    pub moment_y_knm: f64,
    pub moment_z_knm: f64,
}

impl LoadSummary {
    fn from_record(record: &LoadRecord, case: &LoadCase) -> Self {
        // The case was built from this record, so every value is present
        LoadSummary {
            stage: record.stage.clone(),
            part: record.part.clone(),
            axial_kn: KiloNewtons::from(case.n).0,
            moment_y_knm: KiloNewtonMeters::from(case.myy).0,
            moment_z_knm: KiloNewtonMeters::from(case.mxx).0,
        }
    }
}

/// Measured data for the analyzed pier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActualStatus {
    /// No timestamp was selected
    NotRequested,
    /// No reading exists for this pier at the selected timestamp
    NoData { timestamp: NaiveDateTime },
    Available { snapshot: ActualSnapshot },
}

/// Theoretical vs. measured strain at one gauge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorComparison {
    pub sensor: String,
    pub theoretical_strain_ue: f64,
    pub actual_strain_ue: Option<f64>,
    /// actual − theoretical (με)
    pub deviation_ue: Option<f64>,
}

/// Full result for one pier at one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PierAnalysis {
    pub pier: String,
    pub short_name: String,
    pub load: LoadSummary,
    pub stress_stats: FieldStats,
    pub strain_stats: FieldStats,
    pub node_count: usize,
    pub theoretical: Vec<SensorReading>,
    pub actual: ActualStatus,
    pub comparison: Vec<SensorComparison>,
}

/// What happened when analyzing one pier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PierOutcome {
    Analyzed(Box<PierAnalysis>),
    /// The load table has no row for this pier's part at the stage
    MissingLoad { pier: String, stage: String },
    /// The row exists but could not be evaluated
    Failed { pier: String, error: MonitorError },
}

impl PierOutcome {
    pub fn analysis(&self) -> Option<&PierAnalysis> {
        match self {
            PierOutcome::Analyzed(a) => Some(a),
            _ => None,
        }
    }
}

/// Inputs shared by every pier analyzed in one pass
pub struct AnalysisContext<'a> {
    pub config: &'a MonitorConfig,
    pub loads: &'a LoadTable,
    pub actual: &'a ActualReadings,
    pub converter: StrainConverter,
    pub timestamp: Option<NaiveDateTime>,
}

/// Analyze one pier at `stage`. Problems specific to this pier are reported
/// in the outcome; only a broken channel map is returned as an error.
pub fn analyze_pier(
    ctx: &AnalysisContext<'_>,
    pier: &PierModel,
    stage: &str,
) -> MonitorResult<PierOutcome> {
    let Some(record) = ctx.loads.find(&pier.config.part_id, stage) else {
        return Ok(PierOutcome::MissingLoad {
            pier: pier.config.name.clone(),
            stage: stage.to_string(),
        });
    };

    let evaluated = LoadCase::from_record(record).and_then(|case| {
        let section = pier.section()?;
        let field = StressEvaluator::new(section, &case).mesh_field();
        let theoretical = theoretical_readings(pier, &case, &ctx.converter)?;
        Ok((case, field, section.mesh.node_count(), theoretical))
    });
    let (case, field, node_count, theoretical) = match evaluated {
        Ok(v) => v,
        Err(error) => {
            return Ok(PierOutcome::Failed {
                pier: pier.config.name.clone(),
                error,
            })
        }
    };

    let empty_field = || {
        MonitorError::calculation_failed("stress field", format!("{} has an empty mesh", pier.config.name))
    };
    let stress_stats = match field.stats() {
        Some(s) => s,
        None => {
            return Ok(PierOutcome::Failed {
                pier: pier.config.name.clone(),
                error: empty_field(),
            })
        }
    };
    let strain_stats = match FieldStats::from_values(&field.strains(ctx.converter.modulus_mpa)) {
        Some(s) => s,
        None => {
            return Ok(PierOutcome::Failed {
                pier: pier.config.name.clone(),
                error: empty_field(),
            })
        }
    };

    let actual = match ctx.timestamp {
        None => ActualStatus::NotRequested,
        Some(ts) => match ctx.actual.snapshot(ctx.config, &pier.config, ts, &ctx.converter)? {
            Some(snapshot) => ActualStatus::Available { snapshot },
            None => ActualStatus::NoData { timestamp: ts },
        },
    };

    let comparison = compare(&theoretical, &actual);

    Ok(PierOutcome::Analyzed(Box::new(PierAnalysis {
        pier: pier.config.name.clone(),
        short_name: pier.config.short_name.clone(),
        load: LoadSummary::from_record(record, &case),
        stress_stats,
        strain_stats,
        node_count,
        theoretical,
        actual,
        comparison,
    })))
}

fn compare(theoretical: &[SensorReading], actual: &ActualStatus) -> Vec<SensorComparison> {
    theoretical
        .iter()
        .map(|t| {
            let actual_strain_ue = match actual {
                ActualStatus::Available { snapshot } => {
                    snapshot.reading(&t.sensor).and_then(|r| r.strain_ue)
                }
                _ => None,
            };
            SensorComparison {
                sensor: t.sensor.clone(),
                theoretical_strain_ue: t.strain_ue,
                actual_strain_ue,
                deviation_ue: actual_strain_ue.map(|a| a - t.strain_ue),
            }
        })
        .collect()
}

/// Node-level field for heat-map rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshResult {
    pub pier: String,
    pub stage: String,
    pub nodes: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub stress_mpa: Vec<f64>,
    pub strain_ue: Vec<f64>,
}

/// Evaluate the full node field of one pier for a load record.
pub fn mesh_result(
    pier: &PierModel,
    record: &LoadRecord,
    converter: &StrainConverter,
) -> MonitorResult<MeshResult> {
    let case = LoadCase::from_record(record)?;
    let section = pier.section()?;
    let field = StressEvaluator::new(section, &case).mesh_field();

    Ok(MeshResult {
        pier: pier.config.name.clone(),
        stage: record.stage.clone(),
        nodes: section.mesh.nodes.clone(),
        triangles: section.mesh.triangles.clone(),
        strain_ue: field.strains(converter.modulus_mpa),
        stress_mpa: field.values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actual::parse_timestamp;
    use crate::materials::ConcreteMaterial;

    const LOADS: &str = "\
Part,Stage,Axial (kN),Moment-y (kN·m),Moment-z (kN·m)
I[3111],S1,-20000,0,0
I[3211],S1,-18000,500,-1200
I[4110],S1,,0,0
";

    const ACTUAL: &str = "\
PIER,DATE,SGA,SGB,SGC,SGD
P3A,2025-02-01 09:00,1800.0,1990.0,1790.0,2170.0
";

    fn models(config: &MonitorConfig) -> Vec<PierModel> {
        config
            .piers
            .iter()
            .map(|p| {
                let s = SectionModel::rectangular(p.length_mm, p.width_mm, 50.0).map(Rc::new);
                PierModel::new(p.clone(), s)
            })
            .collect()
    }

    fn run(timestamp: Option<&str>) -> Vec<PierOutcome> {
        let config = MonitorConfig::default();
        let loads = LoadTable::from_reader(LOADS.as_bytes(), "loads").unwrap();
        let actual = ActualReadings::from_reader(ACTUAL.as_bytes(), "actual").unwrap();
        let ctx = AnalysisContext {
            config: &config,
            loads: &loads,
            actual: &actual,
            converter: ConcreteMaterial::default().strain_converter(),
            timestamp: timestamp.map(|t| parse_timestamp(t).unwrap()),
        };
        models(&config)
            .iter()
            .map(|m| analyze_pier(&ctx, m, "S1").unwrap())
            .collect()
    }

    #[test]
    fn test_outcomes_per_pier() {
        let outcomes = run(None);
        assert!(matches!(outcomes[0], PierOutcome::Analyzed(_)));
        assert!(matches!(outcomes[1], PierOutcome::Analyzed(_)));
        assert!(matches!(outcomes[2], PierOutcome::Failed { .. }));
        assert!(matches!(&outcomes[3], PierOutcome::MissingLoad { pier, .. } if pier == "Pier 4B"));
    }

    #[test]
    fn test_axial_stage_statistics() {
        let outcomes = run(None);
        let a = outcomes[0].analysis().unwrap();
        // -20 000 kN over 1e7 mm² = -2 MPa everywhere
        assert!((a.stress_stats.min + 2.0).abs() < 1e-9);
        assert!((a.stress_stats.max + 2.0).abs() < 1e-9);
        assert!((a.stress_stats.mean + 2.0).abs() < 1e-9);
        let e = ConcreteMaterial::default().elastic_modulus_mpa();
        assert!((a.strain_stats.mean + 2.0 / e * 1e6).abs() < 1e-6);
        assert_eq!(a.actual, ActualStatus::NotRequested);
        assert!(a.comparison.iter().all(|c| c.deviation_ue.is_none()));
        assert_eq!(a.load.axial_kn, -20000.0);
    }

    #[test]
    fn test_gauges_within_field_range() {
        let outcomes = run(None);
        let a = outcomes[1].analysis().unwrap();
        for r in &a.theoretical {
            assert!(r.stress_mpa >= a.stress_stats.min - 1e-9);
            assert!(r.stress_mpa <= a.stress_stats.max + 1e-9);
        }
    }

    #[test]
    fn test_actual_comparison() {
        let outcomes = run(Some("2025-02-01 09:00"));
        let a = outcomes[0].analysis().unwrap();
        assert!(matches!(a.actual, ActualStatus::Available { .. }));

        let sg1 = a.comparison.iter().find(|c| c.sensor == "SG-1").unwrap();
        let actual = 1800.0 - 1826.46;
        assert_eq!(sg1.actual_strain_ue, Some(actual));
        assert!((sg1.deviation_ue.unwrap() - (actual - sg1.theoretical_strain_ue)).abs() < 1e-12);

        // Pier 3B has loads but no reading at this timestamp
        let b = outcomes[1].analysis().unwrap();
        assert!(matches!(b.actual, ActualStatus::NoData { .. }));
    }

    #[test]
    fn test_mesh_result_lengths() {
        let config = MonitorConfig::default();
        let loads = LoadTable::from_reader(LOADS.as_bytes(), "loads").unwrap();
        let model = &models(&config)[1];
        let record = loads.find("I[3211]", "S1").unwrap();
        let conv = ConcreteMaterial::default().strain_converter();

        let mesh = mesh_result(model, record, &conv).unwrap();
        assert_eq!(mesh.nodes.len(), mesh.stress_mpa.len());
        assert_eq!(mesh.nodes.len(), mesh.strain_ue.len());
        assert!(!mesh.triangles.is_empty());
    }

    #[test]
    fn test_section_failure_reported_per_pier() {
        let config = MonitorConfig::default();
        let pier = config.piers[0].clone();
        let model = PierModel::new(
            pier,
            Err(MonitorError::calculation_failed("mesh", "degenerate")),
        );
        let conv = ConcreteMaterial::default().strain_converter();
        let err = theoretical_readings(&model, &LoadCase::default(), &conv).unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }
}

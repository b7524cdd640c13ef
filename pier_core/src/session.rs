//! # Monitoring Session
//!
//! Owns everything one run of the monitor works from: the configuration, the
//! load and actual-reading tables, the current settings and the section and
//! history caches. Settings changes go through setters that validate the new
//! value before it is stored.
//!
//! ## Example
//!
//! ```rust
//! use pier_core::config::MonitorConfig;
//! use pier_core::loads::LoadTable;
//! use pier_core::actual::ActualReadings;
//! use pier_core::session::Session;
//!
//! let csv = "Part,Stage,Axial (kN),Moment-y (kN·m),Moment-z (kN·m)\nI[3111],S1,-20000,0,0\n";
//! let loads = LoadTable::from_reader(csv.as_bytes(), "inline").unwrap();
//!
//! let mut session = Session::new(MonitorConfig::default(), loads, ActualReadings::empty()).unwrap();
//! assert_eq!(session.default_stage(), Some("S1"));
//!
//! let outcomes = session.analyze("S1", None).unwrap();
//! assert_eq!(outcomes.len(), 4);
//! ```

use std::path::Path;
use std::rc::Rc;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::actual::ActualReadings;
use crate::analysis::{analyze_pier, mesh_result, AnalysisContext, MeshResult, PierModel, PierOutcome};
use crate::config::{MonitorConfig, PierConfig, Settings};
use crate::errors::{MonitorError, MonitorResult};
use crate::history::{aggregate, HistoryCache, HistoryKey, HistoryReport};
use crate::loads::{LoadTable, StageSelection};
use crate::materials::{ConcreteMaterial, StrainConverter};
use crate::section::SectionCache;

pub struct Session {
    config: MonitorConfig,
    loads: LoadTable,
    actual: ActualReadings,
    settings: Settings,
    sections: SectionCache,
    histories: HistoryCache,
}

impl Session {
    /// Start a session from already-loaded tables. Settings come from the configuration.
    ///
    /// # Errors
    /// `Configuration` or `InvalidInput` if the configuration or its settings are invalid.
    pub fn new(config: MonitorConfig, loads: LoadTable, actual: ActualReadings) -> MonitorResult<Self> {
        config.validate()?;

        Ok(Session {
            settings: config.settings.clone(),
            config,
            loads,
            actual,
            sections: SectionCache::new(),
            histories: HistoryCache::new(),
        })
    }

    /// Load both tables from disk.
    ///
    /// The load table is required. A missing or unreadable actual-readings
    /// file is logged and replaced by an empty table.
    pub fn open(config: MonitorConfig, loads_path: &Path, actual_path: Option<&Path>) -> MonitorResult<Self> {
        let loads = LoadTable::from_path(loads_path)?;
        info!(
            path = %loads_path.display(),
            records = loads.len(),
            stages = loads.stages().len(),
            "load table read"
        );

        let actual = match actual_path {
            None => ActualReadings::empty(),
            Some(path) => match ActualReadings::from_path(path) {
                Ok(actual) => {
                    info!(
                        path = %path.display(),
                        rows = actual.rows().len(),
                        dropped = actual.dropped_rows(),
                        "actual readings read"
                    );
                    actual
                }
                Err(e) => {
                    warn!(error = %e, "actual readings unavailable; continuing with theoretical values only");
                    ActualReadings::empty()
                }
            },
        };

        Session::new(config, loads, actual)
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn loads(&self) -> &LoadTable {
        &self.loads
    }

    pub fn actual(&self) -> &ActualReadings {
        &self.actual
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// # Errors
    /// `InvalidInput` for a non-positive or non-finite strength; the old value is kept.
    pub fn set_compressive_strength(&mut self, fc_mpa: f64) -> MonitorResult<()> {
        ConcreteMaterial::new(fc_mpa)?;
        self.settings.compressive_strength_mpa = fc_mpa;
        Ok(())
    }

    /// # Errors
    /// `InvalidInput` for a non-positive or non-finite coarseness; the old value is kept.
    pub fn set_mesh_coarseness(&mut self, coarseness: f64) -> MonitorResult<()> {
        check_coarseness(coarseness)?;
        self.settings.mesh_coarseness = coarseness;
        Ok(())
    }

    pub fn set_stage_selection(&mut self, selection: StageSelection) {
        self.settings.stage_selection = selection;
    }

    /// Converter at the current concrete strength
    pub fn converter(&self) -> MonitorResult<StrainConverter> {
        Ok(ConcreteMaterial::new(self.settings.compressive_strength_mpa)?.strain_converter())
    }

    /// Stages in load-table order
    pub fn stages(&self) -> &[String] {
        self.loads.stages()
    }

    /// The stage picked by the current selection policy, if the table has any stages
    pub fn default_stage(&self) -> Option<&str> {
        self.settings.stage_selection.resolve(self.loads.stages())
    }

    /// Reading timestamps, newest first
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.actual.available_timestamps()
    }

    /// Each configured pier with its (cached) section at the current coarseness.
    pub fn pier_models(&mut self) -> Vec<PierModel> {
        let coarseness = self.settings.mesh_coarseness;
        let sections = &mut self.sections;
        self.config
            .piers
            .iter()
            .map(|pier| {
                let section = sections.get_or_build(pier.length_mm, pier.width_mm, coarseness);
                if let Err(e) = &section {
                    warn!(pier = %pier.name, error = %e, "section could not be built");
                }
                PierModel::new(pier.clone(), section)
            })
            .collect()
    }

    /// Analyze every pier at `stage`, optionally comparing with readings at `timestamp`.
    ///
    /// # Errors
    /// `InvalidInput` if the stage is not in the load table.
    pub fn analyze(&mut self, stage: &str, timestamp: Option<NaiveDateTime>) -> MonitorResult<Vec<PierOutcome>> {
        self.require_stage(stage)?;
        let models = self.pier_models();
        let ctx = AnalysisContext {
            config: &self.config,
            loads: &self.loads,
            actual: &self.actual,
            converter: self.converter()?,
            timestamp,
        };

        let outcomes = models
            .iter()
            .map(|m| analyze_pier(&ctx, m, stage))
            .collect::<MonitorResult<Vec<_>>>()?;

        for outcome in &outcomes {
            match outcome {
                PierOutcome::Analyzed(_) => {}
                PierOutcome::MissingLoad { pier, stage } => {
                    warn!(%pier, %stage, "no load data for this pier at the stage")
                }
                PierOutcome::Failed { pier, error } => {
                    warn!(%pier, %error, "pier could not be analyzed")
                }
            }
        }
        Ok(outcomes)
    }

    /// Stage history over every stage in the load table
    pub fn history(&mut self) -> MonitorResult<Rc<HistoryReport>> {
        let stages = self.loads.stages().to_vec();
        self.history_for(&stages)
    }

    /// Stage history over `stages`, reusing an earlier result for identical inputs.
    pub fn history_for(&mut self, stages: &[String]) -> MonitorResult<Rc<HistoryReport>> {
        let converter = self.converter()?;
        let key = HistoryKey::new(stages, converter.modulus_mpa, self.settings.mesh_coarseness);
        let models = self.pier_models();
        let loads = &self.loads;
        Ok(self
            .histories
            .get_or_insert_with(key, || aggregate(stages, &models, loads, &converter)))
    }

    /// Node-level field of one pier at `stage`, for rendering.
    ///
    /// # Errors
    /// * `InvalidInput` - unknown pier or stage, or no load row for the pier at the stage
    /// * `MissingLoadValue` - the load row has an empty or malformed cell
    pub fn mesh(&mut self, pier: &str, stage: &str) -> MonitorResult<MeshResult> {
        self.require_stage(stage)?;
        let pier = self.require_pier(pier)?.clone();
        let record = self
            .loads
            .find(&pier.part_id, stage)
            .ok_or_else(|| {
                MonitorError::invalid_input(
                    "stage",
                    stage,
                    format!("no load row for part {} ({})", pier.part_id, pier.name),
                )
            })?;
        let section = self
            .sections
            .get_or_build(pier.length_mm, pier.width_mm, self.settings.mesh_coarseness);
        let model = PierModel::new(pier, section);
        mesh_result(&model, record, &self.converter()?)
    }

    fn require_pier(&self, name: &str) -> MonitorResult<&PierConfig> {
        self.config
            .find_pier(name)
            .ok_or_else(|| MonitorError::invalid_input("pier", name, "not in the configuration"))
    }

    fn require_stage(&self, stage: &str) -> MonitorResult<()> {
        if self.loads.stages().iter().any(|s| s == stage) {
            Ok(())
        } else {
            Err(MonitorError::invalid_input("stage", stage, "not in the load table"))
        }
    }
}

fn check_coarseness(coarseness: f64) -> MonitorResult<()> {
    if !coarseness.is_finite() || coarseness <= 0.0 {
        return Err(MonitorError::invalid_input(
            "mesh_coarseness",
            coarseness.to_string(),
            "must be a positive number",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::SkipReason;

    const LOADS: &str = "\
Part,Stage,Axial (kN),Moment-y (kN·m),Moment-z (kN·m)
I[3111],S1,-20000,0,0
I[3211],S1,-20000,0,0
I[3111],S2,-20000,300,-900
";

    fn session() -> Session {
        let loads = LoadTable::from_reader(LOADS.as_bytes(), "loads").unwrap();
        Session::new(MonitorConfig::default(), loads, ActualReadings::empty()).unwrap()
    }

    #[test]
    fn test_default_stage_falls_back_to_first() {
        let s = session();
        assert_eq!(s.stages(), ["S1", "S2"]);
        assert_eq!(s.default_stage(), Some("S1"));
    }

    #[test]
    fn test_stage_policy_change() {
        let mut s = session();
        s.set_stage_selection(StageSelection::Last);
        assert_eq!(s.default_stage(), Some("S2"));
        s.set_stage_selection(StageSelection::Named {
            stage: "S9".to_string(),
        });
        assert_eq!(s.default_stage(), None);
    }

    #[test]
    fn test_sections_shared_across_piers() {
        let mut s = session();
        let models = s.pier_models();
        let a = models[0].section.as_ref().unwrap();
        let b = models[3].section.as_ref().unwrap();
        assert!(Rc::ptr_eq(a, b));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut s = session();
        assert!(s.set_compressive_strength(-5.0).is_err());
        assert!(s.set_mesh_coarseness(0.0).is_err());
        assert_eq!(s.settings(), &Settings::default());

        s.set_compressive_strength(35.0).unwrap();
        assert_eq!(s.settings().compressive_strength_mpa, 35.0);
    }

    #[test]
    fn test_unknown_stage() {
        let mut s = session();
        let err = s.analyze("S99", None).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_history_is_memoized() {
        let mut s = session();
        let a = s.history().unwrap();
        let b = s.history().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.rows.len(), 3 * 4);

        s.set_compressive_strength(30.0).unwrap();
        let c = s.history().unwrap();
        assert!(!Rc::ptr_eq(&a, &c));
        assert!(c.rows[0].strain_ue < a.rows[0].strain_ue);
    }

    #[test]
    fn test_mesh_requires_load_row() {
        let mut s = session();
        assert!(s.mesh("P3A", "S2").is_ok());

        let err = s.mesh("Pier 3B", "S2").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.to_string().contains("I[3211]"));
        assert!(s.mesh("P9", "S1").is_err());
    }

    #[test]
    fn test_mesh_empty_cell_is_missing_load_value() {
        let csv = "Part,Stage,Axial (kN),Moment-y (kN·m),Moment-z (kN·m)\nI[3111],S1,-100,0\n";
        let loads = LoadTable::from_reader(csv.as_bytes(), "loads").unwrap();
        let mut s = Session::new(MonitorConfig::default(), loads, ActualReadings::empty()).unwrap();

        let err = s.mesh("P3A", "S1").unwrap_err();
        assert_eq!(
            err,
            MonitorError::missing_load_value("I[3111]", "S1", crate::loads::table::COL_MOMENT_Z)
        );
    }

    #[test]
    fn test_short_load_row_becomes_history_skip() {
        let csv = "\
Part,Stage,Axial (kN),Moment-y (kN·m),Moment-z (kN·m)
I[3111],S1,-100,0,0
I[3211],S1,-100,0
I[4110],S1,-100,0,0
I[4210],S1,-100,0,0
";
        let loads = LoadTable::from_reader(csv.as_bytes(), "loads").unwrap();
        assert_eq!(loads.len(), 4);
        let mut s = Session::new(MonitorConfig::default(), loads, ActualReadings::empty()).unwrap();

        let report = s.history().unwrap();
        assert_eq!(report.rows.len(), 3 * 4);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].pier, "Pier 3B");
        match &report.skipped[0].reason {
            SkipReason::EvaluationFailed { error } => {
                assert_eq!(error.error_code(), "MISSING_LOAD_VALUE")
            }
            other => panic!("unexpected skip reason {other:?}"),
        }
    }

    #[test]
    fn test_open_without_actual_file() {
        let dir = tempfile::tempdir().unwrap();
        let loads = dir.path().join("loads.csv");
        std::fs::write(&loads, LOADS).unwrap();

        let s = Session::open(
            MonitorConfig::default(),
            &loads,
            Some(&dir.path().join("missing.csv")),
        )
        .unwrap();
        assert!(s.actual().is_empty());

        let err = Session::open(MonitorConfig::default(), &dir.path().join("none.csv"), None);
        assert!(err.is_err());
    }
}

//! End-to-end checks: files on disk through a session to exported results.

use std::fs;
use std::path::Path;

use pier_core::actual::parse_timestamp;
use pier_core::analysis::{ActualStatus, PierOutcome};
use pier_core::file_io::{export_history_csv, export_mesh_csv, save_report_json};
use pier_core::history::SkipReason;
use pier_core::{MonitorConfig, Session};

const LOADS: &str = "\
Part,Stage,Axial (kN),Moment-y (kN·m),Moment-z (kN·m)
I[3111],S1,-12000,0,0
I[3211],S1,-12000,0,0
I[4110],S1,-12000,0,0
I[4210],S1,-12000,0,0
I[3111],S2,-15000,0,2000
I[3211],S2,-15000,0,2000
I[4110],S2,-15000,0,2000
I[4210],S2,,0,2000
";

const ACTUAL: &str = "\
PIER,DATE,SGA,SGB,SGC,SGD
P3A,02/01/2025 09:00,1780.0,1960.0,1770.0,2140.0
P3B,02/01/2025 09:00,1460.0,n/a,1690.0,1800.0
P3A,not a date,1.0,2.0,3.0,4.0
P3A,02/08/2025 09:00,1770.0,1950.0,1760.0,2130.0
";

fn write_inputs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let loads = dir.join("data_gaya.csv");
    let actual = dir.join("data_gaya_aktual.csv");
    fs::write(&loads, LOADS).unwrap();
    fs::write(&actual, ACTUAL).unwrap();
    (loads, actual)
}

#[test]
fn analyze_stage_with_readings() {
    let dir = tempfile::tempdir().unwrap();
    let (loads, actual) = write_inputs(dir.path());
    let mut session = Session::open(MonitorConfig::default(), &loads, Some(actual.as_path())).unwrap();

    assert_eq!(session.actual().dropped_rows(), 1);
    let timestamps = session.timestamps();
    assert_eq!(timestamps.len(), 2);
    assert!(timestamps[0] > timestamps[1]);

    let ts = parse_timestamp("2025-02-01 09:00").unwrap();
    let outcomes = session.analyze("S2", Some(ts)).unwrap();
    assert_eq!(outcomes.len(), 4);
    assert!(matches!(outcomes[3], PierOutcome::Failed { .. }));

    let p3a = outcomes[0].analysis().unwrap();
    // -15 000 kN / 1e7 mm² plus Mz = 2e9 N·mm over Ixx = 2000·5000³/12 at ±2500 mm
    let ixx = 2000.0 * 5000f64.powi(3) / 12.0;
    let bending = 2.0e9 * 2500.0 / ixx;
    let stress: Vec<f64> = p3a.theoretical.iter().map(|r| r.stress_mpa).collect();
    assert!((stress[0] + 1.5).abs() < 1e-6);
    assert!((stress[1] - (-1.5 + bending)).abs() < 1e-6);
    assert!((stress[2] + 1.5).abs() < 1e-6);
    assert!((stress[3] - (-1.5 - bending)).abs() < 1e-6);
    assert!((p3a.stress_stats.max - (-1.5 + bending)).abs() < 1e-6);
    assert!((p3a.stress_stats.min - (-1.5 - bending)).abs() < 1e-6);

    let ActualStatus::Available { snapshot } = &p3a.actual else {
        panic!("expected readings for P3A");
    };
    assert_eq!(snapshot.readings.len(), 4);
    let sg1 = &p3a.comparison[0];
    assert_eq!(sg1.actual_strain_ue, Some(1780.0 - 1826.46));
    assert!(sg1.deviation_ue.is_some());

    // Unreadable cell: that gauge has no actual value, the others do
    let p3b = outcomes[1].analysis().unwrap();
    assert!(p3b.comparison[1].actual_strain_ue.is_none());
    assert!(p3b.comparison[0].actual_strain_ue.is_some());

    let report = dir.path().join("analysis.json");
    save_report_json(&outcomes, &report).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json[0]["outcome"], "analyzed");
    assert_eq!(json[3]["outcome"], "failed");
}

#[test]
fn history_export() {
    let dir = tempfile::tempdir().unwrap();
    let (loads, actual) = write_inputs(dir.path());
    let mut session = Session::open(MonitorConfig::default(), &loads, Some(actual.as_path())).unwrap();

    let report = session.history().unwrap();
    assert_eq!(report.rows.len(), 7 * 4);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].pier, "Pier 4B");
    assert!(matches!(report.skipped[0].reason, SkipReason::EvaluationFailed { .. }));

    let out = dir.path().join("history.csv");
    export_history_csv(&report, &out).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 1 + 28);
    assert!(text.starts_with("Stage,Pier,SG,Stress (MPa),Strain (με)\n"));
    assert!(text.lines().nth(1).unwrap().starts_with("S1,Pier 3A,SG-1,"));
}

#[test]
fn mesh_export_and_coarseness() {
    let dir = tempfile::tempdir().unwrap();
    let (loads, _) = write_inputs(dir.path());
    let mut session = Session::open(MonitorConfig::default(), &loads, None).unwrap();
    assert!(session.actual().is_empty());

    let coarse = session.mesh("P4A", "S2").unwrap();
    session.set_mesh_coarseness(10.0).unwrap();
    let fine = session.mesh("P4A", "S2").unwrap();
    assert!(fine.nodes.len() > coarse.nodes.len());

    let nodes = dir.path().join("nodes.csv");
    let triangles = dir.path().join("triangles.csv");
    export_mesh_csv(&fine, &nodes, &triangles).unwrap();
    assert_eq!(fs::read_to_string(&nodes).unwrap().lines().count(), fine.nodes.len() + 1);
    assert_eq!(
        fs::read_to_string(&triangles).unwrap().lines().count(),
        fine.triangles.len() + 1
    );
}

#[test]
fn missing_load_table_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = Session::open(MonitorConfig::default(), &dir.path().join("absent.csv"), None)
        .err()
        .unwrap();
    assert_eq!(err.error_code(), "FILE_ERROR");
}

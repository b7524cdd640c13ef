//! # File I/O Module
//!
//! Configuration files and result exports, with two safety features:
//! - **Atomic writes**: write to `.tmp`, fsync, rename over the target
//! - **Export locking**: an OS-level exclusive lock on a `.lock` sidecar so
//!   two processes never write the same export at once
//!
//! ## Example
//!
//! ```rust,no_run
//! use pier_core::config::MonitorConfig;
//! use pier_core::file_io::{load_config, save_config};
//! use std::path::Path;
//!
//! let path = Path::new("monitor.json");
//! save_config(&MonitorConfig::default(), path)?;
//! let config = load_config(path)?;
//! assert_eq!(config.piers.len(), 4);
//! # Ok::<(), pier_core::errors::MonitorError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::MeshResult;
use crate::config::{MonitorConfig, SCHEMA_VERSION};
use crate::errors::{MonitorError, MonitorResult};
use crate::history::HistoryReport;

/// Contents of a `.lock` sidecar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

/// Exclusive lock on an output path, released when dropped.
pub struct ExportLock {
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl ExportLock {
    /// Take the lock without blocking.
    ///
    /// # Errors
    /// `FileError` if the sidecar cannot be created or another process holds it.
    pub fn acquire(path: &Path) -> MonitorResult<Self> {
        let lock_path = sidecar(path, "lock");
        let info = LockInfo {
            pid: std::process::id(),
            locked_at: Utc::now(),
        };

        let mut lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| MonitorError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            MonitorError::file_error("lock", path.display().to_string(), "in use by another process")
        })?;

        let json = serde_json::to_string(&info)?;
        lock_file
            .set_len(0)
            .and_then(|_| lock_file.write_all(json.as_bytes()))
            .map_err(|e| MonitorError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;

        Ok(ExportLock {
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }
}

impl Drop for ExportLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `path` with `suffix` appended to its extension (`out.csv` → `out.csv.tmp`)
fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut p = path.to_path_buf();
    let extension = p
        .extension()
        .map(|e| format!("{}.{}", e.to_string_lossy(), suffix))
        .unwrap_or_else(|| suffix.to_string());
    p.set_extension(extension);
    p
}

/// Write `path` atomically under an export lock.
///
/// `write` fills a buffered temp file; the temp file is synced and renamed
/// over `path` only if `write` succeeds.
pub fn atomic_write<F>(path: &Path, write: F) -> MonitorResult<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> MonitorResult<()>,
{
    let _lock = ExportLock::acquire(path)?;
    let tmp_path = sidecar(path, "tmp");
    let tmp_display = tmp_path.display().to_string();

    let result = (|| {
        let tmp_file = File::create(&tmp_path)
            .map_err(|e| MonitorError::file_error("create temp file", &tmp_display, e.to_string()))?;
        {
            let mut writer = BufWriter::new(&tmp_file);
            write(&mut writer)?;
            writer
                .flush()
                .map_err(|e| MonitorError::file_error("write temp file", &tmp_display, e.to_string()))?;
        }
        tmp_file
            .sync_all()
            .map_err(|e| MonitorError::file_error("sync temp file", &tmp_display, e.to_string()))?;
        fs::rename(&tmp_path, path)
            .map_err(|e| MonitorError::file_error("rename to final", path.display().to_string(), e.to_string()))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Save a configuration as pretty JSON.
pub fn save_config(config: &MonitorConfig, path: &Path) -> MonitorResult<()> {
    let json = serde_json::to_string_pretty(config)?;
    atomic_write(path, |w| {
        w.write_all(json.as_bytes())
            .map_err(|e| MonitorError::file_error("write", path.display().to_string(), e.to_string()))
    })
}

/// Load and validate a configuration file.
///
/// # Errors
/// * `FileError` - the file cannot be read
/// * `SerializationError` - invalid JSON
/// * `Configuration` - incompatible schema version or inconsistent contents
pub fn load_config(path: &Path) -> MonitorResult<MonitorConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|e| MonitorError::file_error("read", path.display().to_string(), e.to_string()))?;

    let config: MonitorConfig =
        serde_json::from_str(&contents).map_err(|e| MonitorError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;

    validate_version(&config.version)?;
    config.validate()?;
    Ok(config)
}

/// Major versions must match; within 0.x a newer minor is rejected.
fn validate_version(file_version: &str) -> MonitorResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file = parse(file_version);
    let current = parse(SCHEMA_VERSION);

    let mismatch = || {
        MonitorError::configuration(format!(
            "configuration version {} is not compatible with {}",
            file_version, SCHEMA_VERSION
        ))
    };

    match (file.as_slice(), current.as_slice()) {
        ([fm, ..], [cm, ..]) if fm != cm => Err(mismatch()),
        ([0, f_minor, ..], [0, c_minor, ..]) if f_minor > c_minor => Err(mismatch()),
        ([_, ..], [_, ..]) => Ok(()),
        _ => Err(mismatch()),
    }
}

/// Export the stage history as CSV.
pub fn export_history_csv(report: &HistoryReport, path: &Path) -> MonitorResult<()> {
    let destination = path.display().to_string();
    atomic_write(path, |w| report.write_csv(w, &destination))?;
    info!(path = %destination, rows = report.rows.len(), "history exported");
    Ok(())
}

#[derive(Serialize)]
struct NodeRow {
    node: usize,
    x: f64,
    y: f64,
    stress_mpa: f64,
    strain_ue: f64,
}

#[derive(Serialize)]
struct TriangleRow {
    n0: usize,
    n1: usize,
    n2: usize,
}

/// Export a mesh field as two CSV files: nodes with values, and triangle connectivity.
pub fn export_mesh_csv(mesh: &MeshResult, nodes_path: &Path, triangles_path: &Path) -> MonitorResult<()> {
    let node_count = mesh.nodes.len();
    if mesh.stress_mpa.len() != node_count || mesh.strain_ue.len() != node_count {
        return Err(MonitorError::invalid_input(
            "mesh",
            format!(
                "{} nodes, {} stresses, {} strains",
                node_count,
                mesh.stress_mpa.len(),
                mesh.strain_ue.len()
            ),
            "field values must match the node count",
        ));
    }

    let nodes_dest = nodes_path.display().to_string();
    atomic_write(nodes_path, |w| {
        let mut wtr = csv::Writer::from_writer(w);
        let values = mesh.stress_mpa.iter().zip(&mesh.strain_ue);
        for (i, (v, (&stress_mpa, &strain_ue))) in mesh.nodes.iter().zip(values).enumerate() {
            wtr.serialize(NodeRow {
                node: i,
                x: v.x,
                y: v.y,
                stress_mpa,
                strain_ue,
            })
            .map_err(|e| MonitorError::csv_error(&nodes_dest, e.to_string()))?;
        }
        wtr.flush()
            .map_err(|e| MonitorError::file_error("write", &nodes_dest, e.to_string()))
    })?;

    let tri_dest = triangles_path.display().to_string();
    atomic_write(triangles_path, |w| {
        let mut wtr = csv::Writer::from_writer(w);
        for t in &mesh.triangles {
            let [n0, n1, n2] = t.nodes;
            wtr.serialize(TriangleRow { n0, n1, n2 })
                .map_err(|e| MonitorError::csv_error(&tri_dest, e.to_string()))?;
        }
        wtr.flush()
            .map_err(|e| MonitorError::file_error("write", &tri_dest, e.to_string()))
    })?;

    info!(
        pier = %mesh.pier,
        stage = %mesh.stage,
        nodes = mesh.nodes.len(),
        triangles = mesh.triangles.len(),
        "mesh exported"
    );
    Ok(())
}

/// Save any serializable result as pretty JSON.
pub fn save_report_json<T: Serialize>(value: &T, path: &Path) -> MonitorResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    atomic_write(path, |w| {
        w.write_all(json.as_bytes())
            .map_err(|e| MonitorError::file_error("write", path.display().to_string(), e.to_string()))
    })
}

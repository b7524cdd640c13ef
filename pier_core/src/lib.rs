//! # pier_core - Bridge Pier Stress Monitoring Engine
//!
//! `pier_core` turns construction-stage internal forces into normal stress
//! and strain over meshed rectangular pier sections, evaluates them at the
//! strain gauges, and compares them with baseline-corrected field readings.
//! All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Explicit inputs**: Settings, tables and caches live in a [`session::Session`], not globals
//! - **JSON-First**: Results implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Nothing silently dropped**: Skipped piers and stages are reported, not swallowed
//!
//! ## Quick Start
//!
//! ```rust
//! use pier_core::{ActualReadings, LoadTable, MonitorConfig, Session};
//!
//! let csv = "Part,Stage,Axial (kN),Moment-y (kN·m),Moment-z (kN·m)\n\
//!            I[3111],S1,-20000,150,-400\n";
//! let loads = LoadTable::from_reader(csv.as_bytes(), "inline").unwrap();
//! let mut session = Session::new(MonitorConfig::default(), loads, ActualReadings::empty()).unwrap();
//!
//! let history = session.history().unwrap();
//! assert_eq!(history.rows.len(), 4);
//! assert_eq!(history.skipped.len(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Piers, gauges, baselines and channel maps
//! - [`section`] - Meshing and geometric properties
//! - [`loads`] - Load table and stage selection
//! - [`stress`] - σ_zz evaluation
//! - [`materials`] - Concrete modulus and strain conversion
//! - [`actual`] - Field readings and baseline correction
//! - [`analysis`] - Per-pier results for one stage
//! - [`history`] - Gauge values across all stages
//! - [`session`] - Ties the above together
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - Config files and exports with atomic writes and locking

pub mod actual;
pub mod analysis;
pub mod config;
pub mod errors;
pub mod file_io;
pub mod history;
pub mod loads;
pub mod materials;
pub mod section;
pub mod session;
pub mod stress;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use actual::ActualReadings;
pub use analysis::{PierAnalysis, PierOutcome};
pub use config::MonitorConfig;
pub use errors::{MonitorError, MonitorResult};
pub use file_io::{export_history_csv, load_config, save_config};
pub use history::HistoryReport;
pub use loads::{LoadTable, StageSelection};
pub use session::Session;

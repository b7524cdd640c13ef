//! # Unit Types
//!
//! Thin newtype wrappers for the SI units that flow through the pipeline.
//!
//! The load table reports forces in kN and moments in kN·m, while the section
//! model is dimensioned in millimeters. Converting through these types keeps
//! the factor-of-a-million mistakes out of the stress evaluator:
//!
//! - Force: kilonewtons (kN) → newtons (N), × 1 000
//! - Moment: kilonewton-meters (kN·m) → newton-millimeters (N·mm), × 1 000 000
//! - Stress: megapascals (MPa = N/mm²)
//! - Strain: microstrain (με = strain × 10⁶)
//!
//! ## Example
//!
//! ```rust
//! use pier_core::units::{KiloNewtons, Newtons, KiloNewtonMeters, NewtonMillimeters};
//!
//! let n: Newtons = KiloNewtons(100.0).into();
//! assert_eq!(n.0, 100_000.0);
//!
//! let m: NewtonMillimeters = KiloNewtonMeters(50.0).into();
//! assert_eq!(m.0, 50_000_000.0);
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Force Units
// ============================================================================

/// Force in newtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Newtons(pub f64);

/// Force in kilonewtons (1 kN = 1000 N)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KiloNewtons(pub f64);

impl From<KiloNewtons> for Newtons {
    fn from(kn: KiloNewtons) -> Self {
        Newtons(kn.0 * 1000.0)
    }
}

impl From<Newtons> for KiloNewtons {
    fn from(n: Newtons) -> Self {
        KiloNewtons(n.0 / 1000.0)
    }
}

// ============================================================================
// Moment Units
// ============================================================================

/// Moment in newton-millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonMillimeters(pub f64);

/// Moment in kilonewton-meters (1 kN·m = 10⁶ N·mm)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KiloNewtonMeters(pub f64);

impl From<KiloNewtonMeters> for NewtonMillimeters {
    fn from(knm: KiloNewtonMeters) -> Self {
        NewtonMillimeters(knm.0 * 1e6)
    }
}

impl From<NewtonMillimeters> for KiloNewtonMeters {
    fn from(nmm: NewtonMillimeters) -> Self {
        KiloNewtonMeters(nmm.0 / 1e6)
    }
}

// ============================================================================
// Stress / Strain Units
// ============================================================================

/// Stress in megapascals (N/mm²)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MegaPascals(pub f64);

/// Strain in microstrain (με)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Microstrain(pub f64);

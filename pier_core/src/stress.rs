//! # Normal Stress Evaluation
//!
//! Linear-elastic σ_zz over a section under combined axial force and
//! bi-axial bending, by superposition:
//!
//! ```text
//! σ_zz(x, y) = N/A
//!            − (Ixy·Mxx / D)·x' + (Iyy·Mxx / D)·y'
//!            − (Ixx·Myy / D)·x' + (Ixy·Myy / D)·y'
//!
//! x' = x − cx,  y' = y − cy,  D = Ixx·Iyy − Ixy²
//! ```
//!
//! For a doubly-symmetric rectangle (Ixy = 0) this reduces to the familiar
//! `N/A + Mxx·y'/Ixx − Myy·x'/Iyy`.
//!
//! Stress is in MPa when forces are in N, moments in N·mm and lengths in mm.
//!
//! ## Example
//!
//! ```rust
//! use pier_core::loads::LoadCase;
//! use pier_core::section::{SectionModel, Vertex};
//! use pier_core::stress::StressEvaluator;
//! use pier_core::units::Newtons;
//!
//! let section = SectionModel::rectangular(5000.0, 2000.0, 50.0).unwrap();
//! let eval = StressEvaluator::new(&section, &LoadCase::axial(Newtons(-1.0e7)));
//! let sigma = eval.at_points(&[Vertex::new(0.0, 2500.0)]).unwrap();
//! assert!((sigma[0] + 1.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{MonitorError, MonitorResult};
use crate::loads::LoadCase;
use crate::materials::strain_from_stress;
use crate::section::{GeometricProperties, SectionModel, Vertex};

/// σ_zz = constant + gx·(x − cx) + gy·(y − cy), precomputed for one load case
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressCoefficients {
    /// Uniform axial stress N/A (MPa)
    pub axial: f64,
    /// Stress gradient along x (MPa/mm)
    pub grad_x: f64,
    /// Stress gradient along y (MPa/mm)
    pub grad_y: f64,
    pub cx: f64,
    pub cy: f64,
}

impl StressCoefficients {
    pub fn new(props: &GeometricProperties, load: &LoadCase) -> Self {
        let d = props.bending_determinant();
        let mxx = load.mxx.0;
        let myy = load.myy.0;

        StressCoefficients {
            axial: load.n.0 / props.area,
            grad_x: -(props.ixy_c * mxx) / d - (props.ixx_c * myy) / d,
            grad_y: (props.iyy_c * mxx) / d + (props.ixy_c * myy) / d,
            cx: props.cx,
            cy: props.cy,
        }
    }

    #[inline]
    pub fn sigma_zz(&self, x: f64, y: f64) -> f64 {
        self.axial + self.grad_x * (x - self.cx) + self.grad_y * (y - self.cy)
    }
}

/// Stress evaluation of one load case against one section.
pub struct StressEvaluator<'a> {
    section: &'a SectionModel,
    coefficients: StressCoefficients,
}

impl<'a> StressEvaluator<'a> {
    pub fn new(section: &'a SectionModel, load: &LoadCase) -> Self {
        StressEvaluator {
            section,
            coefficients: StressCoefficients::new(&section.properties, load),
        }
    }

    pub fn coefficients(&self) -> &StressCoefficients {
        &self.coefficients
    }

    /// σ_zz at every mesh node, in node order.
    pub fn mesh_field(&self) -> StressField {
        let values = self
            .section
            .mesh
            .nodes
            .iter()
            .map(|v| self.coefficients.sigma_zz(v.x, v.y))
            .collect();
        StressField { values }
    }

    /// σ_zz at each requested point, in the same order.
    ///
    /// # Errors
    /// `EvaluationFailed` if any point lies outside the section.
    pub fn at_points(&self, points: &[Vertex]) -> MonitorResult<Vec<f64>> {
        points
            .iter()
            .map(|p| {
                if !self.section.contains(p) {
                    return Err(MonitorError::evaluation_failed(format!(
                        "point ({}, {}) lies outside the {} x {} mm section",
                        p.x, p.y, self.section.width_mm, self.section.length_mm
                    )));
                }
                Ok(self.coefficients.sigma_zz(p.x, p.y))
            })
            .collect()
    }
}

/// Stress (MPa) at every mesh node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressField {
    pub values: Vec<f64>,
}

impl StressField {
    /// Summary statistics of the stress field
    pub fn stats(&self) -> Option<FieldStats> {
        FieldStats::from_values(&self.values)
    }

    /// The field converted to microstrain at `modulus_mpa`
    pub fn strains(&self, modulus_mpa: f64) -> Vec<f64> {
        self.values
            .iter()
            .map(|s| strain_from_stress(*s, modulus_mpa))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Minimum, maximum and mean of a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FieldStats {
    /// `None` for an empty slice
    pub fn from_values(values: &[f64]) -> Option<FieldStats> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(FieldStats { min, max, mean })
    }
}

//! # Section Model
//!
//! A rectangular pier cross-section together with its triangular mesh and
//! geometric properties. The model is a pure function of
//! `(length, width, coarseness)` and is immutable once built, so it can be
//! shared between every load case evaluated against the same geometry.
//!
//! ## Coordinates
//!
//! ```text
//!   y ▲
//!  L  ┼──────────┐
//!     │          │
//!     │    ●     │  ● centroid (W/2, L/2)
//!     │          │
//!   0 ┼──────────┼─▶ x
//!     0          W
//! ```
//!
//! `length` runs along y and `width` along x, both in millimeters.
//!
//! ## Example
//!
//! ```rust
//! use pier_core::section::SectionModel;
//!
//! let section = SectionModel::rectangular(5000.0, 2000.0, 50.0).unwrap();
//! assert!((section.properties.area - 1.0e7).abs() < 1e-3);
//! ```

pub mod cache;
pub mod mesh;
pub mod properties;

pub use cache::{SectionCache, SectionKey};
pub use mesh::{Mesh, Triangle, Vertex};
pub use properties::GeometricProperties;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{MonitorError, MonitorResult};

/// Default mesh coarseness: max element area = length × 50 (mm²)
pub const DEFAULT_MESH_COARSENESS: f64 = 50.0;

/// Relative disagreement between integrated and closed-form properties worth a warning
const PROPERTY_CHECK_TOLERANCE: f64 = 1e-6;

/// Meshed rectangular cross-section with precomputed properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionModel {
    /// Dimension along y (mm)
    pub length_mm: f64,
    /// Dimension along x (mm)
    pub width_mm: f64,
    /// Mesh coarseness factor
    pub coarseness: f64,
    pub mesh: Mesh,
    pub properties: GeometricProperties,
}

impl SectionModel {
    /// Build and mesh a `width × length` rectangle.
    ///
    /// Triangles are limited to `length × coarseness` mm² each; smaller
    /// coarseness means a finer (and slower) mesh.
    ///
    /// # Errors
    /// * `InvalidInput` - a dimension or the coarseness is non-positive or not finite
    /// * `CalculationFailed` - the mesh produced a degenerate section
    pub fn rectangular(length_mm: f64, width_mm: f64, coarseness: f64) -> MonitorResult<Self> {
        if !coarseness.is_finite() || coarseness <= 0.0 {
            return Err(MonitorError::invalid_input(
                "coarseness",
                coarseness.to_string(),
                "Mesh coarseness must be positive",
            ));
        }

        let mesh = Mesh::rectangle(length_mm, width_mm, length_mm * coarseness)?;
        let properties = GeometricProperties::from_mesh(&mesh)?;

        let exact = GeometricProperties::rectangle(length_mm, width_mm);
        let diff = properties.max_relative_difference(&exact);
        if diff > PROPERTY_CHECK_TOLERANCE {
            warn!(
                length_mm,
                width_mm, diff, "integrated section properties disagree with closed form"
            );
        }

        Ok(SectionModel {
            length_mm,
            width_mm,
            coarseness,
            mesh,
            properties,
        })
    }

    /// Whether `point` lies inside the section, allowing a small tolerance on the boundary
    pub fn contains(&self, point: &Vertex) -> bool {
        let tol = 1e-9 * self.length_mm.max(self.width_mm);
        point.x >= -tol
            && point.x <= self.width_mm + tol
            && point.y >= -tol
            && point.y <= self.length_mm + tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pier_section_properties() {
        let section = SectionModel::rectangular(5000.0, 2000.0, DEFAULT_MESH_COARSENESS).unwrap();
        let p = section.properties;
        assert!((p.area - 1.0e7).abs() < 1e-3);
        assert!((p.cx - 1000.0).abs() < 1e-6);
        assert!((p.cy - 2500.0).abs() < 1e-6);
        assert!(section.mesh.max_triangle_area() <= 5000.0 * 50.0 + 1e-6);
    }

    #[test]
    fn test_contains() {
        let section = SectionModel::rectangular(5000.0, 2000.0, 50.0).unwrap();
        assert!(section.contains(&Vertex::new(0.0, 2500.0)));
        assert!(section.contains(&Vertex::new(2000.0, 5000.0)));
        assert!(!section.contains(&Vertex::new(2000.5, 2500.0)));
        assert!(!section.contains(&Vertex::new(1000.0, -1.0)));
    }

    #[test]
    fn test_invalid_coarseness() {
        assert!(SectionModel::rectangular(5000.0, 2000.0, 0.0).is_err());
        assert!(SectionModel::rectangular(5000.0, 2000.0, f64::NAN).is_err());
    }

    #[test]
    fn test_finer_mesh_has_more_nodes() {
        let coarse = SectionModel::rectangular(5000.0, 2000.0, 50.0).unwrap();
        let fine = SectionModel::rectangular(5000.0, 2000.0, 5.0).unwrap();
        assert!(fine.mesh.node_count() > coarse.mesh.node_count());
    }
}

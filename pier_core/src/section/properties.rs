//! # Cross-Section Geometric Properties
//!
//! Area, centroid and centroidal second moments of area, integrated exactly
//! over the triangles of a mesh. Closed-form rectangular formulas are kept
//! alongside as a cross-check.
//!
//! ## Notation
//!
//! - `A` = Cross-sectional area
//! - `cx, cy` = Centroid coordinates
//! - `Ixx` = ∫ (y − cy)² dA (bending about the x axis)
//! - `Iyy` = ∫ (x − cx)² dA (bending about the y axis)
//! - `Ixy` = ∫ (x − cx)(y − cy) dA (product of area)
//!
//! ## References
//!
//! - Pilkey, *Analysis and Design of Elastic Beams*, Ch. 1 (section integrals)
//! - Roark's Formulas for Stress and Strain, 8th Edition, Table A.1

use serde::{Deserialize, Serialize};

use super::mesh::Mesh;
use crate::errors::{MonitorError, MonitorResult};

/// Geometric properties of a section about its centroid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometricProperties {
    /// Area (mm²)
    pub area: f64,
    /// Centroid x (mm)
    pub cx: f64,
    /// Centroid y (mm)
    pub cy: f64,
    /// Centroidal second moment about x (mm⁴)
    pub ixx_c: f64,
    /// Centroidal second moment about y (mm⁴)
    pub iyy_c: f64,
    /// Centroidal product of area (mm⁴)
    pub ixy_c: f64,
}

impl GeometricProperties {
    /// Integrate section properties over all triangles of `mesh`.
    ///
    /// Each triangle contributes its exact first and second moments, so a
    /// polygonal section is integrated without quadrature error.
    pub fn from_mesh(mesh: &Mesh) -> MonitorResult<GeometricProperties> {
        let mut area = 0.0;
        let mut qx = 0.0; // ∫ y dA
        let mut qy = 0.0; // ∫ x dA
        let mut ixx = 0.0; // ∫ y² dA
        let mut iyy = 0.0; // ∫ x² dA
        let mut ixy = 0.0; // ∫ xy dA

        for triangle in &mesh.triangles {
            let a = mesh.triangle_area(triangle);
            let [v0, v1, v2] = triangle.nodes.map(|i| mesh.nodes[i]);

            area += a;
            qx += a * (v0.y + v1.y + v2.y) / 3.0;
            qy += a * (v0.x + v1.x + v2.x) / 3.0;
            ixx += a / 6.0
                * (v0.y * v0.y + v1.y * v1.y + v2.y * v2.y + v0.y * v1.y + v1.y * v2.y + v2.y * v0.y);
            iyy += a / 6.0
                * (v0.x * v0.x + v1.x * v1.x + v2.x * v2.x + v0.x * v1.x + v1.x * v2.x + v2.x * v0.x);
            ixy += a / 12.0
                * (2.0 * (v0.x * v0.y + v1.x * v1.y + v2.x * v2.y)
                    + v0.x * v1.y
                    + v1.x * v0.y
                    + v1.x * v2.y
                    + v2.x * v1.y
                    + v2.x * v0.y
                    + v0.x * v2.y);
        }

        if !(area.is_finite() && area > 0.0) {
            return Err(MonitorError::calculation_failed(
                "section properties",
                format!("Mesh has non-positive area {}", area),
            ));
        }

        let cx = qy / area;
        let cy = qx / area;

        let props = GeometricProperties {
            area,
            cx,
            cy,
            ixx_c: ixx - area * cy * cy,
            iyy_c: iyy - area * cx * cx,
            ixy_c: ixy - area * cx * cy,
        };

        if props.bending_determinant() <= 0.0 {
            return Err(MonitorError::calculation_failed(
                "section properties",
                "Section has no bending stiffness (Ixx·Iyy − Ixy² <= 0)",
            ));
        }

        Ok(props)
    }

    /// Closed-form properties of a solid `width × length` rectangle anchored at the origin.
    pub fn rectangle(length: f64, width: f64) -> GeometricProperties {
        GeometricProperties {
            area: rectangular_area(width, length),
            cx: width / 2.0,
            cy: length / 2.0,
            ixx_c: rectangular_moment_of_inertia(width, length),
            iyy_c: rectangular_moment_of_inertia(length, width),
            ixy_c: 0.0,
        }
    }

    /// Ixx·Iyy − Ixy²
    pub fn bending_determinant(&self) -> f64 {
        self.ixx_c * self.iyy_c - self.ixy_c * self.ixy_c
    }

    /// Relative difference against another property set (largest over A, Ixx, Iyy)
    pub fn max_relative_difference(&self, other: &GeometricProperties) -> f64 {
        let rel = |a: f64, b: f64| ((a - b) / b).abs();
        rel(self.area, other.area)
            .max(rel(self.ixx_c, other.ixx_c))
            .max(rel(self.iyy_c, other.iyy_c))
    }
}

/// A = b × d
#[inline]
pub fn rectangular_area(b: f64, d: f64) -> f64 {
    b * d
}

/// I = b d³ / 12, bending with `d` parallel to the bending plane
#[inline]
pub fn rectangular_moment_of_inertia(b: f64, d: f64) -> f64 {
    b * d.powi(3) / 12.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::mesh::{Triangle, Vertex};

    #[test]
    fn test_closed_form_pier_section() {
        let p = GeometricProperties::rectangle(5000.0, 2000.0);
        assert_eq!(p.area, 1.0e7);
        // Ixx = 2000 × 5000³ / 12
        assert!((p.ixx_c - 2.0833333e13).abs() / 2.0833333e13 < 1e-6);
        // Iyy = 5000 × 2000³ / 12
        assert!((p.iyy_c - 3.3333333e12).abs() / 3.3333333e12 < 1e-6);
        assert_eq!((p.cx, p.cy), (1000.0, 2500.0));
    }

    #[test]
    fn test_mesh_integration_matches_closed_form() {
        let mesh = Mesh::rectangle(5000.0, 2000.0, 250_000.0).unwrap();
        let numeric = GeometricProperties::from_mesh(&mesh).unwrap();
        let exact = GeometricProperties::rectangle(5000.0, 2000.0);

        assert!(numeric.max_relative_difference(&exact) < 1e-9);
        assert!((numeric.cx - 1000.0).abs() < 1e-6);
        assert!((numeric.cy - 2500.0).abs() < 1e-6);
        assert!(numeric.ixy_c.abs() / exact.ixx_c < 1e-9);
    }

    #[test]
    fn test_single_triangle_moments() {
        // Right triangle with legs 3 (x) and 6 (y): Ixx_c = b h³ / 36
        let mesh = Mesh {
            nodes: vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(3.0, 0.0),
                Vertex::new(0.0, 6.0),
            ],
            triangles: vec![Triangle { nodes: [0, 1, 2] }],
            nx: 1,
            ny: 1,
        };
        let p = GeometricProperties::from_mesh(&mesh).unwrap();
        assert!((p.area - 9.0).abs() < 1e-12);
        assert!((p.cx - 1.0).abs() < 1e-12);
        assert!((p.cy - 2.0).abs() < 1e-12);
        assert!((p.ixx_c - 3.0 * 216.0 / 36.0).abs() < 1e-9);
        assert!((p.iyy_c - 6.0 * 27.0 / 36.0).abs() < 1e-9);
        // Ixy_c = -b² h² / 72
        assert!((p.ixy_c + 9.0 * 36.0 / 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_mesh_fails() {
        let mesh = Mesh {
            nodes: vec![],
            triangles: vec![],
            nx: 0,
            ny: 0,
        };
        let err = GeometricProperties::from_mesh(&mesh).unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }
}

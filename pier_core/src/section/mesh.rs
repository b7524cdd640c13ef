//! Structured triangular mesh of a rectangular section.
//!
//! The rectangle spans `x ∈ [0, width]`, `y ∈ [0, length]`. It is divided into
//! an `nx × ny` grid of cells, each split into two counter-clockwise
//! triangles along its lower-left/upper-right diagonal:
//!
//! ```text
//!  n01 ──── n11
//!   │ ╲  B   │
//!   │   ╲    │      A = [n00, n10, n11]
//!   │ A   ╲  │      B = [n00, n11, n01]
//!  n00 ──── n10
//! ```
//!
//! The cell side is chosen so that no triangle exceeds the requested maximum
//! element area.

use serde::{Deserialize, Serialize};

use crate::errors::{MonitorError, MonitorResult};

/// Upper bound on grid cells, to keep a tiny coarseness from exhausting memory
pub const MAX_MESH_CELLS: usize = 2_000_000;

/// A point in the section's local coordinate system (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64) -> Self {
        Vertex { x, y }
    }

    fn distance_sq(&self, other: &Vertex) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }
}

impl From<(f64, f64)> for Vertex {
    fn from((x, y): (f64, f64)) -> Self {
        Vertex { x, y }
    }
}

/// Linear triangle referencing three mesh nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub nodes: [usize; 3],
}

/// Node coordinates and triangle connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub nodes: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    /// Grid divisions along x (width)
    pub nx: usize,
    /// Grid divisions along y (length)
    pub ny: usize,
}

impl Mesh {
    /// Mesh a `width × length` rectangle with triangles no larger than `max_element_area`.
    ///
    /// # Arguments
    /// * `length` - Section dimension along y (mm)
    /// * `width` - Section dimension along x (mm)
    /// * `max_element_area` - Largest allowed triangle area (mm²)
    pub fn rectangle(length: f64, width: f64, max_element_area: f64) -> MonitorResult<Mesh> {
        for (field, value) in [
            ("length", length),
            ("width", width),
            ("max_element_area", max_element_area),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(MonitorError::invalid_input(
                    field,
                    value.to_string(),
                    "Mesh dimensions must be positive",
                ));
            }
        }

        // Two triangles per square cell of side s: s²/2 <= max area
        let side = (2.0 * max_element_area).sqrt();
        let nx = ((width / side).ceil() as usize).max(1);
        let ny = ((length / side).ceil() as usize).max(1);

        if nx.saturating_mul(ny) > MAX_MESH_CELLS {
            return Err(MonitorError::invalid_input(
                "max_element_area",
                max_element_area.to_string(),
                format!(
                    "Mesh would need {}x{} cells (limit {}); increase the coarseness",
                    nx, ny, MAX_MESH_CELLS
                ),
            ));
        }

        let dx = width / nx as f64;
        let dy = length / ny as f64;

        let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                // Snap the last row/column exactly onto the boundary
                let x = if i == nx { width } else { i as f64 * dx };
                let y = if j == ny { length } else { j as f64 * dy };
                nodes.push(Vertex::new(x, y));
            }
        }

        let index = |i: usize, j: usize| j * (nx + 1) + i;
        let mut triangles = Vec::with_capacity(2 * nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let n00 = index(i, j);
                let n10 = index(i + 1, j);
                let n11 = index(i + 1, j + 1);
                let n01 = index(i, j + 1);
                triangles.push(Triangle {
                    nodes: [n00, n10, n11],
                });
                triangles.push(Triangle {
                    nodes: [n00, n11, n01],
                });
            }
        }

        Ok(Mesh {
            nodes,
            triangles,
            nx,
            ny,
        })
    }

    /// Signed area of a triangle (positive for counter-clockwise ordering)
    pub fn triangle_area(&self, triangle: &Triangle) -> f64 {
        let v0 = &self.nodes[triangle.nodes[0]];
        let v1 = &self.nodes[triangle.nodes[1]];
        let v2 = &self.nodes[triangle.nodes[2]];

        0.5 * (v0.x * (v1.y - v2.y) + v1.x * (v2.y - v0.y) + v2.x * (v0.y - v1.y))
    }

    /// Largest triangle area in the mesh
    pub fn max_triangle_area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|t| self.triangle_area(t).abs())
            .fold(0.0, f64::max)
    }

    /// Index of the node closest to `point`, or `None` for an empty mesh
    pub fn nearest_node(&self, point: &Vertex) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.distance_sq(point).total_cmp(&b.distance_sq(point)))
            .map(|(i, _)| i)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

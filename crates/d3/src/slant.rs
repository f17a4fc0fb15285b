//! Oblique cutting planes inside containers.
//!
//! A slant is a plane through `position` with normal `n`. Points `p` with
//! `(p - position) . n > 0` lie in the cut-away part of the container; the usable part
//! is the half-space `n . p <= n . position`.

use crate::oracle::HalfSpace;
use nalgebra::Vector3;
use stowage_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Offset added to every projection onto the plane.
const PROJECTION_OFFSET: f64 = 1e-6;

/// A cutting plane.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Slant {
    position: Vector3<f64>,
    normal: Vector3<f64>,
    offset: f64,
    intercepts: Vector3<f64>,
    intersections: Vec<Vector3<f64>>,
    sealed: bool,
}

impl Slant {
    /// Creates an unsealed slant. The normal need not be normalized.
    pub fn new(position: Vector3<f64>, normal: Vector3<f64>) -> Result<Self> {
        if !position.iter().chain(normal.iter()).all(|v| v.is_finite()) {
            return Err(Error::InvalidGeometry(
                "slant position and normal must be finite".to_string(),
            ));
        }
        if normal.norm() == 0.0 {
            return Err(Error::InvalidGeometry(
                "slant normal must not be the zero vector".to_string(),
            ));
        }
        Ok(Self {
            position,
            normal,
            offset: 0.0,
            intercepts: Vector3::zeros(),
            intersections: Vec::new(),
            sealed: false,
        })
    }

    /// Normalizes the normal, computes the axis intercepts and the points where the
    /// plane crosses the edges of a container of the given extent.
    pub fn seal(&mut self, container: &Vector3<f64>) -> Result<()> {
        if self.sealed {
            return Err(Error::AlreadySealed("slant sealed twice".to_string()));
        }
        self.normal = self.normal.normalize();
        self.offset = self.normal.dot(&self.position);
        self.intercepts = self.normal.map(|n| self.offset / n);
        self.intersections = self.edge_intersections(container);
        self.sealed = true;
        Ok(())
    }

    /// Whether the slant has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// A point on the plane.
    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }

    /// Normal vector (unit length once sealed).
    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    /// Axis intercepts `offset / n_i` (infinite or NaN where the plane is parallel to an axis).
    pub fn intercepts(&self) -> &Vector3<f64> {
        &self.intercepts
    }

    /// Points where the plane crosses the container edges, within the container.
    pub fn container_intersections(&self) -> &[Vector3<f64>] {
        &self.intersections
    }

    /// Whether the slant exposes corners worth offering as extreme points.
    pub fn exposes_corners(&self) -> bool {
        self.normal.iter().any(|n| *n <= 0.0)
    }

    /// The usable side of the plane as a half-space.
    pub fn half_space(&self) -> HalfSpace {
        HalfSpace::new(self.normal, self.normal.dot(&self.position))
    }

    /// Signed distance-like value of `point`; positive means cut away.
    pub fn excess(&self, point: &Vector3<f64>) -> f64 {
        (point - self.position).dot(&self.normal)
    }

    /// Projects along x onto the plane: the x at which (·, y, z) hits it.
    pub fn project_x(&self, y: f64, z: f64) -> f64 {
        self.project(0, y * self.normal.y + z * self.normal.z)
    }

    /// Projects along y onto the plane.
    pub fn project_y(&self, x: f64, z: f64) -> f64 {
        self.project(1, x * self.normal.x + z * self.normal.z)
    }

    /// Projects along z onto the plane.
    pub fn project_z(&self, x: f64, y: f64) -> f64 {
        self.project(2, x * self.normal.x + y * self.normal.y)
    }

    fn project(&self, axis: usize, rest: f64) -> f64 {
        let n = self.normal[axis];
        if n == 0.0 {
            return f64::NAN;
        }
        (self.normal.dot(&self.position) - rest) / n + PROJECTION_OFFSET
    }

    fn edge_intersections(&self, c: &Vector3<f64>) -> Vec<Vector3<f64>> {
        let (l, w, h) = (c.x, c.y, c.z);
        let candidates = [
            // bottom frame
            Vector3::new(self.project_x(0.0, 0.0), 0.0, 0.0),
            Vector3::new(0.0, self.project_y(0.0, 0.0), 0.0),
            Vector3::new(self.project_x(w, 0.0), w, 0.0),
            Vector3::new(l, self.project_y(l, 0.0), 0.0),
            // vertical edges
            Vector3::new(0.0, 0.0, self.project_z(0.0, 0.0)),
            Vector3::new(l, 0.0, self.project_z(l, 0.0)),
            Vector3::new(0.0, w, self.project_z(0.0, w)),
            Vector3::new(l, w, self.project_z(l, w)),
            // top frame
            Vector3::new(self.project_x(0.0, h), 0.0, h),
            Vector3::new(0.0, self.project_y(0.0, h), h),
            Vector3::new(self.project_x(w, h), w, h),
            Vector3::new(l, self.project_y(l, h), h),
        ];
        candidates
            .into_iter()
            .filter(|p| {
                (0.0..=l).contains(&p.x) && (0.0..=w).contains(&p.y) && (0.0..=h).contains(&p.z)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp() -> Slant {
        let mut slant = Slant::new(Vector3::new(0.0, 15.6, 0.0), Vector3::new(0.0, 1.0, -1.0))
            .unwrap();
        slant.seal(&Vector3::new(15.3, 20.1, 16.3)).unwrap();
        slant
    }

    #[test]
    fn test_seal_normalizes() {
        let slant = ramp();
        assert_relative_eq!(slant.normal().norm(), 1.0, epsilon = 1e-12);
        assert!(slant.exposes_corners());
        assert!(slant.intercepts().x.is_infinite());
    }

    #[test]
    fn test_ramp_intersections_within_container() {
        let slant = ramp();
        let points = slant.container_intersections();
        assert_eq!(points.len(), 4);
        for p in points {
            assert!((0.0..=15.3).contains(&p.x));
            assert!((0.0..=20.1).contains(&p.y));
            assert!((0.0..=16.3).contains(&p.z));
        }
        assert_relative_eq!(points[0], Vector3::new(0.0, 15.6, 0.0), epsilon = 1e-5);
        assert_relative_eq!(points[1], Vector3::new(15.3, 15.6, 0.0), epsilon = 1e-5);
        assert_relative_eq!(points[2], Vector3::new(0.0, 20.1, 4.5), epsilon = 1e-5);
        assert_relative_eq!(points[3], Vector3::new(15.3, 20.1, 4.5), epsilon = 1e-5);
    }

    #[test]
    fn test_projection_parallel_axis_is_nan() {
        let slant = ramp();
        assert!(slant.project_x(1.0, 1.0).is_nan());
        assert_relative_eq!(slant.project_y(0.0, 2.0), 17.6, epsilon = 1e-5);
    }

    #[test]
    fn test_excess_sign() {
        let slant = ramp();
        assert!(slant.excess(&Vector3::new(1.0, 20.0, 0.0)) > 0.0);
        assert!(slant.excess(&Vector3::new(1.0, 1.0, 1.0)) < 0.0);
        assert!(slant.half_space().contains(&Vector3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_zero_normal_rejected() {
        assert!(Slant::new(Vector3::zeros(), Vector3::zeros()).is_err());
    }
}

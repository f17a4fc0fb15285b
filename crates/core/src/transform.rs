//! Orientation transforms and axis-aligned boxes.
//!
//! # Rotation group
//!
//! Axis-aligned cuboids admit exactly 24 rotations (the proper symmetry group of the
//! cube). They are enumerated as six "sides facing up" times four turns about the
//! vertical axis:
//!
//! | side | alpha (x) | beta (y) |
//! |------|-----------|----------|
//! | 0    | 0         | 0        |
//! | 1    | 90        | 0        |
//! | 2    | 180       | 0        |
//! | 3    | 270       | 0        |
//! | 4    | 0         | 90       |
//! | 5    | 0         | 270      |
//!
//! with gamma (z) in {0, 90, 180, 270}. The orientation id is `side * 4 + turn` and
//! the matrix is `Rz(gamma) * Ry(beta) * Rx(alpha)` rounded to exact integers.

use crate::{Error, Result};
use nalgebra::{Matrix3, Rotation3, Vector3};
use std::sync::OnceLock;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of axis-aligned orientations.
pub const ORIENTATION_COUNT: usize = 24;

const SIDES: [(f64, f64); 6] = [
    (0.0, 0.0),
    (90.0, 0.0),
    (180.0, 0.0),
    (270.0, 0.0),
    (0.0, 90.0),
    (0.0, 270.0),
];

const TURNS: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

/// Euler angles of an orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrientationAngles {
    /// Rotation around the x axis.
    pub alpha: f64,
    /// Rotation around the y axis.
    pub beta: f64,
    /// Rotation around the z axis.
    pub gamma: f64,
}

/// Checks that `orientation` is a valid orientation id.
pub fn check_orientation(orientation: usize) -> Result<()> {
    if orientation < ORIENTATION_COUNT {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "orientation {} outside 0..{}",
            orientation, ORIENTATION_COUNT
        )))
    }
}

/// Returns the Euler angles used to build `orientation`.
pub fn orientation_angles(orientation: usize) -> Result<OrientationAngles> {
    check_orientation(orientation)?;
    let (alpha, beta) = SIDES[orientation / TURNS.len()];
    let gamma = TURNS[orientation % TURNS.len()];
    Ok(OrientationAngles { alpha, beta, gamma })
}

fn build_matrix(angles: OrientationAngles) -> Matrix3<f64> {
    let rotation = Rotation3::from_euler_angles(
        angles.alpha.to_radians(),
        angles.beta.to_radians(),
        angles.gamma.to_radians(),
    );
    rotation.into_inner().map(|v| v.round() + 0.0)
}

/// Returns all 24 integer rotation matrices, indexed by orientation id.
pub fn rotation_group() -> &'static [Matrix3<f64>; ORIENTATION_COUNT] {
    static GROUP: OnceLock<[Matrix3<f64>; ORIENTATION_COUNT]> = OnceLock::new();
    GROUP.get_or_init(|| {
        let mut matrices = [Matrix3::identity(); ORIENTATION_COUNT];
        for (orientation, matrix) in matrices.iter_mut().enumerate() {
            let (alpha, beta) = SIDES[orientation / TURNS.len()];
            let gamma = TURNS[orientation % TURNS.len()];
            *matrix = build_matrix(OrientationAngles { alpha, beta, gamma });
        }
        matrices
    })
}

/// Returns the rotation matrix of `orientation`.
pub fn rotation_matrix(orientation: usize) -> Result<&'static Matrix3<f64>> {
    check_orientation(orientation)?;
    Ok(&rotation_group()[orientation])
}

/// Rotates a vector by the matrix of `orientation`.
pub fn rotate(orientation: usize, v: &Vector3<f64>) -> Result<Vector3<f64>> {
    Ok(rotation_matrix(orientation)? * v)
}

/// Rounds `value` to `digits` decimal places (half away from zero).
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AABB3D {
    /// Minimum corner.
    pub min: Vector3<f64>,
    /// Maximum corner.
    pub max: Vector3<f64>,
}

impl AABB3D {
    /// Creates a new AABB from its corners.
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        Self { min, max }
    }

    /// Creates an AABB anchored at `origin` with the given extent.
    pub fn from_origin_extent(origin: Vector3<f64>, extent: Vector3<f64>) -> Self {
        Self {
            min: origin,
            max: origin + extent,
        }
    }

    /// Returns the extent along each axis.
    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Returns the volume.
    pub fn volume(&self) -> f64 {
        let e = self.extent();
        e.x * e.y * e.z
    }

    /// True if the boxes share interior volume. Touching faces do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.min.x >= other.max.x
            || self.max.x <= other.min.x
            || self.min.y >= other.max.y
            || self.max.y <= other.min.y
            || self.min.z >= other.max.z
            || self.max.z <= other.min.z)
    }

    /// True if this box lies within `[0, bounds]` on every axis.
    pub fn within(&self, bounds: &Vector3<f64>) -> bool {
        self.min.x >= 0.0
            && self.min.y >= 0.0
            && self.min.z >= 0.0
            && self.max.x <= bounds.x
            && self.max.y <= bounds.y
            && self.max.z <= bounds.z
    }

    /// Returns a copy with every coordinate rounded to `digits` decimals.
    pub fn rounded(&self, digits: i32) -> Self {
        Self {
            min: self.min.map(|v| round_to(v, digits)),
            max: self.max.map(|v| round_to(v, digits)),
        }
    }

    /// Corner of the box selected per axis by the sign of `normal`
    /// (max coordinate where the component is non-negative, min otherwise).
    pub fn support_corner(&self, normal: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            if normal.x >= 0.0 { self.max.x } else { self.min.x },
            if normal.y >= 0.0 { self.max.y } else { self.min.y },
            if normal.z >= 0.0 { self.max.z } else { self.min.z },
        )
    }
}
